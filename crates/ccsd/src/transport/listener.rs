//! TCP listener for the compile service endpoint.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use ccs_config::{DispatchMode, TcpEndpoint};

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Listener bound to a TCP endpoint.
#[derive(Debug)]
pub(crate) struct SocketListener {
    endpoint: TcpEndpoint,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl SocketListener {
    pub(crate) fn bind(endpoint: &TcpEndpoint) -> Result<Self, ListenerError> {
        let listener = bind_tcp(&endpoint.host, endpoint.port)?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddr { source })?;
        Ok(Self {
            endpoint: endpoint.clone(),
            listener,
            local_addr,
        })
    }

    /// Address actually bound, which differs from the endpoint for port 0.
    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts the accept loop on a background thread.
    ///
    /// In [`DispatchMode::Serial`] connections are handled one at a time on
    /// the listener thread; in [`DispatchMode::Concurrent`] each connection
    /// gets its own thread.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
        mode: DispatchMode,
    ) -> Result<ListenerHandle, ListenerError> {
        self.listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let local_addr = self.local_addr;
        let handle = thread::Builder::new()
            .name(String::from("ccsd-listener"))
            .spawn(move || run_accept_loop(&self, &shutdown_flag, &handler, mode))
            .map_err(|source| ListenerError::Spawn { source })?;
        Ok(ListenerHandle {
            shutdown,
            local_addr,
            handle: Some(handle),
        })
    }
}

/// Handle to the background listener thread.
#[derive(Debug)]
pub struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    local_addr: SocketAddr,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Asks the accept loop to stop. A connection being served finishes first.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the accept loop to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] when the listener thread
    /// panicked.
    pub fn join(mut self) -> Result<(), ListenerError> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(()) => Ok(()),
                Err(_) => Err(ListenerError::ThreadPanic),
            }
        } else {
            Ok(())
        }
    }
}

impl ListenerHandle {
    /// Stops the accept loop and waits at most `budget` for it to exit.
    ///
    /// A listener thread still busy after the budget is detached.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ShutdownTimeout`] when the budget runs out
    /// and [`ListenerError::ThreadPanic`] when the thread panicked.
    pub fn join_within(mut self, budget: Duration) -> Result<(), ListenerError> {
        self.shutdown();
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let deadline = Instant::now().checked_add(budget);
        while !handle.is_finished() {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                warn!(
                    target: LISTENER_TARGET,
                    budget_ms = budget.as_millis(),
                    "listener still busy after shutdown budget, detaching"
                );
                return Err(ListenerError::ShutdownTimeout { budget });
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }
        handle.join().map_err(|_| ListenerError::ThreadPanic)
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_accept_loop(
    listener: &SocketListener,
    shutdown: &AtomicBool,
    handler: &Arc<dyn ConnectionHandler>,
    mode: DispatchMode,
) {
    info!(
        target: LISTENER_TARGET,
        endpoint = %listener.endpoint,
        local_addr = %listener.local_addr,
        mode = %mode,
        "listener active"
    );
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.load(Ordering::SeqCst) {
        match accept_connection(&listener.listener) {
            Ok(Some(stream)) => {
                last_error = None;
                match mode {
                    DispatchMode::Serial => serve(handler.as_ref(), stream),
                    DispatchMode::Concurrent => spawn_connection(handler, stream),
                }
            }
            Ok(None) => thread::sleep(ACCEPT_BACKOFF),
            Err(error) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        "socket accept error"
                    );
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
    info!(target: LISTENER_TARGET, "listener stopped");
}

fn spawn_connection(handler: &Arc<dyn ConnectionHandler>, stream: ConnectionStream) {
    let handler = Arc::clone(handler);
    let spawned = thread::Builder::new()
        .name(String::from("ccsd-connection"))
        .spawn(move || serve(handler.as_ref(), stream));
    if let Err(error) = spawned {
        error!(
            target: LISTENER_TARGET,
            error = %error,
            "failed to spawn connection thread; connection dropped"
        );
    }
}

// The accept loop must outlive any single connection.
fn serve(handler: &dyn ConnectionHandler, stream: ConnectionStream) {
    let peer = stream.peer();
    if panic::catch_unwind(AssertUnwindSafe(|| handler.handle(stream))).is_err() {
        error!(
            target: LISTENER_TARGET,
            ?peer,
            "connection handler panicked"
        );
    }
}

fn accept_connection(listener: &TcpListener) -> Result<Option<ConnectionStream>, io::Error> {
    match listener.accept() {
        Ok((stream, _)) => {
            stream.set_nonblocking(false)?;
            enable_nodelay(&stream);
            Ok(Some(ConnectionStream::new(stream)))
        }
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(error) => Err(error),
    }
}

fn enable_nodelay(stream: &TcpStream) {
    if let Err(error) = stream.set_nodelay(true) {
        debug!(
            target: LISTENER_TARGET,
            error = %error,
            "failed to disable Nagle's algorithm"
        );
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_string(),
            port,
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| ListenerError::ResolveEmpty {
        host: host.to_string(),
        port,
    })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}
