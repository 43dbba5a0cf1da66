//! Test helpers for the transport module.

use std::io::Write;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
    mpsc::{self, Receiver, Sender},
};

use super::{ConnectionHandler, ConnectionStream};

pub(crate) struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            count: Arc::clone(&count),
        });
        (count, handler)
    }
}

impl ConnectionHandler for CountingHandler {
    fn handle(&self, _stream: ConnectionStream) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handler whose first connection blocks until the test opens the gate.
///
/// Every connection is answered with its arrival index followed by a
/// newline, so tests can observe ordering.
pub(crate) struct GatedHandler {
    arrivals: AtomicUsize,
    gate: Mutex<Option<Receiver<()>>>,
    panic_on_first: bool,
}

impl GatedHandler {
    pub(crate) fn new() -> (Sender<()>, Arc<Self>) {
        let (open, gate) = mpsc::channel();
        let handler = Arc::new(Self {
            arrivals: AtomicUsize::new(0),
            gate: Mutex::new(Some(gate)),
            panic_on_first: false,
        });
        (open, handler)
    }

    /// Handler whose first connection panics without answering.
    pub(crate) fn panicking() -> Arc<Self> {
        Arc::new(Self {
            arrivals: AtomicUsize::new(0),
            gate: Mutex::new(None),
            panic_on_first: true,
        })
    }
}

impl ConnectionHandler for GatedHandler {
    fn handle(&self, mut stream: ConnectionStream) {
        let index = self.arrivals.fetch_add(1, Ordering::SeqCst);
        if index == 0 {
            assert!(!self.panic_on_first, "first connection panics");
            let gate = self.gate.lock().expect("gate mutex poisoned").take();
            if let Some(gate) = gate {
                drop(gate.recv());
            }
        }
        drop(writeln!(stream, "{index}"));
    }
}
