use std::process::ExitCode;

fn main() -> ExitCode {
    match ccsd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: "ccsd::process", error = %error, "service terminated");
            eprintln!("ccsd: {error}");
            ExitCode::FAILURE
        }
    }
}
