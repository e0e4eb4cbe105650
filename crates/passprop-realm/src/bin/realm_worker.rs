//! Isolated realm worker entry point.
//!
//! Reads one [`WorkerRequest`] from stdin, runs the propagation attempt
//! under its own deadline, and exits carrying the outcome code. Stderr is
//! the only log channel; stdout stays silent.

use std::io::Read;

use tracing::error;
use tracing_subscriber::EnvFilter;

use passprop_core::outcome::PropagationOutcome;
use passprop_realm::kadmin::KadminFactory;
use passprop_realm::wire::WorkerRequest;
use passprop_realm::worker;

fn read_request() -> Result<WorkerRequest, String> {
    let mut raw = Vec::new();
    std::io::stdin()
        .read_to_end(&mut raw)
        .map_err(|e| format!("reading request: {e}"))?;
    serde_json::from_slice(&raw).map_err(|e| format!("parsing request: {e}"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let outcome = match read_request() {
        Ok(request) => worker::run_with_deadline(&request, &KadminFactory).await,
        Err(message) => {
            error!(message, "malformed worker request");
            PropagationOutcome::LocalError
        }
    };

    std::process::exit(outcome.exit_code());
}
