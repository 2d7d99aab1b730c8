//! Instrumentation and background recomputation
//!
//! Profiling goes through the `profiling` crate; with neither
//! `profile-with-puffin` nor `profile-with-tracy` enabled the scopes are no-ops.

mod worker;

pub use worker::{RecomputeRequest, RecomputeWorker, WorkerRequest, WorkerResult};

// Re-export profiling macros for convenience
pub use profiling;

/// Profile a block and trace how long it took.
/// Usage: timed!("operation name", { code })
macro_rules! timed {
    ($name:expr, $block:expr) => {{
        $crate::perf::profiling::scope!($name);
        let started = std::time::Instant::now();
        let r = $block;
        tracing::trace!(elapsed = ?started.elapsed(), "{}", $name);
        r
    }};
}

pub(crate) use timed;

/// Serve puffin profiling data for `puffin_viewer`.
///
/// Returns `None` (and logs) when the server cannot bind.
#[cfg(feature = "profile-with-puffin")]
pub fn start_puffin_server() -> Option<puffin_http::Server> {
    let addr = format!("127.0.0.1:{}", puffin_http::DEFAULT_PORT);
    match puffin_http::Server::new(&addr) {
        Ok(server) => {
            puffin::set_scopes_on(true);
            tracing::info!(%addr, "puffin server listening");
            Some(server)
        }
        Err(err) => {
            tracing::warn!(%err, "failed to start puffin server");
            None
        }
    }
}
