//! cli::blocking
//!
//! Bridges async command bodies into the synchronous CLI.
//!
//! # Design
//!
//! Engine-facing command bodies are async so they can suspend on backend
//! I/O. The CLI itself is synchronous: each invocation builds a fresh
//! single-threaded scheduler, drives the body to completion, and tears the
//! scheduler down. Nothing runs concurrently with the invoking thread and
//! no scheduler state leaks between invocations.

use std::future::Future;
use std::io;

/// Run an async command body to completion on a fresh scheduler.
///
/// The caller blocks until the body finishes. The body's output, including
/// any error it produced, is returned unchanged; the outer error covers
/// only failure to construct the scheduler itself.
pub fn run<F: Future>(future: F) -> io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}
