//! Streaming test client for a deployed scoring agent.
//!
//! Opens one session, sends one prompt, and folds the resulting event stream
//! into a [`Summary`] of score, artifacts and storage URI.

pub mod cli;
pub mod reducer;
pub mod run;
pub mod summary;

pub use reducer::{SummaryBuilder, reduce_stream, reduce_stream_inspect};
pub use run::{Run, RunError, RunRequest, RunState};
pub use summary::Summary;
