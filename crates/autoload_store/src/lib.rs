//! Persisted session snapshots ("autoload").
//!
//! A snapshot captures the build-shell selections (prefix, runtime, project,
//! config, drive, debug flag) so the next startup can skip the initial
//! selection screens. The store is deliberately strict on load — a snapshot
//! missing any required field is an error — and callers treat every error as
//! "no snapshot", never as fatal.

mod error;
mod paths;
mod schema;
mod store;

pub use error::AutoloadError;
pub use paths::default_snapshot_path;
pub use schema::AutoloadSnapshot;
pub use store::{load_snapshot, save_snapshot};
