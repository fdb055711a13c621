//! CLI command handlers, one per file.

mod channels;
mod resolve;
mod run;

pub use channels::run_channels;
pub use resolve::run_resolve;
pub use run::run_run;
