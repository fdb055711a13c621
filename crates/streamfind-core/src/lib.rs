//! Stream resolution engine: find the live HLS/DASH manifest behind a landing
//! page and the player frames it embeds.
//!
//! Entry point is [`resolver::Resolver`]; see [`resolver::resolve_all`] for
//! batch resolution.

pub mod budget;
pub mod config;
pub mod derive;
pub mod diagnostics;
pub mod embed;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod playlist;
pub mod resolver;
pub mod scan;
pub mod sniff;
pub mod url_model;

pub use error::{Probe, ResolveError, Stage};
pub use resolver::{ResolutionOutcome, ResolvedStream, Resolver, StreamOrigin, Target};
