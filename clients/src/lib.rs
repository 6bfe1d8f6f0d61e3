//! Shared plumbing for the biograph command-line clients.
//!
//! A run is described by a TOML [`RunConfig`]; [`Prepared::load`] performs
//! the whole construction phase (term graphs, joins, schema resolution,
//! label routing) and fails before any record is read.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod config;
pub mod pipeline;

pub use config::{CacheConfig, HeadSource, RunConfig, RunConfigError, TailSource};
pub use pipeline::{build_graph, load_terms, Prepared};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber: `RUST_LOG` filtering (default `info`),
/// human-readable or JSON lines on stderr.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}
