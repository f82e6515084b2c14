//! Dossier Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the dossier workspace.
//!
//! - **Error Handling**: [`DossierError`] and the [`Result`] alias used by the engine
//!   and the HTTP service
//! - **Logging**: tracing subscriber bootstrap driven by environment variables
//!
//! # Example
//!
//! ```no_run
//! use dossier_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

pub use error::{DossierError, Result};
