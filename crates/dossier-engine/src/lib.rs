//! Gene dossier workflow engine
//!
//! Aggregates information about a gene or protein from several external
//! providers into one category-organized report. Workflows move through
//! three stages:
//!
//! 1. **Discovery** (`stage_1`): list steps and their minimum and optional methods
//! 2. **Configuration** (`stage_2`): set the search term, enable optional
//!    methods, override per-method options
//! 3. **Execution** (`stage_3`): run the declarative plan, resolving derived
//!    inputs and fanning out enrichments, then format the report
//!
//! # Example
//!
//! ```no_run
//! use dossier_engine::{catalog, EngineConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = catalog::default_orchestrator(&EngineConfig::load()?)?;
//!
//!     orchestrator.set_stage_2(catalog::GENE_REPORT).await?;
//!     orchestrator.set_search_param(catalog::GENE_REPORT, "EGFR").await?;
//!     orchestrator.set_stage_3(catalog::GENE_REPORT).await?;
//!
//!     let report = orchestrator.start_workflow(catalog::GENE_REPORT).await?;
//!     println!("{}", report.to_json_pretty()?);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod catalog;
pub mod config;
pub mod executor;
pub mod filter;
pub mod formatter;
pub mod orchestrator;
pub mod plan;
pub mod provider;
pub mod report;
pub mod stage;
pub mod step;
pub mod table;
pub mod workflow;

pub use config::EngineConfig;
pub use filter::{FilterDescriptor, MethodSelection};
pub use orchestrator::Orchestrator;
pub use report::Report;
pub use stage::Stage;
pub use table::{Table, TableResult, NO_DATA_SENTINEL};
pub use workflow::Workflow;
