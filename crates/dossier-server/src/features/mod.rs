//! Feature modules implementing the dossier API
//!
//! - **workflows**: discovery, configuration and execution of registered workflows

pub mod workflows;

use axum::Router;
use dossier_engine::Orchestrator;
use std::sync::Arc;

/// Shared state for all feature routes
///
/// The orchestrator locks each workflow on its own; a running workflow only
/// holds up requests for that same workflow.
#[derive(Clone)]
pub struct FeatureState {
    pub orchestrator: Arc<Orchestrator>,
}

impl FeatureState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Creates the API router with all feature routes mounted
///
/// - `/workflows` - Workflow discovery, configuration and runs
pub fn router(state: FeatureState) -> Router<()> {
    Router::new().nest("/workflows", workflows::workflows_routes().with_state(state))
}
