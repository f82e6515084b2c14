//! Orchestrator: named workflows behind one stage-aware facade
//!
//! The registry is fixed once the orchestrator is shared. Each workflow sits
//! behind its own lock, so a long run only holds up callers of that workflow.
//!
//! Read queries against an unknown workflow name return empty results;
//! mutations fail with `WorkflowNotFound`.

use std::sync::Arc;

use dossier_common::{DossierError, Result};
use indexmap::IndexMap;
use tokio::sync::{Mutex, MutexGuard};

use crate::filter::FilterDescriptor;
use crate::provider::ProviderStatus;
use crate::report::Report;
use crate::stage::Stage;
use crate::step::StepInfo;
use crate::table::MethodOptions;
use crate::workflow::{MethodsByStep, Workflow, WorkflowSummary};

/// A workflow shared between concurrent callers
pub type SharedWorkflow = Arc<Mutex<Workflow>>;

#[derive(Debug, Default)]
pub struct Orchestrator {
    workflows: IndexMap<String, SharedWorkflow>,
}

impl Orchestrator {
    /// Register `workflows`; names must be unique
    pub fn new(workflows: Vec<Workflow>) -> Result<Self> {
        let mut orchestrator = Self::default();
        for workflow in workflows {
            orchestrator.register(workflow)?;
        }
        Ok(orchestrator)
    }

    pub fn register(&mut self, workflow: Workflow) -> Result<()> {
        if self.workflows.contains_key(workflow.name()) {
            return Err(DossierError::configuration(format!(
                "workflow '{}' is already registered",
                workflow.name()
            )));
        }
        self.workflows
            .insert(workflow.name().to_string(), Arc::new(Mutex::new(workflow)));
        Ok(())
    }

    pub fn workflow(&self, name: &str) -> Option<SharedWorkflow> {
        self.workflows.get(name).cloned()
    }

    /// Registered names in registration order. Takes no workflow lock.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.workflows.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.workflows.contains_key(name)
    }

    async fn lock(&self, name: &str) -> Option<MutexGuard<'_, Workflow>> {
        match self.workflows.get(name) {
            Some(workflow) => Some(workflow.lock().await),
            None => None,
        }
    }

    async fn lock_existing(&self, name: &str) -> Result<MutexGuard<'_, Workflow>> {
        self.lock(name)
            .await
            .ok_or_else(|| DossierError::WorkflowNotFound(name.to_string()))
    }

    /// Summaries of every workflow; waits for any workflow that is running
    pub async fn get_workflows(&self) -> Vec<WorkflowSummary> {
        let mut summaries = Vec::with_capacity(self.workflows.len());
        for workflow in self.workflows.values() {
            summaries.push(workflow.lock().await.summary());
        }
        summaries
    }

    pub async fn stage_of(&self, name: &str) -> Option<Stage> {
        self.lock(name).await.map(|workflow| workflow.stage())
    }

    pub async fn get_steps(&self, name: &str) -> Result<Vec<StepInfo>> {
        match self.lock(name).await {
            Some(workflow) => workflow.get_steps(),
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_minimum_methods(&self, name: &str) -> Result<MethodsByStep> {
        match self.lock(name).await {
            Some(workflow) => workflow.get_minimum_methods(),
            None => Ok(MethodsByStep::new()),
        }
    }

    pub async fn get_optional_methods(&self, name: &str) -> Result<MethodsByStep> {
        match self.lock(name).await {
            Some(workflow) => workflow.get_optional_methods(),
            None => Ok(MethodsByStep::new()),
        }
    }

    pub async fn get_filters(&self, name: &str) -> Result<IndexMap<String, FilterDescriptor>> {
        match self.lock(name).await {
            Some(workflow) => workflow.get_filters(),
            None => Ok(IndexMap::new()),
        }
    }

    pub async fn check_providers(&self, name: &str) -> IndexMap<String, ProviderStatus> {
        match self.lock(name).await {
            Some(mut workflow) => workflow.check_providers().await,
            None => IndexMap::new(),
        }
    }

    pub async fn set_stage_2(&self, name: &str) -> Result<()> {
        self.lock_existing(name).await?.set_stage_2()
    }

    pub async fn set_search_param(&self, name: &str, value: &str) -> Result<()> {
        self.lock_existing(name).await?.set_search_param(value)
    }

    pub async fn set_optional_method(
        &self,
        name: &str,
        step: &str,
        method: &str,
        options: Option<MethodOptions>,
    ) -> Result<()> {
        self.lock_existing(name)
            .await?
            .set_optional_method(step, method, options)
    }

    pub async fn set_filter_to_method(
        &self,
        name: &str,
        step: &str,
        method: &str,
        options: MethodOptions,
    ) -> Result<()> {
        self.lock_existing(name)
            .await?
            .set_filter_to_method(step, method, options)
    }

    pub async fn set_stage_3(&self, name: &str) -> Result<()> {
        self.lock_existing(name).await?.set_stage_3()
    }

    /// Run `name` to completion while holding only its own lock
    pub async fn start_workflow(&self, name: &str) -> Result<Report> {
        self.lock_existing(name).await?.start_workflow().await
    }

    pub async fn reset(&self, name: &str) -> Result<()> {
        self.lock_existing(name).await?.reset();
        Ok(())
    }
}
