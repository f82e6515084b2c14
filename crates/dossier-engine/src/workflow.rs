//! Stage-gated workflows
//!
//! A [`Workflow`] owns its steps, their default filter descriptors, an
//! execution plan and a report layout. Every public operation checks the
//! current [`Stage`] first and leaves the workflow untouched when the check
//! fails.

use dossier_common::{DossierError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::executor;
use crate::filter::{FilterDescriptor, MethodSelection};
use crate::formatter;
use crate::plan::ExecutionPlan;
use crate::report::{Report, ReportLayout};
use crate::stage::Stage;
use crate::step::{StepInfo, WorkflowStep};
use crate::table::MethodOptions;

/// Processor id and method list declared for one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepMethods {
    pub processor_id: String,
    pub methods: Vec<MethodSelection>,
}

/// Step name to declared methods, in step order
pub type MethodsByStep = IndexMap<String, StepMethods>;

/// Listing entry for a registered workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowSummary {
    pub name: String,
    pub description: String,
    pub stage: Stage,
}

#[derive(Debug)]
pub struct Workflow {
    name: String,
    description: String,
    stage: Stage,
    steps: IndexMap<String, WorkflowStep>,
    minimum_methods: MethodsByStep,
    optional_methods: MethodsByStep,
    search_param: Option<String>,
    plan: ExecutionPlan,
    layout: ReportLayout,
}

impl Workflow {
    pub fn builder(name: impl Into<String>, description: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder {
            name: name.into(),
            description: description.into(),
            steps: Vec::new(),
            optional: IndexMap::new(),
            plan: ExecutionPlan::default(),
            layout: ReportLayout::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn search_param(&self) -> Option<&str> {
        self.search_param.as_deref()
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub fn layout(&self) -> &ReportLayout {
        &self.layout
    }

    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            stage: self.stage,
        }
    }

    fn require(&self, required: Stage, operation: &str) -> Result<()> {
        self.stage.require(required, &self.name, operation)
    }

    fn step_mut(&mut self, step: &str) -> Result<&mut WorkflowStep> {
        let workflow = &self.name;
        self.steps.get_mut(step).ok_or_else(|| DossierError::StepNotFound {
            workflow: workflow.clone(),
            step: step.to_string(),
        })
    }

    // ------------------------------------------------------------------
    // stage_1: discovery
    // ------------------------------------------------------------------

    pub fn get_steps(&self) -> Result<Vec<StepInfo>> {
        self.require(Stage::Discovery, "get_steps")?;
        Ok(self.steps.values().map(WorkflowStep::info).collect())
    }

    pub fn get_minimum_methods(&self) -> Result<MethodsByStep> {
        self.require(Stage::Discovery, "get_minimum_methods")?;
        Ok(self.minimum_methods.clone())
    }

    pub fn get_optional_methods(&self) -> Result<MethodsByStep> {
        self.require(Stage::Discovery, "get_optional_methods")?;
        Ok(self.optional_methods.clone())
    }

    /// Ping every step's provider. Allowed in any stage.
    pub async fn check_providers(&mut self) -> IndexMap<String, crate::provider::ProviderStatus> {
        let mut statuses = IndexMap::new();
        for (name, step) in &mut self.steps {
            statuses.insert(name.clone(), step.get_status().await);
        }
        statuses
    }

    pub fn set_stage_2(&mut self) -> Result<()> {
        self.require(Stage::Discovery, "set_stage_2")?;
        self.stage = self.stage.next();
        info!(workflow = %self.name, stage = %self.stage, "Stage changed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // stage_2: configuration
    // ------------------------------------------------------------------

    pub fn set_search_param(&mut self, value: &str) -> Result<()> {
        self.require(Stage::Configuration, "set_search_param")?;
        let value = value.trim();
        if value.is_empty() {
            return Err(DossierError::configuration("search param must not be empty"));
        }
        self.search_param = Some(value.to_string());
        Ok(())
    }

    /// Enable one of the step's optional methods, with `options` when given
    pub fn set_optional_method(
        &mut self,
        step: &str,
        method: &str,
        options: Option<MethodOptions>,
    ) -> Result<()> {
        self.require(Stage::Configuration, "set_optional_method")?;

        let declared = self
            .optional_methods
            .get(step)
            .and_then(|s| s.methods.iter().find(|m| m.method_id == method))
            .cloned();
        let target = self.step_mut(step)?;
        let Some(mut selection) = declared else {
            return Err(DossierError::MethodNotFound {
                step: step.to_string(),
                method: method.to_string(),
            });
        };
        if let Some(options) = options {
            selection.method_options = options;
        }

        let filter = target
            .current_filter_mut()
            .ok_or_else(|| DossierError::FilterNotSet { step: step.to_string() })?;
        filter.enable_method(selection);
        Ok(())
    }

    /// Replace the options of an enabled method
    pub fn set_filter_to_method(
        &mut self,
        step: &str,
        method: &str,
        options: MethodOptions,
    ) -> Result<()> {
        self.require(Stage::Configuration, "set_filter_to_method")?;
        let target = self.step_mut(step)?;
        let filter = target
            .current_filter_mut()
            .ok_or_else(|| DossierError::FilterNotSet { step: step.to_string() })?;
        filter.override_method_options(method, options)
    }

    /// Currently attached descriptors, by step
    pub fn get_filters(&self) -> Result<IndexMap<String, FilterDescriptor>> {
        self.require(Stage::Configuration, "get_filters")?;
        Ok(self
            .steps
            .iter()
            .filter_map(|(name, step)| step.current_filter().map(|f| (name.clone(), f.clone())))
            .collect())
    }

    pub fn set_stage_3(&mut self) -> Result<()> {
        self.require(Stage::Configuration, "set_stage_3")?;
        self.stage = self.stage.next();
        info!(workflow = %self.name, stage = %self.stage, "Stage changed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // stage_3: execution
    // ------------------------------------------------------------------

    /// Run the plan, format the report and return to stage_1.
    ///
    /// The stage returns to stage_1 even when the run cannot start for lack
    /// of a search param.
    pub async fn start_workflow(&mut self) -> Result<Report> {
        self.require(Stage::Execution, "start_workflow")?;

        let Some(search_param) = self.search_param.clone() else {
            self.stage = self.stage.next();
            return Err(DossierError::MissingSearchParam {
                workflow: self.name.clone(),
            });
        };

        let span = info_span!(
            "workflow_run",
            workflow = %self.name,
            run_id = %Uuid::new_v4(),
            search_term = %search_param
        );

        let report = self.steps_execution(&search_param).instrument(span).await;

        executor::clear_search_inputs(&mut self.steps);
        self.stage = self.stage.next();
        Ok(report)
    }

    async fn steps_execution(&mut self, search_param: &str) -> Report {
        info!("Workflow started");
        let outcome = executor::execute(&self.plan, &mut self.steps, search_param).await;

        let categories = formatter::format(
            &outcome.triples,
            &self.layout.category_config,
            &self.layout.method_category_mapping,
            &self.layout.grouping_config,
        );

        let warnings: Vec<String> = outcome
            .skipped
            .iter()
            .map(|s| format!("{} skipped: {}", s.step, s.reason))
            .collect();
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "Workflow finished with skipped steps");
        }
        info!(categories = categories.len(), "Workflow finished");

        Report::new(search_param, categories, warnings)
    }

    /// Abort back to stage_1 from any stage, dropping all customization
    pub fn reset(&mut self) {
        for (name, step) in &mut self.steps {
            if let Some(minimum) = self.minimum_methods.get(name) {
                step.attach_filter(FilterDescriptor::create(
                    minimum.methods.iter().cloned(),
                    minimum.processor_id.clone(),
                ));
            }
        }
        self.search_param = None;
        self.stage = Stage::Discovery;
        info!(workflow = %self.name, "Workflow reset");
    }
}

/// Fluent construction of a [`Workflow`]
pub struct WorkflowBuilder {
    name: String,
    description: String,
    steps: Vec<(WorkflowStep, Vec<MethodSelection>)>,
    optional: IndexMap<String, Vec<MethodSelection>>,
    plan: ExecutionPlan,
    layout: ReportLayout,
}

impl WorkflowBuilder {
    /// Add a step with its minimum methods
    pub fn step<I>(mut self, step: WorkflowStep, minimum_methods: I) -> Self
    where
        I: IntoIterator<Item = MethodSelection>,
    {
        self.steps.push((step, minimum_methods.into_iter().collect()));
        self
    }

    /// Declare a step's optional methods explicitly.
    ///
    /// Steps without a declaration offer every provider method that is not
    /// in their minimum set.
    pub fn optional_methods<I>(mut self, step: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = MethodSelection>,
    {
        self.optional.insert(step.into(), methods.into_iter().collect());
        self
    }

    pub fn plan(mut self, plan: ExecutionPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn layout(mut self, layout: ReportLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn build(self) -> Result<Workflow> {
        let mut steps = IndexMap::new();
        let mut minimum_methods = MethodsByStep::new();
        let mut optional_methods = MethodsByStep::new();

        for (mut step, minimum) in self.steps {
            let name = step.name().to_string();
            if steps.contains_key(&name) {
                return Err(DossierError::configuration(format!(
                    "workflow '{}' declares step '{}' twice",
                    self.name, name
                )));
            }

            let declared_optional = self.optional.get(&name).cloned();
            for selection in minimum.iter().chain(declared_optional.iter().flatten()) {
                if !step.supports(&selection.method_id) {
                    return Err(DossierError::MethodNotFound {
                        step: name.clone(),
                        method: selection.method_id.clone(),
                    });
                }
            }

            let optional = declared_optional.unwrap_or_else(|| {
                step.info()
                    .methods
                    .into_iter()
                    .filter(|m| !minimum.iter().any(|s| s.method_id == m.id))
                    .map(|m| MethodSelection::new(m.id))
                    .collect()
            });

            let processor_id = step.provider_name().to_string();
            let filter = FilterDescriptor::create(minimum.iter().cloned(), processor_id.clone());
            step.attach_filter(filter);

            minimum_methods.insert(
                name.clone(),
                StepMethods {
                    processor_id: processor_id.clone(),
                    methods: minimum,
                },
            );
            optional_methods.insert(
                name.clone(),
                StepMethods {
                    processor_id,
                    methods: optional,
                },
            );
            steps.insert(name, step);
        }

        if let Some(unknown) = self.optional.keys().find(|k| !steps.contains_key(*k)) {
            return Err(DossierError::StepNotFound {
                workflow: self.name,
                step: unknown.clone(),
            });
        }

        let names: Vec<&str> = steps.keys().map(String::as_str).collect();
        self.plan.validate(&names)?;

        Ok(Workflow {
            name: self.name,
            description: self.description,
            stage: Stage::Discovery,
            steps,
            minimum_methods,
            optional_methods,
            search_param: None,
            plan: self.plan,
            layout: self.layout,
        })
    }
}
