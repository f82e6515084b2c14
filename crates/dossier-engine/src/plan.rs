//! Declarative execution plans
//!
//! A plan lists the steps a workflow runs, in order, with where each step's
//! search input comes from and which of its method results get enriched by
//! per-row calls into another step.

use dossier_common::{DossierError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Where a step's search input comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputSource {
    /// The workflow's search param, verbatim
    Direct,
    /// One cell of an earlier step's method result
    Derived {
        step: String,
        method: String,
        column: String,
        #[serde(default)]
        row: usize,
    },
}

/// What to do with a row whose enrichment call returned no data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingRowPolicy {
    DropRow,
    KeepRow,
}

/// Row-by-row fan-out from one method result into another step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    /// Method of the planned step whose table is enriched
    pub method: String,
    /// Column whose value becomes the target step's search input
    pub key_column: String,
    pub target_step: String,
    pub target_method: String,
    /// Columns copied from the first row of the target result
    pub columns: Vec<String>,
    pub on_missing: MissingRowPolicy,
}

/// One entry of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStep {
    pub step: String,
    pub input: InputSource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enrichments: Vec<Enrichment>,
}

impl PlannedStep {
    pub fn direct(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            input: InputSource::Direct,
            enrichments: Vec::new(),
        }
    }

    pub fn derived(
        step: impl Into<String>,
        from_step: impl Into<String>,
        from_method: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            step: step.into(),
            input: InputSource::Derived {
                step: from_step.into(),
                method: from_method.into(),
                column: column.into(),
                row: 0,
            },
            enrichments: Vec::new(),
        }
    }

    pub fn enrich(mut self, enrichment: Enrichment) -> Self {
        self.enrichments.push(enrichment);
        self
    }
}

/// Ordered steps of one workflow run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub steps: Vec<PlannedStep>,
}

impl ExecutionPlan {
    pub fn new(steps: Vec<PlannedStep>) -> Self {
        Self { steps }
    }

    /// Check the plan against the workflow's step names.
    ///
    /// Every planned step and enrichment target must exist, no step is
    /// planned twice, and a derived input must come from a step planned
    /// earlier.
    pub fn validate<S: AsRef<str>>(&self, steps: &[S]) -> Result<()> {
        let known: HashSet<&str> = steps.iter().map(AsRef::as_ref).collect();
        let mut planned: HashSet<&str> = HashSet::new();

        for entry in &self.steps {
            if !known.contains(entry.step.as_str()) {
                return Err(DossierError::configuration(format!(
                    "plan references unknown step '{}'",
                    entry.step
                )));
            }

            if let InputSource::Derived { step, .. } = &entry.input {
                if !planned.contains(step.as_str()) {
                    return Err(DossierError::configuration(format!(
                        "step '{}' derives its input from '{}', which is not planned before it",
                        entry.step, step
                    )));
                }
            }

            for enrichment in &entry.enrichments {
                if !known.contains(enrichment.target_step.as_str()) {
                    return Err(DossierError::configuration(format!(
                        "enrichment of '{}.{}' targets unknown step '{}'",
                        entry.step, enrichment.method, enrichment.target_step
                    )));
                }

                let mut copied = HashSet::new();
                let repeated = enrichment.columns.iter().find(|c| !copied.insert(c.as_str()));
                if let Some(column) = repeated {
                    return Err(DossierError::configuration(format!(
                        "enrichment of '{}.{}' copies column '{}' twice",
                        entry.step, enrichment.method, column
                    )));
                }
            }

            if !planned.insert(entry.step.as_str()) {
                return Err(DossierError::configuration(format!(
                    "step '{}' is planned twice",
                    entry.step
                )));
            }
        }

        Ok(())
    }
}
