//! Workflow lifecycle stages

use dossier_common::{DossierError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle stage of a workflow.
///
/// The forward cycle is Discovery → Configuration → Execution → Discovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Read-only discovery of steps and methods
    #[default]
    #[serde(rename = "stage_1")]
    Discovery,
    /// User customization of search param and method options
    #[serde(rename = "stage_2")]
    Configuration,
    /// Ready to run
    #[serde(rename = "stage_3")]
    Execution,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Discovery => "stage_1",
            Stage::Configuration => "stage_2",
            Stage::Execution => "stage_3",
        }
    }

    /// The stage a forward transition from `self` lands in
    pub fn next(self) -> Stage {
        match self {
            Stage::Discovery => Stage::Configuration,
            Stage::Configuration => Stage::Execution,
            Stage::Execution => Stage::Discovery,
        }
    }

    /// Fail with a stage violation unless `self == required`
    pub fn require(self, required: Stage, workflow: &str, operation: &str) -> Result<()> {
        if self == required {
            Ok(())
        } else {
            Err(DossierError::StageViolation {
                workflow: workflow.to_string(),
                current: self.to_string(),
                required: required.to_string(),
                operation: operation.to_string(),
            })
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
