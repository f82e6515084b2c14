//! Request and response bodies for workflow routes

use dossier_engine::provider::ProviderStatus;
use dossier_engine::Stage;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParamRequest {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionalMethodRequest {
    pub step: String,
    pub method: String,
    #[serde(default)]
    pub options: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterRequest {
    pub step: String,
    pub method: String,
    pub options: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageResponse {
    pub workflow: String,
    pub stage: Stage,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatusResponse {
    pub workflow: String,
    pub providers: IndexMap<String, ProviderStatus>,
}
