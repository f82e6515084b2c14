//! Workflow steps
//!
//! A step wraps one provider. Given a filter descriptor it fetches the raw
//! document once and runs every enabled method's parse routine over it.

use dossier_common::{DossierError, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::filter::FilterDescriptor;
use crate::provider::{Provider, ProviderStatus};
use crate::table::TableResult;

/// Method id to result, in descriptor order
pub type StepResults = IndexMap<String, TableResult>;

/// Discovery view of a supported method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodInfo {
    pub id: String,
    pub description: String,
}

/// Discovery view of a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepInfo {
    pub name: String,
    pub description: String,
    pub provider: String,
    pub methods: Vec<MethodInfo>,
    pub last_status: Option<ProviderStatus>,
}

/// One provider-backed unit of a workflow
pub struct WorkflowStep {
    name: String,
    description: String,
    provider: Arc<dyn Provider>,
    current_filter: Option<FilterDescriptor>,
    last_status: Option<ProviderStatus>,
}

impl std::fmt::Debug for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStep")
            .field("name", &self.name)
            .field("provider", &self.provider.name())
            .field("current_filter", &self.current_filter)
            .field("last_status", &self.last_status)
            .finish()
    }
}

impl WorkflowStep {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        provider: Arc<dyn Provider>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            provider,
            current_filter: None,
            last_status: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn last_status(&self) -> Option<ProviderStatus> {
        self.last_status
    }

    /// Whether the provider registry has `method_id`
    pub fn supports(&self, method_id: &str) -> bool {
        self.provider.parser(method_id).is_some()
    }

    pub fn info(&self) -> StepInfo {
        StepInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            provider: self.provider.name().to_string(),
            methods: self
                .provider
                .parsers()
                .iter()
                .map(|p| MethodInfo {
                    id: p.id.to_string(),
                    description: p.description.to_string(),
                })
                .collect(),
            last_status: self.last_status,
        }
    }

    pub fn attach_filter(&mut self, filter: FilterDescriptor) {
        self.current_filter = Some(filter);
    }

    pub fn current_filter(&self) -> Option<&FilterDescriptor> {
        self.current_filter.as_ref()
    }

    pub fn current_filter_mut(&mut self) -> Option<&mut FilterDescriptor> {
        self.current_filter.as_mut()
    }

    /// Ping the provider and remember the answer
    pub async fn get_status(&mut self) -> ProviderStatus {
        let status = self.provider.ping().await;
        self.last_status = Some(status);
        status
    }

    /// Run the attached filter descriptor
    pub async fn process(&mut self) -> Result<StepResults> {
        let filter = self
            .current_filter
            .clone()
            .ok_or_else(|| DossierError::FilterNotSet {
                step: self.name.clone(),
            })?;
        self.process_with(&filter).await
    }

    /// Attach a descriptor given in interchange form, then run it
    pub async fn process_interchange(&mut self, text: &str) -> Result<StepResults> {
        let filter = FilterDescriptor::from_interchange(text)?;
        self.attach_filter(filter);
        self.process().await
    }

    /// Run an explicit descriptor without touching the attached one.
    ///
    /// Methods the provider does not implement are skipped. Provider and
    /// parse failures become `NotFound` results; only a missing search input
    /// is an error.
    pub async fn process_with(&mut self, filter: &FilterDescriptor) -> Result<StepResults> {
        let search_id = filter.search_param().ok_or_else(|| {
            DossierError::configuration(format!("step '{}' has no search input", self.name))
        })?;

        let mut runnable = Vec::with_capacity(filter.methods().len());
        for selection in filter.methods() {
            match self.provider.parser(&selection.method_id) {
                Some(parser) => runnable.push((parser, &selection.method_options)),
                None => warn!(
                    step = %self.name,
                    method = %selection.method_id,
                    "Method not implemented by provider, skipping"
                ),
            }
        }

        let mut results = StepResults::new();
        if runnable.is_empty() {
            return Ok(results);
        }

        debug!(step = %self.name, search_id = %search_id, "Fetching");
        let raw = match self.provider.fetch(search_id).await {
            Ok(raw) => {
                self.last_status = Some(ProviderStatus::OK);
                raw
            }
            Err(e) => {
                self.last_status = Some(ProviderStatus::UNREACHABLE);
                warn!(
                    step = %self.name,
                    provider = %self.provider.name(),
                    error = %e,
                    "Provider fetch failed"
                );
                let reason = format!("{} unreachable: {}", self.provider.name(), e);
                for (parser, _) in runnable {
                    results.insert(parser.id.to_string(), TableResult::not_found(reason.clone()));
                }
                return Ok(results);
            }
        };

        for (parser, options) in runnable {
            let result = match (parser.parse)(&raw, options) {
                Ok(table) => TableResult::from_table(table),
                Err(e) => {
                    warn!(step = %self.name, method = parser.id, error = %e, "Parse failed");
                    TableResult::not_found(format!("parse error: {e}"))
                }
            };
            info!(
                step = %self.name,
                method = parser.id,
                rows = result.table().map_or(0, |t| t.len()),
                "Method processed"
            );
            results.insert(parser.id.to_string(), result);
        }

        Ok(results)
    }

    /// Compensating action hook; nothing to undo for read-only providers
    pub fn revert(&mut self) {}
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::filter::MethodSelection;
    use crate::provider::MethodParser;
    use crate::table::{MethodOptions, Table};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn parse_names(raw: &Value, options: &MethodOptions) -> anyhow::Result<Table> {
        Ok(Table::from_records(raw.as_array().unwrap()).apply_options(options))
    }

    fn parse_nothing(_: &Value, _: &MethodOptions) -> anyhow::Result<Table> {
        Ok(Table::new(["name"]))
    }

    fn parse_broken(_: &Value, _: &MethodOptions) -> anyhow::Result<Table> {
        anyhow::bail!("unexpected document")
    }

    static PARSERS: &[MethodParser] = &[
        MethodParser {
            id: "names",
            description: "names",
            parse: parse_names,
        },
        MethodParser {
            id: "nothing",
            description: "always empty",
            parse: parse_nothing,
        },
        MethodParser {
            id: "broken",
            description: "always fails",
            parse: parse_broken,
        },
    ];

    struct Fake {
        up: bool,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl Provider for Fake {
        fn name(&self) -> &str {
            "fake"
        }

        async fn ping(&self) -> ProviderStatus {
            if self.up {
                ProviderStatus::OK
            } else {
                ProviderStatus::UNREACHABLE
            }
        }

        async fn fetch(&self, id: &str) -> anyhow::Result<Value> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            anyhow::ensure!(self.up, "connection refused");
            Ok(json!([{"name": format!("{id}-b")}, {"name": format!("{id}-a")}]))
        }

        fn parsers(&self) -> &'static [MethodParser] {
            PARSERS
        }
    }

    fn step(up: bool) -> (WorkflowStep, Arc<Fake>) {
        let provider = Arc::new(Fake { up, fetches: AtomicUsize::new(0) });
        (WorkflowStep::new("fake", "test step", provider.clone()), provider)
    }

    fn filter(methods: &[&str]) -> FilterDescriptor {
        let selections = methods.iter().map(|m| MethodSelection::new(*m));
        let mut f = FilterDescriptor::create(selections, "fake");
        f.set_search_param("x");
        f
    }

    #[tokio::test]
    async fn test_process_without_filter_fails() {
        let (mut step, _) = step(true);
        let err = step.process().await.unwrap_err();
        assert!(matches!(err, DossierError::FilterNotSet { .. }));
    }

    #[tokio::test]
    async fn test_fetches_once_and_skips_unknown_methods() {
        let (mut step, provider) = step(true);
        step.attach_filter(filter(&["names", "unknown", "nothing", "broken"]));

        let results = step.process().await.unwrap();
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
        let keys: Vec<_> = results.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["names", "nothing", "broken"]);
        assert_eq!(results["names"].table().unwrap().len(), 2);
        assert!(!results["nothing"].is_found());
        assert!(!results["broken"].is_found());
        assert_eq!(step.last_status(), Some(ProviderStatus::OK));
    }

    #[tokio::test]
    async fn test_options_reach_parse_routine() {
        let (mut step, _) = step(true);
        let mut f = filter(&["names"]);
        f.override_method_options("names", json!({"sort": ["name"]}).as_object().cloned().unwrap())
            .unwrap();
        step.attach_filter(f);

        let results = step.process().await.unwrap();
        assert_eq!(results["names"].table().unwrap().cell_text(0, "name").as_deref(), Some("x-a"));
    }

    #[tokio::test]
    async fn test_unreachable_provider_yields_not_found() {
        let (mut step, _) = step(false);
        step.attach_filter(filter(&["names", "nothing"]));

        let results = step.process().await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.values().all(|r| !r.is_found()));
        assert_eq!(step.last_status(), Some(ProviderStatus::UNREACHABLE));
        assert_eq!(step.get_status().await, ProviderStatus::UNREACHABLE);
    }

    #[tokio::test]
    async fn test_process_with_leaves_attached_filter() {
        let (mut step, _) = step(true);
        let attached = FilterDescriptor::create([MethodSelection::new("names")], "fake");
        step.attach_filter(attached.clone());

        step.process_with(&filter(&["names"])).await.unwrap();
        assert_eq!(step.current_filter(), Some(&attached));
    }

    #[tokio::test]
    async fn test_missing_search_input_is_an_error() {
        let (mut step, provider) = step(true);
        step.attach_filter(FilterDescriptor::create([MethodSelection::new("names")], "fake"));
        assert!(step.process().await.is_err());
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_process_interchange() {
        let (mut step, _) = step(true);
        let text = filter(&["names"]).to_interchange().unwrap();
        let results = step.process_interchange(&text).await.unwrap();
        assert!(results["names"].is_found());
        assert!(step.current_filter().is_some());
    }
}
