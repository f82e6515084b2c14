//! Shared test doubles for engine integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use dossier_engine::provider::{MethodParser, Provider, ProviderStatus};
use dossier_engine::step::WorkflowStep;
use dossier_engine::table::{MethodOptions, Table};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

fn parse_rows(raw: &Value, options: &MethodOptions) -> anyhow::Result<Table> {
    let rows = raw["rows"].as_array().cloned().unwrap_or_default();
    Ok(Table::from_records(&rows).apply_options(options))
}

fn parse_first(raw: &Value, options: &MethodOptions) -> anyhow::Result<Table> {
    let rows = raw["rows"].as_array().cloned().unwrap_or_default();
    Ok(Table::from_records(&rows[..rows.len().min(1)]).apply_options(options))
}

fn parse_echo_options(raw: &Value, options: &MethodOptions) -> anyhow::Result<Table> {
    Ok(Table::from_records(&[json!({
        "id": raw["id"],
        "options": Value::Object(options.clone()),
    })]))
}

static PARSERS: &[MethodParser] = &[
    MethodParser {
        id: "rows",
        description: "Every scripted row",
        parse: parse_rows,
    },
    MethodParser {
        id: "first",
        description: "First scripted row",
        parse: parse_first,
    },
    MethodParser {
        id: "echo_options",
        description: "The options the parse routine received",
        parse: parse_echo_options,
    },
];

/// In-memory provider answering from a script and logging every fetch
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    name: String,
    rows: Arc<HashMap<String, Vec<Value>>>,
    failing: Arc<HashSet<String>>,
    down: bool,
    fetches: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Rows returned when fetching `id`; ids without a script yield no rows
    pub fn with_rows(mut self, id: &str, rows: Value) -> Self {
        let mut map = (*self.rows).clone();
        map.insert(id.to_string(), rows.as_array().cloned().unwrap_or_default());
        self.rows = Arc::new(map);
        self
    }

    /// Fetching `id` fails as if the connection dropped
    pub fn failing_on(mut self, id: &str) -> Self {
        let mut set = (*self.failing).clone();
        set.insert(id.to_string());
        self.failing = Arc::new(set);
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.down = true;
        self
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn step(&self, name: &str) -> WorkflowStep {
        WorkflowStep::new(name, format!("{name} test step"), Arc::new(self.clone()))
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ping(&self) -> ProviderStatus {
        if self.down {
            ProviderStatus::UNREACHABLE
        } else {
            ProviderStatus::OK
        }
    }

    async fn fetch(&self, id: &str) -> anyhow::Result<Value> {
        self.fetches.lock().unwrap().push(id.to_string());
        anyhow::ensure!(!self.down, "{} is unreachable", self.name);
        anyhow::ensure!(!self.failing.contains(id), "connection reset fetching {}", id);
        let rows = self.rows.get(id).cloned().unwrap_or_default();
        Ok(json!({"id": id, "rows": rows}))
    }

    fn parsers(&self) -> &'static [MethodParser] {
        PARSERS
    }
}

pub fn options(value: Value) -> MethodOptions {
    value.as_object().cloned().expect("options must be an object")
}
