//! STRING: protein-protein interaction partners

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::{at, HttpJson, MethodParser, Provider, ProviderStatus};
use crate::config::EngineConfig;
use crate::table::{MethodOptions, Table};

static PARSERS: &[MethodParser] = &[
    MethodParser {
        id: "interaction_partners",
        description: "Interaction partners with combined and per-channel scores",
        parse: parse_interaction_partners,
    },
    MethodParser {
        id: "network_summary",
        description: "Partner count and score statistics",
        parse: parse_network_summary,
    },
];

/// STRING API provider
#[derive(Debug, Clone)]
pub struct StringProvider {
    http: HttpJson,
    base_url: String,
    species: u32,
}

impl StringProvider {
    pub fn new(http: HttpJson, config: &EngineConfig) -> Self {
        Self {
            http,
            base_url: config.string_base_url.clone(),
            species: config.species,
        }
    }
}

#[async_trait]
impl Provider for StringProvider {
    fn name(&self) -> &str {
        "string"
    }

    async fn ping(&self) -> ProviderStatus {
        self.http.ping(&format!("{}/json/version", self.base_url)).await
    }

    async fn fetch(&self, id: &str) -> Result<Value> {
        self.http
            .get_json(
                &format!("{}/json/interaction_partners", self.base_url),
                &[
                    ("identifiers", id.trim().to_string()),
                    ("species", self.species.to_string()),
                ],
            )
            .await
    }

    fn parsers(&self) -> &'static [MethodParser] {
        PARSERS
    }
}

fn records(raw: &Value) -> &[Value] {
    raw.as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn score(record: &Value) -> f64 {
    record.get("score").and_then(Value::as_f64).unwrap_or(0.0)
}

/// Options: `min_score` (0..1) drops weaker partners before the common options apply.
fn parse_interaction_partners(raw: &Value, options: &MethodOptions) -> Result<Table> {
    let min_score = options.get("min_score").and_then(Value::as_f64).unwrap_or(0.0);

    let mut table = Table::new([
        "partner",
        "string_id",
        "score",
        "experimental",
        "database",
        "textmining",
    ]);

    for record in records(raw).iter().filter(|r| score(r) >= min_score) {
        table.push_row(vec![
            at(record, "/preferredName_B"),
            at(record, "/stringId_B"),
            at(record, "/score"),
            at(record, "/escore"),
            at(record, "/dscore"),
            at(record, "/tscore"),
        ]);
    }

    Ok(table.apply_options(options))
}

fn parse_network_summary(raw: &Value, options: &MethodOptions) -> Result<Table> {
    let partners = records(raw);
    let mut table = Table::new(["query", "partners", "mean_score", "max_score"]);

    if partners.is_empty() {
        return Ok(table);
    }

    let scores: Vec<f64> = partners.iter().map(score).collect();
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let max = scores.iter().cloned().fold(f64::MIN, f64::max);

    table.push_row(vec![
        at(&partners[0], "/preferredName_A"),
        json!(partners.len()),
        json!((mean * 1000.0).round() / 1000.0),
        json!(max),
    ]);

    Ok(table.apply_options(options))
}
