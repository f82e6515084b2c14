//! ChEMBL: targets, mechanisms of action and molecules

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{array_at, at, HttpJson, MethodParser, Provider, ProviderStatus};
use crate::config::EngineConfig;
use crate::table::{MethodOptions, Table};

/// Default organism filter for target searches
pub const DEFAULT_TARGET_ORGANISM: &str = "Homo sapiens";

static TARGET_PARSERS: &[MethodParser] = &[MethodParser {
    id: "targets",
    description: "Targets matching the query (option `organism`, \"any\" to disable)",
    parse: parse_targets,
}];

static MECHANISM_PARSERS: &[MethodParser] = &[MethodParser {
    id: "mechanisms",
    description: "Drug mechanisms of action recorded against a target",
    parse: parse_mechanisms,
}];

static MOLECULE_PARSERS: &[MethodParser] = &[MethodParser {
    id: "molecule",
    description: "Name, development phase and type of a molecule",
    parse: parse_molecule,
}];

/// The ChEMBL resource a provider instance reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChemblResource {
    /// Free-text target search
    TargetSearch,
    /// Mechanisms by target ChEMBL id
    Mechanism,
    /// Molecule by molecule ChEMBL id
    Molecule,
}

/// ChEMBL web services provider, one instance per resource
#[derive(Debug, Clone)]
pub struct ChemblProvider {
    http: HttpJson,
    base_url: String,
    resource: ChemblResource,
}

impl ChemblProvider {
    pub fn new(http: HttpJson, config: &EngineConfig, resource: ChemblResource) -> Self {
        Self {
            http,
            base_url: config.chembl_base_url.clone(),
            resource,
        }
    }
}

#[async_trait]
impl Provider for ChemblProvider {
    fn name(&self) -> &str {
        match self.resource {
            ChemblResource::TargetSearch => "chembl_target",
            ChemblResource::Mechanism => "chembl_mechanism",
            ChemblResource::Molecule => "chembl_molecule",
        }
    }

    async fn ping(&self) -> ProviderStatus {
        self.http.ping(&format!("{}/status.json", self.base_url)).await
    }

    async fn fetch(&self, id: &str) -> Result<Value> {
        let id = id.trim();
        match self.resource {
            ChemblResource::TargetSearch => {
                self.http
                    .get_json(
                        &format!("{}/target/search.json", self.base_url),
                        &[("q", id.to_string()), ("limit", "50".to_string())],
                    )
                    .await
            }
            ChemblResource::Mechanism => {
                self.http
                    .get_json(
                        &format!("{}/mechanism.json", self.base_url),
                        &[
                            ("target_chembl_id", id.to_string()),
                            ("limit", "200".to_string()),
                        ],
                    )
                    .await
            }
            ChemblResource::Molecule => {
                self.http
                    .get_json(&format!("{}/molecule/{}.json", self.base_url, id), &[])
                    .await
            }
        }
    }

    fn parsers(&self) -> &'static [MethodParser] {
        match self.resource {
            ChemblResource::TargetSearch => TARGET_PARSERS,
            ChemblResource::Mechanism => MECHANISM_PARSERS,
            ChemblResource::Molecule => MOLECULE_PARSERS,
        }
    }
}

fn parse_targets(raw: &Value, options: &MethodOptions) -> Result<Table> {
    let organism = options
        .get("organism")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_TARGET_ORGANISM);
    let any_organism = organism.is_empty() || organism.eq_ignore_ascii_case("any");

    let mut table = Table::new(["target_chembl_id", "pref_name", "organism", "target_type"]);

    for target in array_at(raw, "/targets") {
        let target_organism = target.get("organism").and_then(Value::as_str).unwrap_or("");
        if !any_organism && !target_organism.eq_ignore_ascii_case(organism) {
            continue;
        }
        table.push_row(vec![
            at(target, "/target_chembl_id"),
            at(target, "/pref_name"),
            at(target, "/organism"),
            at(target, "/target_type"),
        ]);
    }

    Ok(table.apply_options(options))
}

fn parse_mechanisms(raw: &Value, options: &MethodOptions) -> Result<Table> {
    let mut table = Table::new([
        "molecule_chembl_id",
        "mechanism_of_action",
        "action_type",
        "direct_interaction",
    ]);

    for mechanism in array_at(raw, "/mechanisms") {
        table.push_row(vec![
            at(mechanism, "/molecule_chembl_id"),
            at(mechanism, "/mechanism_of_action"),
            at(mechanism, "/action_type"),
            at(mechanism, "/direct_interaction"),
        ]);
    }

    Ok(table.apply_options(options))
}

fn parse_molecule(raw: &Value, options: &MethodOptions) -> Result<Table> {
    let mut table = Table::new([
        "molecule_chembl_id",
        "pref_name",
        "max_phase",
        "molecule_type",
        "first_approval",
    ]);

    if raw.get("molecule_chembl_id").is_some() {
        table.push_row(vec![
            at(raw, "/molecule_chembl_id"),
            at(raw, "/pref_name"),
            at(raw, "/max_phase"),
            at(raw, "/molecule_type"),
            at(raw, "/first_approval"),
        ]);
    }

    Ok(table.apply_options(options))
}
