//! UniProtKB: protein sequence and functional annotation

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

use super::{array_at, at, HttpJson, MethodParser, Provider, ProviderStatus};
use crate::config::EngineConfig;
use crate::table::{MethodOptions, Table};

static ACCESSION: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^([OPQ][0-9][A-Z0-9]{3}[0-9]|[A-NR-Z][0-9]([A-Z][A-Z0-9]{2}[0-9]){1,2})$")
        .expect("accession pattern is valid")
});

static PARSERS: &[MethodParser] = &[
    MethodParser {
        id: "summary",
        description: "Accession, names, organism and sequence length",
        parse: parse_summary,
    },
    MethodParser {
        id: "function",
        description: "Curated function statements",
        parse: parse_function,
    },
    MethodParser {
        id: "subcellular_location",
        description: "Subcellular locations and topology",
        parse: parse_subcellular_location,
    },
    MethodParser {
        id: "keywords",
        description: "UniProt keywords by category",
        parse: parse_keywords,
    },
    MethodParser {
        id: "diseases",
        description: "Disease associations",
        parse: parse_diseases,
    },
];

/// UniProtKB REST provider
///
/// Gene symbols are resolved to the reviewed entry of the configured species;
/// inputs shaped like an accession are fetched directly.
#[derive(Debug, Clone)]
pub struct UniProtProvider {
    http: HttpJson,
    base_url: String,
    species: u32,
}

impl UniProtProvider {
    pub fn new(http: HttpJson, config: &EngineConfig) -> Self {
        Self {
            http,
            base_url: config.uniprot_base_url.clone(),
            species: config.species,
        }
    }

    pub fn is_accession(id: &str) -> bool {
        ACCESSION.is_match(id)
    }
}

#[async_trait]
impl Provider for UniProtProvider {
    fn name(&self) -> &str {
        "uniprot"
    }

    async fn ping(&self) -> ProviderStatus {
        self.http
            .ping(&format!("{}/uniprotkb/search?query=P00533&size=1", self.base_url))
            .await
    }

    async fn fetch(&self, id: &str) -> Result<Value> {
        let id = id.trim();
        if Self::is_accession(id) {
            let entry = self
                .http
                .get_json(&format!("{}/uniprotkb/{}.json", self.base_url, id), &[])
                .await?;
            return Ok(json!({ "results": [entry] }));
        }

        let query = format!(
            "(gene_exact:{}) AND (organism_id:{}) AND (reviewed:true)",
            id, self.species
        );
        self.http
            .get_json(
                &format!("{}/uniprotkb/search", self.base_url),
                &[
                    ("query", query),
                    ("format", "json".to_string()),
                    ("size", "1".to_string()),
                ],
            )
            .await
    }

    fn parsers(&self) -> &'static [MethodParser] {
        PARSERS
    }
}

fn comments<'a>(entry: &'a Value, kind: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    array_at(entry, "/comments")
        .iter()
        .filter(move |c| c.get("commentType").and_then(Value::as_str) == Some(kind))
}

fn parse_summary(raw: &Value, options: &MethodOptions) -> Result<Table> {
    let mut table = Table::new([
        "accession",
        "entry_name",
        "protein_name",
        "gene",
        "organism",
        "length",
    ]);

    for entry in array_at(raw, "/results") {
        let mut protein_name = at(entry, "/proteinDescription/recommendedName/fullName/value");
        if protein_name.is_null() {
            protein_name = at(entry, "/proteinDescription/submissionNames/0/fullName/value");
        }
        table.push_row(vec![
            at(entry, "/primaryAccession"),
            at(entry, "/uniProtkbId"),
            protein_name,
            at(entry, "/genes/0/geneName/value"),
            at(entry, "/organism/scientificName"),
            at(entry, "/sequence/length"),
        ]);
    }

    Ok(table.apply_options(options))
}

fn parse_function(raw: &Value, options: &MethodOptions) -> Result<Table> {
    let mut table = Table::new(["accession", "function"]);

    for entry in array_at(raw, "/results") {
        for comment in comments(entry, "FUNCTION") {
            for text in array_at(comment, "/texts") {
                table.push_row(vec![at(entry, "/primaryAccession"), at(text, "/value")]);
            }
        }
    }

    Ok(table.apply_options(options))
}

fn parse_subcellular_location(raw: &Value, options: &MethodOptions) -> Result<Table> {
    let mut table = Table::new(["accession", "location", "topology"]);

    for entry in array_at(raw, "/results") {
        for comment in comments(entry, "SUBCELLULAR LOCATION") {
            for location in array_at(comment, "/subcellularLocations") {
                table.push_row(vec![
                    at(entry, "/primaryAccession"),
                    at(location, "/location/value"),
                    at(location, "/topology/value"),
                ]);
            }
        }
    }

    Ok(table.apply_options(options))
}

fn parse_keywords(raw: &Value, options: &MethodOptions) -> Result<Table> {
    let mut table = Table::new(["accession", "category", "keyword"]);

    for entry in array_at(raw, "/results") {
        for keyword in array_at(entry, "/keywords") {
            table.push_row(vec![
                at(entry, "/primaryAccession"),
                at(keyword, "/category"),
                at(keyword, "/name"),
            ]);
        }
    }

    Ok(table.apply_options(options))
}

fn parse_diseases(raw: &Value, options: &MethodOptions) -> Result<Table> {
    let mut table = Table::new(["accession", "disease", "acronym", "description"]);

    for entry in array_at(raw, "/results") {
        for comment in comments(entry, "DISEASE") {
            table.push_row(vec![
                at(entry, "/primaryAccession"),
                at(comment, "/disease/diseaseId"),
                at(comment, "/disease/acronym"),
                at(comment, "/disease/description"),
            ]);
        }
    }

    Ok(table.apply_options(options))
}
