//! Report tree and the static configuration that shapes it

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::table::TableResult;

/// Declared report section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub id: String,
    pub title: String,
}

impl CategoryDef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Sections of a report and human titles for content items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub categories: Vec<CategoryDef>,
    /// `step.method` or `method` to content title
    #[serde(default)]
    pub titles: IndexMap<String, String>,
}

/// `step.method` or `method` to category id
pub type MethodCategoryMapping = IndexMap<String, String>;

/// `step.method` or `method` to the column its table is grouped by
pub type GroupingConfig = IndexMap<String, String>;

/// Everything the formatter needs besides the triples
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLayout {
    pub category_config: CategoryConfig,
    pub method_category_mapping: MethodCategoryMapping,
    pub grouping_config: GroupingConfig,
}

/// Look up a `step.method` key, then the bare method
pub(crate) fn lookup<'a>(
    map: &'a IndexMap<String, String>,
    step: &str,
    method: &str,
) -> Option<&'a String> {
    map.get(&format!("{step}.{method}")).or_else(|| map.get(method))
}

/// Payload of a content item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Payload {
    /// Flattened table, or the no-data sentinel
    Data(TableResult),
    /// Nested grouping
    Content(Vec<ContentItem>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    pub content: Vec<ContentItem>,
}

/// Final report of one workflow run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub search_term: String,
    /// RFC 3339 generation time
    pub date: String,
    pub categories: Vec<Category>,
    /// Steps skipped during the run
    pub warnings: Vec<String>,
}

impl Report {
    pub fn new(
        search_term: impl Into<String>,
        categories: Vec<Category>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            search_term: search_term.into(),
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            categories,
            warnings,
        }
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
