//! External data providers
//!
//! A provider knows how to fetch one raw JSON document for an identifier and
//! exposes a fixed registry of parse routines over that document. Dispatch is
//! by method id against the registry returned from [`Provider::parsers`];
//! a method missing from the registry is skipped by the calling step.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::table::{MethodOptions, Table};

pub mod chembl;
pub mod http;
pub mod string_db;
pub mod uniprot;

pub use chembl::{ChemblProvider, ChemblResource};
pub use http::HttpJson;
pub use string_db::StringProvider;
pub use uniprot::UniProtProvider;

/// Parse routine signature: raw provider document plus method options to a table
pub type ParseFn = fn(&Value, &MethodOptions) -> anyhow::Result<Table>;

/// One entry of a provider's method registry
#[derive(Clone, Copy)]
pub struct MethodParser {
    pub id: &'static str,
    pub description: &'static str,
    pub parse: ParseFn,
}

impl std::fmt::Debug for MethodParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodParser")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Reachability code of a provider: an HTTP status, or 999 when unreachable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderStatus(pub u16);

impl ProviderStatus {
    pub const OK: ProviderStatus = ProviderStatus(200);
    pub const UNREACHABLE: ProviderStatus = ProviderStatus(999);

    pub fn is_reachable(self) -> bool {
        (200..300).contains(&self.0)
    }
}

impl std::fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fetch-and-parse contract every data source implements
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable provider name used in logs and discovery listings
    fn name(&self) -> &str;

    /// Ping the provider without fetching data
    async fn ping(&self) -> ProviderStatus;

    /// Fetch the raw document for one identifier
    async fn fetch(&self, id: &str) -> anyhow::Result<Value>;

    /// Static registry of supported methods
    fn parsers(&self) -> &'static [MethodParser];

    fn parser(&self, method_id: &str) -> Option<&'static MethodParser> {
        self.parsers().iter().find(|p| p.id == method_id)
    }
}

/// Read a JSON pointer, yielding `null` when absent
pub(crate) fn at(value: &Value, pointer: &str) -> Value {
    value.pointer(pointer).cloned().unwrap_or(Value::Null)
}

/// Read a JSON pointer as an array slice, empty when absent
pub(crate) fn array_at<'a>(value: &'a Value, pointer: &str) -> &'a [Value] {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
