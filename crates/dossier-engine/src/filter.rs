//! Filter descriptors: which methods a step runs, with which options, on which input
//!
//! The interchange form is a one-element JSON list:
//!
//! ```json
//! [{
//!   "PROCESSOR": "uniprot",
//!   "CLIENT_SEARCH_PARAMS": [{"search_id": "EGFR"}],
//!   "METODOS_PARSER": [
//!     {"NOMBRE_METODO": "summary", "FILTROS_METODO_PARSER": {}}
//!   ]
//! }]
//! ```

use dossier_common::{DossierError, Result};
use serde::{Deserialize, Serialize};

use crate::table::MethodOptions;

/// One enabled method and its options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSelection {
    #[serde(rename = "NOMBRE_METODO")]
    pub method_id: String,
    #[serde(rename = "FILTROS_METODO_PARSER", default)]
    pub method_options: MethodOptions,
}

impl MethodSelection {
    pub fn new(method_id: impl Into<String>) -> Self {
        Self {
            method_id: method_id.into(),
            method_options: MethodOptions::new(),
        }
    }

    /// Attach options given as a JSON object; non-object values are ignored
    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = options {
            self.method_options = map;
        }
        self
    }
}

/// A resolved input value for a step's fetch call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBinding {
    pub search_id: String,
}

/// Method selection plus resolved search input for one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    #[serde(rename = "PROCESSOR")]
    processor_id: String,
    #[serde(rename = "CLIENT_SEARCH_PARAMS", default)]
    search_params: Vec<SearchBinding>,
    #[serde(rename = "METODOS_PARSER", default)]
    methods: Vec<MethodSelection>,
}

impl FilterDescriptor {
    /// Build a descriptor whose methods are exactly `minimum_methods`, in order
    pub fn create<I>(minimum_methods: I, processor_id: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = MethodSelection>,
    {
        Self {
            processor_id: processor_id.into(),
            search_params: Vec::new(),
            methods: minimum_methods.into_iter().collect(),
        }
    }

    pub fn processor_id(&self) -> &str {
        &self.processor_id
    }

    pub fn methods(&self) -> &[MethodSelection] {
        &self.methods
    }

    pub fn search_params(&self) -> &[SearchBinding] {
        &self.search_params
    }

    /// The first bound search value, if any
    pub fn search_param(&self) -> Option<&str> {
        self.search_params.first().map(|b| b.search_id.as_str())
    }

    /// Replace the search input with a single binding
    pub fn set_search_param(&mut self, value: impl Into<String>) {
        self.search_params = vec![SearchBinding {
            search_id: value.into(),
        }];
    }

    pub fn clear_search_params(&mut self) {
        self.search_params.clear();
    }

    pub fn has_method(&self, method_id: &str) -> bool {
        self.methods.iter().any(|m| m.method_id == method_id)
    }

    /// Replace the options of an enabled method.
    ///
    /// Fails with `MethodNotFound` when the method is not in the list; the
    /// list itself is never modified by this call.
    pub fn override_method_options(
        &mut self,
        method_id: &str,
        options: MethodOptions,
    ) -> Result<()> {
        match self.methods.iter_mut().find(|m| m.method_id == method_id) {
            Some(selection) => {
                selection.method_options = options;
                Ok(())
            }
            None => Err(DossierError::MethodNotFound {
                step: self.processor_id.clone(),
                method: method_id.to_string(),
            }),
        }
    }

    /// Current options of a method, or an empty mapping when it is not enabled
    pub fn get_method_options(&self, method_id: &str) -> MethodOptions {
        self.methods
            .iter()
            .find(|m| m.method_id == method_id)
            .map(|m| m.method_options.clone())
            .unwrap_or_default()
    }

    /// Enable a method at the end of the list, or replace its options if already enabled
    pub fn enable_method(&mut self, selection: MethodSelection) {
        match self.methods.iter_mut().find(|m| m.method_id == selection.method_id) {
            Some(existing) => existing.method_options = selection.method_options,
            None => self.methods.push(selection),
        }
    }

    /// A copy that runs only `method_id`, keeping its current options
    pub fn restricted_to(&self, method_id: &str) -> FilterDescriptor {
        FilterDescriptor {
            processor_id: self.processor_id.clone(),
            search_params: self.search_params.clone(),
            methods: vec![MethodSelection {
                method_id: method_id.to_string(),
                method_options: self.get_method_options(method_id),
            }],
        }
    }

    /// Serialize to the interchange text form
    pub fn to_interchange(&self) -> Result<String> {
        Ok(serde_json::to_string(&[self])?)
    }

    /// Rebuild a descriptor from its interchange text form
    pub fn from_interchange(text: &str) -> Result<Self> {
        let mut list: Vec<FilterDescriptor> = serde_json::from_str(text)
            .map_err(|e| DossierError::InvalidFilter(e.to_string()))?;

        match list.len() {
            1 => Ok(list.remove(0)),
            n => Err(DossierError::InvalidFilter(format!(
                "expected exactly one descriptor, found {n}"
            ))),
        }
    }
}
