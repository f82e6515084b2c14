//! Engine configuration
//!
//! Provider endpoints and HTTP client settings, loaded from the environment
//! (and a `.env` file when present).

use serde::{Deserialize, Serialize};

// ============================================================================
// Provider Configuration Constants
// ============================================================================

/// Default UniProt REST base URL.
pub const DEFAULT_UNIPROT_BASE_URL: &str = "https://rest.uniprot.org";

/// Default STRING API base URL.
pub const DEFAULT_STRING_BASE_URL: &str = "https://string-db.org/api";

/// Default ChEMBL web services base URL.
pub const DEFAULT_CHEMBL_BASE_URL: &str = "https://www.ebi.ac.uk/chembl/api/data";

/// NCBI taxonomy id used for species-scoped queries (human).
pub const DEFAULT_SPECIES: u32 = 9606;

/// Default provider request timeout in seconds.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent sent to providers.
pub const DEFAULT_USER_AGENT: &str = concat!("gene-dossier/", env!("CARGO_PKG_VERSION"));

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub uniprot_base_url: String,
    pub string_base_url: String,
    pub chembl_base_url: String,
    /// Taxonomy id for UniProt and STRING queries
    pub species: u32,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            uniprot_base_url: DEFAULT_UNIPROT_BASE_URL.to_string(),
            string_base_url: DEFAULT_STRING_BASE_URL.to_string(),
            chembl_base_url: DEFAULT_CHEMBL_BASE_URL.to_string(),
            species: DEFAULT_SPECIES,
            timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment and defaults
    ///
    /// - `UNIPROT_BASE_URL`, `STRING_BASE_URL`, `CHEMBL_BASE_URL`
    /// - `DOSSIER_SPECIES` (taxonomy id, default 9606)
    /// - `PROVIDER_TIMEOUT_SECS` (default 30)
    /// - `PROVIDER_USER_AGENT`
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            uniprot_base_url: env_or("UNIPROT_BASE_URL", defaults.uniprot_base_url),
            string_base_url: env_or("STRING_BASE_URL", defaults.string_base_url),
            chembl_base_url: env_or("CHEMBL_BASE_URL", defaults.chembl_base_url),
            species: std::env::var("DOSSIER_SPECIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.species),
            timeout_secs: std::env::var("PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            user_agent: env_or("PROVIDER_USER_AGENT", defaults.user_agent),
        };

        config.validate()?;
        Ok(config)
    }

    /// Point every provider at one base URL (used with mock servers)
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            uniprot_base_url: base.clone(),
            string_base_url: base.clone(),
            chembl_base_url: base,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, url) in [
            ("UNIPROT_BASE_URL", &self.uniprot_base_url),
            ("STRING_BASE_URL", &self.string_base_url),
            ("CHEMBL_BASE_URL", &self.chembl_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("{} must be an http(s) URL, got '{}'", name, url);
            }
        }

        if self.timeout_secs == 0 {
            anyhow::bail!("Provider timeout must be greater than 0");
        }

        Ok(())
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or(default)
}
