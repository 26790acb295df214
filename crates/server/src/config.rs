//! Pipeline configuration.
//!
//! Every collaborator has a client-level config with sensible defaults;
//! `PipelineConfig::from_env` overlays environment variables on top:
//!
//! | Variable              | Overrides                                 |
//! |-----------------------|-------------------------------------------|
//! | `VISION_SERVICE_URL`  | labeling service base URL                 |
//! | `RECIPE_CATALOG_URL`  | recipe catalog base URL                   |
//! | `PROFILE_STORE_URL`   | profile store REST root                   |
//! | `PROFILE_PROJECT_ID`  | profile store project                     |
//! | `PHOTO_STORE_URL`     | photo store REST root                     |
//! | `PHOTO_PROJECT_ID`    | photo store project                       |
//! | `STORE_API_KEY`       | API key for both stores                   |
//! | `HTTP_TIMEOUT_SECS`   | timeout for every HTTP collaborator       |
//! | `INGREDIENT_POLICY`   | `positional` or `highest-confidence`      |
//! | `INGREDIENT_ORDINAL`  | label position for the positional policy  |

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use catalog_client::CatalogConfig;
use pipeline::PolicyKind;
use sources::DocumentStoreConfig;
use tracing::info;
use vision_client::VisionConfig;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub vision: VisionConfig,
    pub catalog: CatalogConfig,
    pub profiles: DocumentStoreConfig,
    pub photos: DocumentStoreConfig,
    pub policy: PolicyKind,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            vision: VisionConfig::default(),
            catalog: CatalogConfig::default(),
            profiles: DocumentStoreConfig::profiles("recipe-profiles"),
            photos: DocumentStoreConfig::photos("recipe-board"),
            policy: PolicyKind::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        info!("Loading pipeline configuration from environment variables");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key/value source (the environment in
    /// production, a map in tests)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("VISION_SERVICE_URL") {
            config.vision.base_url = url;
        }
        if let Some(url) = lookup("RECIPE_CATALOG_URL") {
            config.catalog.base_url = url;
        }
        if let Some(url) = lookup("PROFILE_STORE_URL") {
            config.profiles.base_url = url;
        }
        if let Some(project) = lookup("PROFILE_PROJECT_ID") {
            config.profiles.project_id = project;
        }
        if let Some(url) = lookup("PHOTO_STORE_URL") {
            config.photos.base_url = url;
        }
        if let Some(project) = lookup("PHOTO_PROJECT_ID") {
            config.photos.project_id = project;
        }
        if let Some(key) = lookup("STORE_API_KEY") {
            config.profiles.api_key = Some(key.clone());
            config.photos.api_key = Some(key);
        }

        if let Some(secs) = lookup("HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .context("Invalid HTTP_TIMEOUT_SECS value")?;
            config.set_timeout(Duration::from_secs(secs));
        }

        if let Some(policy) = lookup("INGREDIENT_POLICY") {
            config.set_policy(policy.parse().context("Invalid INGREDIENT_POLICY value")?);
        }
        if let Some(ordinal) = lookup("INGREDIENT_ORDINAL") {
            let ordinal: usize = ordinal
                .trim()
                .parse()
                .context("Invalid INGREDIENT_ORDINAL value")?;
            config.set_ordinal(ordinal);
        }

        Ok(config)
    }

    /// Apply one timeout to every HTTP collaborator
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.vision.timeout = timeout;
        self.catalog.timeout = timeout;
        self.profiles.timeout = timeout;
        self.photos.timeout = timeout;
    }

    /// Switch policy kind, keeping an already configured positional ordinal
    /// when the kind stays positional
    pub fn set_policy(&mut self, policy: PolicyKind) {
        match (&self.policy, policy) {
            (PolicyKind::Positional { .. }, PolicyKind::Positional { .. }) => {}
            _ => self.policy = policy,
        }
    }

    /// Set the positional ordinal; has no effect on other policies
    pub fn set_ordinal(&mut self, ordinal: usize) {
        if let PolicyKind::Positional { ordinal: current } = &mut self.policy {
            *current = ordinal;
        }
    }
}
