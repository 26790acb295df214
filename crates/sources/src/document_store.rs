//! Repositories backed by a hosted document database over REST.
//!
//! Documents use the typed-value encoding of the hosted store:
//! ```text
//! { "name": ".../documents/users/uid-1",
//!   "fields": { "nickname": { "stringValue": "chef" } } }
//! ```
//! Profiles are fetched by document id; photos are found with a structured
//! query filtering on the `nickname` field.
//!
//! The profile store and the photo store each get their own config, so they
//! can point at two different projects.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, instrument};

use domain::{IngredientPhotoRecord, PipelineError, Result, UserProfile};

use crate::traits::{IngredientPhotoRepository, ProfileRepository};

/// Connection settings for one collection in one project
#[derive(Debug, Clone)]
pub struct DocumentStoreConfig {
    /// REST root of the document service
    pub base_url: String,
    /// Project that owns the database
    pub project_id: String,
    /// Collection holding the documents
    pub collection: String,
    /// Optional API key sent as the `key` query parameter
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl DocumentStoreConfig {
    /// Defaults for the profile collection (`users`)
    pub fn profiles(project_id: impl Into<String>) -> Self {
        Self {
            base_url: "https://firestore.googleapis.com/v1".to_owned(),
            project_id: project_id.into(),
            collection: "users".to_owned(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Defaults for the ingredient-photo collection (`fridge`)
    pub fn photos(project_id: impl Into<String>) -> Self {
        Self {
            collection: "fridge".to_owned(),
            ..Self::profiles(project_id)
        }
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url.trim_end_matches('/'),
            self.project_id
        )
    }
}

/// A single typed field value; only strings are read here
#[derive(Debug, Deserialize)]
struct FieldValue {
    #[serde(rename = "stringValue")]
    string_value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: HashMap<String, FieldValue>,
}

impl Document {
    fn string_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key)?.string_value.as_deref()
    }

    /// Document id is the last segment of its resource name
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    document: Option<Document>,
}

fn build_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_default()
}

fn with_key(request: RequestBuilder, api_key: &Option<String>) -> RequestBuilder {
    match api_key {
        Some(key) => request.query(&[("key", key)]),
        None => request,
    }
}

/// Profile documents looked up by principal id.
pub struct DocumentProfileRepository {
    config: DocumentStoreConfig,
    client: Client,
}

impl DocumentProfileRepository {
    const SERVICE: &'static str = "profile store";

    pub fn new(config: DocumentStoreConfig) -> Self {
        info!(
            "Profile store: project {} collection {}",
            config.project_id, config.collection
        );
        let client = build_client(config.timeout);
        Self { config, client }
    }
}

#[async_trait]
impl ProfileRepository for DocumentProfileRepository {
    #[instrument(skip(self))]
    async fn get_profile(&self, uid: &str) -> Result<UserProfile> {
        let url = format!(
            "{}/{}/{}",
            self.config.documents_root(),
            self.config.collection,
            uid
        );

        let response = with_key(self.client.get(&url), &self.config.api_key)
            .send()
            .await
            .map_err(|e| {
                error!("Profile lookup failed: {}", e);
                PipelineError::unavailable(Self::SERVICE, e)
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(PipelineError::not_found("profile", uid)),
            status if !status.is_success() => {
                error!("Profile store returned {}", status);
                return Err(PipelineError::unavailable(Self::SERVICE, format!("HTTP {status}")));
            }
            _ => {}
        }

        let document: Document = response.json().await.map_err(|e| {
            error!("Invalid profile document: {}", e);
            PipelineError::unavailable(Self::SERVICE, format!("invalid response: {e}"))
        })?;

        let nickname = document.string_field("nickname").unwrap_or_default();
        debug!("Fetched profile document {}", document.id());
        Ok(UserProfile::new(uid, nickname))
    }
}

/// Ingredient-photo documents queried by owner nickname.
pub struct DocumentPhotoRepository {
    config: DocumentStoreConfig,
    client: Client,
}

impl DocumentPhotoRepository {
    const SERVICE: &'static str = "photo store";

    pub fn new(config: DocumentStoreConfig) -> Self {
        info!(
            "Photo store: project {} collection {}",
            config.project_id, config.collection
        );
        let client = build_client(config.timeout);
        Self { config, client }
    }
}

#[async_trait]
impl IngredientPhotoRepository for DocumentPhotoRepository {
    #[instrument(skip(self))]
    async fn find_by_nickname(&self, nickname: &str) -> Result<Vec<IngredientPhotoRecord>> {
        let url = format!("{}:runQuery", self.config.documents_root());
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.config.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "nickname" },
                        "op": "EQUAL",
                        "value": { "stringValue": nickname }
                    }
                }
            }
        });

        let response = with_key(self.client.post(&url).json(&body), &self.config.api_key)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                error!("Photo query failed: {}", e);
                PipelineError::unavailable(Self::SERVICE, e)
            })?;

        let results: Vec<QueryResult> = response.json().await.map_err(|e| {
            error!("Invalid photo query response: {}", e);
            PipelineError::unavailable(Self::SERVICE, format!("invalid response: {e}"))
        })?;

        // An empty result set still carries one entry with only a read time
        let records: Vec<IngredientPhotoRecord> = results
            .into_iter()
            .filter_map(|result| result.document)
            .filter_map(|document| {
                let image_url = document.string_field("url")?.to_string();
                Some(IngredientPhotoRecord {
                    id: document.id().to_string(),
                    image_url,
                    owner_nickname: document
                        .string_field("nickname")
                        .unwrap_or(nickname)
                        .to_string(),
                })
            })
            .collect();

        debug!("Photo store returned {} records", records.len());
        Ok(records)
    }
}
