//! Daily-record store.
//!
//! All mutating operations are remote calls against the persistence
//! endpoints, each followed by a cache refresh from the remote source of
//! truth. The local date-keyed mapping is only a cache; a warm-start copy
//! lives at ~/.reviewkit/daily_records.json. No automatic retries: failures
//! surface to the caller.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{Error, Result};
use crate::trackers::ensure_success;
use crate::types::DailyRecordEntry;
use crate::util::{is_valid_date, is_valid_year_month};

/// One remote row: the server-assigned id (used by the delete endpoint)
/// plus the entry content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub content: String,
}

/// Remote persistence operations the store runs on. Implemented by
/// `RecordsClient` for HTTP; tests swap in an in-memory implementation.
#[async_trait]
pub trait RecordsApi: Send + Sync {
    async fn create(&self, name: &str, records: &[DailyRecordEntry]) -> Result<()>;
    async fn fetch(&self, name: &str) -> Result<BTreeMap<String, StoredRecord>>;
    async fn delete(&self, id: i64) -> Result<()>;
    async fn clear(&self, year_month: &str, user_name: &str) -> Result<()>;
}

// =============================================================================
// HTTP client
// =============================================================================

pub struct RecordsClient {
    http: reqwest::Client,
    base_url: String,
}

impl RecordsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePayload<'a> {
    name: &'a str,
    daily_records: &'a [DailyRecordEntry],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClearPayload<'a> {
    year_month: &'a str,
    user_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    #[serde(default)]
    data: BTreeMap<String, StoredRecord>,
}

#[async_trait]
impl RecordsApi for RecordsClient {
    async fn create(&self, name: &str, records: &[DailyRecordEntry]) -> Result<()> {
        let response = self
            .http
            .post(self.url("createdaily"))
            .json(&CreatePayload {
                name,
                daily_records: records,
            })
            .send()
            .await?;
        ensure_success(&response, "record create")
    }

    async fn fetch(&self, name: &str) -> Result<BTreeMap<String, StoredRecord>> {
        let response = self
            .http
            .get(self.url("getdaily"))
            .query(&[("name", name)])
            .send()
            .await?;
        ensure_success(&response, "record fetch")?;
        let body: FetchResponse = response.json().await?;
        Ok(body.data)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let response = self
            .http
            .delete(self.url("deletedaily"))
            .query(&[("id", id.to_string())])
            .send()
            .await?;
        ensure_success(&response, "record delete")
    }

    async fn clear(&self, year_month: &str, user_name: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("cleardaily"))
            .json(&ClearPayload {
                year_month,
                user_name,
            })
            .send()
            .await?;
        ensure_success(&response, "record clear")
    }
}

// =============================================================================
// Store
// =============================================================================

pub struct DailyRecordStore {
    owner: String,
    api: Box<dyn RecordsApi>,
    records: BTreeMap<String, StoredRecord>,
    cache_path: Option<PathBuf>,
}

impl DailyRecordStore {
    pub fn new(owner: impl Into<String>, api: Box<dyn RecordsApi>) -> Self {
        Self {
            owner: owner.into(),
            api,
            records: BTreeMap::new(),
            cache_path: None,
        }
    }

    /// Prime the cache from a warm-start file. A missing or unreadable
    /// cache is not an error; the remote store is authoritative.
    pub fn with_warm_cache(
        owner: impl Into<String>,
        api: Box<dyn RecordsApi>,
        cache_path: impl Into<PathBuf>,
    ) -> Self {
        let cache_path = cache_path.into();
        let records = load_cache(&cache_path).unwrap_or_default();
        Self {
            owner: owner.into(),
            api,
            records,
            cache_path: Some(cache_path),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Upsert the entry for `date`. Empty content removes an existing entry
    /// (equivalent to `remove`) and is a no-op when nothing is stored.
    pub async fn add(&mut self, date: &str, content: &str) -> Result<()> {
        if !is_valid_date(date) {
            return Err(Error::Validation(format!(
                "record date must be a valid YYYY-MM-DD date, got '{}'",
                date
            )));
        }
        if content.trim().is_empty() {
            if self.records.contains_key(date) {
                return self.remove(date).await;
            }
            return Ok(());
        }

        let entry = DailyRecordEntry::new(date, content);
        self.api.create(&self.owner, std::slice::from_ref(&entry)).await?;
        self.refresh().await
    }

    /// Delete the entry for `date`; a no-op (not an error) when absent.
    pub async fn remove(&mut self, date: &str) -> Result<()> {
        let Some(record) = self.records.get(date) else {
            return Ok(());
        };
        match record.id {
            Some(id) => self.api.delete(id).await?,
            // Never synced with an id; nothing addressable remotely.
            None => log::warn!("Record for {} has no remote id; dropping locally", date),
        }
        self.refresh().await
    }

    /// Entries currently cached, in no guaranteed report order.
    pub fn list(&self) -> Vec<DailyRecordEntry> {
        self.records
            .iter()
            .map(|(date, record)| DailyRecordEntry::new(date.clone(), record.content.clone()))
            .collect()
    }

    /// Date-keyed content view, for seeding state snapshots.
    pub fn as_map(&self) -> BTreeMap<String, String> {
        self.records
            .iter()
            .map(|(date, record)| (date.clone(), record.content.clone()))
            .collect()
    }

    /// Bulk delete of every entry in `year_month` (`YYYY-MM`) for this
    /// store's owner, then refresh from remote.
    pub async fn clear_range(&mut self, year_month: &str) -> Result<()> {
        if !is_valid_year_month(year_month) {
            return Err(Error::Validation(format!(
                "clear range expects YYYY-MM, got '{}'",
                year_month
            )));
        }
        self.api.clear(year_month, &self.owner).await?;
        self.refresh().await
    }

    /// Replace the cache wholesale with the remote state and persist the
    /// warm-start copy. Replacement is atomic, so a late-arriving refresh
    /// can only produce a complete older or newer view, never a blend.
    pub async fn refresh(&mut self) -> Result<()> {
        self.records = self.api.fetch(&self.owner).await?;
        self.persist_cache();
        Ok(())
    }

    fn persist_cache(&self) {
        let Some(path) = &self.cache_path else {
            return;
        };
        match serde_json::to_string_pretty(&self.records) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    log::warn!("Failed to write records cache: {}", e);
                }
            }
            Err(e) => log::warn!("Failed to serialize records cache: {}", e),
        }
    }
}

/// Default warm-cache location (~/.reviewkit/daily_records.json).
pub fn default_cache_path() -> Result<PathBuf> {
    Ok(config::app_dir()?.join("daily_records.json"))
}

fn load_cache(path: &Path) -> Option<BTreeMap<String, StoredRecord>> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}
