use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::DecodeError;

/// One fetched `list.json` document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    #[serde(deserialize_with = "nullable")]
    pub instances: Vec<Instance>,
    #[serde(deserialize_with = "nullable")]
    pub total_users: i64,
    #[serde(deserialize_with = "nullable")]
    pub languages: Vec<Language>,
    #[serde(deserialize_with = "nullable")]
    pub countries: Vec<Country>,
    #[serde(deserialize_with = "nullable")]
    pub prohibited_content: ProhibitedContentCatalog,
}

impl Snapshot {
    /// Parse a payload, distinguishing broken JSON from a document of the wrong shape.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn total_instances(&self) -> i64 {
        self.instances.len() as i64
    }

    pub fn total_statuses(&self) -> i64 {
        self.instances
            .iter()
            .fold(0i64, |acc, i| acc.saturating_add(i.statuses))
    }

    /// Number of instances with strictly more than `threshold` users.
    pub fn above_users(&self, threshold: i64) -> i64 {
        self.instances
            .iter()
            .filter(|i| i.users > threshold)
            .count() as i64
    }
}

/// A single server's state as observed by the upstream checker.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instance {
    #[serde(rename = "_id", deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub added_at: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub updated_at: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub checked_at: Option<String>,

    #[serde(deserialize_with = "nullable")]
    pub upchecks: i64,
    #[serde(deserialize_with = "nullable")]
    pub downchecks: i64,
    #[serde(deserialize_with = "nullable")]
    pub up: bool,
    #[serde(deserialize_with = "nullable")]
    pub dead: bool,
    #[serde(deserialize_with = "nullable")]
    pub blacklisted: bool,
    #[serde(deserialize_with = "nullable")]
    pub ipv6: bool,
    #[serde(deserialize_with = "nullable")]
    pub open_registrations: bool,

    #[serde(deserialize_with = "nullable")]
    pub users: i64,
    #[serde(deserialize_with = "nullable")]
    pub users_change_ratio: i64,
    #[serde(deserialize_with = "nullable")]
    pub statuses: i64,
    #[serde(deserialize_with = "nullable")]
    pub connections: i64,
    #[serde(deserialize_with = "nullable")]
    pub connected: i64,
    #[serde(deserialize_with = "nullable")]
    pub uptime: f64,
    #[serde(rename = "uptime_str", deserialize_with = "nullable")]
    pub uptime_str: String,

    #[serde(rename = "https_rank", deserialize_with = "nullable")]
    pub https_rank: String,
    #[serde(rename = "https_score", deserialize_with = "nullable")]
    pub https_score: i64,
    #[serde(rename = "obs_rank", deserialize_with = "nullable")]
    pub obs_rank: String,
    #[serde(rename = "obs_score", deserialize_with = "nullable")]
    pub obs_score: i64,
    #[serde(deserialize_with = "nullable")]
    pub version: String,
    #[serde(rename = "version_score", deserialize_with = "nullable")]
    pub version_score: i64,
    #[serde(deserialize_with = "nullable")]
    pub score: f64,

    #[serde(deserialize_with = "nullable")]
    pub infos: Infos,
}

/// Self-declared policy block of an instance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Infos {
    #[serde(deserialize_with = "nullable")]
    pub opt_out: bool,
    #[serde(deserialize_with = "nullable")]
    pub short_description: String,
    #[serde(deserialize_with = "nullable")]
    pub full_description: String,
    pub theme: Value,
    #[serde(deserialize_with = "nullable")]
    pub languages: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub no_other_languages: bool,
    #[serde(deserialize_with = "nullable")]
    pub prohibited_content: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub other_prohibited_content: Vec<Value>,
    #[serde(deserialize_with = "nullable")]
    pub federation: String,
    #[serde(deserialize_with = "nullable")]
    pub bots: String,
    #[serde(deserialize_with = "nullable")]
    pub brands: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Language {
    #[serde(rename = "iso639_1", deserialize_with = "nullable")]
    pub iso639_1: String,
    #[serde(rename = "iso639_3", deserialize_with = "nullable")]
    pub iso639_3: String,
    #[serde(deserialize_with = "nullable")]
    pub name: Vec<String>,
    #[serde(rename = "nativeName", deserialize_with = "nullable")]
    pub native_name: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Country {
    #[serde(rename = "code_2", deserialize_with = "nullable")]
    pub code_2: String,
    #[serde(rename = "code_3", deserialize_with = "nullable")]
    pub code_3: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub languages: Vec<String>,
}

/// Upstream's catalog of prohibited-content codes and their display names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProhibitedContentCatalog {
    #[serde(deserialize_with = "nullable")]
    pub array: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    #[serde(deserialize_with = "nullable")]
    pub code: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
}

/// Decodes `null` as the type's default instead of failing.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
