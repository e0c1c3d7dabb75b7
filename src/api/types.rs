//! StrikeTracker API document types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Top-level section holding the back-reference to the owning scope
pub const SCOPE_SECTION: &str = "scope";

/// Top-level section holding domain bindings, never cloned across hosts
pub const HOSTNAME_SECTION: &str = "hostname";

/// Server-assigned identity field
pub const ID_FIELD: &str = "id";

/// Bearer credential presented on authenticated calls
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Account identity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub account_hash: String,
    /// Everything else the API returns, kept for display
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Routing/platform binding under a host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub id: u64,
    pub platform: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
}

/// Configured delivery endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    pub hash_code: String,
    pub name: String,
    #[serde(default)]
    pub services: Vec<Value>,
    #[serde(default)]
    pub scopes: Vec<Scope>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body for host creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostSpec {
    pub name: String,
    pub services: Vec<Value>,
}

impl HostSpec {
    /// Spec for a copy of `host`: same services, name suffixed with " (copy)"
    pub fn copy_of(host: &Host) -> Self {
        Self {
            name: format!("{} (copy)", host.name),
            services: host.services.clone(),
        }
    }
}

/// Body for scope creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeSpec {
    pub platform: String,
    pub path: String,
}

impl From<&Scope> for ScopeSpec {
    fn from(scope: &Scope) -> Self {
        Self {
            platform: scope.platform.clone(),
            path: scope.path.clone(),
        }
    }
}

/// One configuration section: a single object or a list of objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Section {
    List(Vec<Map<String, Value>>),
    Single(Map<String, Value>),
    /// Anything else; passed through untouched
    Other(Value),
}

impl Section {
    fn without_ids(&self) -> Self {
        match self {
            Section::List(items) => Section::List(
                items
                    .iter()
                    .map(|item| {
                        let mut item = item.clone();
                        item.remove(ID_FIELD);
                        item
                    })
                    .collect(),
            ),
            Section::Single(obj) => {
                let mut obj = obj.clone();
                obj.remove(ID_FIELD);
                Section::Single(obj)
            }
            Section::Other(value) => Section::Other(value.clone()),
        }
    }
}

/// Host configuration for one scope, keyed by section name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    sections: BTreeMap<String, Section>,
}

impl Configuration {
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(|k| k.as_str())
    }

    /// Copy with identity removed so it can be published to another host:
    /// drops the `scope` and `hostname` sections and every nested `id`.
    pub fn strip_identity(&self) -> Self {
        let sections = self
            .sections
            .iter()
            .filter(|(name, _)| name.as_str() != SCOPE_SECTION && name.as_str() != HOSTNAME_SECTION)
            .map(|(name, section)| (name.clone(), section.without_ids()))
            .collect();
        Self { sections }
    }
}

/// Batch-wide purge options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeFlags {
    pub purge_all_dynamic: bool,
    pub recursive: bool,
    pub invalidate_only: bool,
}

/// One entry of a purge batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeRequest {
    pub url: String,
    #[serde(default)]
    pub purge_all_dynamic: bool,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub invalidate_only: bool,
}

impl PurgeRequest {
    pub fn new(url: impl Into<String>, flags: PurgeFlags) -> Self {
        Self {
            url: url.into(),
            purge_all_dynamic: flags.purge_all_dynamic,
            recursive: flags.recursive,
            invalidate_only: flags.invalidate_only,
        }
    }
}
