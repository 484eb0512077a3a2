//! Winget identifier validation against winget.run
//!
//! Checks every `windows_winget` identifier of the catalog against the
//! winget.run API and, for packages without one, searches for candidate ids by
//! display name. The report is written as JSON:
//!
//! ```json
//! {
//!   "checkedAt": 1760000000,
//!   "valid":   [{ "pkgKey": "vlc", "wingetId": "VideoLAN.VLC" }],
//!   "invalid": [{ "pkgKey": "foo", "wingetId": "Foo.Bar" }],
//!   "missing": [{ "pkgKey": "zed", "query": "Zed", "results": [...] }]
//! }
//! ```
//!
//! Network access goes through the `WingetLookup` trait; `WingetClient` is the
//! HTTP implementation.

use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::{Result, ToolboxError};
use crate::platform::Platform;

pub const WINGET_API_BASE: &str = "https://api.winget.run/v2";

const USER_AGENT: &str = "toolbox/validate-winget";

// ============================================================================
// Types
// ============================================================================

/// A search hit from winget.run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WingetCandidate {
    pub package_identifier: Option<String>,
    pub package_name: Option<String>,
    pub publisher: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WingetCheck {
    pub pkg_key: String,
    pub winget_id: String,
}

/// A package with no winget id and the candidates found for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WingetSuggestion {
    pub pkg_key: String,
    pub query: String,
    pub results: Vec<WingetCandidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WingetReport {
    /// Seconds since the Unix epoch
    pub checked_at: u64,
    pub valid: Vec<WingetCheck>,
    pub invalid: Vec<WingetCheck>,
    pub missing: Vec<WingetSuggestion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WingetOptions {
    /// Candidates kept per missing package
    pub limit: usize,
    /// Pause between packages
    pub delay: Duration,
}

impl Default for WingetOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            delay: Duration::from_millis(100),
        }
    }
}

/// Source of winget package information.
pub trait WingetLookup {
    /// Whether `id` (`Publisher.Package`) is a known winget package.
    fn exists(&self, id: &str) -> Result<bool>;

    /// Packages matching a free-text query.
    fn search(&self, query: &str) -> Result<Vec<WingetCandidate>>;
}

// ============================================================================
// Validation
// ============================================================================

/// Check every catalog package against `lookup`, in id order.
pub fn validate_winget(
    catalog: &Catalog,
    lookup: &impl WingetLookup,
    options: &WingetOptions,
) -> Result<WingetReport> {
    let mut report = WingetReport {
        checked_at: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default(),
        ..WingetReport::default()
    };

    for entry in catalog.iter() {
        match entry.install_name(Platform::WindowsWinget) {
            Some(winget_id) => {
                let check = WingetCheck {
                    pkg_key: entry.id.clone(),
                    winget_id: winget_id.to_string(),
                };
                if lookup.exists(winget_id)? {
                    debug!("{}: {} ok", entry.id, winget_id);
                    report.valid.push(check);
                } else {
                    warn!("{}: winget id {} not found", entry.id, winget_id);
                    report.invalid.push(check);
                }
            }
            None => {
                let mut results = lookup.search(&entry.name)?;
                results.truncate(options.limit);
                report.missing.push(WingetSuggestion {
                    pkg_key: entry.id.clone(),
                    query: entry.name.clone(),
                    results,
                });
            }
        }

        if !options.delay.is_zero() {
            thread::sleep(options.delay);
        }
    }

    info!(
        "Winget check: {} valid, {} invalid, {} missing",
        report.valid.len(),
        report.invalid.len(),
        report.missing.len()
    );
    Ok(report)
}

/// Split `Publisher.Package.Name` into publisher and package name.
pub fn split_winget_id(id: &str) -> Option<(&str, &str)> {
    let (publisher, package) = id.split_once('.')?;
    if publisher.is_empty() || package.is_empty() {
        None
    } else {
        Some((publisher, package))
    }
}

/// Read search hits from either a bare array or `{ "Packages": [...] }`.
pub fn normalize_search_results(json: &Value) -> Vec<WingetCandidate> {
    let items = match json {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("Packages") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    items
        .iter()
        .map(|item| {
            let latest = item.get("Latest");
            let field = |keys: &[&str]| {
                keys.iter()
                    .find_map(|k| item.get(*k).and_then(Value::as_str))
                    .map(str::to_string)
            };
            let latest_field = |key: &str| {
                latest
                    .and_then(|l| l.get(key))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            };
            WingetCandidate {
                package_identifier: field(&["Id", "id"]),
                package_name: latest_field("Name").or_else(|| field(&["Name", "name"])),
                publisher: latest_field("Publisher").or_else(|| field(&["Publisher", "publisher"])),
            }
        })
        .collect()
}

// ============================================================================
// HTTP client
// ============================================================================

/// `WingetLookup` backed by the winget.run REST API.
pub struct WingetClient {
    client: Client,
    base: Url,
}

impl WingetClient {
    pub fn new() -> Result<Self> {
        Self::with_base(WINGET_API_BASE)
    }

    pub fn with_base(base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|e| ToolboxError::winget(format!("Invalid API base {}: {}", base, e)))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ToolboxError::winget(format!("API base {} cannot take a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl WingetLookup for WingetClient {
    fn exists(&self, id: &str) -> Result<bool> {
        let Some((publisher, package)) = split_winget_id(id) else {
            return Ok(false);
        };
        let url = self.endpoint(&["packages", publisher, package])?;
        debug!("GET {}", url);

        let status = self.client.get(url).send()?.status();
        match status {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(ToolboxError::winget(format!(
                "winget.run returned {} for {}",
                other, id
            ))),
        }
    }

    fn search(&self, query: &str) -> Result<Vec<WingetCandidate>> {
        let mut url = self.endpoint(&["packages"])?;
        url.query_pairs_mut().append_pair("query", query);
        debug!("GET {}", url);

        let response = self.client.get(url).send()?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ToolboxError::winget(format!(
                "winget.run search returned {} for {}",
                status, query
            )));
        }
        let json: Value = serde_json::from_str(&response.text()?).unwrap_or(Value::Null);
        Ok(normalize_search_results(&json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PackageCatalogEntry;
    use serde_json::json;

    struct FakeWinget {
        known: Vec<&'static str>,
    }

    impl WingetLookup for FakeWinget {
        fn exists(&self, id: &str) -> Result<bool> {
            Ok(self.known.contains(&id))
        }

        fn search(&self, query: &str) -> Result<Vec<WingetCandidate>> {
            Ok((0..10)
                .map(|n| WingetCandidate {
                    package_identifier: Some(format!("{}.Build{}", query, n)),
                    ..WingetCandidate::default()
                })
                .collect())
        }
    }

    fn test_catalog() -> Catalog {
        Catalog::from_entries([
            PackageCatalogEntry::new("vlc", "VLC", "Video", "Player")
                .with_package(Platform::WindowsWinget, "VideoLAN.VLC"),
            PackageCatalogEntry::new("foo", "Foo", "Utility", "Tools")
                .with_package(Platform::WindowsWinget, "Foo.Bar"),
            PackageCatalogEntry::new("zed", "Zed", "Development", "Editor")
                .with_package(Platform::MacosBrew, "zed"),
        ])
    }

    #[test]
    fn test_split_winget_id() {
        assert_eq!(split_winget_id("VideoLAN.VLC"), Some(("VideoLAN", "VLC")));
        assert_eq!(
            split_winget_id("Microsoft.VisualStudioCode.Insiders"),
            Some(("Microsoft", "VisualStudioCode.Insiders"))
        );
        assert_eq!(split_winget_id("NoDot"), None);
        assert_eq!(split_winget_id(".VLC"), None);
        assert_eq!(split_winget_id("VideoLAN."), None);
    }

    #[test]
    fn test_normalize_search_results_shapes() {
        let wrapped = json!({ "Packages": [
            { "Id": "VideoLAN.VLC", "Latest": { "Name": "VLC media player", "Publisher": "VideoLAN" } }
        ] });
        assert_eq!(
            normalize_search_results(&wrapped),
            vec![WingetCandidate {
                package_identifier: Some("VideoLAN.VLC".to_string()),
                package_name: Some("VLC media player".to_string()),
                publisher: Some("VideoLAN".to_string()),
            }]
        );

        let bare = json!([{ "id": "a.b", "name": "AB" }]);
        let results = normalize_search_results(&bare);
        assert_eq!(results[0].package_identifier.as_deref(), Some("a.b"));
        assert_eq!(results[0].package_name.as_deref(), Some("AB"));
        assert_eq!(results[0].publisher, None);

        assert!(normalize_search_results(&json!({ "error": "x" })).is_empty());
        assert!(normalize_search_results(&Value::Null).is_empty());
    }

    #[test]
    fn test_validate_winget_buckets() {
        let lookup = FakeWinget {
            known: vec!["VideoLAN.VLC"],
        };
        let options = WingetOptions {
            limit: 3,
            delay: Duration::ZERO,
        };
        let report = validate_winget(&test_catalog(), &lookup, &options).unwrap();

        assert_eq!(report.valid.len(), 1);
        assert_eq!(report.valid[0].winget_id, "VideoLAN.VLC");
        assert_eq!(report.invalid[0].pkg_key, "foo");
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].query, "Zed");
        assert_eq!(report.missing[0].results.len(), 3);
    }

    #[test]
    fn test_report_json_keys() {
        let report = WingetReport {
            checked_at: 1,
            valid: vec![WingetCheck {
                pkg_key: "vlc".to_string(),
                winget_id: "VideoLAN.VLC".to_string(),
            }],
            ..WingetReport::default()
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["checkedAt"], 1);
        assert_eq!(value["valid"][0]["pkgKey"], "vlc");
        assert_eq!(value["valid"][0]["wingetId"], "VideoLAN.VLC");
    }

    #[test]
    fn test_client_endpoint_encodes_segments() {
        let client = WingetClient::with_base("https://api.winget.run/v2").unwrap();
        let url = client.endpoint(&["packages", "Some Pub", "App"]).unwrap();
        assert_eq!(url.as_str(), "https://api.winget.run/v2/packages/Some%20Pub/App");
    }

    #[test]
    fn test_client_rejects_bad_base() {
        assert!(WingetClient::with_base("not a url").is_err());
    }
}
