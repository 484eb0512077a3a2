//! Package catalog loaded from `packages-info.json`.
//!
//! The catalog is read once and then only queried. Entries are keyed by their
//! stable id and iterated in id order.
//!
//! # File Format
//!
//! ```json
//! {
//!   "packages": {
//!     "firefox": {
//!       "name": "Firefox",
//!       "category": "Internet & Communication",
//!       "subcategory": "Browser",
//!       "package_manager": { "macos_brew": "firefox", "linux_snap": null }
//!     }
//!   }
//! }
//! ```

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, ToolboxError};
use crate::platform::Platform;

/// Category order of the package grid. Categories not listed here follow,
/// sorted case-insensitively.
pub const DISPLAY_CATEGORIES: &[&str] = &[
    "Science",
    "Reading",
    "Utility",
    "Gaming",
    "Virtualization",
    "File Man",
    "Office",
    "Audio",
    "Video",
    "Image",
    "System",
    "Internet & Communication",
    "Development",
];

/// One package of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageCatalogEntry {
    /// Key of the entry in the `packages` object
    #[serde(skip)]
    pub id: String,
    /// Display name; the id when the catalog leaves it out
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    /// Platform key -> package identifier on that platform (null = unavailable)
    #[serde(rename = "package_manager", default)]
    pub package_managers: BTreeMap<String, Option<String>>,
    /// Fields we do not interpret, kept so rewrites are lossless
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PackageCatalogEntry {
    /// Build an entry with no package manager mappings.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        subcategory: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            subcategory: subcategory.into(),
            package_managers: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Add a mapping for `platform`, builder style.
    pub fn with_package(mut self, platform: Platform, identifier: impl Into<String>) -> Self {
        self.package_managers
            .insert(platform.key().to_string(), Some(identifier.into()));
        self
    }

    /// Package identifier for `platform`. Null and empty values are both absent.
    pub fn install_name(&self, platform: Platform) -> Option<&str> {
        self.package_managers
            .get(platform.key())
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }

    pub fn is_available_on(&self, platform: Platform) -> bool {
        self.install_name(platform).is_some()
    }

    /// Case-insensitive substring match over id, name, category and subcategory.
    ///
    /// `needle` must already be lowercase.
    fn matches_query(&self, needle: &str) -> bool {
        needle.is_empty()
            || [&self.id, &self.name, &self.category, &self.subcategory]
                .iter()
                .any(|field| field.to_lowercase().contains(needle))
    }
}

/// On-disk shape of the catalog.
#[derive(Deserialize)]
struct CatalogFile {
    packages: BTreeMap<String, PackageCatalogEntry>,
}

/// The immutable package catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    packages: BTreeMap<String, PackageCatalogEntry>,
}

/// Packages of one subcategory, sorted by id.
#[derive(Debug, Clone, PartialEq)]
pub struct SubcategoryGroup<'a> {
    pub subcategory: &'a str,
    pub entries: Vec<&'a PackageCatalogEntry>,
}

/// Packages of one category, grouped by subcategory.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub category: &'a str,
    pub subcategories: Vec<SubcategoryGroup<'a>>,
}

impl CategoryGroup<'_> {
    /// Every entry of the category in display order.
    pub fn entries(&self) -> impl Iterator<Item = &PackageCatalogEntry> {
        self.subcategories
            .iter()
            .flat_map(|sub| sub.entries.iter().copied())
    }
}

/// Text search combined with a multi-select category filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageFilter {
    pub query: String,
    /// Empty set means every category
    pub categories: BTreeSet<String>,
}

impl PackageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.insert(category.into());
        self
    }

    pub fn matches(&self, entry: &PackageCatalogEntry) -> bool {
        let in_category =
            self.categories.is_empty() || self.categories.contains(&entry.category);
        in_category && entry.matches_query(&self.query.trim().to_lowercase())
    }
}

/// Summary counts of a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    pub total_packages: usize,
    pub categories: usize,
    pub subcategories: usize,
}

/// A problem found in one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    EmptyName,
    EmptyCategory,
    EmptySubcategory,
    /// An empty string where `null` is expected
    EmptyIdentifier(String),
    /// A `package_manager` key that is not a known platform
    UnknownPlatformKey(String),
    /// Not installable on any selectable platform nor via a fallback
    NoInstallPath,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name is empty"),
            Self::EmptyCategory => write!(f, "category is empty"),
            Self::EmptySubcategory => write!(f, "subcategory is empty"),
            Self::EmptyIdentifier(key) => {
                write!(f, "empty identifier for {} (use null)", key)
            }
            Self::UnknownPlatformKey(key) => write!(f, "unknown platform key {}", key),
            Self::NoInstallPath => write!(f, "not installable on any platform"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub id: String,
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.kind)
    }
}

/// Result of `Catalog::validate`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Case-insensitive ordering with a byte-order tie break, so it stays total.
pub(crate) fn caseless_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn display_rank(category: &str) -> usize {
    DISPLAY_CATEGORIES
        .iter()
        .position(|c| *c == category)
        .unwrap_or(DISPLAY_CATEGORIES.len())
}

fn display_cmp(a: &str, b: &str) -> Ordering {
    display_rank(a)
        .cmp(&display_rank(b))
        .then_with(|| caseless_cmp(a, b))
}

impl Catalog {
    /// Build a catalog from entries; later entries replace earlier ones with the same id.
    pub fn from_entries(entries: impl IntoIterator<Item = PackageCatalogEntry>) -> Self {
        let packages = entries
            .into_iter()
            .map(|entry| (entry.id.clone(), entry))
            .collect();
        Self { packages }
    }

    /// Parse a catalog from its JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.get("packages").is_none() {
            return Err(ToolboxError::catalog(
                "Invalid JSON structure: missing \"packages\" property",
            ));
        }

        let file: CatalogFile = serde_json::from_value(value)?;
        let packages = file
            .packages
            .into_iter()
            .map(|(id, mut entry)| {
                entry.id.clone_from(&id);
                if entry.name.trim().is_empty() {
                    entry.name.clone_from(&id);
                }
                (id, entry)
            })
            .collect();

        Ok(Self { packages })
    }

    /// Load a catalog from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading catalog: {}", path.display());
        let content = fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        info!(
            "Loaded {} packages from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&PackageCatalogEntry> {
        self.packages.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.packages.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = &PackageCatalogEntry> {
        self.packages.values()
    }

    /// Distinct categories in display order.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self
            .iter()
            .map(|e| e.category.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        categories.sort_by(|a, b| display_cmp(a, b));
        categories
    }

    /// Entries of one category, in id order.
    pub fn in_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a PackageCatalogEntry> + 'a {
        self.iter().filter(move |e| e.category == category)
    }

    /// Entries grouped by category then subcategory, in display order.
    pub fn grouped(&self) -> Vec<CategoryGroup<'_>> {
        self.group_entries(self.iter())
    }

    /// Like `grouped`, restricted to entries accepted by `filter`.
    /// Categories left empty by the filter are omitted.
    pub fn grouped_filtered(&self, filter: &PackageFilter) -> Vec<CategoryGroup<'_>> {
        self.group_entries(self.iter().filter(|e| filter.matches(e)))
    }

    fn group_entries<'a>(
        &'a self,
        entries: impl Iterator<Item = &'a PackageCatalogEntry>,
    ) -> Vec<CategoryGroup<'a>> {
        let mut by_category: BTreeMap<&str, BTreeMap<&str, Vec<&PackageCatalogEntry>>> =
            BTreeMap::new();
        for entry in entries {
            by_category
                .entry(entry.category.as_str())
                .or_default()
                .entry(entry.subcategory.as_str())
                .or_default()
                .push(entry);
        }

        let mut groups: Vec<CategoryGroup<'a>> = by_category
            .into_iter()
            .map(|(category, subs)| {
                let mut subcategories: Vec<SubcategoryGroup<'a>> = subs
                    .into_iter()
                    .map(|(subcategory, mut entries)| {
                        entries.sort_by(|a, b| a.id.cmp(&b.id));
                        SubcategoryGroup {
                            subcategory,
                            entries,
                        }
                    })
                    .collect();
                subcategories.sort_by(|a, b| caseless_cmp(a.subcategory, b.subcategory));
                CategoryGroup {
                    category,
                    subcategories,
                }
            })
            .collect();
        groups.sort_by(|a, b| display_cmp(a.category, b.category));
        groups
    }

    /// Entries accepted by `filter`, in id order.
    pub fn filter(&self, filter: &PackageFilter) -> Vec<&PackageCatalogEntry> {
        self.iter().filter(|e| filter.matches(e)).collect()
    }

    /// Display names in id order.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn stats(&self) -> CatalogStats {
        let categories: BTreeSet<&str> = self
            .iter()
            .filter(|e| !e.category.is_empty())
            .map(|e| e.category.as_str())
            .collect();
        let subcategories: BTreeSet<&str> = self
            .iter()
            .filter(|e| !e.subcategory.is_empty())
            .map(|e| e.subcategory.as_str())
            .collect();
        CatalogStats {
            total_packages: self.len(),
            categories: categories.len(),
            subcategories: subcategories.len(),
        }
    }

    /// Check every entry for authoring mistakes.
    pub fn validate(&self) -> ValidationReport {
        let mut issues = Vec::new();
        let mut push = |id: &str, kind: IssueKind| {
            issues.push(ValidationIssue {
                id: id.to_string(),
                kind,
            })
        };

        for entry in self.iter() {
            if entry.name.trim().is_empty() {
                push(&entry.id, IssueKind::EmptyName);
            }
            if entry.category.trim().is_empty() {
                push(&entry.id, IssueKind::EmptyCategory);
            }
            if entry.subcategory.trim().is_empty() {
                push(&entry.id, IssueKind::EmptySubcategory);
            }
            for (key, value) in &entry.package_managers {
                if key.parse::<Platform>().is_err() {
                    push(&entry.id, IssueKind::UnknownPlatformKey(key.clone()));
                } else if value.as_deref() == Some("") {
                    push(&entry.id, IssueKind::EmptyIdentifier(key.clone()));
                }
            }
            let installable = Platform::selectable().any(|p| {
                entry.is_available_on(p)
                    || p.fallback().is_some_and(|f| entry.is_available_on(f))
            });
            if !installable {
                push(&entry.id, IssueKind::NoInstallPath);
            }
        }

        debug!("Catalog validation found {} issues", issues.len());
        ValidationReport { issues }
    }

    /// Serialize with package keys sorted case-insensitively, 2-space indent.
    pub fn to_sorted_json(&self) -> Result<String> {
        let mut entries: Vec<(&str, &PackageCatalogEntry)> = self
            .packages
            .iter()
            .map(|(id, entry)| (id.as_str(), entry))
            .collect();
        entries.sort_by(|a, b| caseless_cmp(a.0, b.0));

        let json = serde_json::to_string_pretty(&SortedCatalog {
            packages: SortedPackages(entries),
        })?;
        Ok(json)
    }

    /// Write the sorted catalog to `path`.
    pub fn save_sorted<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_sorted_json()?;
        fs::write(&path, json)?;
        info!("Sorted catalog written to {}", path.as_ref().display());
        Ok(())
    }
}

#[derive(Serialize)]
struct SortedCatalog<'a> {
    packages: SortedPackages<'a>,
}

/// Map serialized in vector order rather than key order.
struct SortedPackages<'a>(Vec<(&'a str, &'a PackageCatalogEntry)>);

impl Serialize for SortedPackages<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, entry) in &self.0 {
            map.serialize_entry(id, entry)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "packages": {
            "vlc": {
                "name": "VLC",
                "category": "Video",
                "subcategory": "Player",
                "package_manager": {
                    "linux_arch_pacman": "vlc",
                    "macos_brew": "vlc",
                    "windows_winget": "VideoLAN.VLC"
                }
            },
            "Audacity": {
                "name": "Audacity",
                "category": "Audio",
                "subcategory": "Editor",
                "package_manager": { "linux_flatpak": "org.audacityteam.Audacity", "macos_brew": null }
            },
            "brave": {
                "name": "Brave",
                "category": "Internet & Communication",
                "subcategory": "browser",
                "package_manager": { "linux_arch_aur": "brave-bin" },
                "homepage": "https://brave.com"
            },
            "firefox": {
                "name": "Firefox",
                "category": "Internet & Communication",
                "subcategory": "Browser",
                "package_manager": { "linux_arch_pacman": "firefox", "linux_snap": "" }
            },
            "zed": {
                "name": "Zed",
                "category": "Editors",
                "subcategory": "Code",
                "package_manager": {}
            }
        }
    }"#;

    fn sample() -> Catalog {
        Catalog::from_json_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_parse_sets_ids() {
        let catalog = sample();
        assert_eq!(catalog.len(), 5);
        let vlc = catalog.get("vlc").unwrap();
        assert_eq!(vlc.id, "vlc");
        assert_eq!(vlc.name, "VLC");
        assert_eq!(vlc.install_name(Platform::WindowsWinget), Some("VideoLAN.VLC"));
    }

    #[test]
    fn test_missing_packages_property() {
        let err = Catalog::from_json_str(r#"{ "pkgs": {} }"#).unwrap_err();
        assert!(matches!(err, ToolboxError::Catalog(_)));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            Catalog::from_json_str("{ not json"),
            Err(ToolboxError::Json(_))
        ));
        assert!(matches!(
            Catalog::from_json_str(r#"{ "packages": { "a": { "package_manager": "brew" } } }"#),
            Err(ToolboxError::Json(_))
        ));
    }

    #[test]
    fn test_missing_name_falls_back_to_id() {
        let catalog = Catalog::from_json_str(
            r#"{ "packages": {
                "a": { "package_manager": { "macos_brew": "pkg-a" } },
                "b": { "name": "  ", "package_manager": {} }
            } }"#,
        )
        .unwrap();
        assert_eq!(catalog.get("a").unwrap().name, "a");
        assert_eq!(catalog.get("a").unwrap().category, "");
        assert_eq!(catalog.get("b").unwrap().name, "b");
    }

    #[test]
    fn test_null_and_empty_are_unavailable() {
        let catalog = sample();
        let audacity = catalog.get("Audacity").unwrap();
        assert!(!audacity.is_available_on(Platform::MacosBrew));
        assert!(!audacity.is_available_on(Platform::WindowsWinget));
        let firefox = catalog.get("firefox").unwrap();
        assert!(!firefox.is_available_on(Platform::LinuxSnap));
    }

    #[test]
    fn test_categories_in_display_order() {
        let catalog = sample();
        assert_eq!(
            catalog.categories(),
            vec!["Audio", "Video", "Internet & Communication", "Editors"]
        );
    }

    #[test]
    fn test_grouped_sorts_subcategories_caselessly() {
        let catalog = sample();
        let groups = catalog.grouped();
        let internet = groups
            .iter()
            .find(|g| g.category == "Internet & Communication")
            .unwrap();
        let subs: Vec<&str> = internet.subcategories.iter().map(|s| s.subcategory).collect();
        assert_eq!(subs, vec!["Browser", "browser"]);
        let ids: Vec<&str> = internet.entries().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["firefox", "brave"]);
    }

    #[test]
    fn test_filter_query_and_categories() {
        let catalog = sample();

        let by_query = catalog.filter(&PackageFilter::new().with_query("  BROW "));
        let ids: Vec<&str> = by_query.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["brave", "firefox"]);

        let by_category = catalog.filter(
            &PackageFilter::new()
                .with_category("Audio")
                .with_category("Video"),
        );
        let ids: Vec<&str> = by_category.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["Audacity", "vlc"]);

        let both = catalog.filter(&PackageFilter::new().with_category("Video").with_query("aud"));
        assert!(both.is_empty());
    }

    #[test]
    fn test_grouped_filtered_drops_empty_categories() {
        let catalog = sample();
        let groups = catalog.grouped_filtered(&PackageFilter::new().with_query("vlc"));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].category, "Video");
    }

    #[test]
    fn test_stats() {
        let stats = sample().stats();
        assert_eq!(stats.total_packages, 5);
        assert_eq!(stats.categories, 4);
        assert_eq!(stats.subcategories, 5);
    }

    #[test]
    fn test_validate_reports_problems() {
        let report = sample().validate();
        assert!(!report.is_ok());
        assert!(report.issues.contains(&ValidationIssue {
            id: "firefox".into(),
            kind: IssueKind::EmptyIdentifier("linux_snap".into()),
        }));
        assert!(report.issues.contains(&ValidationIssue {
            id: "zed".into(),
            kind: IssueKind::NoInstallPath,
        }));
        // AUR-only packages are installable through the pacman fallback
        assert!(!report
            .issues
            .iter()
            .any(|i| i.id == "brave" && i.kind == IssueKind::NoInstallPath));
    }

    #[test]
    fn test_sorted_json_orders_keys_caselessly() {
        let json = sample().to_sorted_json().unwrap();
        let pos = |key: &str| json.find(&format!("\"{}\": {{", key)).unwrap();
        assert!(pos("Audacity") < pos("brave"));
        assert!(pos("brave") < pos("firefox"));
        assert!(pos("vlc") < pos("zed"));
        // Unknown fields survive the rewrite
        assert!(json.contains("\"homepage\": \"https://brave.com\""));

        let reparsed = Catalog::from_json_str(&json).unwrap();
        assert_eq!(reparsed, sample());
    }

    #[test]
    fn test_names_in_id_order() {
        assert_eq!(
            sample().names(),
            vec!["Audacity", "Brave", "Firefox", "VLC", "Zed"]
        );
    }
}
