//! Package selection state owned by the caller.
//!
//! A `Selection` is an ordered, duplicate-free list of catalog ids. It is the
//! explicit replacement for "whatever checkboxes are ticked": callers mutate it
//! and pass it to the resolver.
//!
//! Selections round-trip through JSON files as a plain array of ids:
//!
//! ```json
//! ["firefox", "vlc", "gimp"]
//! ```
//!
//! Favorites files may use the same array or wrap it: `{ "favorites": [...] }`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::{Result, ToolboxError};

/// File name suggested when exporting a selection.
pub const DEFAULT_EXPORT_FILENAME: &str = "toolbox-exported-packages.json";

/// Largest selection file accepted for import (5 MiB).
pub const MAX_IMPORT_BYTES: u64 = 5 * 1024 * 1024;

/// Tri-state check of a group of packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    /// Nothing in the group is selected (or the group is empty)
    Unchecked,
    /// Everything in the group is selected
    Checked,
    /// Some but not all of the group is selected
    Indeterminate,
}

impl CheckState {
    fn from_counts(selected: usize, total: usize) -> Self {
        if selected == 0 {
            Self::Unchecked
        } else if selected == total {
            Self::Checked
        } else {
            Self::Indeterminate
        }
    }
}

/// Outcome of importing ids into a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Ids found in the catalog and selected
    pub imported: usize,
    /// Ids absent from the catalog, in file order
    pub not_found: Vec<String>,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} packages selected", self.imported)?;
        if !self.not_found.is_empty() {
            write!(f, "\n{} packages not found", self.not_found.len())?;
        }
        Ok(())
    }
}

/// Accepted shapes of a favorites file.
#[derive(Deserialize)]
#[serde(untagged)]
enum FavoritesFile {
    List(Vec<String>),
    Wrapped { favorites: Vec<String> },
}

/// Ordered set of selected package ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from ids, dropping repeats but keeping first-seen order.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::new();
        for id in ids {
            selection.add(id);
        }
        selection
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    /// Append `id` unless already selected. Returns true if it was added.
    pub fn add(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Returns true if `id` was selected.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|s| s != id);
        self.ids.len() != before
    }

    /// Flip `id`. Returns the new state (true = selected).
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.remove(id) {
            false
        } else {
            self.ids.push(id.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Select or deselect every package of `category`.
    pub fn select_category(&mut self, catalog: &Catalog, category: &str, on: bool) {
        let groups = catalog.grouped();
        let Some(group) = groups.iter().find(|g| g.category == category) else {
            debug!("select_category: no packages in {}", category);
            return;
        };
        for entry in group.entries() {
            if on {
                self.add(entry.id.as_str());
            } else {
                self.remove(&entry.id);
            }
        }
    }

    /// Select every catalog package in display order, or clear the selection.
    pub fn select_all(&mut self, catalog: &Catalog, on: bool) {
        if !on {
            self.clear();
            return;
        }
        for group in catalog.grouped() {
            for entry in group.entries() {
                self.add(entry.id.as_str());
            }
        }
    }

    pub fn category_state(&self, catalog: &Catalog, category: &str) -> CheckState {
        let (selected, total) = catalog
            .in_category(category)
            .fold((0, 0), |(selected, total), entry| {
                (selected + usize::from(self.contains(&entry.id)), total + 1)
            });
        CheckState::from_counts(selected, total)
    }

    /// State of the "select all" check over the whole catalog.
    pub fn overall_state(&self, catalog: &Catalog) -> CheckState {
        let selected = self.ids.iter().filter(|id| catalog.contains(id)).count();
        CheckState::from_counts(selected, catalog.len())
    }

    /// Selected ids reordered to catalog display order.
    ///
    /// Ids unknown to the catalog keep their relative order at the end.
    pub fn in_display_order(&self, catalog: &Catalog) -> Vec<String> {
        let selected: HashSet<&str> = self.ids.iter().map(String::as_str).collect();
        let mut ordered: Vec<String> = catalog
            .grouped()
            .iter()
            .flat_map(|g| g.entries())
            .filter(|e| selected.contains(e.id.as_str()))
            .map(|e| e.id.clone())
            .collect();
        ordered.extend(self.ids.iter().filter(|id| !catalog.contains(id)).cloned());
        ordered
    }

    /// Select the ids present in the catalog; report the rest.
    pub fn import_ids<I, S>(&mut self, catalog: &Catalog, ids: I) -> ImportReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut report = ImportReport::default();
        for id in ids {
            let id = id.into();
            if catalog.contains(&id) {
                self.add(id);
                report.imported += 1;
            } else {
                warn!("Imported package {} not found in catalog", id);
                report.not_found.push(id);
            }
        }
        report
    }

    /// Pretty JSON array of ids.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.ids)?)
    }

    /// Write the selection to `path` as a JSON array, in catalog display order.
    pub fn export_to_file<P: AsRef<Path>>(&self, catalog: &Catalog, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.in_display_order(catalog))?;
        fs::write(&path, json)?;
        info!(
            "Exported {} packages to {}",
            self.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Add the ids listed in a JSON selection file.
    ///
    /// The file must have a `.json` extension, be at most `MAX_IMPORT_BYTES`,
    /// and hold an array of strings.
    pub fn import_from_file<P: AsRef<Path>>(
        &mut self,
        catalog: &Catalog,
        path: P,
    ) -> Result<ImportReport> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json {
            return Err(ToolboxError::selection("Please select a valid JSON file."));
        }

        let size = fs::metadata(path)?.len();
        if size > MAX_IMPORT_BYTES {
            return Err(ToolboxError::selection(
                "File is too large. Maximum size is 5MB.",
            ));
        }

        let content = fs::read_to_string(path)?;
        let ids = parse_id_array(&content)?;
        let report = self.import_ids(catalog, ids);
        info!("Imported selection from {}: {}", path.display(), report);
        Ok(report)
    }

    /// Replace the selection with the favorites listed in `path`.
    pub fn load_favorites<P: AsRef<Path>>(
        &mut self,
        catalog: &Catalog,
        path: P,
    ) -> Result<ImportReport> {
        let content = fs::read_to_string(&path)?;
        let favorites = parse_favorites(&content)?;
        self.clear();
        let report = self.import_ids(catalog, favorites);
        info!(
            "Loaded {} favorites from {}",
            report.imported,
            path.as_ref().display()
        );
        Ok(report)
    }
}

/// Parse a JSON array of package ids.
pub fn parse_id_array(json: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    serde_json::from_value(value).map_err(|_| {
        ToolboxError::selection("Invalid format: expected an array of package IDs")
    })
}

/// Parse a favorites document: an id array or `{ "favorites": [...] }`.
pub fn parse_favorites(json: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    match serde_json::from_value(value) {
        Ok(FavoritesFile::List(ids)) | Ok(FavoritesFile::Wrapped { favorites: ids }) => Ok(ids),
        Err(_) => Err(ToolboxError::selection("Invalid favorites format")),
    }
}
