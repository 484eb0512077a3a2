//! OS compatibility table.
//!
//! One row per catalog package telling on which OS families it can be
//! installed, with sorting, text filtering and per-family counts.

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

use crate::catalog::{caseless_cmp, Catalog, PackageCatalogEntry};
use crate::platform::{OsFamily, Platform};

/// Column the table is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum SortColumn {
    #[default]
    Name,
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Availability of one package per OS family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub windows: bool,
    pub macos: bool,
    pub linux: bool,
    pub freebsd: bool,
}

impl CompatRow {
    pub fn from_entry(entry: &PackageCatalogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            category: entry.category.clone(),
            subcategory: entry.subcategory.clone(),
            windows: available_on_family(entry, OsFamily::Windows),
            macos: available_on_family(entry, OsFamily::Macos),
            linux: available_on_family(entry, OsFamily::Linux),
            freebsd: available_on_family(entry, OsFamily::Bsd),
        }
    }

    pub fn is_available(&self, family: OsFamily) -> bool {
        match family {
            OsFamily::Windows => self.windows,
            OsFamily::Macos => self.macos,
            OsFamily::Linux => self.linux,
            OsFamily::Bsd => self.freebsd,
        }
    }

    fn sort_key(&self, column: SortColumn) -> &str {
        match column {
            SortColumn::Name => &self.name,
            SortColumn::Category => &self.category,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        [&self.id, &self.name, &self.category, &self.subcategory]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Whether any platform of the family, or a fallback of one, carries the package.
///
/// `unix_nix_env` belongs to the Linux family, so nix-only packages count as Linux.
fn available_on_family(entry: &PackageCatalogEntry, family: OsFamily) -> bool {
    family.platforms().into_iter().any(|p: Platform| {
        entry.is_available_on(p) || p.fallback().is_some_and(|f| entry.is_available_on(f))
    })
}

/// Per-family package counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CompatStats {
    pub total: usize,
    pub windows: usize,
    pub macos: usize,
    pub linux: usize,
    pub freebsd: usize,
}

/// Sortable compatibility table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatTable {
    rows: Vec<CompatRow>,
    column: SortColumn,
    direction: SortDirection,
}

impl CompatTable {
    /// Build the table sorted by name, ascending.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let rows = catalog.iter().map(CompatRow::from_entry).collect();
        let mut table = Self {
            rows,
            column: SortColumn::default(),
            direction: SortDirection::default(),
        };
        table.sort(SortColumn::default(), SortDirection::default());
        table
    }

    pub fn rows(&self) -> &[CompatRow] {
        &self.rows
    }

    /// Current sort column and direction.
    pub fn sorting(&self) -> (SortColumn, SortDirection) {
        (self.column, self.direction)
    }

    /// Sort case-insensitively. Ties keep their previous relative order.
    pub fn sort(&mut self, column: SortColumn, direction: SortDirection) {
        self.column = column;
        self.direction = direction;
        self.rows.sort_by(|a, b| {
            let ord = caseless_cmp(a.sort_key(column), b.sort_key(column));
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }

    /// Same column flips the direction; a new column starts ascending.
    pub fn toggle_sort(&mut self, column: SortColumn) {
        let direction = if column == self.column {
            self.direction.flipped()
        } else {
            SortDirection::Asc
        };
        self.sort(column, direction);
    }

    /// Rows containing `query` in id, name, category or subcategory.
    pub fn filter(&self, query: &str) -> Vec<&CompatRow> {
        let needle = query.trim().to_lowercase();
        self.rows
            .iter()
            .filter(|row| needle.is_empty() || row.matches(&needle))
            .collect()
    }

    pub fn stats(&self) -> CompatStats {
        self.rows.iter().fold(
            CompatStats {
                total: self.rows.len(),
                ..CompatStats::default()
            },
            |mut stats, row| {
                stats.windows += usize::from(row.windows);
                stats.macos += usize::from(row.macos);
                stats.linux += usize::from(row.linux);
                stats.freebsd += usize::from(row.freebsd);
                stats
            },
        )
    }
}
