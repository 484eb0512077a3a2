//! Install Command Resolver
//!
//! Translates a package selection and a target platform into the shell command
//! that installs the selection, plus the packages that cannot be installed there.
//!
//! # Design
//!
//! - **Pure logic**: No I/O, no side effects; the catalog is only read
//! - **Order preserving**: Identifiers appear in selection order, never sorted
//! - **Deduplication**: A package selected twice is resolved once
//! - **Expected conditions are values**: Unknown ids and missing mappings land in
//!   `unresolved`; nothing installable yields `ResolutionStatus::AllUnresolvable`
//!
//! # Resolution Rules
//!
//! | Lookup result                                        | Goes to           |
//! |------------------------------------------------------|-------------------|
//! | id not in catalog                                    | `unresolved` (id) |
//! | `package_manager[platform]` non-empty                | primary clause    |
//! | else platform has a fallback and it is non-empty     | auxiliary clause  |
//! | otherwise                                            | `unresolved` (name) |
//!
//! The command is `<prefix> <primary...> && <fallback prefix> <auxiliary...>`,
//! with either clause omitted when its list is empty.

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::platform::Platform;

/// Separator between the primary and auxiliary clauses.
pub const CLAUSE_SEPARATOR: &str = " && ";

// ============================================================================
// Types
// ============================================================================

/// A resolution request that cannot be attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSelection {
    /// No platform was chosen
    #[error("Please select an operating system")]
    NoPlatform,

    /// The platform key is not one we know
    #[error("Unsupported distribution: {0}")]
    UnknownPlatform(String),

    /// The key names an auxiliary repository, not an install target
    #[error("{0} is only used as a fallback repository and cannot be selected")]
    FallbackOnly(Platform),

    /// No packages were selected
    #[error("Select packages to generate installation command...")]
    NoPackages,
}

/// Why a selected package is missing from the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// The id is not in the catalog
    UnknownPackageId,
    /// The package has no mapping (nor fallback) for the platform
    NoInstallPathForPlatform,
}

/// A selected package that could not be placed in the command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unresolved {
    pub id: String,
    /// Display name, or the id itself when the package is unknown
    pub name: String,
    pub reason: UnresolvedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// At least one package is installable
    Ready,
    /// Every selected package was unresolvable; `command` is empty
    AllUnresolvable,
}

/// Output of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub platform: Platform,
    /// Identifiers for the platform's own package manager, in selection order
    pub primary: Vec<String>,
    /// Identifiers for the fallback repository, in selection order
    pub auxiliary: Vec<String>,
    pub unresolved: Vec<Unresolved>,
    /// The full command, clauses joined with `CLAUSE_SEPARATOR`
    pub command: String,
}

impl Resolution {
    pub fn status(&self) -> ResolutionStatus {
        if self.command.is_empty() {
            ResolutionStatus::AllUnresolvable
        } else {
            ResolutionStatus::Ready
        }
    }

    /// The non-empty clauses in execution order (primary, then auxiliary).
    pub fn clauses(&self) -> Vec<String> {
        let mut clauses = Vec::new();
        if let Some(primary) = build_clause(self.platform.command_prefix(), &self.primary) {
            clauses.push(primary);
        }
        if let Some(fallback) = self.platform.fallback() {
            if let Some(aux) = build_clause(fallback.command_prefix(), &self.auxiliary) {
                clauses.push(aux);
            }
        }
        clauses
    }

    /// Display names of the unresolved packages, in selection order.
    pub fn unresolved_names(&self) -> Vec<&str> {
        self.unresolved.iter().map(|u| u.name.as_str()).collect()
    }

    /// True when every selected package made it into the command.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve a selection against a platform given by its catalog key.
///
/// # Errors
///
/// `InvalidSelection` when the key is blank, unknown or fallback-only, or when
/// the selection is empty. All other conditions are reported in the result.
pub fn resolve<S: AsRef<str>>(
    catalog: &Catalog,
    selected_ids: &[S],
    platform_key: &str,
) -> Result<Resolution, InvalidSelection> {
    let key = platform_key.trim();
    if key.is_empty() {
        return Err(InvalidSelection::NoPlatform);
    }
    let platform: Platform = key
        .parse()
        .map_err(|_| InvalidSelection::UnknownPlatform(key.to_string()))?;
    resolve_for(catalog, selected_ids, platform)
}

/// Resolve a selection against a typed platform.
pub fn resolve_for<S: AsRef<str>>(
    catalog: &Catalog,
    selected_ids: &[S],
    platform: Platform,
) -> Result<Resolution, InvalidSelection> {
    if !platform.is_selectable() {
        return Err(InvalidSelection::FallbackOnly(platform));
    }
    if selected_ids.is_empty() {
        return Err(InvalidSelection::NoPackages);
    }

    let fallback = platform.fallback();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut primary = Vec::new();
    let mut auxiliary = Vec::new();
    let mut unresolved = Vec::new();

    for id in selected_ids.iter().map(AsRef::as_ref) {
        if !seen.insert(id) {
            continue;
        }

        let Some(entry) = catalog.get(id) else {
            warn!("Selected package not in catalog: {}", id);
            unresolved.push(Unresolved {
                id: id.to_string(),
                name: id.to_string(),
                reason: UnresolvedReason::UnknownPackageId,
            });
            continue;
        };

        if let Some(name) = entry.install_name(platform) {
            primary.push(name.to_string());
        } else if let Some(name) = fallback.and_then(|f| entry.install_name(f)) {
            debug!("{} only available via {:?}", id, fallback);
            auxiliary.push(name.to_string());
        } else {
            unresolved.push(Unresolved {
                id: id.to_string(),
                name: entry.name.clone(),
                reason: UnresolvedReason::NoInstallPathForPlatform,
            });
        }
    }

    let mut resolution = Resolution {
        platform,
        primary,
        auxiliary,
        unresolved,
        command: String::new(),
    };
    resolution.command = resolution.clauses().join(CLAUSE_SEPARATOR);

    debug!(
        "Resolved {} packages for {}: {} primary, {} auxiliary, {} unresolved",
        seen.len(),
        platform,
        resolution.primary.len(),
        resolution.auxiliary.len(),
        resolution.unresolved.len()
    );

    Ok(resolution)
}

// ============================================================================
// Helpers
// ============================================================================

/// `<prefix> <space-joined identifiers>`, or `None` for an empty list.
fn build_clause(prefix: &str, identifiers: &[String]) -> Option<String> {
    if identifiers.is_empty() {
        None
    } else {
        Some(format!("{} {}", prefix, identifiers.join(" ")))
    }
}

/// Parse a space/comma-separated id list string into individual ids.
///
/// Handles both "a b c" and "a,b,c" formats.
/// Empty strings and whitespace-only entries are filtered out.
pub fn parse_id_list(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
