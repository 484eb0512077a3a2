//! Toolbox Library
//!
//! Turns a selection of catalog packages and a target platform into the shell
//! command that installs them, reporting packages the platform cannot provide.

pub mod catalog;
pub mod cli;
pub mod compat;
pub mod config_file;
pub mod error;
pub mod installer;
pub mod logic;
pub mod platform;
pub mod selection;
pub mod winget;

// Re-export main types for convenience
pub use catalog::{Catalog, CatalogStats, PackageCatalogEntry, PackageFilter, ValidationReport};
pub use compat::{CompatRow, CompatStats, CompatTable, SortColumn, SortDirection};
pub use config_file::ToolboxConfig;
pub use error::ToolboxError;
pub use installer::{execute, InstallOutcome};
pub use platform::{detect_platform, OsFamily, Platform};
pub use selection::{CheckState, ImportReport, Selection};
pub use winget::{validate_winget, WingetClient, WingetOptions, WingetReport};

// Command resolver
pub use logic::resolver::{
    resolve, resolve_for, InvalidSelection, Resolution, ResolutionStatus, Unresolved,
    UnresolvedReason,
};
