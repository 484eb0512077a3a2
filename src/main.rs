//! Toolbox - Main entry point
//!
//! Loads the configuration and catalog, then dispatches the subcommand. Command
//! output goes to stdout; logs and user-facing errors go to stderr.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use toolbox::cli::{platform_keys, Cli, Commands, GenerateArgs};
use toolbox::compat::{CompatTable, SortDirection};
use toolbox::config_file::ToolboxConfig;
use toolbox::installer;
use toolbox::logic::resolver::{parse_id_list, resolve, InvalidSelection, ResolutionStatus};
use toolbox::platform::{detect_platform, Platform, PLATFORMS};
use toolbox::winget::{validate_winget, WingetClient, WingetOptions};
use toolbox::{Catalog, PackageFilter, Resolution, Selection};

/// Initialize the tracing subscriber on stderr.
///
/// `RUST_LOG` overrides the level picked from `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);
    debug!("CLI arguments parsed");

    let config = ToolboxConfig::discover(cli.config.as_deref())?;
    let catalog_path = cli.catalog.unwrap_or_else(|| config.catalog_path.clone());

    let load_catalog = || {
        Catalog::load_from_file(&catalog_path)
            .with_context(|| format!("Failed to load catalog {:?}", catalog_path))
    };

    match cli.command {
        Commands::Generate(args) => run_generate(&load_catalog()?, &config, args)?,
        Commands::List { category, search } => {
            let catalog = load_catalog()?;
            let mut filter = PackageFilter::new();
            for c in category {
                filter = filter.with_category(c);
            }
            if let Some(term) = search {
                filter = filter.with_query(term);
            }
            print_listing(&catalog, &filter);
        }
        Commands::Platforms => print_platforms(),
        Commands::Compat { sort, desc, search } => {
            let catalog = load_catalog()?;
            let mut table = CompatTable::from_catalog(&catalog);
            let direction = if desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            table.sort(sort, direction);
            print_compat(&table, search.as_deref().unwrap_or(""));
        }
        Commands::Validate => {
            let catalog = load_catalog()?;
            let report = catalog.validate();
            if report.is_ok() {
                println!("✓ Catalog is valid: {} packages", catalog.len());
            } else {
                for issue in &report.issues {
                    eprintln!("✗ {}", issue);
                }
                eprintln!("✗ {} problems found", report.issues.len());
                std::process::exit(1);
            }
        }
        Commands::Sort { write } => {
            let catalog = load_catalog()?;
            if write {
                catalog
                    .save_sorted(&catalog_path)
                    .with_context(|| format!("Failed to write {:?}", catalog_path))?;
            } else {
                println!("{}", catalog.to_sorted_json()?);
            }
            let stats = catalog.stats();
            eprintln!("Total packages: {}", stats.total_packages);
            eprintln!("Categories: {}", stats.categories);
            eprintln!("Subcategories: {}", stats.subcategories);
        }
        Commands::ValidateWinget {
            output,
            limit,
            delay_ms,
        } => {
            let catalog = load_catalog()?;
            let client = WingetClient::new()?;
            let options = WingetOptions {
                limit,
                delay: Duration::from_millis(delay_ms),
            };
            let report = validate_winget(&catalog, &client, &options)?;
            let json = serde_json::to_string_pretty(&report)?;
            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    info!("Winget report written to {:?}", path);
                }
                None => println!("{}", json),
            }
            eprintln!(
                "Valid: {}, invalid: {}, missing: {}",
                report.valid.len(),
                report.invalid.len(),
                report.missing.len()
            );
        }
        Commands::Names { output } => {
            let catalog = load_catalog()?;
            let names = catalog.names().join("\n");
            match output {
                Some(path) => {
                    fs::write(&path, names + "\n")
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    info!("Names written to {:?}", path);
                }
                None => println!("{}", names),
            }
        }
    }

    Ok(())
}

// ============================================================================
// generate
// ============================================================================

#[derive(Serialize)]
struct GenerateReport<'a> {
    status: ResolutionStatus,
    #[serde(flatten)]
    resolution: &'a Resolution,
}

fn run_generate(catalog: &Catalog, config: &ToolboxConfig, args: GenerateArgs) -> Result<()> {
    let mut selection = Selection::new();

    if let Some(path) = &args.favorites {
        let path = path.clone().unwrap_or_else(|| config.favorites_path.clone());
        let report = selection.load_favorites(catalog, &path)?;
        eprintln!("{}", report);
    }

    if let Some(path) = &args.import {
        let report = selection.import_from_file(catalog, path)?;
        eprintln!("{}", report);
    }

    for id in args.ids.iter().flat_map(|arg| parse_id_list(arg)) {
        selection.add(id);
    }

    if let Some(path) = &args.export {
        let path: PathBuf = path.clone().unwrap_or_else(|| config.export_path.clone());
        selection.export_to_file(catalog, &path)?;
        eprintln!("Selection saved to {}", path.display());
    }

    let ids = if args.display_order {
        selection.in_display_order(catalog)
    } else {
        selection.ids().to_vec()
    };

    let platform_key = target_platform(&args, config);
    let resolution = match resolve(catalog, &ids, &platform_key) {
        Ok(resolution) => resolution,
        Err(e) => {
            error!("Invalid selection: {}", e);
            eprintln!("{}", e);
            if matches!(e, InvalidSelection::UnknownPlatform(_)) {
                eprintln!("Known platforms: {}", platform_keys().join(", "));
            }
            std::process::exit(1);
        }
    };

    if args.json {
        let report = GenerateReport {
            status: resolution.status(),
            resolution: &resolution,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_resolution(&resolution);
    }

    if resolution.status() == ResolutionStatus::AllUnresolvable {
        std::process::exit(1);
    }

    if args.execute {
        let outcomes = installer::execute(&resolution, args.dry_run)?;
        for outcome in outcomes.iter().filter(|o| o.skipped) {
            println!("[dry-run] {}", outcome.clause);
        }
        installer::ensure_success(&outcomes)?;
    }

    Ok(())
}

/// `--platform`, else the `--os` default, else the configured default, else host detection.
fn target_platform(args: &GenerateArgs, config: &ToolboxConfig) -> String {
    if let Some(key) = &args.platform {
        return key.clone();
    }
    let platform = args
        .os
        .map(|family| family.default_platform())
        .or(config.default_platform)
        .or_else(detect_platform);
    match platform {
        Some(platform) => {
            info!("Using platform {}", platform);
            platform.key().to_string()
        }
        None => String::new(),
    }
}

fn print_resolution(resolution: &Resolution) {
    if resolution.command.is_empty() {
        eprintln!("No compatible packages selected for this OS");
    } else {
        println!("{}", resolution.command);
    }

    if !resolution.unresolved.is_empty() {
        println!(
            "⚠️ Not available for this OS: {}",
            resolution.unresolved_names().join(", ")
        );
    }
}

// ============================================================================
// Listings
// ============================================================================

fn print_platforms() {
    for spec in PLATFORMS {
        let note = match spec.fallback {
            Some(fallback) => format!(" (falls back to {})", fallback),
            None if !spec.selectable => " (fallback only)".to_string(),
            None => String::new(),
        };
        println!(
            "{:<20} {:<8} {:<28} {}{}",
            spec.platform.key(),
            spec.os_family.to_string(),
            spec.label,
            spec.command_prefix,
            note
        );
    }
    debug!(
        "{} platforms, {} selectable",
        PLATFORMS.len(),
        Platform::selectable().count()
    );
}

fn print_listing(catalog: &Catalog, filter: &PackageFilter) {
    let groups = catalog.grouped_filtered(filter);
    if groups.is_empty() {
        eprintln!("No packages match");
        return;
    }
    for group in groups {
        println!("{}", group.category);
        for sub in &group.subcategories {
            println!("  {}", sub.subcategory);
            for entry in &sub.entries {
                println!("    {:<24} {}", entry.id, entry.name);
            }
        }
    }
}

fn print_compat(table: &CompatTable, query: &str) {
    let mark = |available: bool| if available { "✓" } else { "✗" };
    println!(
        "{:<28} {:<26} {:^7} {:^7} {:^7} {:^7}",
        "Package", "Category", "Windows", "macOS", "Linux", "FreeBSD"
    );
    for row in table.filter(query) {
        println!(
            "{:<28} {:<26} {:^7} {:^7} {:^7} {:^7}",
            row.name,
            row.category,
            mark(row.windows),
            mark(row.macos),
            mark(row.linux),
            mark(row.freebsd)
        );
    }

    let stats = table.stats();
    println!();
    println!("Total packages: {}", stats.total);
    println!("Windows: {}", stats.windows);
    println!("macOS: {}", stats.macos);
    println!("Linux: {}", stats.linux);
    println!("FreeBSD: {}", stats.freebsd);
}
