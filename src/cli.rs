use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::compat::SortColumn;
use crate::platform::{OsFamily, Platform};

/// Toolbox - pick packages, get the install command for your OS
#[derive(Parser)]
#[command(name = "toolbox")]
#[command(about = "Generate package installation commands for many operating systems")]
#[command(version)]
pub struct Cli {
    /// Package catalog (defaults to the configured path)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Configuration file (overrides $TOOLBOX_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the install command for the selected packages
    Generate(GenerateArgs),
    /// List catalog packages grouped by category
    List {
        /// Only show these categories (repeatable)
        #[arg(short, long)]
        category: Vec<String>,
        /// Case-insensitive search over id, name, category and subcategory
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show the supported platforms and their install commands
    Platforms,
    /// Show on which operating systems each package is available
    Compat {
        /// Column to sort by
        #[arg(long, default_value_t = SortColumn::Name)]
        sort: SortColumn,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Only show rows matching this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Check the catalog for problems
    Validate,
    /// Print the catalog with packages sorted by key
    Sort {
        /// Rewrite the catalog file in place
        #[arg(long)]
        write: bool,
    },
    /// Check windows_winget ids against winget.run and suggest missing ones
    ValidateWinget {
        /// Write the JSON report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Candidates kept per package without a winget id
        #[arg(long, default_value_t = 5)]
        limit: usize,
        /// Pause between packages, in milliseconds
        #[arg(long, default_value_t = 100)]
        delay_ms: u64,
    },
    /// Extract package display names
    Names {
        /// Write names to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Package ids, space or comma separated
    pub ids: Vec<String>,

    /// Target platform key (e.g. linux_debian_apt)
    #[arg(short, long, conflicts_with = "os")]
    pub platform: Option<String>,

    /// Operating system family; uses its default platform
    #[arg(long)]
    pub os: Option<OsFamily>,

    /// Add ids from an exported selection file
    #[arg(long, value_name = "FILE")]
    pub import: Option<PathBuf>,

    /// Start from a favorites file (configured path if no FILE is given)
    #[arg(long, value_name = "FILE", num_args = 0..=1)]
    pub favorites: Option<Option<PathBuf>>,

    /// Save the selection (configured path if no FILE is given)
    #[arg(long, value_name = "FILE", num_args = 0..=1)]
    pub export: Option<Option<PathBuf>>,

    /// Run the generated command
    #[arg(long)]
    pub execute: bool,

    /// With --execute, only show what would run
    #[arg(long, requires = "execute")]
    pub dry_run: bool,

    /// Print the resolution as JSON
    #[arg(long)]
    pub json: bool,

    /// Order packages as they appear in the category listing
    #[arg(long)]
    pub display_order: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Keys accepted by `--platform`.
pub fn platform_keys() -> Vec<&'static str> {
    Platform::selectable().map(Platform::key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_subcommand() {
        let result = Cli::try_parse_from(["toolbox"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_generate_with_platform() {
        let result = Cli::try_parse_from([
            "toolbox",
            "generate",
            "vlc",
            "firefox",
            "--platform",
            "linux_debian_apt",
        ]);
        assert!(result.is_ok());
        let cli = result.unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.ids, vec!["vlc", "firefox"]);
                assert_eq!(args.platform.as_deref(), Some("linux_debian_apt"));
                assert!(!args.execute);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_generate_with_os() {
        let cli = Cli::try_parse_from(["toolbox", "generate", "vlc", "--os", "macos"]).unwrap();
        match cli.command {
            Commands::Generate(args) => assert_eq!(args.os, Some(OsFamily::Macos)),
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_platform_conflicts_with_os() {
        let result = Cli::try_parse_from([
            "toolbox",
            "generate",
            "--platform",
            "macos_brew",
            "--os",
            "macos",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_dry_run_requires_execute() {
        let result = Cli::try_parse_from(["toolbox", "generate", "vlc", "--dry-run"]);
        assert!(result.is_err());

        let result =
            Cli::try_parse_from(["toolbox", "generate", "vlc", "--execute", "--dry-run"]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_cli_export_optional_value() {
        let cli = Cli::try_parse_from(["toolbox", "generate", "vlc", "--export"]).unwrap();
        match cli.command {
            Commands::Generate(args) => assert_eq!(args.export, Some(None)),
            _ => panic!("Expected Generate command"),
        }

        let cli =
            Cli::try_parse_from(["toolbox", "generate", "vlc", "--export", "mine.json"]).unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.export, Some(Some(PathBuf::from("mine.json"))))
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "toolbox",
            "list",
            "-vv",
            "--catalog",
            "/tmp/catalog.json",
            "--category",
            "Video",
            "--category",
            "Audio",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.catalog, Some(PathBuf::from("/tmp/catalog.json")));
        match cli.command {
            Commands::List { category, search } => {
                assert_eq!(category, vec!["Video", "Audio"]);
                assert!(search.is_none());
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_cli_compat_sort() {
        let cli = Cli::try_parse_from(["toolbox", "compat", "--sort", "category", "--desc"])
            .unwrap();
        match cli.command {
            Commands::Compat { sort, desc, .. } => {
                assert_eq!(sort, SortColumn::Category);
                assert!(desc);
            }
            _ => panic!("Expected Compat command"),
        }
    }

    #[test]
    fn test_cli_validate_winget() {
        let cli = Cli::try_parse_from([
            "toolbox",
            "validate-winget",
            "--limit",
            "2",
            "--delay-ms",
            "0",
            "--output",
            "report.json",
        ])
        .unwrap();
        match cli.command {
            Commands::ValidateWinget {
                output,
                limit,
                delay_ms,
            } => {
                assert_eq!(output, Some(PathBuf::from("report.json")));
                assert_eq!(limit, 2);
                assert_eq!(delay_ms, 0);
            }
            _ => panic!("Expected ValidateWinget command"),
        }

        let cli = Cli::try_parse_from(["toolbox", "validate-winget"]).unwrap();
        match cli.command {
            Commands::ValidateWinget { limit, delay_ms, .. } => {
                assert_eq!((limit, delay_ms), (5, 100));
            }
            _ => panic!("Expected ValidateWinget command"),
        }
    }

    #[test]
    fn test_platform_keys_exclude_fallback() {
        let keys = platform_keys();
        assert!(keys.contains(&"windows_winget"));
        assert!(!keys.contains(&"linux_arch_aur"));
    }
}
