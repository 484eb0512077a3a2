//! Install Command Execution
//!
//! Runs the clauses of a `Resolution` through the system shell, one at a time,
//! stopping at the first clause that fails. Nothing is run in dry-run mode.
//!
//! Output of the package managers is inherited so the user sees prompts and
//! progress directly.

use std::process::{Command, ExitStatus};
use tracing::{info, warn};

use crate::error::{Result, ToolboxError};
use crate::logic::resolver::Resolution;

/// Result of one clause of the install command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// The clause as passed to the shell
    pub clause: String,
    /// Exit code (None if terminated by signal or skipped)
    pub exit_code: Option<i32>,
    pub success: bool,
    /// True in dry-run mode; the clause was not run
    pub skipped: bool,
}

impl InstallOutcome {
    fn skipped(clause: String) -> Self {
        Self {
            clause,
            exit_code: None,
            success: true,
            skipped: true,
        }
    }

    fn from_status(clause: String, status: ExitStatus) -> Self {
        Self {
            clause,
            exit_code: status.code(),
            success: status.success(),
            skipped: false,
        }
    }
}

/// Execute the resolution's command clause by clause.
///
/// # Returns
///
/// - `Ok(outcomes)` - one outcome per clause that was run (or skipped); a
///   failing clause is the last element
/// - `Err` - the command is empty, or the shell could not be spawned
pub fn execute(resolution: &Resolution, dry_run: bool) -> Result<Vec<InstallOutcome>> {
    let clauses = resolution.clauses();
    if clauses.is_empty() {
        return Err(ToolboxError::execution(
            "No compatible packages selected for this OS",
        ));
    }

    let mut outcomes = Vec::with_capacity(clauses.len());
    for clause in clauses {
        if dry_run {
            info!("Dry run, not executing: {}", clause);
            outcomes.push(InstallOutcome::skipped(clause));
            continue;
        }

        let outcome = run_clause(clause)?;
        let failed = !outcome.success;
        outcomes.push(outcome);
        if failed {
            break;
        }
    }

    Ok(outcomes)
}

/// Convenience check over `execute`'s output.
pub fn ensure_success(outcomes: &[InstallOutcome]) -> Result<()> {
    match outcomes.iter().find(|o| !o.success) {
        Some(failed) => Err(ToolboxError::execution(format!(
            "'{}' exited with code {}",
            failed.clause,
            failed.exit_code.unwrap_or(-1)
        ))),
        None => Ok(()),
    }
}

fn run_clause(clause: String) -> Result<InstallOutcome> {
    info!("Executing: {}", clause);

    let status = shell_command(&clause).status().map_err(|e| {
        ToolboxError::execution(format!("Failed to spawn shell for '{}': {}", clause, e))
    })?;

    let outcome = InstallOutcome::from_status(clause, status);
    if outcome.success {
        info!("Clause finished successfully");
    } else {
        warn!(
            "Clause failed with exit code {}",
            outcome.exit_code.unwrap_or(-1)
        );
    }
    Ok(outcome)
}

#[cfg(windows)]
fn shell_command(clause: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(clause);
    cmd
}

#[cfg(not(windows))]
fn shell_command(clause: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(clause);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;

    fn resolution(platform: Platform, primary: &[&str], auxiliary: &[&str]) -> Resolution {
        let mut resolution = Resolution {
            platform,
            primary: primary.iter().map(|s| s.to_string()).collect(),
            auxiliary: auxiliary.iter().map(|s| s.to_string()).collect(),
            unresolved: Vec::new(),
            command: String::new(),
        };
        resolution.command = resolution.clauses().join(" && ");
        resolution
    }

    #[test]
    fn test_dry_run_skips_every_clause() {
        let res = resolution(Platform::LinuxArchPacman, &["vlc"], &["brave-bin"]);
        let outcomes = execute(&res, true).unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.skipped && o.success));
        assert_eq!(outcomes[0].clause, "sudo pacman -S vlc");
        assert_eq!(outcomes[1].clause, "yay -S brave-bin");
        assert!(ensure_success(&outcomes).is_ok());
    }

    #[test]
    fn test_empty_command_is_an_error() {
        let res = resolution(Platform::LinuxDebianApt, &[], &[]);
        let err = execute(&res, true).unwrap_err();
        assert!(matches!(err, ToolboxError::Execution(_)));
    }

    #[test]
    fn test_ensure_success_reports_failed_clause() {
        let outcomes = vec![InstallOutcome {
            clause: "sudo apt install vlc".to_string(),
            exit_code: Some(100),
            success: false,
            skipped: false,
        }];
        let msg = ensure_success(&outcomes).unwrap_err().to_string();
        assert!(msg.contains("sudo apt install vlc"));
        assert!(msg.contains("100"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_clause_exit_status() {
        let ok = run_clause("true".to_string()).unwrap();
        assert!(ok.success);
        assert_eq!(ok.exit_code, Some(0));

        let failed = run_clause("exit 3".to_string()).unwrap();
        assert!(!failed.success);
        assert_eq!(failed.exit_code, Some(3));
    }
}
