pub mod azure;
pub mod install;
pub mod status;
pub mod uninstall;
pub mod upgrade;

use colored::Colorize;
use nbctl_core::Outcome;

/// Final line of a mutating command
///
/// A system that was never applied fails the command: only re-running
/// `command` can finish the job.
pub(crate) fn conclude(outcome: &Outcome, command: &str) -> anyhow::Result<()> {
    match outcome {
        Outcome::Ready | Outcome::Applied => Ok(()),
        Outcome::NotReady { what } => {
            println!();
            println!(
                "{}",
                format!("⚠ {what} is not ready yet, check again with: nbctl status").yellow()
            );
            Ok(())
        }
        Outcome::NotApplied { waiting_on } => anyhow::bail!(
            "{waiting_on} did not become ready, so the system was not applied\n\nhint:\n  • inspect it with: nbctl status\n  • re-run `nbctl {command}` once it is ready"
        ),
    }
}
