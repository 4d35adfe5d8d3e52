//! Progress CLI commands.

use anyhow::Result;
use clap::{builder::BoolishValueParser, ArgAction, Args, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::output::{list_table, output, CommandOutput};
use crate::domain::models::{ProgressSnapshot, TaskKind};

/// Arguments for `progress`.
#[derive(Args, Debug)]
pub struct ProgressArgs {
    #[command(subcommand)]
    /// Progress action to run.
    pub command: ProgressCommands,
}

/// `progress` subcommands.
#[derive(Subcommand, Debug)]
pub enum ProgressCommands {
    /// Show a user's progress for today
    Show {
        /// User ID
        user: String,
    },
    /// Mark a task as done or not done
    Set {
        /// User ID
        user: String,
        /// Task kind (gratitude, journal, pomodoro, todo)
        kind: String,
        /// true/false (also yes/no, 1/0)
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        completed: bool,
    },
    /// Clear today's checklist, keeping the streak
    Reset {
        /// User ID
        user: String,
    },
    /// Create a progress record for a new user
    Register {
        /// User ID
        user: String,
    },
    /// Delete a user's progress record
    Remove {
        /// User ID
        user: String,
    },
}

/// A user's progress as printed by the CLI.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOutput {
    /// User the progress belongs to.
    pub user_id: String,
    /// Snapshot after the command ran.
    #[serde(flatten)]
    pub progress: ProgressSnapshot,
}

impl CommandOutput for ProgressOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["task", "done"]);
        for kind in TaskKind::ALL {
            let done = self.progress.completed_tasks.get(kind);
            table.add_row(vec![kind.as_str(), if done { "yes" } else { "no" }]);
        }

        let mut lines = vec![
            format!("Progress for {}", self.user_id),
            table.to_string(),
            String::new(),
            format!("Progress: {}%", self.progress.progress_percent),
            format!("Streak:   {} day(s)", self.progress.streak),
        ];
        if self.progress.all_tasks_completed {
            lines.push("All tasks completed today.".to_string());
        }
        lines.join("\n")
    }
}

/// Result of `progress remove`.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveOutput {
    /// User whose record was targeted.
    pub user_id: String,
    /// Whether a record existed.
    pub removed: bool,
}

impl CommandOutput for RemoveOutput {
    fn to_human(&self) -> String {
        if self.removed {
            format!("Removed progress record for {}", self.user_id)
        } else {
            format!("No progress record for {}", self.user_id)
        }
    }
}

/// Run one `progress` subcommand.
pub async fn execute(args: ProgressArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let service = &ctx.service;

    match args.command {
        ProgressCommands::Show { user } => {
            let progress = service.get_progress(&user).await?;
            output(&ProgressOutput { user_id: user, progress }, json_mode);
        }
        ProgressCommands::Set {
            user,
            kind,
            completed,
        } => {
            let progress = service
                .set_task_completion_str(&user, &kind, completed)
                .await?;
            output(&ProgressOutput { user_id: user, progress }, json_mode);
        }
        ProgressCommands::Reset { user } => {
            let progress = service.reset_daily(&user).await?;
            output(&ProgressOutput { user_id: user, progress }, json_mode);
        }
        ProgressCommands::Register { user } => {
            let progress = service.register_user(&user).await?;
            output(&ProgressOutput { user_id: user, progress }, json_mode);
        }
        ProgressCommands::Remove { user } => {
            let removed = service.remove_user(&user).await?;
            output(&RemoveOutput { user_id: user, removed }, json_mode);
        }
    }

    Ok(())
}
