//! `dayloop sweep`: one daily reset pass over every stored user.

use anyhow::{bail, Result};

use crate::cli::context::AppContext;
use crate::cli::output::{list_table, output, CommandOutput};
use crate::services::SweepReport;

/// Result of `sweep`.
#[derive(Debug, serde::Serialize)]
pub struct SweepOutput {
    /// Per-user outcome.
    #[serde(flatten)]
    pub report: SweepReport,
}

impl CommandOutput for SweepOutput {
    fn to_human(&self) -> String {
        let summary = format!(
            "Reset {} of {} user(s).",
            self.report.users_reset, self.report.users_seen
        );
        if self.report.is_clean() {
            return summary;
        }

        let mut table = list_table(&["user", "error"]);
        for failure in &self.report.failures {
            table.add_row(vec![failure.user_id.as_str(), failure.error.as_str()]);
        }
        format!("{summary}\n\n{} failure(s):\n{table}", self.report.failures.len())
    }
}

/// Run one sweep; fails when any user could not be reset.
pub async fn execute(ctx: &AppContext, json_mode: bool) -> Result<()> {
    let report = ctx.service.reset_all_daily().await?;
    let failed = report.failures.len();
    output(&SweepOutput { report }, json_mode);

    if failed > 0 {
        bail!("daily reset failed for {failed} user(s)");
    }
    Ok(())
}
