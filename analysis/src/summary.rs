use crate::ledger::ActivityLedger;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

/// End-of-run report printed after all datasets are written
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub finished_at: DateTime<Utc>,
    pub communities: Vec<String>,
    pub total_unique_users: usize,
    pub multi_community_users: usize,
    pub crossposts_found: usize,
    pub files_generated: Vec<PathBuf>,
}

impl RunSummary {
    pub fn from_ledger(ledger: &ActivityLedger, files_generated: Vec<PathBuf>) -> Self {
        let mut communities = ledger.communities().to_vec();
        communities.sort();

        Self {
            finished_at: Utc::now(),
            communities,
            total_unique_users: ledger.total_unique_users(),
            multi_community_users: ledger.multi_community_users().len(),
            crossposts_found: ledger.crossposts().len(),
            files_generated,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== MULTI-COMMUNITY ANALYSIS SUMMARY ===")?;
        writeln!(
            f,
            "Finished at: {}",
            self.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "Total Communities Analyzed: {}", self.communities.len())?;
        writeln!(f, "Total Unique Users: {}", self.total_unique_users)?;
        writeln!(f, "Multi-Community Users: {}", self.multi_community_users)?;
        writeln!(f, "Cross-Posts Found: {}", self.crossposts_found)?;
        writeln!(f, "Communities: {}", self.communities.join(", "))?;
        writeln!(f, "Files Generated:")?;
        for file in &self.files_generated {
            writeln!(f, "  {}", file.display())?;
        }
        Ok(())
    }
}
