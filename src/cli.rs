use std::path::PathBuf;

use clap::Parser;
use subweave_core::{CollectionPlan, CoreError};

/// Collects posts and comments from several subreddits and derives
/// community-overlap datasets.
#[derive(Debug, Parser)]
#[command(name = "subweave", version, about)]
pub struct Cli {
    /// Subreddits to collect, by name (for example: rust programming)
    #[arg(required_unless_present = "plan", conflicts_with = "plan")]
    pub subreddits: Vec<String>,

    /// TOML plan file to load instead of listing subreddits
    #[arg(long, value_name = "FILE")]
    pub plan: Option<PathBuf>,

    /// .env file to load before reading credentials
    #[arg(long, value_name = "FILE")]
    pub env_file: Option<PathBuf>,

    /// Hot posts to collect per subreddit (default 50)
    #[arg(long, value_name = "N")]
    pub posts_per_subreddit: Option<u32>,

    /// Comments to keep per post (default 30)
    #[arg(long, value_name = "N")]
    pub comments_per_post: Option<u32>,

    /// Directory the CSV files are written to (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Base name of the four CSV files (default reddit_multi_community)
    #[arg(long, value_name = "NAME")]
    pub base_name: Option<String>,
}

impl Cli {
    /// Resolves the plan from the file or the positional subreddits, then
    /// applies the command line overrides.
    pub fn into_plan(self) -> Result<CollectionPlan, CoreError> {
        let mut plan = match self.plan {
            Some(path) => CollectionPlan::from_toml_file(&path)?,
            None => CollectionPlan::new(self.subreddits),
        };

        if let Some(posts) = self.posts_per_subreddit {
            plan.posts_per_subreddit = posts;
        }
        if let Some(comments) = self.comments_per_post {
            plan.comments_per_post = comments;
        }
        if let Some(output_dir) = self.output_dir {
            plan.output_dir = output_dir;
        }
        if let Some(base_name) = self.base_name {
            plan.base_name = base_name;
        }

        plan.validate()?;
        Ok(plan)
    }
}
