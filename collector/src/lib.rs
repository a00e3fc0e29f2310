pub mod comments;
pub mod karma;
pub mod records;
pub mod recovery;

pub use comments::{flatten_comment_tree, FlattenedComment};
pub use karma::KarmaCache;
pub use records::{build_comment_record, build_post_record};
pub use recovery::{containment_action, ContainmentScope, RunAction};

use analysis::{build_community_stats, build_interconnections, ActivityLedger, RunSummary};
use dataset::DatasetWriter;
use futures::future::join_all;
use reddit_client::{RedditClient, RedditPostData};
use subweave_core::{CollectionPlan, CoreError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Drives one collection run: validates the communities, streams posts
/// and comments into the datasets, and derives the overlap analysis at
/// the end.
pub struct Collector {
    client: RedditClient,
    plan: CollectionPlan,
    writer: DatasetWriter,
    ledger: ActivityLedger,
    karma: KarmaCache,
}

impl Collector {
    /// Validates the plan and creates the output files.
    pub fn new(client: RedditClient, plan: CollectionPlan) -> Result<Self, CoreError> {
        plan.validate()?;
        let writer = DatasetWriter::create(&plan.output_dir, &plan.base_name)?;

        Ok(Self {
            client,
            plan,
            writer,
            ledger: ActivityLedger::new(),
            karma: KarmaCache::new(),
        })
    }

    /// Runs the full collection and returns the end-of-run summary.
    pub async fn run(&mut self) -> Result<RunSummary, CoreError> {
        let run_id = Uuid::new_v4();
        info!("Starting collection run {}", run_id);

        self.client.authenticate().await?;

        let communities = self.validate_communities().await?;
        let total = communities.len();

        for (index, community) in communities.iter().enumerate() {
            info!(
                "Collecting community {}/{}: r/{}",
                index + 1,
                total,
                community
            );
            if let Err(error) = self.collect_community(community).await {
                match containment_action(&error, ContainmentScope::Community) {
                    RunAction::Abort => return Err(error),
                    RunAction::Skip(_) => {
                        warn!("Skipping rest of r/{}: {}", community, error);
                    }
                }
            }
        }

        let interconnections = build_interconnections(&self.ledger);
        let stats = build_community_stats(&self.ledger);
        self.writer.finish(&interconnections, &stats)?;

        info!(
            "Karma cache finished with {} hits and {} misses",
            self.karma.hits(),
            self.karma.misses()
        );

        Ok(RunSummary::from_ledger(
            &self.ledger,
            self.writer.paths().to_vec(),
        ))
    }

    pub fn client(&self) -> &RedditClient {
        &self.client
    }

    /// Checks every planned subreddit via its about endpoint, keeping the
    /// reachable ones in plan order.
    async fn validate_communities(&mut self) -> Result<Vec<String>, CoreError> {
        let checks = self.plan.subreddits.iter().map(|name| {
            let client = &self.client;
            async move { (name.clone(), client.get_subreddit_about(name).await) }
        });
        let results = join_all(checks).await;

        let mut valid = Vec::new();
        for (name, result) in results {
            match result {
                Ok(about) => {
                    debug!(
                        "Validated r/{} ({} subscribers)",
                        about.display_name,
                        about.subscribers.unwrap_or(0)
                    );
                    valid.push(name);
                }
                Err(error) => match containment_action(&error, ContainmentScope::Community) {
                    RunAction::Abort => return Err(error),
                    RunAction::Skip(_) => {
                        warn!("Skipping unreachable community r/{}: {}", name, error);
                    }
                },
            }
        }

        if valid.is_empty() {
            return Err(CoreError::InvalidInput {
                message: "no valid subreddits to collect".to_string(),
            });
        }
        for name in &valid {
            self.ledger.register_community(name);
        }
        Ok(valid)
    }

    async fn collect_community(&mut self, community: &str) -> Result<(), CoreError> {
        let posts = self
            .client
            .get_subreddit_posts(community, self.plan.posts_per_subreddit)
            .await?;
        let total = posts.len();

        for (index, post) in posts.iter().enumerate() {
            if let Err(error) = self.collect_post(community, post).await {
                match containment_action(&error, ContainmentScope::Post) {
                    RunAction::Abort => return Err(error),
                    RunAction::Skip(_) => {
                        warn!("Skipping post {} in r/{}: {}", post.id, community, error);
                    }
                }
            }
            if (index + 1) % 10 == 0 {
                info!("Processed {}/{} posts in r/{}", index + 1, total, community);
            }
        }
        Ok(())
    }

    async fn collect_post(
        &mut self,
        community: &str,
        post: &RedditPostData,
    ) -> Result<(), CoreError> {
        let karma = self.karma.lookup(&self.client, &post.author).await;
        let record = build_post_record(post, karma);

        self.writer.append_post(&record)?;
        self.ledger.register_activity(&post.author, community);
        if record.is_crosspost {
            self.ledger
                .register_crosspost(&post.id, community, record.crosspost_parent.clone());
        }

        self.collect_comments(community, post).await
    }

    async fn collect_comments(
        &mut self,
        community: &str,
        post: &RedditPostData,
    ) -> Result<(), CoreError> {
        let nodes = self
            .client
            .get_comment_tree(community, &post.id, self.plan.comments_per_post)
            .await?;
        let post_fullname = format!("t3_{}", post.id);
        let flattened = flatten_comment_tree(
            nodes,
            &post_fullname,
            &post.author,
            self.plan.comments_per_post as usize,
        );

        for entry in &flattened {
            let karma = self.karma.lookup(&self.client, &entry.comment.author).await;
            let record = build_comment_record(
                &entry.comment,
                &post.id,
                entry.depth,
                entry.parent_author.as_deref(),
                karma,
            );

            self.writer.append_comment(&record)?;
            self.ledger
                .register_activity(&entry.comment.author, community);
            if let Some(parent_author) = &entry.parent_author {
                self.ledger.register_interaction(
                    &entry.comment.author,
                    parent_author,
                    community,
                    record.created_utc,
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use subweave_core::{ConfigError, RedditCredentials};

    fn test_client() -> RedditClient {
        let credentials = RedditCredentials {
            client_id: "test_client_id".to_string(),
            client_secret: "test_client_secret".to_string(),
            user_agent: "subweave/0.1 by u/test_user".to_string(),
        };
        RedditClient::new(&credentials).expect("client should build")
    }

    fn temp_plan() -> (CollectionPlan, PathBuf) {
        let dir = env::temp_dir().join(format!("test_subweave_{}", Uuid::new_v4()));
        let mut plan = CollectionPlan::new(vec!["rust".to_string()]);
        plan.output_dir = dir.clone();
        (plan, dir)
    }

    #[test]
    fn test_new_creates_dataset_files() {
        let (plan, dir) = temp_plan();
        let collector = Collector::new(test_client(), plan).expect("collector should build");

        assert!(dir.join("reddit_multi_community_posts.csv").exists());
        assert!(dir.join("reddit_multi_community_comments.csv").exists());
        assert!(dir
            .join("reddit_multi_community_interconnections.csv")
            .exists());
        assert!(dir
            .join("reddit_multi_community_community_stats.csv")
            .exists());

        drop(collector);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_new_rejects_invalid_plan() {
        let (mut plan, dir) = temp_plan();
        plan.posts_per_subreddit = 0;

        let result = Collector::new(test_client(), plan);
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::InvalidValue { .. }))
        ));
        // The plan is rejected before any file is created.
        assert!(!dir.exists());
    }
}
