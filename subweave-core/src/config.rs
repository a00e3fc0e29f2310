use crate::error::{ConfigError, CoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const ENV_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
pub const ENV_USER_AGENT: &str = "REDDIT_USER_AGENT";

pub const DEFAULT_POSTS_PER_SUBREDDIT: u32 = 50;
pub const DEFAULT_COMMENTS_PER_POST: u32 = 30;
pub const DEFAULT_BASE_NAME: &str = "reddit_multi_community";

// Subreddit names are alphanumeric plus underscore, 2 to 21 characters.
const SUBREDDIT_NAME_MIN: usize = 2;
const SUBREDDIT_NAME_MAX: usize = 21;

/// Reddit application credentials, read from the environment.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl RedditCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build credentials through an injectable variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |var: &str| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                    var_name: var.to_string(),
                })
        };

        Ok(Self {
            client_id: require(ENV_CLIENT_ID)?,
            client_secret: require(ENV_CLIENT_SECRET)?,
            user_agent: require(ENV_USER_AGENT)?,
        })
    }
}

// The client secret must never reach logs or error text.
impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// What one collection run covers: which communities, how deep, and where
/// the datasets land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionPlan {
    pub subreddits: Vec<String>,

    #[serde(default = "default_posts_per_subreddit")]
    pub posts_per_subreddit: u32,

    #[serde(default = "default_comments_per_post")]
    pub comments_per_post: u32,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_base_name")]
    pub base_name: String,
}

impl CollectionPlan {
    pub fn new(subreddits: Vec<String>) -> Self {
        Self {
            subreddits,
            posts_per_subreddit: DEFAULT_POSTS_PER_SUBREDDIT,
            comments_per_post: DEFAULT_COMMENTS_PER_POST,
            output_dir: default_output_dir(),
            base_name: DEFAULT_BASE_NAME.to_string(),
        }
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            if error.kind() == std::io::ErrorKind::NotFound {
                CoreError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                CoreError::Io(error)
            }
        })?;
        let plan: CollectionPlan = toml::from_str(&raw).map_err(ConfigError::Parse)?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subreddits.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "at least one subreddit is required".to_string(),
            });
        }
        for name in &self.subreddits {
            if !is_plausible_subreddit_name(name) {
                return Err(ConfigError::InvalidValue {
                    field: "subreddits".to_string(),
                    value: name.clone(),
                });
            }
        }
        if self.posts_per_subreddit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "posts_per_subreddit".to_string(),
                value: self.posts_per_subreddit.to_string(),
            });
        }
        if self.comments_per_post == 0 {
            return Err(ConfigError::InvalidValue {
                field: "comments_per_post".to_string(),
                value: self.comments_per_post.to_string(),
            });
        }
        if self.base_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "base_name".to_string(),
                value: self.base_name.clone(),
            });
        }
        Ok(())
    }
}

pub fn is_plausible_subreddit_name(name: &str) -> bool {
    (SUBREDDIT_NAME_MIN..=SUBREDDIT_NAME_MAX).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn default_posts_per_subreddit() -> u32 {
    DEFAULT_POSTS_PER_SUBREDDIT
}

fn default_comments_per_post() -> u32 {
    DEFAULT_COMMENTS_PER_POST
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_base_name() -> String {
    DEFAULT_BASE_NAME.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |var| {
            pairs
                .iter()
                .find(|(name, _)| *name == var)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn test_credentials_from_lookup() {
        let creds = RedditCredentials::from_lookup(lookup_from(&[
            (ENV_CLIENT_ID, "id123"),
            (ENV_CLIENT_SECRET, "secret456"),
            (ENV_USER_AGENT, "subweave/0.1 by tester"),
        ]))
        .unwrap();

        assert_eq!(creds.client_id, "id123");
        assert_eq!(creds.client_secret, "secret456");
        assert_eq!(creds.user_agent, "subweave/0.1 by tester");
    }

    #[test]
    fn test_credentials_missing_variable() {
        let result = RedditCredentials::from_lookup(lookup_from(&[
            (ENV_CLIENT_ID, "id123"),
            (ENV_USER_AGENT, "subweave/0.1 by tester"),
        ]));

        match result {
            Err(ConfigError::MissingEnvironmentVariable { var_name }) => {
                assert_eq!(var_name, ENV_CLIENT_SECRET);
            }
            other => panic!("expected missing variable error, got {other:?}"),
        }
    }

    #[test]
    fn test_credentials_blank_value_is_missing() {
        let result = RedditCredentials::from_lookup(lookup_from(&[
            (ENV_CLIENT_ID, "   "),
            (ENV_CLIENT_SECRET, "secret"),
            (ENV_USER_AGENT, "agent"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::MissingEnvironmentVariable { .. })
        ));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = RedditCredentials {
            client_id: "id123".to_string(),
            client_secret: "supersecret".to_string(),
            user_agent: "agent".to_string(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("supersecret"));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn test_plan_defaults() {
        let plan = CollectionPlan::new(vec!["rust".to_string()]);
        assert_eq!(plan.posts_per_subreddit, DEFAULT_POSTS_PER_SUBREDDIT);
        assert_eq!(plan.comments_per_post, DEFAULT_COMMENTS_PER_POST);
        assert_eq!(plan.output_dir, PathBuf::from("."));
        assert_eq!(plan.base_name, DEFAULT_BASE_NAME);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_plan_from_toml_defaults() {
        let plan: CollectionPlan = toml::from_str(r#"subreddits = ["rust", "python"]"#).unwrap();
        assert_eq!(plan.subreddits, vec!["rust", "python"]);
        assert_eq!(plan.posts_per_subreddit, DEFAULT_POSTS_PER_SUBREDDIT);
        assert_eq!(plan.comments_per_post, DEFAULT_COMMENTS_PER_POST);
    }

    #[test]
    fn test_plan_from_toml_full() {
        let plan: CollectionPlan = toml::from_str(
            r#"
            subreddits = ["askscience"]
            posts_per_subreddit = 10
            comments_per_post = 5
            output_dir = "out"
            base_name = "science_run"
            "#,
        )
        .unwrap();
        assert_eq!(plan.posts_per_subreddit, 10);
        assert_eq!(plan.comments_per_post, 5);
        assert_eq!(plan.output_dir, PathBuf::from("out"));
        assert_eq!(plan.base_name, "science_run");
    }

    #[test]
    fn test_plan_from_toml_file() {
        let path = std::env::temp_dir().join(format!(
            "subweave_plan_{}.toml",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, "subreddits = [\"rust\"]\nposts_per_subreddit = 3\n").unwrap();

        let plan = CollectionPlan::from_toml_file(&path).unwrap();
        assert_eq!(plan.subreddits, vec!["rust"]);
        assert_eq!(plan.posts_per_subreddit, 3);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_plan_file_not_found() {
        let path = std::env::temp_dir().join(format!(
            "subweave_missing_{}.toml",
            uuid::Uuid::new_v4()
        ));
        let result = CollectionPlan::from_toml_file(&path);
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_subreddits() {
        let plan = CollectionPlan::new(vec![]);
        assert!(matches!(
            plan.validate(),
            Err(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_subreddit_names() {
        for bad in ["r/rust", "", "a", "has space", "way_too_long_subreddit_name"] {
            let plan = CollectionPlan::new(vec![bad.to_string()]);
            assert!(plan.validate().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_validate_rejects_zero_counts() {
        let mut plan = CollectionPlan::new(vec!["rust".to_string()]);
        plan.posts_per_subreddit = 0;
        assert!(plan.validate().is_err());

        let mut plan = CollectionPlan::new(vec!["rust".to_string()]);
        plan.comments_per_post = 0;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_plausible_subreddit_names() {
        assert!(is_plausible_subreddit_name("rust"));
        assert!(is_plausible_subreddit_name("ask_science"));
        assert!(is_plausible_subreddit_name("AskReddit"));
        assert!(is_plausible_subreddit_name("de"));
        assert!(!is_plausible_subreddit_name("r"));
        assert!(!is_plausible_subreddit_name("r/rust"));
        assert!(!is_plausible_subreddit_name("bad-name"));
    }
}
