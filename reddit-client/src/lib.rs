pub mod api;
pub mod auth;
pub mod metrics;
pub mod model;
pub mod rate_limiter;
pub mod retry;


pub use api::RedditApiClient;
pub use auth::{AuthState, RedditAuthenticator, RedditOAuth2Config, RedditToken};
pub use metrics::{ApiMetrics, EndpointMetrics, MetricsCollector, RequestMetrics};
pub use model::{
    CommentNode, MoreData, RedditCommentData, RedditListing, RedditListingData, RedditPostData,
    RedditSubredditData, RedditThing, RedditUserData,
};
pub use rate_limiter::{RateLimitConfig, RateLimitStatus, RateLimiter};
pub use retry::{CircuitBreakerState, RetryConfig, RetryExecutor, RetryMetrics};

use subweave_core::{CoreError, RedditCredentials};

/// Largest page size the listing endpoints accept
pub const MAX_PAGE_SIZE: u32 = 100;

/// Largest `limit` hint worth sending to the comments endpoint
pub const COMMENT_LIMIT_HINT_MAX: u32 = 500;

/// High-level Reddit client combining authentication, the rate-limited
/// HTTP layer and retry handling
pub struct RedditClient {
    auth: RedditAuthenticator,
    api: RedditApiClient,
    retry: RetryExecutor,
}

impl RedditClient {
    pub fn new(credentials: &RedditCredentials) -> Result<Self, CoreError> {
        let oauth_config = RedditOAuth2Config::from_credentials(credentials);
        let auth = RedditAuthenticator::new(&oauth_config)?;
        let api = RedditApiClient::new(&credentials.user_agent)?;
        let retry = RetryExecutor::new(RetryConfig::reddit());

        Ok(Self { auth, api, retry })
    }

    /// Obtain an application-only token before the first request
    pub async fn authenticate(&self) -> Result<(), CoreError> {
        self.auth.authenticate().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated().await
    }

    pub async fn needs_refresh(&self) -> bool {
        self.auth.needs_refresh().await
    }

    pub async fn auth_state(&self) -> AuthState {
        self.auth.auth_state().await
    }

    pub async fn set_token(&self, token: RedditToken) {
        self.auth.set_token(token).await;
    }

    /// Fetch up to `limit` posts from a subreddit's hot listing
    ///
    /// Pages through the listing until the limit is reached, the listing
    /// ends, or a page comes back empty.
    pub async fn get_subreddit_posts(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<RedditPostData>, CoreError> {
        let mut posts: Vec<RedditPostData> = Vec::with_capacity(limit as usize);
        let mut after: Option<String> = None;

        while (posts.len() as u32) < limit {
            let token = self.auth.access_token().await?;
            let page_size = (limit - posts.len() as u32).min(MAX_PAGE_SIZE);

            let api = &self.api;
            let token_ref = token.as_str();
            let after_param = after.as_deref();
            let listing = self
                .retry
                .execute("subreddit_hot_page", move || async move {
                    api.fetch_hot_page(token_ref, subreddit, page_size, after_param)
                        .await
                })
                .await?;

            let data = listing.data;
            after = data.after;

            if data.children.is_empty() {
                break;
            }
            posts.extend(data.children.into_iter().map(|thing| thing.data));

            if after.is_none() {
                break;
            }
        }

        posts.truncate(limit as usize);
        Ok(posts)
    }

    /// Fetch the comment forest for one post
    ///
    /// `limit_hint` is passed to the endpoint to bound the payload. The
    /// caller still has to walk and cap the flattened tree itself.
    pub async fn get_comment_tree(
        &self,
        subreddit: &str,
        article_id: &str,
        limit_hint: u32,
    ) -> Result<Vec<CommentNode>, CoreError> {
        let token = self.auth.access_token().await?;
        let capped_hint = limit_hint.min(COMMENT_LIMIT_HINT_MAX);

        let api = &self.api;
        let token_ref = token.as_str();
        let listing = self
            .retry
            .execute("comment_tree", move || async move {
                api.fetch_comment_tree(token_ref, subreddit, article_id, capped_hint)
                    .await
            })
            .await?;

        Ok(listing.data.children)
    }

    /// Fetch subreddit metadata
    pub async fn get_subreddit_about(
        &self,
        subreddit: &str,
    ) -> Result<RedditSubredditData, CoreError> {
        let token = self.auth.access_token().await?;

        let api = &self.api;
        let token_ref = token.as_str();
        self.retry
            .execute("subreddit_about", move || async move {
                api.fetch_subreddit_about(token_ref, subreddit).await
            })
            .await
    }

    /// Fetch a user's profile
    pub async fn get_user_about(&self, username: &str) -> Result<RedditUserData, CoreError> {
        let token = self.auth.access_token().await?;

        let api = &self.api;
        let token_ref = token.as_str();
        self.retry
            .execute("user_about", move || async move {
                api.fetch_user_about(token_ref, username).await
            })
            .await
    }

    pub async fn api_metrics(&self) -> ApiMetrics {
        self.api.get_metrics().await
    }

    pub async fn export_metrics(&self) -> Result<String, CoreError> {
        self.api.export_metrics().await
    }

    pub async fn rate_limit_status(&self) -> RateLimitStatus {
        self.api.get_rate_limit_status().await
    }

    pub fn retry_metrics(&self) -> RetryMetrics {
        self.retry.get_metrics()
    }

    pub fn circuit_breaker_state(&self) -> CircuitBreakerState {
        self.retry.get_circuit_breaker_state()
    }
}
