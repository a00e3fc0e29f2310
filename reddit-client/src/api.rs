use crate::metrics::{ApiMetrics, MetricsCollector, RequestMetrics};
use crate::model::{
    CommentNode, RedditListing, RedditPostData, RedditSubredditData, RedditThing, RedditUserData,
};
use crate::rate_limiter::{RateLimitConfig, RateLimitStatus, RateLimiter};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use subweave_core::{CoreError, ErrorExt, RedditApiError};
use tracing::{debug, info, warn};
use url::Url;

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Rate-limited HTTP client for the OAuth Reddit API
///
/// Every request goes through the shared rate limiter and is recorded in
/// the metrics collector, whether it succeeded or not.
#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: Arc<RateLimiter>,
    metrics: Arc<MetricsCollector>,
}

impl RedditApiClient {
    pub fn new(user_agent: &str) -> Result<Self, CoreError> {
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::reddit_oauth()));
        let metrics = Arc::new(MetricsCollector::new());

        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(CoreError::Network)?;

        Ok(Self {
            http_client,
            rate_limiter,
            metrics,
        })
    }

    /// Perform one GET against the API, mapping status codes to typed errors
    ///
    /// `label` is the metrics bucket for this request, so pagination over
    /// many subreddits does not explode endpoint cardinality.
    async fn make_request(
        &self,
        endpoint: &str,
        label: &str,
        access_token: &str,
        query_params: &[(&str, &str)],
    ) -> Result<reqwest::Response, CoreError> {
        let url = Url::parse(&format!("{}{}", REDDIT_API_BASE, endpoint)).map_err(|e| {
            CoreError::InvalidInput {
                message: format!("invalid endpoint {}: {}", endpoint, e),
            }
        })?;

        let permit = self.rate_limiter.acquire_permit().await;
        debug!(
            "Acquired rate limit permit for GET {} (queued {:?})",
            endpoint, permit.queue_wait_time
        );

        // Timing starts after the permit so queue waits are not counted
        // against Reddit's response time.
        let start_time = Instant::now();

        let send_result = self
            .http_client
            .get(url)
            .bearer_auth(access_token)
            .query(&[("raw_json", "1")])
            .query(query_params)
            .send()
            .await;

        let response_time = start_time.elapsed();

        match send_result {
            Ok(response) => {
                let status = response.status();
                let status_code = Some(status.as_u16());

                if status.is_success() {
                    debug!("Request successful: {} {}", status, endpoint);
                    self.record(label, status_code, response_time, true, false, None)
                        .await;
                    return Ok(response);
                }

                let rate_limited = status.as_u16() == 429;
                let api_error = match status.as_u16() {
                    429 => {
                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|value| value.to_str().ok())
                            .and_then(|value| value.parse::<u64>().ok())
                            .unwrap_or(60);
                        warn!("Rate limited on {}, retry after {}s", endpoint, retry_after);
                        RedditApiError::RateLimitExceeded { retry_after }
                    }
                    401 => RedditApiError::InvalidToken,
                    403 => RedditApiError::Forbidden {
                        resource: endpoint.to_string(),
                    },
                    404 => RedditApiError::NotFound {
                        resource: endpoint.to_string(),
                    },
                    code if status.is_server_error() => {
                        RedditApiError::ServerError { status_code: code }
                    }
                    _ => RedditApiError::InvalidResponse {
                        details: format!("unexpected status {} for {}", status, endpoint),
                    },
                };

                warn!("Request failed with status {} for {}", status, endpoint);
                self.record(
                    label,
                    status_code,
                    response_time,
                    false,
                    rate_limited,
                    Some(api_error.error_code().to_string()),
                )
                .await;

                Err(CoreError::RedditApi(api_error))
            }
            Err(e) => {
                warn!("Network error for GET {}: {}", endpoint, e);
                let error: CoreError = if e.is_timeout() {
                    RedditApiError::RequestTimeout.into()
                } else {
                    CoreError::Network(e)
                };

                self.record(
                    label,
                    None,
                    response_time,
                    false,
                    false,
                    Some(error.error_code().to_string()),
                )
                .await;

                Err(error)
            }
        }
    }

    async fn record(
        &self,
        endpoint: &str,
        status_code: Option<u16>,
        response_time: Duration,
        success: bool,
        rate_limited: bool,
        error_type: Option<String>,
    ) {
        self.metrics
            .record_request(RequestMetrics {
                endpoint: endpoint.to_string(),
                status_code,
                response_time,
                success,
                rate_limited,
                error_type,
            })
            .await;
    }

    /// Fetch one page of a subreddit's hot listing
    pub async fn fetch_hot_page(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditThing<RedditPostData>>, CoreError> {
        let endpoint = format!("/r/{}/hot", subreddit);
        let limit_param = limit.to_string();
        let mut params: Vec<(&str, &str)> = vec![("limit", limit_param.as_str())];
        if let Some(after_val) = after {
            params.push(("after", after_val));
        }

        let response = self
            .make_request(&endpoint, "subreddit_hot_page", access_token, &params)
            .await?;

        let listing: RedditListing<RedditThing<RedditPostData>> =
            response.json().await.map_err(|e| {
                CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: format!("hot listing for r/{}: {}", subreddit, e),
                })
            })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }

    /// Fetch the comment tree for one post
    ///
    /// The comments endpoint returns a two-element array: the post wrapped
    /// in a listing, then the comment forest. Only the forest is kept.
    pub async fn fetch_comment_tree(
        &self,
        access_token: &str,
        subreddit: &str,
        article_id: &str,
        limit: u32,
    ) -> Result<RedditListing<CommentNode>, CoreError> {
        let endpoint = format!("/r/{}/comments/{}", subreddit, article_id);
        let limit_param = limit.to_string();
        let params: Vec<(&str, &str)> = vec![("limit", limit_param.as_str())];

        let response = self
            .make_request(&endpoint, "comment_tree", access_token, &params)
            .await?;

        let (_post_listing, comments): (serde_json::Value, RedditListing<CommentNode>) =
            response.json().await.map_err(|e| {
                CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: format!("comment tree for post {}: {}", article_id, e),
                })
            })?;

        debug!(
            "Retrieved {} top-level comment nodes for post {}",
            comments.data.children.len(),
            article_id
        );
        Ok(comments)
    }

    /// Fetch subreddit metadata, used to validate names before a run
    pub async fn fetch_subreddit_about(
        &self,
        access_token: &str,
        subreddit: &str,
    ) -> Result<RedditSubredditData, CoreError> {
        let endpoint = format!("/r/{}/about", subreddit);

        let response = self
            .make_request(&endpoint, "subreddit_about", access_token, &[])
            .await?;

        let thing: RedditThing<RedditSubredditData> = response.json().await.map_err(|e| {
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("about page for r/{}: {}", subreddit, e),
            })
        })?;

        debug!("Retrieved info for r/{}", subreddit);
        Ok(thing.data)
    }

    /// Fetch a user's profile, the source of karma counts
    pub async fn fetch_user_about(
        &self,
        access_token: &str,
        username: &str,
    ) -> Result<RedditUserData, CoreError> {
        let endpoint = format!("/user/{}/about", username);

        let response = self
            .make_request(&endpoint, "user_about", access_token, &[])
            .await?;

        let thing: RedditThing<RedditUserData> = response.json().await.map_err(|e| {
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("about page for u/{}: {}", username, e),
            })
        })?;

        debug!("Retrieved profile for u/{}", username);
        Ok(thing.data)
    }

    pub async fn get_metrics(&self) -> ApiMetrics {
        self.metrics.get_metrics().await
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        self.rate_limiter.get_rate_limit_status().await
    }

    pub async fn reset_metrics(&self) {
        self.metrics.reset_metrics().await;
    }

    pub async fn export_metrics(&self) -> Result<String, CoreError> {
        self.metrics
            .export_metrics()
            .await
            .map_err(CoreError::Serialization)
    }
}
