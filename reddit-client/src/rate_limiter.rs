use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tokio::time::sleep;

/// Longest single sleep while waiting out a token drought.
const MAX_DROUGHT_SLEEP: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    pub fn reddit_oauth() -> Self {
        Self {
            max_requests: 100, // Reddit allows 100 requests per minute for OAuth2
            time_window: Duration::from_secs(60), // 1 minute window
            burst_allowance: 10, // Allow small bursts up to 10 requests
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::reddit_oauth()
    }
}

#[derive(Debug)]
pub struct TokenBucket {
    tokens: Arc<Mutex<f64>>,
    capacity: f64,
    refill_rate: f64, // tokens per second
    last_refill: Arc<Mutex<Instant>>,
}

impl TokenBucket {
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = config.burst_allowance as f64;
        let refill_rate = config.max_requests as f64 / config.time_window.as_secs_f64();

        Self {
            tokens: Arc::new(Mutex::new(capacity)),
            capacity,
            refill_rate,
            last_refill: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub async fn acquire(&self, tokens_needed: f64) -> Result<(), Duration> {
        let now = Instant::now();

        let mut tokens = self.tokens.lock().await;
        let mut last_refill = self.last_refill.lock().await;

        // Refill tokens based on elapsed time
        let elapsed = now.duration_since(*last_refill);
        let tokens_to_add = elapsed.as_secs_f64() * self.refill_rate;
        *tokens = (*tokens + tokens_to_add).min(self.capacity);
        *last_refill = now;

        if *tokens >= tokens_needed {
            *tokens -= tokens_needed;
            Ok(())
        } else {
            // Report how long until the deficit refills
            let deficit = tokens_needed - *tokens;
            Err(Duration::from_secs_f64(deficit / self.refill_rate))
        }
    }

    pub async fn get_available_tokens(&self) -> f64 {
        let now = Instant::now();
        let mut tokens = self.tokens.lock().await;
        let mut last_refill = self.last_refill.lock().await;

        let elapsed = now.duration_since(*last_refill);
        let tokens_to_add = elapsed.as_secs_f64() * self.refill_rate;

        *tokens = (*tokens + tokens_to_add).min(self.capacity);
        *last_refill = now;

        *tokens
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    token_bucket: TokenBucket,
    semaphore: Arc<Semaphore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.burst_allowance as usize));
        let token_bucket = TokenBucket::new(&config);

        Self {
            token_bucket,
            semaphore,
            config,
        }
    }

    pub async fn acquire_permit(&self) -> RateLimitPermit {
        let start_time = Instant::now();
        let _permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("Semaphore should not be closed");

        // Try to acquire a token, waiting in capped naps if necessary
        loop {
            match self.token_bucket.acquire(1.0).await {
                Ok(()) => break,
                Err(wait_time) => {
                    let nap = wait_time.min(MAX_DROUGHT_SLEEP);
                    tracing::debug!("Rate limit reached, waiting {:?}", nap);
                    sleep(nap).await;
                }
            }
        }

        let queue_wait_time = start_time.elapsed();
        RateLimitPermit {
            _permit,
            queue_wait_time,
        }
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        let available_tokens = self.token_bucket.get_available_tokens().await;
        let available_permits = self.semaphore.available_permits();

        let is_near_limit = available_tokens < (self.config.burst_allowance as f64 * 0.2);
        let estimated_wait_time = if available_tokens < 1.0 {
            let refill_rate =
                self.config.max_requests as f64 / self.config.time_window.as_secs_f64();
            Some(Duration::from_secs_f64(
                (1.0 - available_tokens) / refill_rate,
            ))
        } else {
            None
        };

        RateLimitStatus {
            available_tokens: available_tokens as u32,
            max_tokens: self.config.burst_allowance,
            available_permits,
            max_permits: self.config.burst_allowance as usize,
            requests_per_minute: self.config.max_requests,
            is_near_limit,
            estimated_wait_time,
        }
    }
}

#[derive(Debug)]
pub struct RateLimitPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
    pub queue_wait_time: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub available_tokens: u32,
    pub max_tokens: u32,
    pub available_permits: usize,
    pub max_permits: usize,
    pub requests_per_minute: u32,
    pub is_near_limit: bool,
    pub estimated_wait_time: Option<Duration>,
}

impl RateLimitStatus {
    pub fn utilization_percentage(&self) -> f64 {
        if self.max_tokens == 0 {
            return 0.0;
        }
        let used_tokens = self.max_tokens.saturating_sub(self.available_tokens);
        (used_tokens as f64 / self.max_tokens as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_token_bucket_basic() {
        let config = RateLimitConfig {
            max_requests: 10,
            time_window: Duration::from_secs(10),
            burst_allowance: 5,
        };

        let bucket = TokenBucket::new(&config);

        // Should be able to acquire up to burst allowance
        for _ in 0..5 {
            assert!(bucket.acquire(1.0).await.is_ok());
        }

        // Next acquisition should fail
        assert!(bucket.acquire(1.0).await.is_err());
    }

    #[tokio::test]
    async fn test_token_bucket_reports_wait_time() {
        let config = RateLimitConfig {
            max_requests: 60,
            time_window: Duration::from_secs(60),
            burst_allowance: 1,
        };

        let bucket = TokenBucket::new(&config);
        assert!(bucket.acquire(1.0).await.is_ok());

        match bucket.acquire(1.0).await {
            Err(wait) => assert!(wait > Duration::ZERO),
            Ok(()) => panic!("expected the bucket to be drained"),
        }
    }

    #[tokio::test]
    async fn test_token_bucket_refill() {
        let config = RateLimitConfig {
            max_requests: 60, // 1 token per second
            time_window: Duration::from_secs(60),
            burst_allowance: 2,
        };

        let bucket = TokenBucket::new(&config);

        // Use all tokens
        assert!(bucket.acquire(2.0).await.is_ok());
        assert!(bucket.acquire(1.0).await.is_err());

        // Wait for refill
        sleep(Duration::from_millis(1100)).await;

        // Should be able to acquire one token now
        assert!(bucket.acquire(1.0).await.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limiter() {
        let config = RateLimitConfig::reddit_oauth();
        let limiter = RateLimiter::new(config);

        // Should be able to acquire permits
        let _permit1 = limiter.acquire_permit().await;
        let _permit2 = limiter.acquire_permit().await;

        let status = limiter.get_rate_limit_status().await;
        assert!(status.available_tokens <= status.max_tokens);
        assert!(status.available_permits <= status.max_permits);
    }

    #[tokio::test]
    async fn test_rate_limit_status() {
        let config = RateLimitConfig::reddit_oauth();
        let limiter = RateLimiter::new(config);

        let status = limiter.get_rate_limit_status().await;

        assert_eq!(status.max_tokens, 10);
        assert_eq!(status.max_permits, 10);
        assert_eq!(status.requests_per_minute, 100);
        assert!(!status.is_near_limit);

        let utilization = status.utilization_percentage();
        assert!((0.0..=100.0).contains(&utilization));
    }

    #[tokio::test]
    async fn test_status_reflects_consumption() {
        let config = RateLimitConfig {
            max_requests: 60,
            time_window: Duration::from_secs(60),
            burst_allowance: 2,
        };
        let limiter = RateLimiter::new(config);

        let _permit = limiter.acquire_permit().await;
        let status = limiter.get_rate_limit_status().await;
        assert!(status.available_tokens < 2);
        assert!(status.utilization_percentage() > 0.0);
    }

    #[tokio::test]
    async fn test_permit_wait_time_tracking() {
        let config = RateLimitConfig::reddit_oauth();
        let limiter = RateLimiter::new(config);

        let permit = limiter.acquire_permit().await;

        // Check that queue wait time is tracked
        assert!(permit.queue_wait_time >= Duration::from_secs(0));
    }
}
