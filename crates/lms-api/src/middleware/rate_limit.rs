use anyhow::{Context, bail};
use axum::Router;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

/// Per-client rate limit over the whole router.
///
/// Clients are keyed by `X-Forwarded-For` / `X-Real-IP` / `Forwarded`, then by
/// the peer address, so the server must be served with connect info. Over the
/// limit a client gets `429 Too Many Requests` with `x-ratelimit-*` headers.
///
/// `per_second` is the sustained rate: one token is replenished every
/// `1000 / per_second` milliseconds, up to `burst` tokens.
pub fn apply_rate_limit(router: Router, per_second: u64, burst: u32) -> anyhow::Result<Router> {
    if per_second == 0 {
        bail!("rate limit must allow at least one request per second");
    }

    let config = GovernorConfigBuilder::default()
        .per_millisecond(replenish_interval_ms(per_second))
        .burst_size(burst)
        .key_extractor(SmartIpKeyExtractor)
        .use_headers()
        .finish()
        .context("invalid rate limit configuration")?;

    Ok(router.layer(GovernorLayer::new(config)))
}

/// Milliseconds between two replenished tokens at `per_second` requests per second.
const fn replenish_interval_ms(per_second: u64) -> u64 {
    let interval = 1000 / per_second;
    if interval == 0 { 1 } else { interval }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use std::time::Duration;
    use tower::ServiceExt;

    fn request() -> Request<Body> {
        Request::builder()
            .uri("/health")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_burst_exhausted() {
        let app = apply_rate_limit(Router::new().route("/health", get(|| async { "ok" })), 1, 2)
            .expect("valid config");

        assert_eq!(app.clone().oneshot(request()).await.unwrap().status(), StatusCode::OK);
        assert_eq!(app.clone().oneshot(request()).await.unwrap().status(), StatusCode::OK);
        assert_eq!(
            app.oneshot(request()).await.unwrap().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_token_replenished_at_configured_rate() {
        let app = apply_rate_limit(Router::new().route("/health", get(|| async { "ok" })), 10, 1)
            .expect("valid config");

        assert_eq!(app.clone().oneshot(request()).await.unwrap().status(), StatusCode::OK);
        assert_eq!(
            app.clone().oneshot(request()).await.unwrap().status(),
            StatusCode::TOO_MANY_REQUESTS
        );

        // 10 per second puts a new token in the bucket every 100ms
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(app.oneshot(request()).await.unwrap().status(), StatusCode::OK);
    }

    #[test]
    fn test_replenish_interval() {
        assert_eq!(replenish_interval_ms(1), 1000);
        assert_eq!(replenish_interval_ms(10), 100);
        assert_eq!(replenish_interval_ms(5000), 1);
    }

    #[test]
    fn test_invalid_limits_rejected() {
        assert!(apply_rate_limit(Router::new(), 1, 0).is_err());
        assert!(apply_rate_limit(Router::new(), 0, 5).is_err());
    }
}
