//! HTTP client middleware for upstream request logging.

use crate::utils::fmt_duration;
use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Upstream calls slower than this are logged at warn.
const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_secs(2);

pub struct TracingMiddleware;

#[async_trait::async_trait]
impl Middleware for TracingMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let method = req.method().clone();
        let url = req.url().to_string();
        trace!(method = %method, url = %url, "upstream request");

        let start = Instant::now();
        let result = next.run(req, extensions).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => {
                let status = response.status().as_u16();
                if elapsed > SLOW_REQUEST_THRESHOLD {
                    warn!(method = %method, url = %url, status, duration = fmt_duration(elapsed), "slow upstream response");
                } else {
                    debug!(method = %method, url = %url, status, duration = fmt_duration(elapsed), "upstream response");
                }
            }
            Err(e) => {
                warn!(method = %method, url = %url, error = %e, duration = fmt_duration(elapsed), "upstream request failed");
            }
        }

        result
    }
}
