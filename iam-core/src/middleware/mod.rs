pub mod metrics;
pub mod rate_limit;
pub mod security_headers;
pub mod tracing;

pub use metrics::{init_metrics, metrics_middleware, render_metrics};
pub use rate_limit::{
    ClientRateLimiter, HasRateLimitInfo, IpRateLimiter, UnkeyedRateLimiter,
    client_rate_limit_middleware, create_client_rate_limiter, create_ip_rate_limiter,
    create_unkeyed_rate_limiter, ip_rate_limit_middleware, rate_limit_middleware,
};
pub use security_headers::security_headers_middleware;
pub use tracing::{REQUEST_ID_HEADER, request_id_middleware};
