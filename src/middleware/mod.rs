mod request_log;

pub mod client_ip;
pub mod rate_limit;

pub use request_log::log_requests;
pub use rate_limit::{QuotaDecision, RateLimiter, rate_limit};
