mod error;
mod limiter;

pub use error::RateLimitError;
pub use limiter::{RateLimitOutcome, RateLimiter};
