//! Rate limiting logic and state management.

mod backend;
mod clock;
mod counter;
mod key;
mod limiter;
pub mod rules;
mod sweeper;

pub use backend::RateLimiterBackend;
pub use clock::{Clock, ManualClock, SystemClock};
pub use counter::{Decision, Entry, Quota};
pub use key::RateLimitKey;
pub use limiter::RateLimiter;
pub use rules::{EndpointRules, RateLimitRule, TimeUnit};
pub use sweeper::spawn_sweeper;
