// 制御層 - ペーシングとデッドライン

pub mod deadline;
pub mod rate_limit;

pub use deadline::{with_deadline, with_deadline_cancellable, DeadlineGuard};
pub use rate_limit::RateLimiter;
