pub mod retry_policy;
pub mod session_ctx;

pub use retry_policy::{RetryDecision, RetryPolicy};
pub use session_ctx::SessionCtx;
