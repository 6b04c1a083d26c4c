//! 门户会话
//!
//! `selectors` 记录门户的页面结构与提示文本，`session` 是驱动登录和抓取的状态机。

pub mod outcome;
pub mod selectors;
pub mod session;
pub mod state;

pub use outcome::{FatalReason, LoginOutcome};
pub use session::PortalSession;
pub use state::SessionState;
