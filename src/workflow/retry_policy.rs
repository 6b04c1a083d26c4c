//! 登录重试策略
//!
//! 会话只负责报告"发生了什么"（`LoginOutcome`），是否重试由这里决定。

use crate::config::SessionSettings;
use crate::error::LoginError;
use crate::portal::outcome::{FatalReason, LoginOutcome};

/// 对一次尝试结果的处理决定
#[derive(Debug)]
pub enum RetryDecision {
    /// 登录成功，继续后续流程
    Proceed,
    /// 换一张验证码重新登录
    Retry,
    /// 终止并返回错误
    Abort(LoginError),
}

/// 只对验证码错误重试，且总尝试次数不超过 `max_attempts`
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: usize,
    poll_attempts: usize,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, poll_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            poll_attempts,
        }
    }

    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self::new(settings.max_login_attempts, settings.login_poll_attempts)
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// `attempt` 从 1 开始计数
    pub fn decide(&self, outcome: &LoginOutcome, attempt: usize) -> RetryDecision {
        match outcome {
            LoginOutcome::Success => RetryDecision::Proceed,
            LoginOutcome::FatalFailure {
                reason: FatalReason::WrongCredentials,
            } => RetryDecision::Abort(LoginError::WrongCredentials),
            LoginOutcome::Unknown => RetryDecision::Abort(LoginError::AmbiguousOutcome {
                polls: self.poll_attempts,
            }),
            LoginOutcome::RetryableFailure { reason } if attempt >= self.max_attempts => {
                RetryDecision::Abort(LoginError::RetriesExhausted {
                    attempts: attempt,
                    last: reason.clone(),
                })
            }
            LoginOutcome::RetryableFailure { .. } => RetryDecision::Retry,
        }
    }
}
