use crate::error::RetryReason;
use crate::portal::selectors::{WRONG_CAPTCHA_MESSAGE, WRONG_CREDENTIALS_MESSAGE};

/// 不可重试的登录失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalReason {
    WrongCredentials,
}

/// 一次登录尝试的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    /// 换一张验证码重试
    RetryableFailure { reason: RetryReason },
    /// 立即终止
    FatalFailure { reason: FatalReason },
    /// 轮询结束仍未观察到任何已知信号
    Unknown,
}

impl LoginOutcome {
    /// 根据门户错误提示判断结果，未知提示返回 `None`（继续轮询）
    pub fn from_error_message(message: &str) -> Option<Self> {
        match message.trim() {
            WRONG_CREDENTIALS_MESSAGE => Some(LoginOutcome::FatalFailure {
                reason: FatalReason::WrongCredentials,
            }),
            WRONG_CAPTCHA_MESSAGE => Some(LoginOutcome::RetryableFailure {
                reason: RetryReason::WrongCaptcha,
            }),
            _ => None,
        }
    }
}
