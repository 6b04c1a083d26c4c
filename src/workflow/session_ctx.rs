//! 会话上下文
//!
//! 封装"我正在处理第几个请求、哪个账号"这一信息，用作日志前缀

use std::fmt::Display;

use crate::utils::mask_username;

/// 会话上下文
#[derive(Debug, Clone)]
pub struct SessionCtx {
    /// 请求序号（从1开始，仅用于日志显示）
    pub request_index: usize,

    /// 登录账号
    pub username: String,
}

impl SessionCtx {
    pub fn new(request_index: usize, username: impl Into<String>) -> Self {
        Self {
            request_index,
            username: username.into(),
        }
    }

    /// 用于文件名、浏览器配置目录等的短标识
    pub fn tag(&self) -> String {
        format!("{}_{}", std::process::id(), self.request_index)
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[会话 #{} 账号 {}]",
            self.request_index,
            mask_username(&self.username)
        )
    }
}
