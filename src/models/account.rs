use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LoginError;

/// 门户登录凭据
///
/// `Debug` 不输出密码。
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// 只检查非空
    pub fn validate(&self) -> Result<(), LoginError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(LoginError::EmptyCredentials);
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 每个账号要抓取的内容
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountTask {
    #[default]
    Courses,
    StudentInfo,
}

/// accounts.toml 中的一项
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default)]
    pub task: AccountTask,
}

/// accounts.toml 顶层结构
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountList {
    #[serde(default)]
    pub accounts: Vec<Account>,
}
