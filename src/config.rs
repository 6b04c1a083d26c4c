use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppResult, ConfigError};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 门户登录页 URL
    pub portal_url: String,
    /// 课程列表报表代码
    pub course_report_code: String,
    /// 最大登录尝试次数（仅验证码错误会重试）
    pub max_login_attempts: usize,
    /// 登录结果轮询次数
    pub login_poll_attempts: usize,
    /// 登录结果轮询间隔（毫秒）
    pub login_poll_interval_ms: u64,
    /// "点击-等待-检查" 导航步骤的最大尝试次数
    pub navigation_attempts: usize,
    /// 导航步骤间隔（毫秒）
    pub navigation_interval_ms: u64,
    /// 等待元素可见的超时（毫秒）
    pub element_timeout_ms: u64,
    /// 等待页面加载的超时（毫秒）
    pub page_load_timeout_ms: u64,
    /// 是否使用无头浏览器
    pub headless: bool,
    /// 浏览器调试端口（设置后连接已有浏览器，而不是启动新的）
    pub browser_debug_port: Option<u16>,
    /// Chromium 可执行文件路径
    pub chrome_executable: Option<String>,
    /// 字形模板文件
    pub classifier_model_path: String,
    /// 同时运行的会话数量
    pub max_concurrent_sessions: usize,
    /// 账号列表文件
    pub accounts_file: String,
    /// 结果输出目录
    pub output_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal_url: "https://golestan.ui.ac.ir/forms/authenticateuser/main.htm".to_string(),
            course_report_code: "212".to_string(),
            max_login_attempts: 20,
            login_poll_attempts: 20,
            login_poll_interval_ms: 100,
            navigation_attempts: 20,
            navigation_interval_ms: 100,
            element_timeout_ms: 5000,
            page_load_timeout_ms: 15000,
            headless: true,
            browser_debug_port: None,
            chrome_executable: None,
            classifier_model_path: "models/glyphs.json".to_string(),
            max_concurrent_sessions: 4,
            accounts_file: "accounts.toml".to_string(),
            output_dir: "output".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            portal_url: std::env::var("PORTAL_URL").unwrap_or(default.portal_url),
            course_report_code: std::env::var("COURSE_REPORT_CODE").unwrap_or(default.course_report_code),
            max_login_attempts: std::env::var("MAX_LOGIN_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_login_attempts),
            login_poll_attempts: std::env::var("LOGIN_POLL_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.login_poll_attempts),
            login_poll_interval_ms: std::env::var("LOGIN_POLL_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.login_poll_interval_ms),
            navigation_attempts: std::env::var("NAVIGATION_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.navigation_attempts),
            navigation_interval_ms: std::env::var("NAVIGATION_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.navigation_interval_ms),
            element_timeout_ms: std::env::var("ELEMENT_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.element_timeout_ms),
            page_load_timeout_ms: std::env::var("PAGE_LOAD_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_load_timeout_ms),
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headless),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).or(default.browser_debug_port),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(default.chrome_executable),
            classifier_model_path: std::env::var("CLASSIFIER_MODEL_PATH").unwrap_or(default.classifier_model_path),
            max_concurrent_sessions: std::env::var("MAX_CONCURRENT_SESSIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_sessions),
            accounts_file: std::env::var("ACCOUNTS_FILE").unwrap_or(default.accounts_file),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 从 TOML 文件加载配置，缺失的键使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config)
    }

    /// 会话级别的时序与重试参数
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            portal_url: self.portal_url.clone(),
            course_report_code: self.course_report_code.clone(),
            max_login_attempts: self.max_login_attempts.max(1),
            login_poll_attempts: self.login_poll_attempts,
            login_poll_interval: Duration::from_millis(self.login_poll_interval_ms),
            navigation_attempts: self.navigation_attempts.max(1),
            navigation_interval: Duration::from_millis(self.navigation_interval_ms),
            element_timeout: Duration::from_millis(self.element_timeout_ms),
            page_load_timeout: Duration::from_millis(self.page_load_timeout_ms),
        }
    }

    /// 浏览器启动参数
    pub fn browser_settings(&self) -> BrowserSettings {
        BrowserSettings {
            headless: self.headless,
            debug_port: self.browser_debug_port,
            chrome_executable: self.chrome_executable.clone(),
            page_load_timeout: Duration::from_millis(self.page_load_timeout_ms),
        }
    }
}

/// 单个会话使用的参数
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub portal_url: String,
    pub course_report_code: String,
    pub max_login_attempts: usize,
    pub login_poll_attempts: usize,
    pub login_poll_interval: Duration,
    pub navigation_attempts: usize,
    pub navigation_interval: Duration,
    pub element_timeout: Duration,
    pub page_load_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Config::default().session_settings()
    }
}

/// 浏览器参数
#[derive(Clone, Debug)]
pub struct BrowserSettings {
    pub headless: bool,
    pub debug_port: Option<u16>,
    pub chrome_executable: Option<String>,
    pub page_load_timeout: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_only_given_keys() {
        let config: Config = toml::from_str(
            r#"
            max_login_attempts = 5
            browser_debug_port = 9222
            "#,
        )
        .unwrap();

        assert_eq!(config.max_login_attempts, 5);
        assert_eq!(config.browser_debug_port, Some(9222));
        assert_eq!(config.course_report_code, "212");
        assert_eq!(config.login_poll_attempts, 20);
    }

    #[test]
    fn session_settings_never_allow_zero_attempts() {
        let config = Config {
            max_login_attempts: 0,
            ..Config::default()
        };
        assert_eq!(config.session_settings().max_login_attempts, 1);
        assert_eq!(
            config.session_settings().login_poll_interval,
            Duration::from_millis(100)
        );
    }
}
