//! 错误类型
//!
//! 核心层使用带类型的错误（`AppError`），应用层（main / 批处理）使用 `anyhow`。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 验证码识别错误
    #[error("验证码错误: {0}")]
    Captcha(#[from] CaptchaError),
    /// 登录错误
    #[error("登录错误: {0}")]
    Login(#[from] LoginError),
    /// 门户内导航错误
    #[error("导航错误: {0}")]
    Navigation(#[from] NavigationError),
    /// 会话状态错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件读写错误
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),
    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动浏览器失败
    #[error("启动浏览器失败: {reason}")]
    LaunchFailed { reason: String },
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {reason}")]
    ConnectionFailed { port: u16, reason: String },
    /// 创建页面失败
    #[error("创建页面失败: {reason}")]
    PageCreationFailed { reason: String },
    /// 浏览器配置失败
    #[error("浏览器配置失败: {reason}")]
    ConfigurationFailed { reason: String },
    /// 执行脚本失败
    #[error("执行脚本失败: {0}")]
    ScriptExecutionFailed(#[source] chromiumoxide::error::CdpError),
    /// 脚本返回值无法解析
    #[error("脚本返回值无法解析: {0}")]
    ScriptResultInvalid(String),
    /// 元素截图失败
    #[error("元素截图失败 ({selector}): {reason}")]
    ScreenshotFailed { selector: String, reason: String },
    /// 关闭浏览器失败
    #[error("关闭浏览器失败: {reason}")]
    CloseFailed { reason: String },
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::ScriptExecutionFailed(err)
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(err.into())
    }
}

/// 验证码识别错误
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// 分割后没有任何候选字符
    #[error("无法分割验证码图片: 未找到候选字符 ({width}x{height})")]
    UnsolvableImage { width: u32, height: u32 },
    /// 分类器失败
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    /// 截图解码失败
    #[error("验证码图片解码失败: {0}")]
    Decode(#[from] image::ImageError),
}

/// 字形分类器错误
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// 模型文件读取失败
    #[error("读取分类模型失败 ({path}): {reason}")]
    ModelLoadFailed { path: String, reason: String },
    /// 模型中没有模板
    #[error("分类模型为空")]
    EmptyModel,
    /// 特征向量长度不符
    #[error("特征向量长度 {actual} 与模型要求的 {expected} 不符")]
    FeatureLength { expected: usize, actual: usize },
    /// 预测数量与输入数量不一致
    #[error("分类器返回 {actual} 个结果, 期望 {expected} 个")]
    PredictionCount { expected: usize, actual: usize },
    /// 其他分类失败
    #[error("分类失败: {0}")]
    Failed(String),
}

/// 可重试的登录失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// 门户提示验证码错误
    WrongCaptcha,
    /// 验证码无法分割
    UnsolvableCaptcha,
    /// 分类器失败
    ClassifierFailed(String),
}

impl std::fmt::Display for RetryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryReason::WrongCaptcha => write!(f, "验证码错误"),
            RetryReason::UnsolvableCaptcha => write!(f, "验证码无法分割"),
            RetryReason::ClassifierFailed(msg) => write!(f, "分类器失败: {}", msg),
        }
    }
}

/// 登录错误
#[derive(Debug, Error)]
pub enum LoginError {
    /// 用户名或密码为空
    #[error("用户名或密码不能为空")]
    EmptyCredentials,
    /// 用户名或密码错误（不可重试）
    #[error("用户名或密码错误")]
    WrongCredentials,
    /// 轮询结束仍未观察到任何已知信号
    #[error("登录结果不明确: 轮询 {polls} 次后仍无响应")]
    AmbiguousOutcome { polls: usize },
    /// 重试次数耗尽
    #[error("登录失败: 已尝试 {attempts} 次, 最后一次原因: {last}")]
    RetriesExhausted { attempts: usize, last: RetryReason },
}

/// 门户内导航错误
#[derive(Debug, Error)]
pub enum NavigationError {
    /// 某一步点击后页面没有前进
    #[error("步骤 '{step}' 在 {attempts} 次尝试后仍未进入下一页")]
    StepDidNotAdvance { step: &'static str, attempts: usize },
    /// 元素在超时内不可见
    #[error("元素 {selector} 在 {timeout_ms}ms 内不可见")]
    ElementNotVisible { selector: String, timeout_ms: u64 },
    /// 元素不存在
    #[error("找不到元素 {selector}")]
    ElementNotFound { selector: String },
    /// 导出窗口没有打开
    #[error("点击 {selector} 后 {timeout_ms}ms 内没有打开新窗口")]
    PopupNotOpened { selector: String, timeout_ms: u64 },
    /// 页面加载超时
    #[error("页面在 {timeout_ms}ms 内未加载完成")]
    LoadTimeout { timeout_ms: u64 },
}

/// 会话状态错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 非法状态迁移
    #[error("非法状态迁移: {from} -> {to}")]
    InvalidTransition { from: &'static str, to: &'static str },
    /// 尚未登录
    #[error("尚未登录, 当前状态: {state}")]
    NotAuthenticated { state: &'static str },
    /// 会话已关闭
    #[error("会话已关闭")]
    Closed,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器启动错误
    pub fn launch_failed(reason: impl std::fmt::Display) -> Self {
        AppError::Browser(BrowserError::LaunchFailed {
            reason: reason.to_string(),
        })
    }

    /// 创建页面创建错误
    pub fn page_creation_failed(reason: impl std::fmt::Display) -> Self {
        AppError::Browser(BrowserError::PageCreationFailed {
            reason: reason.to_string(),
        })
    }

    /// 是否为凭据错误（调用方据此区分"密码错误"与"门户异常"）
    pub fn is_wrong_credentials(&self) -> bool {
        matches!(self, AppError::Login(LoginError::WrongCredentials))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
