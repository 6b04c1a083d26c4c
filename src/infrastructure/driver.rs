//! 浏览器驱动能力
//!
//! 门户会话只通过这里的 trait 访问页面，不直接接触 chromiumoxide。
//! 测试中用假驱动替换。

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::error::AppResult;
use crate::workflow::SessionCtx;

/// 从顶层文档到目标文档要依次进入的 frame 选择器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramePath(pub &'static [&'static str]);

impl FramePath {
    /// 顶层文档
    pub const ROOT: FramePath = FramePath(&[]);

    pub fn frames(&self) -> &'static [&'static str] {
        self.0
    }
}

/// 某个 frame 内的元素
///
/// 选择器以 `/` 开头时按 XPath 解析，否则按 CSS 解析。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub frame: FramePath,
    pub selector: &'static str,
}

impl Target {
    pub const fn new(frame: FramePath, selector: &'static str) -> Self {
        Self { frame, selector }
    }

    pub const fn root(selector: &'static str) -> Self {
        Self::new(FramePath::ROOT, selector)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self.frame.frames() {
            write!(f, "{} > ", frame)?;
        }
        write!(f, "{}", self.selector)
    }
}

/// 门户页面驱动
///
/// 一个驱动只服务一个会话，方法都取 `&mut self`，不支持并发调用。
pub trait PortalDriver: Send {
    type Popup: PopupPage;

    fn goto(&mut self, url: &str) -> impl Future<Output = AppResult<()>> + Send;

    /// 等待顶层文档加载完成
    fn wait_for_load(&mut self, timeout: Duration) -> impl Future<Output = AppResult<()>> + Send;

    /// 匹配元素个数，frame 不存在时为 0
    fn count(&mut self, target: Target) -> impl Future<Output = AppResult<usize>> + Send;

    fn attribute(
        &mut self,
        target: Target,
        name: &str,
    ) -> impl Future<Output = AppResult<Option<String>>> + Send;

    /// 元素截图（PNG）
    fn screenshot(&mut self, target: Target) -> impl Future<Output = AppResult<Vec<u8>>> + Send;

    fn fill(&mut self, target: Target, value: &str) -> impl Future<Output = AppResult<()>> + Send;

    fn click(&mut self, target: Target) -> impl Future<Output = AppResult<()>> + Send;

    fn wait_for_visible(
        &mut self,
        target: Target,
        timeout: Duration,
    ) -> impl Future<Output = AppResult<()>> + Send;

    fn text_content(&mut self, target: Target) -> impl Future<Output = AppResult<Option<String>>> + Send;

    fn input_value(&mut self, target: Target) -> impl Future<Output = AppResult<Option<String>>> + Send;

    /// 点击后等待新窗口打开并返回它
    fn click_expect_popup(
        &mut self,
        target: Target,
        timeout: Duration,
    ) -> impl Future<Output = AppResult<Self::Popup>> + Send;

    /// 释放页面和浏览器，调用方保证只调用一次
    fn close(&mut self) -> impl Future<Output = AppResult<()>> + Send;
}

/// 点击导出后打开的新窗口
pub trait PopupPage: Send {
    fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> impl Future<Output = AppResult<()>> + Send;

    /// 文档中第一个匹配 `container` 的元素内，每个匹配 `selector` 的元素的 innerText
    ///
    /// `selector` 相对该元素求值（可用 `:scope` 只取直接子元素），找不到 `container` 时为空。
    fn inner_texts_in_first(
        &mut self,
        container: &str,
        selector: &str,
    ) -> impl Future<Output = AppResult<Vec<String>>> + Send;

    fn close(&mut self) -> impl Future<Output = AppResult<()>> + Send;
}

/// 为每个会话创建独立的驱动
pub trait DriverFactory: Send + Sync {
    type Driver: PortalDriver;

    fn open(&self, ctx: &SessionCtx) -> impl Future<Output = AppResult<Self::Driver>> + Send;
}
