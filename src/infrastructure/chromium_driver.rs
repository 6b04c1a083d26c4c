//! 基于 chromiumoxide 的门户驱动 - 基础设施层
//!
//! 持有本会话唯一的 Browser / Page，所有 DOM 操作都通过在页面中执行 JS 完成：
//! 先沿 `FramePath` 逐层进入 `contentDocument`，再在目标文档中定位元素。

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, Viewport};
use chromiumoxide::cdp::browser_protocol::target::TargetId;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Page};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::browser;
use crate::config::BrowserSettings;
use crate::error::{AppError, AppResult, BrowserError, NavigationError};
use crate::infrastructure::driver::{DriverFactory, PopupPage, PortalDriver, Target};
use crate::workflow::SessionCtx;

/// 轮询页面状态的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 帧内脚本的返回值，脚本永远返回对象而不是 null
#[derive(Debug, Deserialize)]
struct Probe<T> {
    found: bool,
    value: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// JSON 字面量同时也是合法的 JS 字面量
fn js_literal(value: impl Into<JsonValue>) -> String {
    value.into().to_string()
}

/// 生成在目标 frame 中执行 `body` 的脚本
///
/// `body` 中可用的变量：`doc`（目标文档）、`all`（匹配元素数组）、`el`（第一个匹配元素或 null）、
/// `ox` / `oy`（目标文档相对顶层页面的偏移）。
fn frame_script(target: Target, body: &str) -> String {
    let frames = js_literal(target.frame.frames().to_vec());
    let selector = js_literal(target.selector);
    format!(
        r#"(() => {{
    let doc = document, ox = window.scrollX, oy = window.scrollY;
    for (const sel of {frames}) {{
        const frame = doc.querySelector(sel);
        if (!frame || !frame.contentDocument) return {{ found: false, value: null }};
        const r = frame.getBoundingClientRect();
        ox += r.left + frame.clientLeft;
        oy += r.top + frame.clientTop;
        doc = frame.contentDocument;
    }}
    const selector = {selector};
    let all;
    if (selector.startsWith('/')) {{
        const snap = doc.evaluate(selector, doc, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
        all = Array.from({{ length: snap.snapshotLength }}, (_, i) => snap.snapshotItem(i));
    }} else {{
        all = Array.from(doc.querySelectorAll(selector));
    }}
    const el = all.length > 0 ? all[0] : null;
    {body}
}})()"#
    )
}

/// 只在第一个 `container` 元素内查找 `selector`
fn scoped_texts_script(container: &str, selector: &str) -> String {
    format!(
        r#"(() => {{
    const root = document.querySelector({});
    if (!root) return [];
    return Array.from(root.querySelectorAll({})).map(e => e.innerText);
}})()"#,
        js_literal(container),
        js_literal(selector)
    )
}

const MISSING: &str = "if (!el) return { found: false, value: null };";

/// 在给定时间内反复检查条件
async fn poll_until<F, Fut>(timeout: Duration, mut check: F) -> AppResult<bool>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = AppResult<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await? {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        sleep(POLL_INTERVAL).await;
    }
}

async fn eval(page: &Page, js_code: impl Into<String>) -> AppResult<JsonValue> {
    let result = page.evaluate(js_code.into()).await?;
    let json_value = result.into_value()?;
    Ok(json_value)
}

async fn eval_as<T: DeserializeOwned>(page: &Page, js_code: impl Into<String>) -> AppResult<T> {
    let json_value = eval(page, js_code).await?;
    serde_json::from_value(json_value)
        .map_err(|e| BrowserError::ScriptResultInvalid(e.to_string()).into())
}

/// 门户驱动
pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    /// 自己启动的浏览器在关闭时整体退出；连接来的浏览器只关闭页面
    owns_browser: bool,
    profile_dir: Option<PathBuf>,
    closed: bool,
}

impl ChromiumDriver {
    pub fn new(
        browser: Browser,
        page: Page,
        handler_task: JoinHandle<()>,
        owns_browser: bool,
        profile_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            browser,
            page,
            handler_task,
            owns_browser,
            profile_dir,
            closed: false,
        }
    }

    async fn probe<T: DeserializeOwned>(&self, target: Target, body: &str) -> AppResult<Probe<T>> {
        eval_as(&self.page, frame_script(target, body)).await
    }

    /// 元素必须存在且脚本必须返回值
    async fn require<T: DeserializeOwned>(&self, target: Target, body: &str) -> AppResult<T> {
        let probe = self.probe::<T>(target, body).await?;
        if !probe.found {
            return Err(NavigationError::ElementNotFound {
                selector: target.to_string(),
            }
            .into());
        }
        probe.value.ok_or_else(|| {
            BrowserError::ScriptResultInvalid(format!("{} 没有返回值", target)).into()
        })
    }

    async fn is_visible(&self, target: Target) -> AppResult<bool> {
        let body = format!(
            "{MISSING}
    const r = el.getBoundingClientRect();
    const st = doc.defaultView.getComputedStyle(el);
    return {{ found: true, value: r.width > 0 && r.height > 0 && st.visibility !== 'hidden' && st.display !== 'none' }};"
        );
        let probe = self.probe::<bool>(target, &body).await?;
        Ok(probe.found && probe.value.unwrap_or(false))
    }

    async fn target_ids(&self) -> AppResult<HashSet<TargetId>> {
        let pages = self.browser.pages().await?;
        Ok(pages.iter().map(|p| p.target_id().clone()).collect())
    }
}

impl PortalDriver for ChromiumDriver {
    type Popup = ChromiumPopup;

    async fn goto(&mut self, url: &str) -> AppResult<()> {
        debug!("导航到: {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn wait_for_load(&mut self, timeout: Duration) -> AppResult<()> {
        let page = &self.page;
        let loaded = poll_until(timeout, move || async move {
            let state: String = eval_as(page, "document.readyState").await?;
            Ok(state == "complete")
        })
        .await?;
        if !loaded {
            return Err(NavigationError::LoadTimeout {
                timeout_ms: timeout.as_millis() as u64,
            }
            .into());
        }
        Ok(())
    }

    async fn count(&mut self, target: Target) -> AppResult<usize> {
        let probe = self
            .probe::<usize>(target, "return { found: true, value: all.length };")
            .await?;
        Ok(probe.value.unwrap_or(0))
    }

    async fn attribute(&mut self, target: Target, name: &str) -> AppResult<Option<String>> {
        let body = format!(
            "{MISSING}\n    return {{ found: true, value: el.getAttribute({}) }};",
            js_literal(name)
        );
        let probe = self.probe::<String>(target, &body).await?;
        Ok(probe.value)
    }

    async fn screenshot(&mut self, target: Target) -> AppResult<Vec<u8>> {
        let body = format!(
            "{MISSING}
    const r = el.getBoundingClientRect();
    return {{ found: true, value: {{ x: ox + r.left, y: oy + r.top, width: r.width, height: r.height }} }};"
        );
        let rect: Rect = self.require(target, &body).await?;
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Err(BrowserError::ScreenshotFailed {
                selector: target.to_string(),
                reason: format!("元素尺寸为 {}x{}", rect.width, rect.height),
            }
            .into());
        }

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .clip(Viewport {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                scale: 1.0,
            })
            .build();

        self.page.screenshot(params).await.map_err(|e| {
            BrowserError::ScreenshotFailed {
                selector: target.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    async fn fill(&mut self, target: Target, value: &str) -> AppResult<()> {
        let body = format!(
            "{MISSING}
    el.focus();
    el.value = {};
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return {{ found: true, value: true }};",
            js_literal(value)
        );
        self.require::<bool>(target, &body).await?;
        Ok(())
    }

    async fn click(&mut self, target: Target) -> AppResult<()> {
        let body = format!("{MISSING}\n    el.click();\n    return {{ found: true, value: true }};");
        self.require::<bool>(target, &body).await?;
        Ok(())
    }

    async fn wait_for_visible(&mut self, target: Target, timeout: Duration) -> AppResult<()> {
        let this = &*self;
        let visible = poll_until(timeout, move || this.is_visible(target)).await?;
        if !visible {
            return Err(NavigationError::ElementNotVisible {
                selector: target.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }
            .into());
        }
        Ok(())
    }

    async fn text_content(&mut self, target: Target) -> AppResult<Option<String>> {
        let body = format!("{MISSING}\n    return {{ found: true, value: el.textContent }};");
        Ok(self.probe::<String>(target, &body).await?.value)
    }

    async fn input_value(&mut self, target: Target) -> AppResult<Option<String>> {
        let body = format!("{MISSING}\n    return {{ found: true, value: el.value }};");
        Ok(self.probe::<String>(target, &body).await?.value)
    }

    async fn click_expect_popup(&mut self, target: Target, timeout: Duration) -> AppResult<ChromiumPopup> {
        let before = self.target_ids().await?;
        self.click(target).await?;

        let deadline = Instant::now() + timeout;
        loop {
            let pages = self.browser.pages().await?;
            if let Some(page) = pages.into_iter().find(|p| !before.contains(p.target_id())) {
                debug!("已打开新窗口: {:?}", page.target_id());
                return Ok(ChromiumPopup::new(page));
            }
            if Instant::now() >= deadline {
                return Err(NavigationError::PopupNotOpened {
                    selector: target.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                }
                .into());
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn close(&mut self) -> AppResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = if self.owns_browser {
            match self.browser.close().await {
                Ok(_) => {
                    let _ = self.browser.wait().await;
                    Ok(())
                }
                Err(e) => Err(BrowserError::CloseFailed {
                    reason: e.to_string(),
                }),
            }
        } else {
            self.page
                .clone()
                .close()
                .await
                .map_err(|e| BrowserError::CloseFailed {
                    reason: e.to_string(),
                })
        };

        self.handler_task.abort();
        if let Some(dir) = self.profile_dir.take() {
            browser::remove_profile_dir(&dir).await;
        }

        result.map_err(AppError::from)
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        if !self.closed {
            warn!("ChromiumDriver 未调用 close() 即被释放");
        }
        self.handler_task.abort();
    }
}

/// 导出按钮打开的新窗口
pub struct ChromiumPopup {
    page: Page,
    closed: bool,
}

impl ChromiumPopup {
    fn new(page: Page) -> Self {
        Self { page, closed: false }
    }
}

impl PopupPage for ChromiumPopup {
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> AppResult<()> {
        let script = format!(
            "document.querySelector({}) !== null",
            js_literal(selector)
        );
        let page = &self.page;
        let script = script.as_str();
        let present = poll_until(timeout, move || async move { eval_as::<bool>(page, script).await }).await?;
        if !present {
            return Err(NavigationError::ElementNotVisible {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }
            .into());
        }
        Ok(())
    }

    async fn inner_texts_in_first(&mut self, container: &str, selector: &str) -> AppResult<Vec<String>> {
        eval_as(&self.page, scoped_texts_script(container, selector)).await
    }

    async fn close(&mut self) -> AppResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.page.clone().close().await?;
        Ok(())
    }
}

/// 为每个会话启动（或连接）一个浏览器
#[derive(Debug)]
pub struct ChromiumDriverFactory {
    settings: BrowserSettings,
    /// 已启动的浏览器个数，保证配置目录互不相同
    launched: AtomicUsize,
}

impl ChromiumDriverFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            launched: AtomicUsize::new(0),
        }
    }

    /// 本次启动独占的用户数据目录，调用方给出相同的 ctx 也不会重复
    fn next_profile_dir(&self, ctx: &SessionCtx) -> PathBuf {
        let seq = self.launched.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("golestan_sync_{}_{}", ctx.tag(), seq))
    }
}

impl DriverFactory for ChromiumDriverFactory {
    type Driver = ChromiumDriver;

    async fn open(&self, ctx: &SessionCtx) -> AppResult<ChromiumDriver> {
        match self.settings.debug_port {
            Some(port) => {
                debug!("{} 使用调试端口 {} 上的浏览器", ctx, port);
                let (browser, page, handler_task) = browser::connect_to_browser(port).await?;
                Ok(ChromiumDriver::new(browser, page, handler_task, false, None))
            }
            None => {
                let profile_dir = self.next_profile_dir(ctx);
                let (browser, page, handler_task) =
                    browser::launch_headless_browser(&self.settings, &profile_dir).await?;
                Ok(ChromiumDriver::new(
                    browser,
                    page,
                    handler_task,
                    true,
                    Some(profile_dir),
                ))
            }
        }
    }
}
