use chromiumoxide::{Browser, Page};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::spawn_handler;
use crate::error::{AppError, AppResult, BrowserError};

/// 连接到已经在运行的浏览器（开发模式），并为本会话新开一个页面
///
/// 浏览器不归本会话所有，关闭会话时只关闭这个页面。
pub async fn connect_to_browser(port: u16) -> AppResult<(Browser, Page, JoinHandle<()>)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        BrowserError::ConnectionFailed {
            port,
            reason: e.to_string(),
        }
    })?;
    let handler_task = spawn_handler(handler);
    debug!("浏览器连接成功");

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = match browser.new_page("about:blank").await {
        Ok(page) => page,
        Err(e) => {
            error!("创建空白页面失败: {}", e);
            handler_task.abort();
            return Err(AppError::page_creation_failed(e));
        }
    };
    debug!("已创建空白页面");

    Ok((browser, page, handler_task))
}
