use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig, Page};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::{remove_profile_dir, spawn_handler};
use crate::config::BrowserSettings;
use crate::error::{AppError, AppResult, BrowserError};

/// 启动浏览器并打开空白页
///
/// 每个会话使用独立的 `profile_dir`，并发会话之间不共享 cookie。
pub async fn launch_headless_browser(
    settings: &BrowserSettings,
    profile_dir: &Path,
) -> AppResult<(Browser, Page, JoinHandle<()>)> {
    info!("🚀 启动{}浏览器...", if settings.headless { "无头" } else { "" });
    debug!("用户数据目录: {}", profile_dir.display());

    let mut builder = if settings.headless {
        BrowserConfig::builder().new_headless_mode()
    } else {
        BrowserConfig::builder().with_head()
    };
    if let Some(executable) = &settings.chrome_executable {
        builder = builder.chrome_executable(Path::new(executable));
    }

    let config = builder
        .user_data_dir(profile_dir)
        .request_timeout(settings.page_load_timeout)
        .args(vec![
            "--disable-gpu",             // 无头模式下禁用 GPU
            "--no-sandbox",              // 容器内没有沙盒权限
            "--disable-dev-shm-usage",   // 防止共享内存不足
            "--remote-debugging-port=0", // 让浏览器自动选择端口
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            BrowserError::ConfigurationFailed { reason: e }
        })?;

    let (mut browser, handler) = match Browser::launch(config).await {
        Ok(launched) => launched,
        Err(e) => {
            error!("启动浏览器失败: {}", e);
            remove_profile_dir(profile_dir).await;
            return Err(AppError::launch_failed(e));
        }
    };
    let handler_task = spawn_handler(handler);
    debug!("浏览器启动成功");

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = match browser.new_page("about:blank").await {
        Ok(page) => page,
        Err(e) => {
            error!("创建页面失败: {}", e);
            if browser.close().await.is_ok() {
                let _ = browser.wait().await;
            }
            handler_task.abort();
            remove_profile_dir(profile_dir).await;
            return Err(AppError::page_creation_failed(e));
        }
    };

    Ok((browser, page, handler_task))
}
