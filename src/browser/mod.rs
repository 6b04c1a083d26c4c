//! 浏览器启动与连接
//!
//! 两种方式都返回 (Browser, Page, 事件循环任务)，由 `ChromiumDriver` 接管。

pub mod connection;
pub mod headless;

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;

use std::path::Path;

use chromiumoxide::Handler;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

/// 在后台处理浏览器事件，出错即退出
pub(crate) fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    })
}

/// 删除会话的浏览器用户数据目录，目录不存在或删除失败只记录日志
pub(crate) async fn remove_profile_dir(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        debug!("清理浏览器配置目录失败 {}: {}", dir.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn profile_dir_is_removed_with_its_contents() {
        let dir = std::env::temp_dir().join(format!("golestan_sync_profile_{}", std::process::id()));
        tokio::fs::create_dir_all(dir.join("Default")).await.unwrap();
        tokio::fs::write(dir.join("Default").join("Cookies"), b"x").await.unwrap();

        remove_profile_dir(&dir).await;
        assert!(!dir.exists());

        // 再删一次也不会出错
        remove_profile_dir(&dir).await;
    }
}
