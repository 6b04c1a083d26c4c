use anyhow::{Context, Result};
use golestan_sync::utils::logging;
use golestan_sync::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：指定了 CONFIG_FILE 时读取 TOML，否则读取环境变量
    let config = match std::env::var("CONFIG_FILE") {
        Ok(path) => Config::from_toml_file(&path).with_context(|| format!("加载配置失败: {}", path))?,
        Err(_) => Config::from_env(),
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
