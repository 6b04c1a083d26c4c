use crate::models::account::{Account, AccountList};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载账号列表
///
/// 文件不存在时报错；用户名为空的条目跳过并记录警告。
pub async fn load_accounts(accounts_file: &Path) -> Result<Vec<Account>> {
    if !accounts_file.exists() {
        anyhow::bail!("账号文件不存在: {}", accounts_file.display());
    }

    let content = fs::read_to_string(accounts_file)
        .await
        .with_context(|| format!("无法读取账号文件: {}", accounts_file.display()))?;

    let list: AccountList = toml::from_str(&content)
        .with_context(|| format!("无法解析账号文件: {}", accounts_file.display()))?;

    let total = list.accounts.len();
    let accounts: Vec<Account> = list
        .accounts
        .into_iter()
        .filter(|account| {
            let keep = !account.credentials.username.trim().is_empty();
            if !keep {
                tracing::warn!("跳过用户名为空的账号条目");
            }
            keep
        })
        .collect();

    tracing::info!(
        "从 {} 加载 {}/{} 个账号",
        accounts_file
            .file_name()
            .unwrap_or_default()
            .to_string_lossy(),
        accounts.len(),
        total
    );

    Ok(accounts)
}
