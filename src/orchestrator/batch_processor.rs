//! 批量账号处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量账号的处理和资源管理。
//!
//! 1. **应用初始化**：加载字形模板，创建驱动工厂与 `SessionOrchestrator`
//! 2. **批量加载**：读取账号列表（`Vec<Account>`）
//! 3. **并发控制**：使用 Semaphore 限制同时打开的浏览器数量
//! 4. **分批处理**：每批完成后再开始下一批
//! 5. **结果落盘**：每个账号一个 JSON 文件
//! 6. **全局统计**：汇总所有账号的处理结果

use crate::captcha::{CaptchaProfile, CaptchaResolver, TemplateClassifier};
use crate::config::Config;
use crate::infrastructure::ChromiumDriverFactory;
use crate::models::{load_accounts, Account, AccountTask, CourseRecord, StudentInfo};
use crate::orchestrator::SessionOrchestrator;
use crate::utils::logging::{
    log_accounts_loaded, log_batch_complete, log_batch_start, log_startup, print_final_stats,
};
use crate::workflow::SessionCtx;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

type Orchestrator = SessionOrchestrator<ChromiumDriverFactory, TemplateClassifier>;

/// 单个账号的输出
#[derive(Debug, Serialize)]
#[serde(tag = "task", content = "data", rename_all = "snake_case")]
pub enum AccountReport {
    Courses(Vec<CourseRecord>),
    StudentInfo(StudentInfo),
}

/// 应用主结构
pub struct App {
    config: Config,
    orchestrator: Arc<Orchestrator>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(config.max_concurrent_sessions, &config.portal_url);

        let profile = CaptchaProfile::default();
        let classifier = TemplateClassifier::from_file(&config.classifier_model_path, profile.glyph_side)
            .with_context(|| format!("无法加载字形模板: {}", config.classifier_model_path))?;
        info!("✓ 已加载 {} 个字形模板", classifier.len());

        let resolver = Arc::new(CaptchaResolver::with_profile(classifier, profile));
        let factory = ChromiumDriverFactory::new(config.browser_settings());
        let orchestrator = SessionOrchestrator::new(factory, resolver, config.session_settings());

        Ok(Self {
            config,
            orchestrator: Arc::new(orchestrator),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let accounts = load_accounts(Path::new(&self.config.accounts_file)).await?;

        if accounts.is_empty() {
            warn!("⚠️ 没有找到待处理的账号，程序结束");
            return Ok(());
        }

        log_accounts_loaded(accounts.len(), self.max_concurrent());

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .with_context(|| format!("无法创建输出目录: {}", self.config.output_dir))?;

        let stats = self.process_all_accounts(accounts).await?;

        print_final_stats(stats.success, stats.failed, stats.total, &self.config.output_dir);

        Ok(())
    }

    fn max_concurrent(&self) -> usize {
        self.config.max_concurrent_sessions.max(1)
    }

    /// 处理所有账号
    async fn process_all_accounts(&self, accounts: Vec<Account>) -> Result<ProcessingStats> {
        let max_concurrent = self.max_concurrent();
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let total = accounts.len();
        let mut stats = ProcessingStats {
            total,
            ..Default::default()
        };

        // 分批处理
        let total_batches = total.div_ceil(max_concurrent);
        for (batch_idx, batch) in accounts.chunks(max_concurrent).enumerate() {
            let batch_start = batch_idx * max_concurrent;
            let batch_num = batch_idx + 1;

            log_batch_start(batch_num, total_batches, batch_start + 1, batch_start + batch.len(), total);

            let batch_result = self.process_batch(batch, batch_start, semaphore.clone()).await?;

            stats.success += batch_result.success;
            stats.failed += batch_result.failed;

            log_batch_complete(batch_num, batch_result.success, batch_result.success + batch_result.failed);
        }

        Ok(stats)
    }

    /// 处理单个批次
    async fn process_batch(
        &self,
        batch: &[Account],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<BatchResult> {
        let mut handles = Vec::new();

        for (idx, account) in batch.iter().enumerate() {
            let request_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;

            let orchestrator = Arc::clone(&self.orchestrator);
            let account = account.clone();
            let output_dir = PathBuf::from(&self.config.output_dir);

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let ctx = SessionCtx::new(request_index, account.credentials.username.clone());
                match process_account(&orchestrator, &account, ctx.clone(), &output_dir).await {
                    Ok(path) => {
                        info!("{} ✅ 结果已写入 {}", ctx, path.display());
                        true
                    }
                    Err(e) => {
                        error!("{} ❌ 处理失败: {:#}", ctx, e);
                        false
                    }
                }
            });
            handles.push((request_index, handle));
        }

        // 等待本批所有任务完成
        let mut result = BatchResult::default();

        for (request_index, handle) in handles {
            match handle.await {
                Ok(true) => result.success += 1,
                Ok(false) => result.failed += 1,
                Err(e) => {
                    error!("[会话 #{}] 任务执行失败: {}", request_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }
}

/// 执行账号对应的任务并写出结果文件
async fn process_account(
    orchestrator: &Orchestrator,
    account: &Account,
    ctx: SessionCtx,
    output_dir: &Path,
) -> Result<PathBuf> {
    let file_name = report_file_name(&ctx);
    let report = match account.task {
        AccountTask::Courses => {
            AccountReport::Courses(orchestrator.fetch_courses(ctx, &account.credentials).await?)
        }
        AccountTask::StudentInfo => AccountReport::StudentInfo(
            orchestrator.fetch_student_info(ctx, &account.credentials).await?,
        ),
    };

    let path = output_dir.join(file_name);
    write_report(&path, &report).await?;
    Ok(path)
}

/// 结果文件名：账号中除字母、数字、`-`、`_` 之外的字符替换为 `_`，
/// 替换后没有有效字符时使用请求序号
fn report_file_name(ctx: &SessionCtx) -> String {
    let stem: String = ctx
        .username
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if stem.trim_matches('_').is_empty() {
        format!("account_{}.json", ctx.request_index)
    } else {
        format!("{}.json", stem)
    }
}

async fn write_report(path: &Path, report: &AccountReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("无法写入结果文件: {}", path.display()))?;
    Ok(())
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_file_name_stays_inside_output_dir() {
        assert_eq!(report_file_name(&SessionCtx::new(1, " 4001234567 ")), "4001234567.json");
        assert_eq!(report_file_name(&SessionCtx::new(2, "../../etc/passwd")), "______etc_passwd.json");
        assert_eq!(report_file_name(&SessionCtx::new(3, "a\\b")), "a_b.json");
        assert_eq!(report_file_name(&SessionCtx::new(4, "..")), "account_4.json");
        assert_eq!(report_file_name(&SessionCtx::new(5, "/")), "account_5.json");

        let path = Path::new("output").join(report_file_name(&SessionCtx::new(6, "x/../../y")));
        assert_eq!(path.parent(), Some(Path::new("output")));
    }

    #[tokio::test]
    async fn report_is_tagged_by_task() {
        let path = std::env::temp_dir().join(format!("golestan_sync_report_{}.json", std::process::id()));
        let report = AccountReport::StudentInfo(StudentInfo::new("4001", "علی", "کامپیوتر", "فنی"));
        write_report(&path, &report).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(written["task"], "student_info");
        assert_eq!(written["data"]["student_number"], "4001");
    }
}
