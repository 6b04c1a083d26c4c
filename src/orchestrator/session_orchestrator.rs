//! 单个请求的编排
//!
//! 每个请求独占一个 `PortalSession`：打开驱动 → 登录 → 抓取 → 关闭。
//! 无论成功还是出错都会关闭会话；关闭失败只记录日志，不覆盖原来的结果。

use std::sync::Arc;

use tracing::{info, warn};

use crate::captcha::{CaptchaResolver, GlyphClassifier};
use crate::config::SessionSettings;
use crate::error::AppResult;
use crate::infrastructure::driver::DriverFactory;
use crate::models::{CourseRecord, Credentials, RawRecordRow, StudentInfo};
use crate::portal::PortalSession;
use crate::schedule::ScheduleTextParser;
use crate::workflow::SessionCtx;

type Session<F, C> = PortalSession<<F as DriverFactory>::Driver, C>;

/// 会话编排器
///
/// 可以被多个任务共享（`Arc`），每次调用都创建独立的会话，彼此之间没有共享的可变状态。
pub struct SessionOrchestrator<F: DriverFactory, C: GlyphClassifier> {
    factory: F,
    resolver: Arc<CaptchaResolver<C>>,
    settings: SessionSettings,
    parser: ScheduleTextParser,
}

impl<F: DriverFactory, C: GlyphClassifier> SessionOrchestrator<F, C> {
    pub fn new(factory: F, resolver: Arc<CaptchaResolver<C>>, settings: SessionSettings) -> Self {
        Self {
            factory,
            resolver,
            settings,
            parser: ScheduleTextParser::new(),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// 登录并抓取课程报表
    ///
    /// 字段数不足的行记录警告后跳过，不影响其余行。
    pub async fn fetch_courses(
        &self,
        ctx: SessionCtx,
        credentials: &Credentials,
    ) -> AppResult<Vec<CourseRecord>> {
        credentials.validate()?;
        let mut session = self.open_session(ctx.clone()).await?;

        let result = Self::login_and_extract(&mut session, credentials).await;
        let rows = Self::finish(&mut session, result).await?;

        let records = self.to_records(&ctx, &rows);
        info!("{} ✓ 解析出 {}/{} 门课程", ctx, records.len(), rows.len());
        Ok(records)
    }

    /// 登录并读取学生综合信息
    pub async fn fetch_student_info(
        &self,
        ctx: SessionCtx,
        credentials: &Credentials,
    ) -> AppResult<StudentInfo> {
        credentials.validate()?;
        let mut session = self.open_session(ctx).await?;

        let result = Self::login_and_read_student(&mut session, credentials).await;
        Self::finish(&mut session, result).await
    }

    /// 驱动创建失败时直接返回错误（没有需要释放的资源）
    async fn open_session(&self, ctx: SessionCtx) -> AppResult<Session<F, C>> {
        let driver = self.factory.open(&ctx).await?;
        Ok(PortalSession::new(
            driver,
            Arc::clone(&self.resolver),
            self.settings.clone(),
            ctx,
        ))
    }

    async fn login_and_extract(
        session: &mut Session<F, C>,
        credentials: &Credentials,
    ) -> AppResult<Vec<RawRecordRow>> {
        session.login(credentials).await?;
        session.extract_records().await
    }

    async fn login_and_read_student(
        session: &mut Session<F, C>,
        credentials: &Credentials,
    ) -> AppResult<StudentInfo> {
        session.login(credentials).await?;
        session.extract_student_info().await
    }

    /// 关闭会话后原样返回 `result`
    async fn finish<T>(session: &mut Session<F, C>, result: AppResult<T>) -> AppResult<T> {
        if let Err(e) = session.close().await {
            warn!("{} 关闭会话失败: {}", session.ctx(), e);
        }
        result
    }

    fn to_records(&self, ctx: &SessionCtx, rows: &[RawRecordRow]) -> Vec<CourseRecord> {
        rows.iter()
            .enumerate()
            .filter_map(|(index, row)| match CourseRecord::from_raw(row, &self.parser) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("{} 跳过第 {} 行: {}", ctx, index + 1, e);
                    None
                }
            })
            .collect()
    }
}
