//! 门户会话 - 状态机
//!
//! 一个 `PortalSession` 独占一个驱动（即一个浏览器页面）。所有状态变化都经过
//! `transition`，非法迁移会返回 `SessionError`。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::captcha::{CaptchaResolver, GlyphClassifier};
use crate::config::SessionSettings;
use crate::error::{AppResult, CaptchaError, LoginError, NavigationError, RetryReason, SessionError};
use crate::infrastructure::driver::{PopupPage, PortalDriver, Target};
use crate::models::{Credentials, RawRecordRow, StudentInfo};
use crate::portal::outcome::LoginOutcome;
use crate::portal::selectors as sel;
use crate::portal::state::SessionState;
use crate::utils::truncate_text;
use crate::workflow::{RetryDecision, RetryPolicy, SessionCtx};

/// 连续点击 "学生综合信息" 菜单之间的间隔
const MENU_CLICK_GAP: Duration = Duration::from_millis(500);

/// 门户会话
pub struct PortalSession<D: PortalDriver, C: GlyphClassifier> {
    driver: D,
    resolver: Arc<CaptchaResolver<C>>,
    settings: SessionSettings,
    policy: RetryPolicy,
    state: SessionState,
    ctx: SessionCtx,
    attempts: usize,
}

impl<D: PortalDriver, C: GlyphClassifier> PortalSession<D, C> {
    pub fn new(
        driver: D,
        resolver: Arc<CaptchaResolver<C>>,
        settings: SessionSettings,
        ctx: SessionCtx,
    ) -> Self {
        Self {
            driver,
            resolver,
            policy: RetryPolicy::from_settings(&settings),
            settings,
            state: SessionState::Unauthenticated,
            ctx,
            attempts: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 已经进行的登录尝试次数
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn ctx(&self) -> &SessionCtx {
        &self.ctx
    }

    fn transition(&mut self, next: SessionState) -> AppResult<()> {
        let from = self.state;
        self.state = from.transition(next)?;
        debug!("{} 状态: {} -> {}", self.ctx, from.name(), next.name());
        Ok(())
    }

    fn require_authenticated(&self) -> AppResult<()> {
        match self.state {
            SessionState::Authenticated => Ok(()),
            SessionState::Closed => Err(SessionError::Closed.into()),
            other => Err(SessionError::NotAuthenticated { state: other.name() }.into()),
        }
    }

    // ========== 登录 ==========

    /// 登录，直到成功、遇到致命错误或验证码重试次数用完
    ///
    /// 只有验证码错误（包括无法识别）会重试，每次重试都重新加载登录页以获取新的验证码。
    pub async fn login(&mut self, credentials: &Credentials) -> AppResult<()> {
        credentials.validate()?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.attempts = attempt;

            let outcome = self.attempt_login(credentials).await?;
            match self.policy.decide(&outcome, attempt) {
                RetryDecision::Proceed => {
                    info!("{} ✓ 登录成功 (第 {} 次尝试)", self.ctx, attempt);
                    return Ok(());
                }
                RetryDecision::Retry => {
                    if let LoginOutcome::RetryableFailure { reason } = &outcome {
                        warn!(
                            "{} 第 {}/{} 次登录失败: {}, 重新获取验证码",
                            self.ctx,
                            attempt,
                            self.policy.max_attempts(),
                            reason
                        );
                    }
                }
                RetryDecision::Abort(err) => {
                    self.log_abort(&err);
                    if matches!(err, LoginError::RetriesExhausted { .. }) {
                        self.transition(SessionState::RetriesExhausted)?;
                    }
                    return Err(err.into());
                }
            }
        }
    }

    fn log_abort(&self, err: &LoginError) {
        match err {
            LoginError::WrongCredentials => warn!("{} ❌ 用户名或密码错误, 不再重试", self.ctx),
            LoginError::AmbiguousOutcome { polls } => error!(
                "{} ⚠️ 门户在 {} 次轮询后仍无响应 (Unknown), 按失败处理",
                self.ctx, polls
            ),
            other => error!("{} ❌ {}", self.ctx, other),
        }
    }

    /// 完整执行一次登录尝试并返回结果
    pub async fn attempt_login(&mut self, credentials: &Credentials) -> AppResult<LoginOutcome> {
        self.transition(SessionState::AwaitingCaptcha)?;

        self.driver.goto(&self.settings.portal_url).await?;
        self.driver.wait_for_load(self.settings.page_load_timeout).await?;
        self.driver
            .wait_for_visible(sel::CAPTCHA_IMAGE, self.settings.element_timeout)
            .await?;

        let screenshot = self.driver.screenshot(sel::CAPTCHA_IMAGE).await?;
        let code = match self.resolver.solve_screenshot(&screenshot) {
            Ok(code) => code,
            Err(CaptchaError::UnsolvableImage { width, height }) => {
                debug!("{} 验证码无法分割 ({}x{})", self.ctx, width, height);
                return self.reject_captcha(RetryReason::UnsolvableCaptcha);
            }
            Err(CaptchaError::Classifier(e)) => {
                return self.reject_captcha(RetryReason::ClassifierFailed(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        debug!("{} 验证码识别结果: {}", self.ctx, code);

        self.driver.fill(sel::USERNAME_INPUT, &credentials.username).await?;
        self.driver.fill(sel::PASSWORD_INPUT, &credentials.password).await?;
        self.driver.fill(sel::CAPTCHA_INPUT, code.as_str()).await?;
        self.driver.click(sel::LOGIN_BUTTON).await?;
        self.transition(SessionState::Submitted)?;

        let outcome = self.poll_outcome().await?;
        let next = match &outcome {
            LoginOutcome::Success => SessionState::Authenticated,
            LoginOutcome::RetryableFailure { .. } => SessionState::CaptchaRejected,
            LoginOutcome::FatalFailure { .. } => SessionState::CredentialsRejected,
            LoginOutcome::Unknown => SessionState::Unknown,
        };
        self.transition(next)?;
        Ok(outcome)
    }

    fn reject_captcha(&mut self, reason: RetryReason) -> AppResult<LoginOutcome> {
        self.transition(SessionState::CaptchaRejected)?;
        Ok(LoginOutcome::RetryableFailure { reason })
    }

    /// 轮询登录结果：出现第二个工作页即成功；错误提示中出现已知文本即失败
    async fn poll_outcome(&mut self) -> AppResult<LoginOutcome> {
        for _ in 0..self.settings.login_poll_attempts {
            if self.driver.count(sel::SECOND_PAGE).await? > 0 {
                return Ok(LoginOutcome::Success);
            }

            let message = self
                .driver
                .attribute(sel::ERROR_TEXT, sel::ERROR_TEXT_ATTRIBUTE)
                .await?;
            if let Some(outcome) = message.as_deref().and_then(LoginOutcome::from_error_message) {
                return Ok(outcome);
            }

            sleep(self.settings.login_poll_interval).await;
        }
        Ok(LoginOutcome::Unknown)
    }

    // ========== 登录后的抓取 ==========

    /// 查询课程报表并导出，返回去掉表头后的所有行
    pub async fn extract_records(&mut self) -> AppResult<Vec<RawRecordRow>> {
        self.require_authenticated()?;
        let timeout = self.settings.element_timeout;

        self.driver.wait_for_load(self.settings.page_load_timeout).await?;
        self.driver.wait_for_visible(sel::REPORT_CODE_INPUT, timeout).await?;
        self.driver
            .fill(sel::REPORT_CODE_INPUT, &self.settings.course_report_code)
            .await?;
        self.driver.wait_for_visible(sel::REPORT_OK_BUTTON, timeout).await?;

        self.advance("报表查询", sel::REPORT_OK_BUTTON, sel::THIRD_PAGE).await?;
        info!("{} 已进入课程报表页", self.ctx);

        self.driver.wait_for_visible(sel::EXPORT_BUTTON, timeout).await?;
        let mut popup = self
            .driver
            .click_expect_popup(sel::EXPORT_BUTTON, self.settings.page_load_timeout)
            .await?;

        let rows = Self::read_export(&mut popup, self.settings.page_load_timeout).await;
        if let Err(e) = popup.close().await {
            warn!("{} 关闭导出窗口失败: {}", self.ctx, e);
        }
        let rows = rows?;

        let records: Vec<RawRecordRow> = rows
            .iter()
            .skip(1)
            .map(|line| RawRecordRow::from_tab_separated(line))
            .collect();

        if let Some(first) = rows.get(1) {
            debug!("{} 第一行: {}", self.ctx, truncate_text(first, 80));
        }
        info!("{} ✓ 导出 {} 行课程数据", self.ctx, records.len());
        Ok(records)
    }

    async fn read_export(popup: &mut D::Popup, timeout: Duration) -> AppResult<Vec<String>> {
        popup.wait_for_selector(sel::EXPORT_TABLE, timeout).await?;
        popup.inner_texts_in_first(sel::EXPORT_TABLE, sel::EXPORT_ROWS).await
    }

    /// 点击 `button` 直到 `next_page` 出现
    ///
    /// 门户偶尔会忽略第一次点击，因此在次数上限内反复点击。
    async fn advance(&mut self, step: &'static str, button: Target, next_page: Target) -> AppResult<()> {
        let attempts = self.settings.navigation_attempts;
        for attempt in 1..=attempts {
            if self.driver.count(next_page).await? > 0 {
                return Ok(());
            }
            debug!("{} 步骤 '{}' 第 {} 次点击", self.ctx, step, attempt);
            self.driver.click(button).await?;
            sleep(self.settings.navigation_interval).await;
        }

        if self.driver.count(next_page).await? > 0 {
            return Ok(());
        }
        error!("{} 步骤 '{}' 在 {} 次点击后仍未前进", self.ctx, step, attempts);
        Err(NavigationError::StepDidNotAdvance { step, attempts }.into())
    }

    /// 打开 "学生综合信息" 并读取学号、姓名、专业、学院
    pub async fn extract_student_info(&mut self) -> AppResult<StudentInfo> {
        self.require_authenticated()?;
        let timeout = self.settings.element_timeout;

        self.driver.wait_for_visible(sel::STUDENT_INFO_MENU, timeout).await?;
        self.driver.click(sel::STUDENT_INFO_MENU).await?;
        sleep(MENU_CLICK_GAP).await;
        self.driver.click(sel::STUDENT_INFO_MENU).await?;

        for field in [
            sel::STUDENT_NAME,
            sel::STUDENT_NUMBER,
            sel::STUDENT_MAJOR,
            sel::STUDENT_FACULTY,
        ] {
            self.driver.wait_for_visible(field, timeout).await?;
        }

        let full_name = self.driver.text_content(sel::STUDENT_NAME).await?;
        let student_number = self.driver.input_value(sel::STUDENT_NUMBER).await?;
        let major = self.driver.text_content(sel::STUDENT_MAJOR).await?;
        let faculty = self.driver.text_content(sel::STUDENT_FACULTY).await?;

        let info = StudentInfo::new(
            student_number.unwrap_or_default(),
            full_name.unwrap_or_default(),
            major.unwrap_or_default(),
            faculty.unwrap_or_default(),
        );
        info!("{} ✓ 已读取学生信息: {}", self.ctx, info.student_number);
        Ok(info)
    }

    // ========== 释放 ==========

    /// 释放浏览器资源，重复调用不会再次关闭驱动
    pub async fn close(&mut self) -> AppResult<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.transition(SessionState::Closed)?;
        self.driver.close().await
    }
}

