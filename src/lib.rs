//! # Golestan Sync
//!
//! 登录 Golestan 教务门户（带验证码），抓取并结构化课程 / 考试安排
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Browser / Page），只暴露能力
//! - `PortalDriver` - frame 内定位、截图、填写、点击、等待、弹窗
//! - `ChromiumDriver` - 基于 chromiumoxide 的实现
//!
//! ### ② 纯能力层（Capabilities）
//! - `captcha/` - 验证码分割与识别（`CaptchaResolver`，分类器由外部注入）
//! - `schedule/` - 波斯文上课时间 / 考试时间解析（`ScheduleTextParser`）
//! - `models/` - 课程记录、学生信息、账号
//!
//! ### ③ 会话层（Portal / Workflow）
//! - `portal/` - `PortalSession` 状态机：登录、导出报表、读取学生信息
//! - `workflow/` - `RetryPolicy`（只对验证码错误重试）与 `SessionCtx`
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session_orchestrator` - 单个请求，保证会话关闭
//! - `orchestrator/batch_processor` - 批量账号，管理并发
//!
//! ## 模块结构

pub mod browser;
pub mod captcha;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod portal;
pub mod schedule;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use captcha::{CaptchaCode, CaptchaImage, CaptchaResolver, GlyphClassifier, TemplateClassifier};
pub use config::{Config, SessionSettings};
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromiumDriver, ChromiumDriverFactory, DriverFactory, PortalDriver};
pub use models::{ClassSession, CourseRecord, Credentials, ExamSlot, RawRecordRow, StudentInfo};
pub use orchestrator::{App, SessionOrchestrator};
pub use portal::{LoginOutcome, PortalSession, SessionState};
pub use schedule::{ScheduleTextParser, Weekday};
pub use workflow::{RetryPolicy, SessionCtx};
