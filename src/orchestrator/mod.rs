//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `session_orchestrator` - 单个请求
//! - 为请求创建独立的 `PortalSession`
//! - 登录 → 抓取 → 关闭，关闭在任何退出路径上都会执行
//! - 把原始行转换为 `CourseRecord`
//!
//! ### `batch_processor` - 批量账号
//! - 管理应用生命周期（初始化、运行）
//! - 控制并发数量（Semaphore）
//! - 输出结果文件与全局统计
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Account>)
//!     ↓
//! session_orchestrator (处理单个请求)
//!     ↓
//! portal::PortalSession (登录状态机 + 抓取)
//!     ↓                ↘
//! infrastructure      captcha / schedule / models
//! ```

pub mod batch_processor;
pub mod session_orchestrator;

pub use batch_processor::{AccountReport, App};
pub use session_orchestrator::SessionOrchestrator;
