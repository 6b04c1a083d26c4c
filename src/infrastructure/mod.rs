//! 基础设施层
//!
//! 持有稀缺资源（Browser / Page），只向上暴露 `PortalDriver` 能力

pub mod chromium_driver;
pub mod driver;

pub use chromium_driver::{ChromiumDriver, ChromiumDriverFactory, ChromiumPopup};
pub use driver::{DriverFactory, FramePath, PopupPage, PortalDriver, Target};
