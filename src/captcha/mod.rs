//! 验证码识别
//!
//! 纯函数式管线，除注入的分类器外没有任何共享状态：
//! `CaptchaImage` → 分割 (`segmentation`) → 归一化 (`glyph`) → 分类 (`classifier`) → `CaptchaCode`

pub mod classifier;
pub mod glyph;
pub mod raster;
pub mod profile;
pub mod resolver;
pub mod segmentation;

pub use classifier::{GlyphClassifier, TemplateClassifier};
pub use glyph::GlyphBitmap;
pub use raster::{BinaryGrid, CaptchaImage};
pub use profile::{CaptchaProfile, EraseBand};
pub use resolver::{CaptchaCode, CaptchaResolver};
pub use segmentation::GlyphCandidate;
