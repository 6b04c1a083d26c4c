//! 验证码求解器
//!
//! 图片 → 字符序列。给定相同图片与分类器，结果确定；内部不重试，重试由调用方决定。

use std::fmt;

use tracing::debug;

use crate::captcha::classifier::GlyphClassifier;
use crate::captcha::glyph::{normalize, GlyphBitmap};
use crate::captcha::raster::CaptchaImage;
use crate::captcha::profile::CaptchaProfile;
use crate::captcha::segmentation::{segment, GlyphCandidate};
use crate::error::{CaptchaError, ClassifierError};

/// 求解结果，字符数等于分割出的候选字符数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaCode(String);

impl CaptchaCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 字符个数
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CaptchaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 验证码求解器
pub struct CaptchaResolver<C> {
    classifier: C,
    profile: CaptchaProfile,
}

impl<C: GlyphClassifier> CaptchaResolver<C> {
    /// 使用门户默认参数
    pub fn new(classifier: C) -> Self {
        Self::with_profile(classifier, CaptchaProfile::default())
    }

    pub fn with_profile(classifier: C, profile: CaptchaProfile) -> Self {
        Self { classifier, profile }
    }

    pub fn profile(&self) -> &CaptchaProfile {
        &self.profile
    }

    /// 分割得到候选字符（按从左到右、从上到下的顺序）
    pub fn candidates(&self, image: &CaptchaImage) -> Vec<GlyphCandidate> {
        segment(&image.to_gray(), &self.profile)
    }

    /// 求解验证码
    pub fn solve(&self, image: &CaptchaImage) -> Result<CaptchaCode, CaptchaError> {
        let candidates = self.candidates(image);
        if candidates.is_empty() {
            return Err(CaptchaError::UnsolvableImage {
                width: image.width(),
                height: image.height(),
            });
        }

        let bitmaps: Vec<GlyphBitmap> = candidates
            .iter()
            .map(|c| normalize(c, self.profile.glyph_side))
            .collect();

        let predictions = self.classifier.predict(&bitmaps)?;
        if predictions.len() != bitmaps.len() {
            return Err(ClassifierError::PredictionCount {
                expected: bitmaps.len(),
                actual: predictions.len(),
            }
            .into());
        }

        let code = CaptchaCode(predictions.into_iter().collect());
        debug!("验证码识别结果: {} ({} 个字符)", code, code.len());
        Ok(code)
    }

    /// 解码截图并求解
    pub fn solve_screenshot(&self, bytes: &[u8]) -> Result<CaptchaCode, CaptchaError> {
        let image = CaptchaImage::from_screenshot(bytes, &self.profile)?;
        self.solve(&image)
    }
}
