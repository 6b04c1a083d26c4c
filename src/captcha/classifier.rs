//! 字形分类器
//!
//! 分类器作为外部依赖注入到 `CaptchaResolver`，本模块只定义接口，
//! 并提供基于模板的最近邻实现（模板文件由离线训练产出）。

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::captcha::glyph::GlyphBitmap;
use crate::error::ClassifierError;

/// 字形分类器
///
/// 批量预测，每个输入位图对应一个字符，保持输入顺序。
pub trait GlyphClassifier: Send + Sync {
    fn predict(&self, bitmaps: &[GlyphBitmap]) -> Result<Vec<char>, ClassifierError>;
}

impl<T: GlyphClassifier + ?Sized> GlyphClassifier for std::sync::Arc<T> {
    fn predict(&self, bitmaps: &[GlyphBitmap]) -> Result<Vec<char>, ClassifierError> {
        (**self).predict(bitmaps)
    }
}

#[derive(Debug, Deserialize)]
struct TemplateFile {
    templates: Vec<TemplateEntry>,
}

#[derive(Debug, Deserialize)]
struct TemplateEntry {
    label: String,
    /// 按行展开的 0/1 字符串
    bitmap: String,
}

#[derive(Debug, Clone)]
struct Template {
    label: char,
    bits: Vec<u8>,
}

/// 模板最近邻分类器
///
/// 按汉明距离选择最接近的模板；距离相同时取文件中靠前的模板。
#[derive(Debug, Clone)]
pub struct TemplateClassifier {
    side: u32,
    templates: Vec<Template>,
}

impl TemplateClassifier {
    /// 从 JSON 文本加载
    pub fn from_json_str(json: &str, side: u32) -> Result<Self, ClassifierError> {
        let file: TemplateFile = serde_json::from_str(json).map_err(|e| ClassifierError::ModelLoadFailed {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })?;

        let expected = (side * side) as usize;
        let mut templates = Vec::with_capacity(file.templates.len());
        for entry in file.templates {
            let mut chars = entry.label.chars();
            let label = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(ClassifierError::Failed(format!(
                        "模板标签必须是单个字符: {:?}",
                        entry.label
                    )))
                }
            };
            let bits: Vec<u8> = entry
                .bitmap
                .chars()
                .map(|c| match c {
                    '0' => Ok(0),
                    '1' => Ok(1),
                    other => Err(ClassifierError::Failed(format!("模板位图包含非法字符: {:?}", other))),
                })
                .collect::<Result<_, _>>()?;
            if bits.len() != expected {
                return Err(ClassifierError::FeatureLength {
                    expected,
                    actual: bits.len(),
                });
            }
            templates.push(Template { label, bits });
        }

        if templates.is_empty() {
            return Err(ClassifierError::EmptyModel);
        }
        debug!("已加载 {} 个字形模板", templates.len());
        Ok(Self { side, templates })
    }

    /// 从模板文件加载
    pub fn from_file(path: impl AsRef<Path>, side: u32) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ClassifierError::ModelLoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&content, side).map_err(|e| match e {
            ClassifierError::ModelLoadFailed { reason, .. } => ClassifierError::ModelLoadFailed {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl GlyphClassifier for TemplateClassifier {
    fn predict(&self, bitmaps: &[GlyphBitmap]) -> Result<Vec<char>, ClassifierError> {
        let expected = (self.side * self.side) as usize;
        bitmaps
            .iter()
            .map(|bitmap| {
                if bitmap.bits().len() != expected {
                    return Err(ClassifierError::FeatureLength {
                        expected,
                        actual: bitmap.bits().len(),
                    });
                }
                self.templates
                    .iter()
                    .min_by_key(|t| bitmap.hamming(&t.bits))
                    .map(|t| t.label)
                    .ok_or(ClassifierError::EmptyModel)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_json() -> String {
        // 2x2 的迷你模板
        r#"{"templates":[
            {"label":"1","bitmap":"0101"},
            {"label":"7","bitmap":"1101"},
            {"label":"-","bitmap":"1100"}
        ]}"#
        .to_string()
    }

    #[test]
    fn predicts_nearest_template_in_order() {
        let classifier = TemplateClassifier::from_json_str(&model_json(), 2).unwrap();
        let inputs = vec![
            GlyphBitmap::from_bits(2, vec![1, 1, 0, 0]).unwrap(),
            GlyphBitmap::from_bits(2, vec![0, 1, 0, 1]).unwrap(),
            GlyphBitmap::from_bits(2, vec![1, 1, 1, 1]).unwrap(),
        ];
        assert_eq!(classifier.predict(&inputs).unwrap(), vec!['-', '1', '7']);
    }

    #[test]
    fn rejects_templates_of_wrong_length() {
        let json = r#"{"templates":[{"label":"a","bitmap":"010"}]}"#;
        assert!(matches!(
            TemplateClassifier::from_json_str(json, 2),
            Err(ClassifierError::FeatureLength { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn rejects_empty_model() {
        let json = r#"{"templates":[]}"#;
        assert!(matches!(
            TemplateClassifier::from_json_str(json, 2),
            Err(ClassifierError::EmptyModel)
        ));
    }

    #[test]
    fn bitmap_of_wrong_side_is_an_error() {
        let classifier = TemplateClassifier::from_json_str(&model_json(), 2).unwrap();
        let input = GlyphBitmap::from_bits(1, vec![1]).unwrap();
        assert!(classifier.predict(&[input]).is_err());
    }
}
