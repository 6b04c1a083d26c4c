//! 候选字符归一化

use image::imageops::{self, FilterType};

use crate::captcha::segmentation::GlyphCandidate;

/// 归一化后的定长位图（边长 `side`，按行展开，元素为 0/1）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphBitmap {
    side: u32,
    bits: Vec<u8>,
}

impl GlyphBitmap {
    /// 从展开的 0/1 序列构造，长度必须是 `side * side`
    pub fn from_bits(side: u32, bits: Vec<u8>) -> Option<Self> {
        if bits.len() != (side * side) as usize || bits.iter().any(|&b| b > 1) {
            return None;
        }
        Some(Self { side, bits })
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    /// 特征向量
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// 与另一个位图不同的像素数
    pub fn hamming(&self, other: &[u8]) -> usize {
        self.bits.iter().zip(other).filter(|(a, b)| a != b).count()
    }
}

/// 抗锯齿缩放到 `side × side`，再以 128 为阈值二值化
pub fn normalize(candidate: &GlyphCandidate, side: u32) -> GlyphBitmap {
    let luma = candidate.mask.to_luma();
    let resized = imageops::resize(&luma, side, side, FilterType::Lanczos3);
    let bits = resized
        .pixels()
        .map(|p| u8::from(p.0[0] >= 128))
        .collect();
    GlyphBitmap { side, bits }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captcha::raster::BinaryGrid;

    #[test]
    fn normalized_bitmap_has_fixed_length() {
        let mut mask = BinaryGrid::new(7, 18);
        for y in 0..18 {
            for x in 2..5 {
                mask.set(x, y, true);
            }
        }
        let candidate = GlyphCandidate { x: 0, y: 0, mask };

        let bitmap = normalize(&candidate, 32);
        assert_eq!(bitmap.bits().len(), 1024);
        // 竖线居中，中心像素为前景，左右边缘为背景
        assert_eq!(bitmap.bits()[16 * 32 + 16], 1);
        assert_eq!(bitmap.bits()[16 * 32], 0);
        assert_eq!(bitmap.bits()[16 * 32 + 31], 0);
    }

    #[test]
    fn from_bits_rejects_wrong_shape() {
        assert!(GlyphBitmap::from_bits(2, vec![0, 1, 1, 0]).is_some());
        assert!(GlyphBitmap::from_bits(2, vec![0, 1, 1]).is_none());
        assert!(GlyphBitmap::from_bits(2, vec![0, 1, 2, 0]).is_none());
    }
}
