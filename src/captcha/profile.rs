/// 一条需要在分割前擦除的固定装饰带（半开区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraseBand {
    pub rows: (u32, u32),
    pub cols: (u32, u32),
}

/// 验证码求解参数
///
/// `Default` 即门户验证码的固定参数。
#[derive(Debug, Clone, PartialEq)]
pub struct CaptchaProfile {
    /// 求解前截图被缩放到的尺寸 (宽, 高)
    pub canonical_size: (u32, u32),
    /// 固定装饰带
    pub erase_bands: Vec<EraseBand>,
    /// 二值化阈值 = 平均灰度 - margin
    pub threshold_margin: f64,
    /// 去噪轮数
    pub denoise_passes: usize,
    /// 前景像素至少需要的 8 邻域前景数
    pub min_neighbors: usize,
    /// 投影分割时一个截面至少需要的前景像素数
    pub projection_min: usize,
    /// 候选块最少行数
    pub min_rows: usize,
    /// 候选块最少列数
    pub min_cols: usize,
    /// 候选块最少前景像素数
    pub min_foreground: usize,
    /// 归一化位图边长
    pub glyph_side: u32,
}

impl Default for CaptchaProfile {
    fn default() -> Self {
        Self {
            canonical_size: (140, 50),
            erase_bands: vec![
                EraseBand { rows: (46, 50), cols: (45, 80) },
                EraseBand { rows: (46, 50), cols: (85, 95) },
                EraseBand { rows: (46, 50), cols: (100, 140) },
            ],
            threshold_margin: 5.0,
            denoise_passes: 3,
            min_neighbors: 4,
            projection_min: 2,
            min_rows: 6,
            min_cols: 3,
            min_foreground: 15,
            glyph_side: 32,
        }
    }
}
