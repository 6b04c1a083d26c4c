//! 验证码分割
//!
//! 灰度 → 擦除装饰带 → 自适应二值化 → 去噪 → 先列后行的投影分割 → 过滤碎片

use image::GrayImage;

use crate::captcha::raster::BinaryGrid;
use crate::captcha::profile::CaptchaProfile;

/// 分割得到的候选字符
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphCandidate {
    /// 在原图中的左上角列
    pub x: usize,
    /// 在原图中的左上角行
    pub y: usize,
    /// 候选区域的二值掩码
    pub mask: BinaryGrid,
}

impl GlyphCandidate {
    pub fn width(&self) -> usize {
        self.mask.width()
    }

    pub fn height(&self) -> usize {
        self.mask.height()
    }
}

/// 擦除固定装饰带（置为白色）
pub fn erase_bands(gray: &mut GrayImage, profile: &CaptchaProfile) {
    let (w, h) = gray.dimensions();
    for band in &profile.erase_bands {
        for y in band.rows.0.min(h)..band.rows.1.min(h) {
            for x in band.cols.0.min(w)..band.cols.1.min(w) {
                gray.put_pixel(x, y, image::Luma([255u8]));
            }
        }
    }
}

/// 自适应二值化：灰度不高于 `平均值 - margin` 的像素为前景
pub fn binarize(gray: &GrayImage, margin: f64) -> BinaryGrid {
    let (w, h) = gray.dimensions();
    let mut grid = BinaryGrid::new(w as usize, h as usize);
    let total = (w as u64) * (h as u64);
    if total == 0 {
        return grid;
    }

    let sum: u64 = gray.pixels().map(|p| p.0[0] as u64).sum();
    let threshold = sum as f64 / total as f64 - margin;

    for (x, y, p) in gray.enumerate_pixels() {
        if (p.0[0] as f64) <= threshold {
            grid.set(x as usize, y as usize, true);
        }
    }
    grid
}

/// 去噪：8 邻域前景数少于 `min_neighbors` 的前景像素被清除
///
/// 按行优先原地修改，边界像素不处理。
pub fn denoise(grid: &mut BinaryGrid, passes: usize, min_neighbors: usize) {
    let (w, h) = (grid.width(), grid.height());
    if w < 3 || h < 3 {
        return;
    }
    for _ in 0..passes {
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                if !grid.get(x, y) {
                    continue;
                }
                let mut neighbors = 0;
                for ny in y - 1..=y + 1 {
                    for nx in x - 1..=x + 1 {
                        if (nx, ny) != (x, y) && grid.get(nx, ny) {
                            neighbors += 1;
                        }
                    }
                }
                if neighbors < min_neighbors {
                    grid.set(x, y, false);
                }
            }
        }
    }
}

/// 沿一个轴扫描投影，返回 `[start, end)` 区间
///
/// 截面前景数达到 `min` 时开始一段，低于 `min` 时结束；扫描到末尾仍未结束的段被丢弃。
fn projection_runs(len: usize, min: usize, count: impl Fn(usize) -> usize) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for i in 0..len {
        let dense = count(i) >= min;
        match start {
            Some(s) if !dense => {
                runs.push((s, i));
                start = None;
            }
            None if dense => start = Some(i),
            _ => {}
        }
    }
    runs
}

/// 先按列切分，再在每个列带内按行切分
///
/// 输出顺序：从左到右，同一列带内从上到下。
pub fn split_blocks(grid: &BinaryGrid, projection_min: usize) -> Vec<GlyphCandidate> {
    let mut blocks = Vec::new();
    for (x0, x1) in projection_runs(grid.width(), projection_min, |x| grid.column_count(x)) {
        let strip = grid.crop(x0, 0, x1, grid.height());
        for (y0, y1) in projection_runs(strip.height(), projection_min, |y| strip.row_count(y)) {
            blocks.push(GlyphCandidate {
                x: x0,
                y: y0,
                mask: strip.crop(0, y0, strip.width(), y1),
            });
        }
    }
    blocks
}

/// 过滤太小或墨迹太少的碎片
pub fn is_glyph_sized(candidate: &GlyphCandidate, profile: &CaptchaProfile) -> bool {
    candidate.height() >= profile.min_rows
        && candidate.width() >= profile.min_cols
        && candidate.mask.foreground_count() >= profile.min_foreground
}

/// 完整分割流程
pub fn segment(gray: &GrayImage, profile: &CaptchaProfile) -> Vec<GlyphCandidate> {
    let mut gray = gray.clone();
    erase_bands(&mut gray, profile);

    let mut grid = binarize(&gray, profile.threshold_margin);
    denoise(&mut grid, profile.denoise_passes, profile.min_neighbors);

    split_blocks(&grid, profile.projection_min)
        .into_iter()
        .filter(|c| is_glyph_sized(c, profile))
        .collect()
}
