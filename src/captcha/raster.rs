//! 验证码图片与二值网格

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};

use crate::captcha::profile::CaptchaProfile;
use crate::error::CaptchaError;

/// 一次登录尝试中截取到的验证码图片
///
/// 可以是单通道或多通道，求解前统一转换为灰度。
#[derive(Debug, Clone)]
pub struct CaptchaImage {
    inner: DynamicImage,
}

impl CaptchaImage {
    /// 直接包装已解码的图片
    pub fn new(inner: DynamicImage) -> Self {
        Self { inner }
    }

    /// 解码元素截图（PNG 等），并缩放到门户验证码的标准尺寸
    pub fn from_screenshot(bytes: &[u8], profile: &CaptchaProfile) -> Result<Self, CaptchaError> {
        let decoded = image::load_from_memory(bytes)?;
        let (width, height) = profile.canonical_size;
        let inner = if decoded.width() == width && decoded.height() == height {
            decoded
        } else {
            decoded.resize_exact(width, height, FilterType::CatmullRom)
        };
        Ok(Self { inner })
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// 灰度副本
    pub fn to_gray(&self) -> GrayImage {
        self.inner.to_luma8()
    }
}

impl From<GrayImage> for CaptchaImage {
    fn from(img: GrayImage) -> Self {
        Self::new(DynamicImage::ImageLuma8(img))
    }
}

/// 二值网格，`true` 表示前景（墨迹）像素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryGrid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl BinaryGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        self.cells[y * self.width + x] = value;
    }

    /// 前景像素总数
    pub fn foreground_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// 第 `x` 列的前景像素数
    pub fn column_count(&self, x: usize) -> usize {
        (0..self.height).filter(|&y| self.get(x, y)).count()
    }

    /// 第 `y` 行的前景像素数
    pub fn row_count(&self, y: usize) -> usize {
        (0..self.width).filter(|&x| self.get(x, y)).count()
    }

    /// 截取子区域（半开区间）
    pub fn crop(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> BinaryGrid {
        let mut out = BinaryGrid::new(x1 - x0, y1 - y0);
        for y in y0..y1 {
            for x in x0..x1 {
                out.set(x - x0, y - y0, self.get(x, y));
            }
        }
        out
    }

    /// 转为灰度图：前景为白色 (255)，背景为黑色 (0)
    pub fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            if self.get(x as usize, y as usize) {
                image::Luma([255u8])
            } else {
                image::Luma([0u8])
            }
        })
    }
}
