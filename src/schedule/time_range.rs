use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `HH:MM-HH:MM`，允许短横线两侧有空白；只取小时
static TIME_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}):\d{2}\s*-\s*(\d{1,2}):\d{2}").expect("时间段正则无效"));

/// 小时区间
///
/// 门户按整点排课，分钟被丢弃。无法解析时为 `(-1, -1)`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRange {
    pub start: i32,
    pub end: i32,
}

impl HourRange {
    pub const UNPARSABLE: HourRange = HourRange { start: -1, end: -1 };

    pub fn is_parsed(self) -> bool {
        self != Self::UNPARSABLE
    }
}

/// 把波斯数字 (۰-۹) 与阿拉伯-印度数字 (٠-٩) 转为 ASCII 数字
pub fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '۰'..='۹' => char::from(b'0' + (c as u32 - '۰' as u32) as u8),
            '٠'..='٩' => char::from(b'0' + (c as u32 - '٠' as u32) as u8),
            _ => c,
        })
        .collect()
}

/// 在文本任意位置查找时间段并返回小时
///
/// 找不到、数字无法解析、或开始不早于结束时返回 `HourRange::UNPARSABLE`。
pub fn time_decomposition(text: &str) -> HourRange {
    let text = normalize_digits(text);
    let Some(caps) = TIME_RANGE.captures(&text) else {
        return HourRange::UNPARSABLE;
    };
    match (caps[1].parse::<i32>(), caps[2].parse::<i32>()) {
        (Ok(start), Ok(end)) if start < end => HourRange { start, end },
        _ => HourRange::UNPARSABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_hours_only() {
        assert_eq!(time_decomposition("10:00-12:00"), HourRange { start: 10, end: 12 });
        assert_eq!(time_decomposition("8:30 - 10:15"), HourRange { start: 8, end: 10 });
    }

    #[test]
    fn range_can_appear_after_annotations() {
        assert_eq!(
            time_decomposition("درس(ت): سه شنبه 14:00-16:00 مکان: کلاس ۱۰۲"),
            HourRange { start: 14, end: 16 }
        );
    }

    #[test]
    fn garbage_yields_sentinel() {
        assert_eq!(time_decomposition("garbage"), HourRange::UNPARSABLE);
        assert_eq!(time_decomposition("10:00 12:00"), HourRange::UNPARSABLE);
        assert!(!time_decomposition("").is_parsed());
    }

    #[test]
    fn reversed_range_yields_sentinel() {
        assert_eq!(time_decomposition("12:00-10:00"), HourRange::UNPARSABLE);
    }

    #[test]
    fn persian_digits_are_understood() {
        assert_eq!(time_decomposition("۱۰:۰۰-۱۲:۰۰"), HourRange { start: 10, end: 12 });
        assert_eq!(normalize_digits("١٤٠٤"), "1404");
    }
}
