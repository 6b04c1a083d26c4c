//! 伊朗历（Jalali）→ 公历
//!
//! 基于 33 年周期的算术换算，不依赖查表。

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 伊朗历日期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl JalaliDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// 换算为公历，月份或日期越界时返回 `None`
    pub fn to_gregorian(self) -> Option<NaiveDate> {
        let max_day = if self.month <= 6 { 31 } else { 30 };
        if self.year < 1 || !(1..=12).contains(&self.month) || !(1..=max_day).contains(&self.day) {
            return None;
        }

        let jy = self.year as i64 + 1595;
        let jm = self.month as i64;
        let jd = self.day as i64;

        let mut days = -355_668 + 365 * jy + (jy / 33) * 8 + ((jy % 33) + 3) / 4 + jd
            + if jm < 7 { (jm - 1) * 31 } else { (jm - 7) * 30 + 186 };

        let mut gy = 400 * (days / 146_097);
        days %= 146_097;
        if days > 36_524 {
            days -= 1;
            gy += 100 * (days / 36_524);
            days %= 36_524;
            if days >= 365 {
                days += 1;
            }
        }
        gy += 4 * (days / 1461);
        days %= 1461;
        if days > 365 {
            gy += (days - 1) / 365;
            days = (days - 1) % 365;
        }

        let leap = (gy % 4 == 0 && gy % 100 != 0) || gy % 400 == 0;
        let month_days = [31, if leap { 29 } else { 28 }, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        let mut gd = days + 1;
        let mut gm = 1;
        for len in month_days {
            if gd <= len {
                break;
            }
            gd -= len;
            gm += 1;
        }

        NaiveDate::from_ymd_opt(gy as i32, gm as u32, gd as u32)
    }
}

impl fmt::Display for JalaliDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}
