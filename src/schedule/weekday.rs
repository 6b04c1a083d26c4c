use serde::{Deserialize, Serialize};

/// 星期（门户以周六为一周的第一天）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    #[serde(rename = "sat")]
    Saturday,
    #[serde(rename = "sun")]
    Sunday,
    #[serde(rename = "mon")]
    Monday,
    #[serde(rename = "tue")]
    Tuesday,
    #[serde(rename = "wed")]
    Wednesday,
    #[serde(rename = "thu")]
    Thursday,
    #[serde(rename = "fri")]
    Friday,
    /// 无法识别
    #[serde(rename = "non")]
    None,
}

/// 星期名称首字母 → 星期
static DAY_PREFIXES: phf::Map<char, Weekday> = phf::phf_map! {
    'ش' => Weekday::Saturday,
    'ي' => Weekday::Sunday,
    'ی' => Weekday::Sunday,
    'د' => Weekday::Monday,
    'س' => Weekday::Tuesday,
    'چ' => Weekday::Wednesday,
    'پ' => Weekday::Thursday,
    'ج' => Weekday::Friday,
};

impl Weekday {
    /// 根据去掉首尾空白后的第一个字符判断星期，无法识别时返回 `Weekday::None`
    pub fn from_day_token(token: &str) -> Self {
        token
            .trim()
            .chars()
            .next()
            .and_then(|c| DAY_PREFIXES.get(&c).copied())
            .unwrap_or(Weekday::None)
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_day_name_maps_by_its_first_letter() {
        let cases = [
            ("شنبه", Weekday::Saturday),
            ("يك شنبه", Weekday::Sunday),
            ("دوشنبه", Weekday::Monday),
            ("سه شنبه", Weekday::Tuesday),
            ("چهارشنبه", Weekday::Wednesday),
            ("پنج شنبه", Weekday::Thursday),
            ("جمعه", Weekday::Friday),
        ];
        for (token, expected) in cases {
            assert_eq!(Weekday::from_day_token(token), expected, "{}", token);
        }
    }

    #[test]
    fn unknown_or_empty_token_is_none() {
        assert_eq!(Weekday::from_day_token("monday"), Weekday::None);
        assert_eq!(Weekday::from_day_token("   "), Weekday::None);
        assert_eq!(Weekday::from_day_token(""), Weekday::None);
    }

    #[test]
    fn persian_yeh_is_accepted_for_sunday() {
        assert_eq!(Weekday::from_day_token(" یکشنبه"), Weekday::Sunday);
    }

    #[test]
    fn serializes_as_short_code() {
        assert_eq!(serde_json::to_string(&Weekday::Tuesday).unwrap(), "\"tue\"");
        assert_eq!(serde_json::to_string(&Weekday::None).unwrap(), "\"non\"");
    }
}
