//! 课程表文本解析
//!
//! 门户导出的 "上课时间" 字段是波斯文多行文本，这里把它转成结构化的上课时段与考试时段。

pub mod jalali;
pub mod parser;
pub mod time_range;
pub mod weekday;

pub use jalali::JalaliDate;
pub use parser::{ParsedSchedule, ScheduleTextParser};
pub use time_range::{time_decomposition, HourRange};
pub use weekday::Weekday;
