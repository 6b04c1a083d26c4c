use serde::{Deserialize, Serialize};

use crate::schedule::jalali::JalaliDate;
use crate::schedule::weekday::Weekday;

/// 课程性别限制
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Both,
}

/// 一次上课时段
///
/// 小时无法解析时为 -1；两者都有效时 `start_hour < end_hour`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSession {
    pub day: Weekday,
    pub start_hour: i32,
    pub end_hour: i32,
    pub is_problem_solving_section: bool,
    pub location: Option<String>,
}

/// 考试时段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSlot {
    /// `YYYY/MM/DD`（伊朗历），无法解析时为 `"0"`
    pub date: String,
    pub jalali: Option<JalaliDate>,
    pub gregorian: Option<chrono::NaiveDate>,
    pub weekday: Weekday,
    pub start_hour: i32,
    pub end_hour: i32,
}

/// 先修 / 同修要求
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requisites {
    pub pre_needs: Vec<String>,
    pub co_needs: Vec<String>,
}

/// 一门开课记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    /// 课程代码去掉 `_` 后的数字，非数字时为 0
    pub id: i64,
    pub code: String,
    pub name: String,
    pub theory_units: String,
    pub practical_units: String,
    pub capacity: i32,
    pub gender: Gender,
    pub professor_name: String,
    pub location: String,
    pub prerequisites: Vec<String>,
    pub requisites: Requisites,
    pub notes: String,
    pub class_sessions: Vec<ClassSession>,
    pub exam: Option<ExamSlot>,
}

impl CourseRecord {
    /// 入库用的先修字段：各单元格以 `": "` 连接
    pub fn prerequisites_joined(&self) -> String {
        self.prerequisites.join(": ")
    }
}
