//! 原始行 → `CourseRecord`
//!
//! 标量字段逐个清洗，上课时间字段交给 `ScheduleTextParser`。

use crate::models::course::{CourseRecord, Gender, Requisites};
use crate::models::raw_row::{field, RawRecordRow, RowError};
use crate::schedule::ScheduleTextParser;

static GENDERS: phf::Map<&'static str, Gender> = phf::phf_map! {
    "مختلط" => Gender::Both,
    "مرد" => Gender::Male,
    "زن" => Gender::Female,
};

const PRE_NEEDS_HEADER: &str = "پيش نياز";
const CO_NEEDS_HEADER: &str = "هم نياز";
const EQUIVALENT_HEADER: &str = "معادل";
const EMBEDDED_CO_NEEDS: &str = "\nهم نياز";
const EMBEDDED_EQUIVALENT: &str = "\nمعادل";

/// 未知写法一律视为男女混合
pub fn parse_gender(text: &str) -> Gender {
    GENDERS.get(text.trim()).copied().unwrap_or(Gender::Both)
}

/// 容量无法解析时为 0
pub fn parse_capacity(text: &str) -> i32 {
    text.trim().parse().unwrap_or(0)
}

/// 课程代码去掉 `_` 后作为数字 id，例如 `1234_05` → `123405`
pub fn course_id(code: &str) -> i64 {
    code.trim().replace('_', "").parse().unwrap_or(0)
}

/// 去掉空白单元格，其余 trim 后保留
pub fn clean_prerequisites(cells: &[String]) -> Vec<String> {
    cells
        .iter()
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

/// 按分组标题拆分先修 / 同修
///
/// 标题单元格之后的课程归入对应分组，"معادل" 之后的单元格丢弃。
/// 单元格内嵌 `\nهم نياز` 时该课程同时计入两组。
pub fn parse_requisites(cells: &[String]) -> Requisites {
    #[derive(Clone, Copy)]
    enum Group {
        Pre,
        Co,
        Dropped,
    }

    let mut requisites = Requisites::default();
    let mut group = Group::Dropped;

    for cell in cells {
        let cell = cell.trim();
        if cell.starts_with(PRE_NEEDS_HEADER) {
            group = Group::Pre;
            continue;
        }
        if cell.starts_with(CO_NEEDS_HEADER) {
            group = Group::Co;
            continue;
        }
        if cell.starts_with(EQUIVALENT_HEADER) {
            group = Group::Dropped;
            continue;
        }

        if matches!(group, Group::Dropped) {
            continue;
        }

        let cell = cell.replace(EMBEDDED_EQUIVALENT, "");
        let cell = cell.trim();
        if let Some((course, _)) = cell.split_once(EMBEDDED_CO_NEEDS) {
            let course = course.trim().to_string();
            requisites.pre_needs.push(course.clone());
            requisites.co_needs.push(course);
            continue;
        }

        match group {
            Group::Pre => requisites.pre_needs.push(cell.to_string()),
            Group::Co => requisites.co_needs.push(cell.to_string()),
            Group::Dropped => {}
        }
    }

    requisites
}

impl CourseRecord {
    /// 由原始行与上课时间解析器构造课程记录，字段数不足时返回错误
    pub fn from_raw(row: &RawRecordRow, parser: &ScheduleTextParser) -> Result<Self, RowError> {
        row.check_shape()?;

        let code = row.get(field::CODE).trim().to_string();
        let schedule = parser.parse(row.class_day());
        let cells = row.prerequisite_cells();

        Ok(Self {
            id: course_id(&code),
            name: row.get(field::NAME).trim().to_string(),
            theory_units: row.get(field::THEORY_UNITS).trim().to_string(),
            practical_units: row.get(field::PRACTICAL_UNITS).trim().to_string(),
            capacity: parse_capacity(row.get(field::CAPACITY)),
            gender: parse_gender(row.get(field::GENDER)),
            professor_name: row.get(field::PROFESSOR).trim().to_string(),
            location: row.get(field::LOCATION).trim().to_string(),
            prerequisites: clean_prerequisites(cells),
            requisites: parse_requisites(cells),
            notes: row.notes().trim().to_string(),
            class_sessions: schedule.sessions,
            exam: schedule.exam,
            code,
        })
    }
}
