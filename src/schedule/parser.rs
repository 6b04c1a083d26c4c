//! 上课时间字段解析
//!
//! 输入是门户导出表中的一个多行文本字段，每行要么是考试声明，要么是上课声明，
//! 顺序无关，空行忽略。每行先分类，再交给对应的纯函数解析。

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::models::course::{ClassSession, ExamSlot};
use crate::schedule::jalali::JalaliDate;
use crate::schedule::time_range::{normalize_digits, time_decomposition};
use crate::schedule::weekday::Weekday;

/// 考试行标记
pub const EXAM_MARKER: &str = "امتحان";
/// 理论课行标记，其余上课行视为习题课
pub const LECTURE_MARKER: &str = "درس";
/// 上课行中 "类型(x): " 与星期之间的分隔符
pub const SESSION_SEPARATOR: &str = "): ";
/// 地点标记（门户两种写法都出现过）
pub const LOCATION_MARKERS: [&str; 2] = ["مکان:", "مكان:"];

/// 无法解析时的考试日期
pub const UNPARSED_DATE: &str = "0";

static EXAM_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"امتحان\((\d{4})\.(\d{2})\.(\d{2})\)").expect("考试日期正则无效"));

/// 一个字段的解析结果
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ParsedSchedule {
    pub sessions: Vec<ClassSession>,
    pub exam: Option<ExamSlot>,
}

/// 行类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleLine<'a> {
    Exam(&'a str),
    Session(&'a str),
}

/// 是否为考试行
pub fn is_exam_line(line: &str) -> bool {
    line.starts_with(EXAM_MARKER)
}

/// 是否为理论课行
pub fn is_lecture_line(line: &str) -> bool {
    line.starts_with(LECTURE_MARKER)
}

/// 对单行分类，空行返回 `None`
pub fn classify(line: &str) -> Option<ScheduleLine<'_>> {
    let line = line.trim();
    if line.is_empty() {
        None
    } else if is_exam_line(line) {
        Some(ScheduleLine::Exam(line))
    } else {
        Some(ScheduleLine::Session(line))
    }
}

/// 解析考试行，例如 `امتحان(1404.03.26) ساعت : 08:00-10:00`
///
/// 日期无法识别时 `date` 为 `"0"`、星期为 `Weekday::None`，小时区间单独解析。
pub fn parse_exam_line(line: &str) -> ExamSlot {
    let normalized = normalize_digits(line);
    let hours = time_decomposition(&normalized);

    let jalali = EXAM_DATE.captures(&normalized).and_then(|caps| {
        Some(JalaliDate::new(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        ))
    });

    let gregorian = jalali.and_then(JalaliDate::to_gregorian);
    let weekday = gregorian
        .map(|d| Weekday::from_chrono(chrono::Datelike::weekday(&d)))
        .unwrap_or(Weekday::None);

    ExamSlot {
        date: jalali.map(|d| d.to_string()).unwrap_or_else(|| UNPARSED_DATE.to_string()),
        jalali,
        gregorian,
        weekday,
        start_hour: hours.start,
        end_hour: hours.end,
    }
}

/// 解析上课行，例如 `درس(ت): سه شنبه 10:00-12:00 مکان: ساختمان ۲`
///
/// 没有 `): ` 分隔符的行无法定位星期，返回 `None`。
pub fn parse_session_line(line: &str) -> Option<ClassSession> {
    let (_, rest) = line.rsplit_once(SESSION_SEPARATOR)?;

    let (schedule_part, location) = split_location(rest);
    let hours = time_decomposition(schedule_part);

    Some(ClassSession {
        day: Weekday::from_day_token(schedule_part),
        start_hour: hours.start,
        end_hour: hours.end,
        is_problem_solving_section: !is_lecture_line(line),
        location,
    })
}

/// 拆出地点，返回 (地点之前的部分, 地点)
fn split_location(text: &str) -> (&str, Option<String>) {
    for marker in LOCATION_MARKERS {
        if let Some((before, after)) = text.split_once(marker) {
            let location = after.trim();
            let location = (!location.is_empty()).then(|| location.to_string());
            return (before, location);
        }
    }
    (text, None)
}

/// 上课时间解析器
///
/// 无内部状态，同一输入多次解析结果完全相同。
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleTextParser;

impl ScheduleTextParser {
    pub fn new() -> Self {
        Self
    }

    /// 解析整个字段
    ///
    /// 出现多个考试行时以最后一行为准，并记录警告。
    pub fn parse(&self, raw_class_day_field: &str) -> ParsedSchedule {
        let mut parsed = ParsedSchedule::default();

        for line in raw_class_day_field.lines() {
            match classify(line) {
                None => {}
                Some(ScheduleLine::Exam(line)) => {
                    let exam = parse_exam_line(line);
                    if let Some(previous) = parsed.exam.replace(exam) {
                        warn!("同一字段中出现多个考试行, 忽略较早的 {}", previous.date);
                    }
                }
                Some(ScheduleLine::Session(line)) => {
                    if let Some(session) = parse_session_line(line) {
                        parsed.sessions.push(session);
                    }
                }
            }
        }

        parsed
    }
}
