use serde::{Deserialize, Serialize};

/// "学生综合信息" 页中的四个字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInfo {
    pub student_number: String,
    pub full_name: String,
    pub major: String,
    pub faculty: String,
}

impl StudentInfo {
    /// 全部字段 trim 后构造
    pub fn new(
        student_number: impl AsRef<str>,
        full_name: impl AsRef<str>,
        major: impl AsRef<str>,
        faculty: impl AsRef<str>,
    ) -> Self {
        Self {
            student_number: student_number.as_ref().trim().to_string(),
            full_name: full_name.as_ref().trim().to_string(),
            major: major.as_ref().trim().to_string(),
            faculty: faculty.as_ref().trim().to_string(),
        }
    }
}
