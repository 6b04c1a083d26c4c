use thiserror::Error;

/// 导出表一行至少应有的单元格数
pub const MIN_FIELDS: usize = 13;

/// 行字段下标
pub mod field {
    pub const CODE: usize = 3;
    pub const NAME: usize = 4;
    pub const THEORY_UNITS: usize = 5;
    pub const PRACTICAL_UNITS: usize = 6;
    pub const CAPACITY: usize = 7;
    pub const GENDER: usize = 8;
    pub const PROFESSOR: usize = 9;
    pub const CLASS_DAY: usize = 10;
    pub const LOCATION: usize = 11;
    /// 先修单元格从这里开始，到倒数第二个单元格为止
    pub const PREREQUISITES_START: usize = 12;
}

/// 行解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("表格行只有 {actual} 个字段, 至少需要 {expected} 个")]
    TooFewFields { expected: usize, actual: usize },
}

/// 导出表中未经解析的一行
///
/// 只是按制表符切开的文本，字段数在转换为 `CourseRecord` 时才校验。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecordRow {
    fields: Vec<String>,
}

impl RawRecordRow {
    /// 按制表符切分一行的 innerText
    pub fn from_tab_separated(line: &str) -> Self {
        Self::from_fields(line.split('\t').map(str::to_string).collect())
    }

    pub fn from_fields(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 字段数不足时无法按固定下标取值
    pub fn check_shape(&self) -> Result<(), RowError> {
        if self.fields.len() < MIN_FIELDS {
            return Err(RowError::TooFewFields {
                expected: MIN_FIELDS,
                actual: self.fields.len(),
            });
        }
        Ok(())
    }

    /// 指定下标的原始文本，越界时为空串
    pub fn get(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or_default()
    }

    pub fn class_day(&self) -> &str {
        self.get(field::CLASS_DAY)
    }

    /// 先修单元格：第 12 个到倒数第二个
    pub fn prerequisite_cells(&self) -> &[String] {
        let end = self.fields.len().saturating_sub(1);
        &self.fields[field::PREREQUISITES_START.min(end)..end]
    }

    /// 最后一个单元格是备注
    pub fn notes(&self) -> &str {
        self.fields.last().map(String::as_str).unwrap_or_default()
    }
}
