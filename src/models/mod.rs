pub mod account;
pub mod cleaner;
pub mod course;
pub mod loaders;
pub mod raw_row;
pub mod student;

pub use account::{Account, AccountList, AccountTask, Credentials};
pub use course::{ClassSession, CourseRecord, ExamSlot, Gender, Requisites};
pub use loaders::load_accounts;
pub use raw_row::{RawRecordRow, RowError};
pub use student::StudentInfo;
