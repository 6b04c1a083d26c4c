//! 门户页面结构
//!
//! 门户每进入一步都会新建一个 `iframe#FaciN`，其中再嵌套 Master / Form_Body 等 frame。

use crate::infrastructure::driver::{FramePath, Target};

// ========== frame 路径 ==========

pub const LOGIN_FORM: FramePath = FramePath(&["iframe#Faci1", "frame[name='Master']", "frame[name='Form_Body']"]);
pub const LOGIN_MESSAGE: FramePath = FramePath(&["iframe#Faci1", "frame[name='Message']"]);
pub const MENU_FORM: FramePath = FramePath(&["iframe#Faci2", "frame[name='Master']", "frame[name='Form_Body']"]);
pub const REPORT_COMMANDER: FramePath = FramePath(&["iframe#Faci3", "frame[name='Commander']"]);
pub const REPORT_FORM: FramePath = FramePath(&["iframe#Faci3", "frame[name='Master']", "frame[name='Form_Body']"]);

// ========== 登录页 ==========

pub const CAPTCHA_IMAGE: Target = Target::new(LOGIN_FORM, "img#imgCaptcha");
pub const USERNAME_INPUT: Target = Target::new(LOGIN_FORM, "#F80351");
pub const PASSWORD_INPUT: Target = Target::new(LOGIN_FORM, "#F80401");
pub const CAPTCHA_INPUT: Target = Target::new(LOGIN_FORM, "#F51701");
pub const LOGIN_BUTTON: Target = Target::new(LOGIN_FORM, "#btnLog");
/// 错误提示写在 `title` 属性里
pub const ERROR_TEXT: Target = Target::new(LOGIN_MESSAGE, "#errtxt");
pub const ERROR_TEXT_ATTRIBUTE: &str = "title";

/// 登录成功后出现的第二个工作页
pub const SECOND_PAGE: Target = Target::root("iframe#Faci2");
/// 报表查询后出现的第三个工作页
pub const THIRD_PAGE: Target = Target::root("iframe#Faci3");

pub const WRONG_CREDENTIALS_MESSAGE: &str = "کد1 : شناسه کاربري يا گذرواژه اشتباه است.";
pub const WRONG_CAPTCHA_MESSAGE: &str = "لطفا كد امنيتي را به صورت صحيح وارد نماييد";

// ========== 课程报表 ==========

pub const REPORT_CODE_INPUT: Target = Target::new(MENU_FORM, "#F20851");
pub const REPORT_OK_BUTTON: Target = Target::new(MENU_FORM, "#OK");
pub const EXPORT_BUTTON: Target = Target::new(REPORT_COMMANDER, "#ExToEx");
pub const EXPORT_TABLE: &str = "table";
/// 相对导出页第一个 `EXPORT_TABLE` 的行，嵌套表格中的行不算
pub const EXPORT_ROWS: &str = ":scope > tbody > tr";

// ========== 学生综合信息 ==========

pub const STUDENT_INFO_MENU: Target = Target::new(MENU_FORM, r#"//td[span[text()="اطلاعات جامع دانشجو"]]"#);
pub const STUDENT_NAME: Target = Target::new(REPORT_FORM, "label#F51851");
pub const STUDENT_NUMBER: Target = Target::new(REPORT_FORM, "input#F41251");
pub const STUDENT_MAJOR: Target = Target::new(REPORT_FORM, "#F17551");
pub const STUDENT_FACULTY: Target = Target::new(REPORT_FORM, "#F61151");
