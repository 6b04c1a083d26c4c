use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use golestan_sync::captcha::{CaptchaResolver, GlyphBitmap, GlyphClassifier, TemplateClassifier};
use golestan_sync::config::{Config, SessionSettings};
use golestan_sync::error::{
    AppError, AppResult, ClassifierError, LoginError, NavigationError, RetryReason, SessionError,
};
use golestan_sync::infrastructure::{
    ChromiumDriverFactory, DriverFactory, PopupPage, PortalDriver, Target,
};
use golestan_sync::models::{Credentials, Gender};
use golestan_sync::portal::selectors as sel;
use golestan_sync::portal::{PortalSession, SessionState};
use golestan_sync::schedule::Weekday;
use golestan_sync::utils::logging;
use golestan_sync::{SessionCtx, SessionOrchestrator};
use image::{GrayImage, ImageFormat, Luma};
use tokio_test::{assert_err, assert_ok};

// ========== 假驱动 ==========

/// 门户对登录按钮的反应
#[derive(Debug, Clone, Copy)]
enum Scenario {
    /// 永远提示验证码错误
    WrongCaptcha,
    /// 提示用户名或密码错误
    WrongCredentials,
    /// 没有任何反应
    Silent,
    /// 前 n 次验证码错误，之后成功
    SucceedAfter(usize),
    /// 登录成功，但报表页永远打不开
    NavigationStuck,
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    screenshots: AtomicUsize,
    login_clicks: AtomicUsize,
    report_clicks: AtomicUsize,
    popups_closed: AtomicUsize,
    /// `inner_texts_in_first` 收到的 (container, selector)
    row_queries: Mutex<Vec<(String, String)>>,
}

impl Counters {
    fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

struct FakeDriver {
    scenario: Scenario,
    counters: Arc<Counters>,
    captcha_png: Arc<Vec<u8>>,
    export_rows: Arc<Vec<String>>,
    error_message: Option<&'static str>,
    logged_in: bool,
    report_open: bool,
}

impl PortalDriver for FakeDriver {
    type Popup = FakePopup;

    async fn goto(&mut self, _url: &str) -> AppResult<()> {
        self.error_message = None;
        Ok(())
    }

    async fn wait_for_load(&mut self, _timeout: Duration) -> AppResult<()> {
        Ok(())
    }

    async fn count(&mut self, target: Target) -> AppResult<usize> {
        let present = if target == sel::SECOND_PAGE {
            self.logged_in
        } else if target == sel::THIRD_PAGE {
            self.report_open
        } else {
            true
        };
        Ok(present as usize)
    }

    async fn attribute(&mut self, target: Target, _name: &str) -> AppResult<Option<String>> {
        if target == sel::ERROR_TEXT {
            return Ok(self.error_message.map(str::to_string));
        }
        Ok(None)
    }

    async fn screenshot(&mut self, _target: Target) -> AppResult<Vec<u8>> {
        self.counters.screenshots.fetch_add(1, Ordering::SeqCst);
        Ok(self.captcha_png.as_ref().clone())
    }

    async fn fill(&mut self, _target: Target, _value: &str) -> AppResult<()> {
        Ok(())
    }

    async fn click(&mut self, target: Target) -> AppResult<()> {
        if target == sel::LOGIN_BUTTON {
            let clicks = self.counters.login_clicks.fetch_add(1, Ordering::SeqCst) + 1;
            match self.scenario {
                Scenario::WrongCaptcha => self.error_message = Some(sel::WRONG_CAPTCHA_MESSAGE),
                Scenario::WrongCredentials => {
                    self.error_message = Some(sel::WRONG_CREDENTIALS_MESSAGE)
                }
                Scenario::Silent => {}
                Scenario::SucceedAfter(n) if clicks <= n => {
                    self.error_message = Some(sel::WRONG_CAPTCHA_MESSAGE)
                }
                Scenario::SucceedAfter(_) | Scenario::NavigationStuck => self.logged_in = true,
            }
        } else if target == sel::REPORT_OK_BUTTON {
            // 门户会忽略第一次点击
            let clicks = self.counters.report_clicks.fetch_add(1, Ordering::SeqCst) + 1;
            if clicks >= 2 && !matches!(self.scenario, Scenario::NavigationStuck) {
                self.report_open = true;
            }
        }
        Ok(())
    }

    async fn wait_for_visible(&mut self, _target: Target, _timeout: Duration) -> AppResult<()> {
        Ok(())
    }

    async fn text_content(&mut self, target: Target) -> AppResult<Option<String>> {
        let text = if target == sel::STUDENT_NAME {
            " علی رضایی "
        } else if target == sel::STUDENT_MAJOR {
            "مهندسی کامپیوتر"
        } else if target == sel::STUDENT_FACULTY {
            "فنی و مهندسی"
        } else {
            return Ok(None);
        };
        Ok(Some(text.to_string()))
    }

    async fn input_value(&mut self, target: Target) -> AppResult<Option<String>> {
        Ok((target == sel::STUDENT_NUMBER).then(|| "4001234567".to_string()))
    }

    async fn click_expect_popup(&mut self, _target: Target, _timeout: Duration) -> AppResult<FakePopup> {
        Ok(FakePopup {
            rows: Arc::clone(&self.export_rows),
            counters: Arc::clone(&self.counters),
        })
    }

    async fn close(&mut self) -> AppResult<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakePopup {
    rows: Arc<Vec<String>>,
    counters: Arc<Counters>,
}

impl PopupPage for FakePopup {
    async fn wait_for_selector(&mut self, _selector: &str, _timeout: Duration) -> AppResult<()> {
        Ok(())
    }

    async fn inner_texts_in_first(&mut self, container: &str, selector: &str) -> AppResult<Vec<String>> {
        self.counters
            .row_queries
            .lock()
            .unwrap()
            .push((container.to_string(), selector.to_string()));
        Ok(self.rows.as_ref().clone())
    }

    async fn close(&mut self) -> AppResult<()> {
        self.counters.popups_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeFactory {
    scenario: Scenario,
    counters: Arc<Counters>,
    captcha_png: Arc<Vec<u8>>,
    export_rows: Arc<Vec<String>>,
    fail_to_open: bool,
}

impl FakeFactory {
    fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            counters: Arc::new(Counters::default()),
            captcha_png: Arc::new(captcha_png(4)),
            export_rows: Arc::new(export_rows()),
            fail_to_open: false,
        }
    }

    fn driver(&self) -> FakeDriver {
        FakeDriver {
            scenario: self.scenario,
            counters: Arc::clone(&self.counters),
            captcha_png: Arc::clone(&self.captcha_png),
            export_rows: Arc::clone(&self.export_rows),
            error_message: None,
            logged_in: false,
            report_open: false,
        }
    }
}

impl DriverFactory for FakeFactory {
    type Driver = FakeDriver;

    async fn open(&self, _ctx: &SessionCtx) -> AppResult<FakeDriver> {
        if self.fail_to_open {
            return Err(AppError::launch_failed("没有可用的浏览器"));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(self.driver())
    }
}

// ========== 测试数据 ==========

/// 每个字形都识别为 'a'
struct ConstantClassifier;

impl GlyphClassifier for ConstantClassifier {
    fn predict(&self, bitmaps: &[GlyphBitmap]) -> Result<Vec<char>, ClassifierError> {
        Ok(bitmaps.iter().map(|_| 'a').collect())
    }
}

/// 140x50 白底，`glyphs` 个互不相接的黑色方块
fn captcha_png(glyphs: u32) -> Vec<u8> {
    let mut img = GrayImage::from_pixel(140, 50, Luma([255]));
    for g in 0..glyphs {
        let x0 = 10 + g * 25;
        for x in x0..x0 + 10 {
            for y in 10..30 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
    }
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

fn export_rows() -> Vec<String> {
    let header = "ردیف\tدانشکده\tگروه\tکد\tنام\tنظری\tعملی\tظرفیت\tجنسیت\tاستاد\tزمان\tمکان\tپیشنیاز\tتوضیحات";
    let first = [
        "1", "19", "12", "1214_05", "مبانی کامپیوتر", "3", "0", "40", "مرد", "دکتر احمدی",
        "درس(ت): سه شنبه 10:00-12:00\nامتحان(1404.03.26) 08:00-10:00",
        "دانشکده فنی", "پيش نياز", "ریاضی ۱", "",
    ]
    .join("\t");
    let second = [
        "2", "19", "12", "1214_06", "ساختمان داده", "3", "0", "35", "زن", "دکتر کریمی",
        "حل تمرين(ت): دوشنبه 14:00-15:00 مکان: کلاس ۱۰۴",
        "دانشکده فنی", "ندارد",
    ]
    .join("\t");
    vec![header.to_string(), first, second, "ردیف ناقص\tفقط دو ستون".to_string()]
}

fn fast_settings() -> SessionSettings {
    SessionSettings {
        max_login_attempts: 3,
        login_poll_attempts: 3,
        login_poll_interval: Duration::from_millis(1),
        navigation_attempts: 4,
        navigation_interval: Duration::from_millis(1),
        ..SessionSettings::default()
    }
}

fn credentials() -> Credentials {
    Credentials::new("4001234567", "secret")
}

fn orchestrator(factory: FakeFactory) -> SessionOrchestrator<FakeFactory, ConstantClassifier> {
    SessionOrchestrator::new(
        factory,
        Arc::new(CaptchaResolver::new(ConstantClassifier)),
        fast_settings(),
    )
}

fn session(factory: &FakeFactory) -> PortalSession<FakeDriver, ConstantClassifier> {
    PortalSession::new(
        factory.driver(),
        Arc::new(CaptchaResolver::new(ConstantClassifier)),
        fast_settings(),
        SessionCtx::new(1, "4001234567"),
    )
}

// ========== 登录重试 ==========

#[tokio::test]
async fn wrong_captcha_retries_exactly_up_to_the_cap() {
    logging::init(false);
    let factory = FakeFactory::new(Scenario::WrongCaptcha);
    let counters = Arc::clone(&factory.counters);
    let orchestrator = orchestrator(factory);

    let err = assert_err!(
        orchestrator
            .fetch_courses(SessionCtx::new(1, "4001234567"), &credentials())
            .await
    );

    assert!(matches!(
        err,
        AppError::Login(LoginError::RetriesExhausted {
            attempts: 3,
            last: RetryReason::WrongCaptcha
        })
    ));
    assert_eq!(Counters::get(&counters.login_clicks), 3);
    assert_eq!(Counters::get(&counters.screenshots), 3);
    assert_eq!(Counters::get(&counters.opened), 1);
    assert_eq!(Counters::get(&counters.closed), 1);
}

#[tokio::test]
async fn session_ends_in_retries_exhausted_and_closes_once() {
    let factory = FakeFactory::new(Scenario::WrongCaptcha);
    let mut session = session(&factory);

    assert_err!(session.login(&credentials()).await);
    assert_eq!(session.state(), SessionState::RetriesExhausted);
    assert_eq!(session.attempts(), 3);

    assert_ok!(session.close().await);
    assert_ok!(session.close().await);
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(Counters::get(&factory.counters.closed), 1);
}

#[tokio::test]
async fn wrong_credentials_abort_after_one_attempt() {
    let factory = FakeFactory::new(Scenario::WrongCredentials);
    let counters = Arc::clone(&factory.counters);
    let orchestrator = orchestrator(factory);

    let err = assert_err!(
        orchestrator
            .fetch_courses(SessionCtx::new(1, "4001234567"), &credentials())
            .await
    );

    assert!(err.is_wrong_credentials());
    assert_eq!(Counters::get(&counters.login_clicks), 1);
    assert_eq!(Counters::get(&counters.closed), 1);
}

#[tokio::test]
async fn silent_portal_is_an_ambiguous_fatal_outcome() {
    let factory = FakeFactory::new(Scenario::Silent);
    let mut session = session(&factory);

    let err = assert_err!(session.login(&credentials()).await);

    assert!(matches!(
        err,
        AppError::Login(LoginError::AmbiguousOutcome { polls: 3 })
    ));
    assert_eq!(session.state(), SessionState::Unknown);
    assert_eq!(Counters::get(&factory.counters.login_clicks), 1);
    assert_ok!(session.close().await);
}

#[tokio::test]
async fn wrong_captcha_then_success() {
    let factory = FakeFactory::new(Scenario::SucceedAfter(2));
    let mut session = session(&factory);

    assert_ok!(session.login(&credentials()).await);
    assert_eq!(session.state(), SessionState::Authenticated);
    assert_eq!(session.attempts(), 3);
    assert_ok!(session.close().await);
}

#[tokio::test]
async fn unsolvable_captcha_counts_toward_the_budget() {
    let mut factory = FakeFactory::new(Scenario::SucceedAfter(0));
    factory.captcha_png = Arc::new(captcha_png(0));
    let mut session = session(&factory);

    let err = assert_err!(session.login(&credentials()).await);

    assert!(matches!(
        err,
        AppError::Login(LoginError::RetriesExhausted {
            attempts: 3,
            last: RetryReason::UnsolvableCaptcha
        })
    ));
    assert_eq!(Counters::get(&factory.counters.screenshots), 3);
    assert_eq!(Counters::get(&factory.counters.login_clicks), 0);
    assert_ok!(session.close().await);
}

#[tokio::test]
async fn empty_credentials_never_open_a_browser() {
    let factory = FakeFactory::new(Scenario::SucceedAfter(0));
    let counters = Arc::clone(&factory.counters);
    let orchestrator = orchestrator(factory);

    let err = assert_err!(
        orchestrator
            .fetch_courses(SessionCtx::new(1, ""), &Credentials::new("", "secret"))
            .await
    );

    assert!(matches!(err, AppError::Login(LoginError::EmptyCredentials)));
    assert_eq!(Counters::get(&counters.opened), 0);
}

#[tokio::test]
async fn browser_launch_failure_is_fatal() {
    let mut factory = FakeFactory::new(Scenario::SucceedAfter(0));
    factory.fail_to_open = true;
    let counters = Arc::clone(&factory.counters);
    let orchestrator = orchestrator(factory);

    let err = assert_err!(
        orchestrator
            .fetch_courses(SessionCtx::new(1, "4001234567"), &credentials())
            .await
    );

    assert!(matches!(err, AppError::Browser(_)));
    assert_eq!(Counters::get(&counters.closed), 0);
}

// ========== 抓取 ==========

#[tokio::test]
async fn courses_are_extracted_parsed_and_the_session_closed() {
    let factory = FakeFactory::new(Scenario::SucceedAfter(0));
    let counters = Arc::clone(&factory.counters);
    let orchestrator = orchestrator(factory);

    let records = assert_ok!(
        orchestrator
            .fetch_courses(SessionCtx::new(1, "4001234567"), &credentials())
            .await
    );

    // 表头被去掉，字段不足的行被跳过
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.code, "1214_05");
    assert_eq!(first.id, 121405);
    assert_eq!(first.gender, Gender::Male);
    assert_eq!(first.requisites.pre_needs, vec!["ریاضی ۱"]);
    assert_eq!(first.class_sessions.len(), 1);
    assert_eq!(first.class_sessions[0].day, Weekday::Tuesday);
    assert_eq!(
        (first.class_sessions[0].start_hour, first.class_sessions[0].end_hour),
        (10, 12)
    );
    assert!(!first.class_sessions[0].is_problem_solving_section);
    let exam = first.exam.as_ref().unwrap();
    assert_eq!(exam.date, "1404/03/26");
    assert_eq!((exam.start_hour, exam.end_hour), (8, 10));

    let second = &records[1];
    assert_eq!(second.gender, Gender::Female);
    assert!(second.prerequisites.is_empty());
    assert!(second.class_sessions[0].is_problem_solving_section);
    assert_eq!(second.class_sessions[0].location.as_deref(), Some("کلاس ۱۰۴"));
    assert_eq!(second.exam, None);

    assert_eq!(Counters::get(&counters.report_clicks), 2);
    assert_eq!(Counters::get(&counters.popups_closed), 1);
    // 只读第一个表格的直接行
    assert_eq!(
        counters.row_queries.lock().unwrap().as_slice(),
        [("table".to_string(), ":scope > tbody > tr".to_string())]
    );
    assert_eq!(Counters::get(&counters.closed), 1);
}

#[tokio::test]
async fn stuck_navigation_is_reported_and_the_session_closed() {
    let factory = FakeFactory::new(Scenario::NavigationStuck);
    let counters = Arc::clone(&factory.counters);
    let orchestrator = orchestrator(factory);

    let err = assert_err!(
        orchestrator
            .fetch_courses(SessionCtx::new(1, "4001234567"), &credentials())
            .await
    );

    assert!(matches!(
        err,
        AppError::Navigation(NavigationError::StepDidNotAdvance { attempts: 4, .. })
    ));
    assert_eq!(Counters::get(&counters.report_clicks), 4);
    assert_eq!(Counters::get(&counters.closed), 1);
}

#[tokio::test]
async fn extraction_requires_authentication() {
    let factory = FakeFactory::new(Scenario::SucceedAfter(0));
    let mut session = session(&factory);

    let err = assert_err!(session.extract_records().await);
    assert!(matches!(
        err,
        AppError::Session(SessionError::NotAuthenticated {
            state: "Unauthenticated"
        })
    ));

    assert_ok!(session.close().await);
    let err = assert_err!(session.extract_student_info().await);
    assert!(matches!(err, AppError::Session(SessionError::Closed)));
}

#[tokio::test]
async fn student_info_is_read_from_the_third_page() {
    let factory = FakeFactory::new(Scenario::SucceedAfter(0));
    let counters = Arc::clone(&factory.counters);
    let orchestrator = orchestrator(factory);

    let info = assert_ok!(
        orchestrator
            .fetch_student_info(SessionCtx::new(2, "4001234567"), &credentials())
            .await
    );

    assert_eq!(info.student_number, "4001234567");
    assert_eq!(info.full_name, "علی رضایی");
    assert_eq!(info.major, "مهندسی کامپیوتر");
    assert_eq!(info.faculty, "فنی و مهندسی");
    assert_eq!(Counters::get(&counters.closed), 1);
}

#[tokio::test]
async fn concurrent_requests_use_independent_sessions() {
    let factory = FakeFactory::new(Scenario::SucceedAfter(0));
    let counters = Arc::clone(&factory.counters);
    let orchestrator = Arc::new(orchestrator(factory));

    let handles: Vec<_> = (1..=3)
        .map(|i| {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                orchestrator
                    .fetch_courses(SessionCtx::new(i, format!("40012345{}", i)), &credentials())
                    .await
            })
        })
        .collect();

    for handle in handles {
        let records = assert_ok!(handle.await.unwrap());
        assert_eq!(records.len(), 2);
    }
    assert_eq!(Counters::get(&counters.opened), 3);
    assert_eq!(Counters::get(&counters.closed), 3);
}

// ========== 真实门户 ==========

#[tokio::test]
#[ignore] // 需要真实账号与字形模板：GOLESTAN_USER / GOLESTAN_PASS，cargo test -- --ignored
async fn live_portal_fetch_courses() {
    logging::init(true);

    let config = Config::from_env();
    let username = std::env::var("GOLESTAN_USER").expect("缺少 GOLESTAN_USER");
    let password = std::env::var("GOLESTAN_PASS").expect("缺少 GOLESTAN_PASS");

    let classifier = TemplateClassifier::from_file(&config.classifier_model_path, 32)
        .expect("加载字形模板失败");
    let orchestrator = SessionOrchestrator::new(
        ChromiumDriverFactory::new(config.browser_settings()),
        Arc::new(CaptchaResolver::new(classifier)),
        config.session_settings(),
    );

    let records = orchestrator
        .fetch_courses(SessionCtx::new(1, username.clone()), &Credentials::new(username, password))
        .await
        .expect("抓取课程失败");

    assert!(!records.is_empty(), "应该至少抓取到一门课程");
}
