#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{anyhow, Result};
use brobot_common::RobotSettings;
use brobot_config::BrobotConfigLoader;
use brobot_core::BrowserRobot;
use brobot_drivers::{DomElement, Locator, SessionDriver};
use serde_json::{json, Value};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

/// Tracing for test binaries, configured through the `logging` section so
/// `BROBOT__LOGGING__FORMAT=json` switches the encoding.
pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let log_dir = std::env::temp_dir().join("brobot-tests");
        let yaml = format!(
            "logging:\n  app_name: brobot-tests\n  log_dir: {:?}\n  emit_stderr: true\n  filter: debug\n",
            log_dir.display().to_string()
        );
        BrobotConfigLoader::new()
            .with_yaml_str(&yaml)
            .load()
            .map_err(anyhow::Error::from)
            .and_then(|config| config.logging.init_logging())
            .unwrap_or_default()
    });
}

type ScriptHandler = Box<dyn FnMut(&str) -> Result<Value>>;
type LookupHandler = Box<dyn FnMut(&Locator) -> Result<Vec<FakeElement>>>;

/// In-memory session: scripts and DOM lookups are answered by closures.
pub struct FakeSession {
    scripts: RefCell<ScriptHandler>,
    lookups: RefCell<LookupHandler>,
    pub submitted: RefCell<Vec<String>>,
    pub queried: RefCell<Vec<Locator>>,
    pub started: bool,
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            scripts: RefCell::new(Box::new(|_| Ok(undefined()))),
            lookups: RefCell::new(Box::new(|_| Ok(Vec::new()))),
            submitted: RefCell::new(Vec::new()),
            queried: RefCell::new(Vec::new()),
            started: false,
        }
    }

    pub fn with_scripts(mut self, handler: impl FnMut(&str) -> Result<Value> + 'static) -> Self {
        self.scripts = RefCell::new(Box::new(handler));
        self
    }

    pub fn with_lookups(
        mut self,
        handler: impl FnMut(&Locator) -> Result<Vec<FakeElement>> + 'static,
    ) -> Self {
        self.lookups = RefCell::new(Box::new(handler));
        self
    }

    pub fn submitted_containing(&self, needle: &str) -> usize {
        self.submitted
            .borrow()
            .iter()
            .filter(|script| script.contains(needle))
            .count()
    }
}

impl SessionDriver for FakeSession {
    type Element = FakeElement;

    fn start(&mut self) -> Result<()> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.started = false;
        Ok(())
    }

    fn navigate(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    fn evaluate_script(&self, script: &str) -> Result<Value> {
        self.submitted.borrow_mut().push(script.to_string());
        let mut handler = self.scripts.borrow_mut();
        (*handler)(script)
    }

    fn find_element(&self, locator: &Locator) -> Result<Option<FakeElement>> {
        Ok(self.find_all(locator)?.into_iter().next())
    }

    fn find_all(&self, locator: &Locator) -> Result<Vec<FakeElement>> {
        self.queried.borrow_mut().push(locator.clone());
        let mut handler = self.lookups.borrow_mut();
        (*handler)(locator)
    }
}

#[derive(Clone, Default)]
pub struct FakeElement {
    pub text: String,
    pub clicks: Rc<Cell<u32>>,
    pub children: Vec<FakeElement>,
}

impl FakeElement {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn containing(children: Vec<FakeElement>) -> Self {
        let text = children
            .iter()
            .map(|child| child.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            text,
            children,
            ..Self::default()
        }
    }

    pub fn click_count(&self) -> u32 {
        self.clicks.get()
    }
}

impl DomElement for FakeElement {
    fn click(&self) -> Result<()> {
        self.clicks.set(self.clicks.get() + 1);
        Ok(())
    }

    fn text(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn parent(&self) -> Result<Self> {
        Err(anyhow!("detached element"))
    }

    /// Children whose text equals the literal inside an exact-text XPath.
    fn find_all(&self, locator: &Locator) -> Result<Vec<Self>> {
        let wanted = exact_text(locator);
        Ok(self
            .children
            .iter()
            .filter(|child| wanted.as_deref().map_or(true, |text| child.text == text))
            .cloned()
            .collect())
    }
}

/// `'Save'` out of `.//*[text()='Save']`, for simple single-quoted literals.
pub fn exact_text(locator: &Locator) -> Option<String> {
    let Locator::XPath(expression) = locator else {
        return None;
    };
    let start = expression.find("text()='")? + "text()='".len();
    let end = start + expression[start..].find('\'')?;
    Some(expression[start..end].to_string())
}

pub fn value(value: Value) -> Value {
    json!(json!({ "status": "value", "value": value }).to_string())
}

pub fn undefined() -> Value {
    json!(json!({ "status": "undefined" }).to_string())
}

pub fn threw(message: &str) -> Value {
    json!(json!({ "status": "threw", "error": message }).to_string())
}

pub fn fast_settings() -> RobotSettings {
    RobotSettings {
        execution_timeout: Duration::from_millis(300),
        poll_interval: Duration::from_millis(10),
    }
}

pub fn robot(session: FakeSession) -> BrowserRobot<FakeSession> {
    init_test_tracing();
    BrowserRobot::with_settings(session, fast_settings())
}
