use anyhow::Result;
use serde_json::Value;
use std::fmt;

/// Lookup strategy for DOM queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    pub fn as_fantoccini(&self) -> fantoccini::Locator<'_> {
        match self {
            Locator::Css(selector) => fantoccini::Locator::Css(selector),
            Locator::XPath(expression) => fantoccini::Locator::XPath(expression),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css `{selector}`"),
            Locator::XPath(expression) => write!(f, "xpath `{expression}`"),
        }
    }
}

/// A browser session the robot can evaluate scripts against.
///
/// Implementations are used by one test flow at a time; query methods take
/// `&self` so probes can borrow the session while a wait loop runs.
pub trait SessionDriver {
    type Element: DomElement;

    /// Open the underlying browser session.
    fn start(&mut self) -> Result<()>;

    /// Close the session. Stopping a session that never started is a no-op.
    fn stop(&mut self) -> Result<()>;

    fn navigate(&self, url: &str) -> Result<()>;

    /// Execute `script` as a function body and return its raw JSON result.
    fn evaluate_script(&self, script: &str) -> Result<Value>;

    /// First element matching `locator` in the page, if any.
    fn find_element(&self, locator: &Locator) -> Result<Option<Self::Element>>;

    fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element>>;
}

/// A live DOM node handed out by a [`SessionDriver`].
pub trait DomElement: Sized {
    fn click(&self) -> Result<()>;

    /// Rendered text of the element and its descendants.
    fn text(&self) -> Result<String>;

    /// Whether the rendered text contains `needle`.
    fn has_content(&self, needle: &str) -> Result<bool> {
        Ok(self.text()?.contains(needle))
    }

    fn parent(&self) -> Result<Self>;

    /// Descendants matching `locator`. XPath expressions should be relative
    /// (`.//…`) to stay inside this element.
    fn find_all(&self, locator: &Locator) -> Result<Vec<Self>>;
}
