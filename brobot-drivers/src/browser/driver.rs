use crate::browser::{capabilities::build_capabilities, element::WebDriverElement};
use crate::session::{Locator, SessionDriver};
use anyhow::{anyhow, Context, Result};
use brobot_config::{BrobotConfig, WebDriverSection};
use brobot_runtime::BrobotRuntime;
use fantoccini::{Client, ClientBuilder};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

/// Blocking wrapper around a `fantoccini` WebDriver client.
///
/// The session owns a private tokio runtime and blocks on every WebDriver
/// command, so callers see a plain synchronous API.
pub struct WebDriverSession {
    section: WebDriverSection,
    runtime: BrobotRuntime,
    client: Option<Client>,
}

impl WebDriverSession {
    /// Prepare a session for the WebDriver service described by `section`.
    ///
    /// Nothing is contacted until [`SessionDriver::start`].
    pub fn new(section: WebDriverSection) -> Result<Self> {
        Url::parse(&section.url)
            .with_context(|| format!("invalid WebDriver url: {}", section.url))?;
        let runtime = BrobotRuntime::build("brobot-webdriver", Some(1))?;
        Ok(Self {
            section,
            runtime,
            client: None,
        })
    }

    pub fn from_config(config: &BrobotConfig) -> Result<Self> {
        Self::new(config.webdriver.clone())
    }

    pub fn is_started(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| anyhow!("WebDriver session is not started"))
    }

    fn wrap(&self, element: fantoccini::elements::Element) -> WebDriverElement {
        WebDriverElement::new(element, self.runtime.handle())
    }
}

impl SessionDriver for WebDriverSession {
    type Element = WebDriverElement;

    fn start(&mut self) -> Result<()> {
        if self.client.is_some() {
            return Ok(());
        }

        let caps = build_capabilities(&self.section);
        let url = self.section.url.clone();
        let client = self
            .runtime
            .block_on(async { ClientBuilder::native().capabilities(caps).connect(&url).await })
            .with_context(|| format!("failed to open a WebDriver session at {url}"))?;

        info!(
            target: "brobot.driver",
            url = %self.section.url,
            browser = ?self.section.browser,
            headless = self.section.headless,
            "webdriver session started"
        );
        self.client = Some(client);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            self.runtime.block_on(client.close())?;
            info!(target: "brobot.driver", "webdriver session closed");
        }
        Ok(())
    }

    fn navigate(&self, url: &str) -> Result<()> {
        let client = self.client()?;
        self.runtime
            .block_on(client.goto(url))
            .with_context(|| format!("navigation to {url} failed"))?;
        debug!(target: "brobot.driver", %url, "navigated");
        Ok(())
    }

    fn evaluate_script(&self, script: &str) -> Result<Value> {
        let client = self.client()?;
        let value = self.runtime.block_on(client.execute(script, vec![]))?;
        Ok(value)
    }

    fn find_element(&self, locator: &Locator) -> Result<Option<WebDriverElement>> {
        Ok(self.find_all(locator)?.into_iter().next())
    }

    fn find_all(&self, locator: &Locator) -> Result<Vec<WebDriverElement>> {
        let client = self.client()?;
        let elements = self
            .runtime
            .block_on(client.find_all(locator.as_fantoccini()))
            .with_context(|| format!("lookup by {locator} failed"))?;

        Ok(elements
            .into_iter()
            .map(|element| self.wrap(element))
            .collect())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(target: "brobot.driver", error = %err, "failed to close webdriver session on drop");
        }
    }
}
