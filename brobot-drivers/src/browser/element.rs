use crate::session::{DomElement, Locator};
use anyhow::Result;
use brobot_runtime::BrobotHandle;
use fantoccini::elements::Element;

/// DOM element handed out by [`crate::WebDriverSession`].
#[derive(Clone)]
pub struct WebDriverElement {
    pub element: Element,
    handle: BrobotHandle,
}

impl WebDriverElement {
    pub fn new(element: Element, handle: BrobotHandle) -> Self {
        Self { element, handle }
    }

    fn wrap_all(&self, elements: Vec<Element>) -> Vec<WebDriverElement> {
        elements
            .into_iter()
            .map(|element| WebDriverElement::new(element, self.handle.clone()))
            .collect()
    }
}

impl DomElement for WebDriverElement {
    fn click(&self) -> Result<()> {
        self.handle.block_on(self.element.click())?;
        Ok(())
    }

    fn text(&self) -> Result<String> {
        Ok(self.handle.block_on(self.element.text())?)
    }

    fn parent(&self) -> Result<Self> {
        let parent = self
            .handle
            .block_on(self.element.find(fantoccini::Locator::XPath("..")))?;
        Ok(WebDriverElement::new(parent, self.handle.clone()))
    }

    fn find_all(&self, locator: &Locator) -> Result<Vec<Self>> {
        let elements = self
            .handle
            .block_on(self.element.find_all(locator.as_fantoccini()))?;
        Ok(self.wrap_all(elements))
    }
}
