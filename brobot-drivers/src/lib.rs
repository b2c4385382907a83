//! Driver layer for browser automation.
//!
//! The robot only talks to a browser through the [`session::SessionDriver`]
//! and [`session::DomElement`] traits. This crate defines those seams and
//! ships one implementation backed by a `fantoccini` WebDriver client.
//!
//! - [`session::SessionDriver`]: start/stop, navigation, script evaluation, lookups
//! - [`session::Locator`]: CSS or XPath lookup strategy
//! - [`browser::driver::WebDriverSession`]: blocking wrapper around a WebDriver client
//! - [`browser::capabilities`]: browser capabilities built from configuration
pub mod session;
pub mod browser;

pub use session::{DomElement, Locator, SessionDriver};
pub use browser::driver::WebDriverSession;
pub use browser::element::WebDriverElement;
