use brobot_config::{BrowserKind, WebDriverSection};
use serde_json::json;
use ::webdriver::capabilities::Capabilities;

/// Construct browser command-line arguments for a WebDriver section.
pub fn build_browser_arguments(section: &WebDriverSection) -> Vec<String> {
    let mut args = match section.browser {
        BrowserKind::Chrome => vec![
            "--disable-infobars".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--no-sandbox".to_string(),
            "--disable-extensions".to_string(),
            "--window-size=1920,1080".to_string(),
        ],
        BrowserKind::Firefox => vec!["-width=1920".to_string(), "-height=1080".to_string()],
    };

    if section.headless {
        match section.browser {
            BrowserKind::Chrome => {
                args.push("--headless".to_string());
                args.push("--disable-gpu".to_string());
            }
            BrowserKind::Firefox => args.push("-headless".to_string()),
        }
    }

    args.extend(section.args.iter().cloned());
    args
}

/// Capabilities requested when the session is opened.
pub fn build_capabilities(section: &WebDriverSection) -> Capabilities {
    let mut caps = Capabilities::new();
    let args = build_browser_arguments(section);

    match section.browser {
        BrowserKind::Chrome => {
            caps.insert("browserName".to_string(), json!("chrome"));
            caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        }
        BrowserKind::Firefox => {
            caps.insert("browserName".to_string(), json!("firefox"));
            caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
        }
    }
    caps
}
