//! Conveniences for pages built on ExtJs.
//!
//! Components are addressed by `Ext.ComponentQuery` selectors. Only component
//! ids cross back into the test; elements are then looked up in the DOM by id.

use crate::escape::{css_string, quote};
use crate::probe::Probe;
use crate::robot::BrowserRobot;
use brobot_common::{Result, RobotError};
use brobot_drivers::{DomElement, Locator, SessionDriver};
use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use tracing::debug;

/// Page-side helper comparing a component's value against an expected one.
pub const VALUE_LIKE_FN: &str = "Zan.qa.BrowserTestInterop.isValueLike";

/// CSS selector of the floating `Ext.Msg` dialog.
pub const MESSAGE_BOX_SELECTOR: &str = ".x-message-box";

pub trait ExtJsRobot {
    type Session: SessionDriver;

    fn robot(&self) -> &BrowserRobot<Self::Session>;

    /// `Ext.ComponentQuery.query(<query>)[0]`
    fn component_expression(&self, query: &str) -> String {
        format!("Ext.ComponentQuery.query({})[0]", quote(query))
    }

    /// Wait until a component matches `query` and has rendered an id.
    fn wait_for_ext_component(&self, query: &str) -> Result<()> {
        let component = self.component_expression(query);
        self.robot()
            .wait_for_true(&format!("{component} && {component}.id"), None)?;
        Ok(())
    }

    /// Id of the first component matching `query`.
    fn ext_component_id(&self, query: &str) -> Result<String> {
        let component = self.component_expression(query);
        let value = self
            .robot()
            .read_value_with_retry(&format!("{component} ? {component}.id : ''"), None)?;
        match value {
            Value::String(id) if !id.is_empty() => Ok(id),
            _ => Err(RobotError::InvalidArgument(format!(
                "component {query:?} has no id"
            ))),
        }
    }

    fn click_ext_component(&self, query: &str) -> Result<()> {
        self.wait_for_ext_component(query)?;
        let id = self.ext_component_id(query)?;
        let locator = Locator::css(format!("[id={}]", css_string(&id)));

        let robot = self.robot();
        robot.wait_for(
            Probe::function(format!("element of component {query:?}"), || -> Result<bool> {
                match robot.session().find_element(&locator)? {
                    Some(element) => {
                        element.click()?;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }),
            None,
        )?;
        debug!(target: "brobot.robot", %query, %id, "clicked component");
        Ok(())
    }

    /// Wait until the displayed value of the component contains `text`.
    ///
    /// Combo boxes are compared on the display field of the selected record.
    fn wait_for_ext_component_value_text(&self, query: &str, text: &str) -> Result<()> {
        let component = self.component_expression(query);
        let needle = quote(text);
        let expression = format!(
            "(function (c) {{
    if (!c) {{ return false; }}
    if (c.isXType && c.isXType('combobox')) {{
        var record = c.findRecordByValue(c.getValue());
        return !!record && String(record.get(c.displayField)).indexOf({needle}) != -1;
    }}
    return String(c.getValue()).indexOf({needle}) != -1;
}})({component})"
        );
        self.robot().wait_for_true(&expression, None)?;
        Ok(())
    }

    fn set_ext_component_value(&self, query: &str, value: &Value) -> Result<()> {
        let component = self.component_expression(query);
        self.robot()
            .run_script(&format!("{component}.setValue({value});"), None)?;
        Ok(())
    }

    fn set_ext_date_value(&self, query: &str, date: NaiveDate) -> Result<()> {
        let component = self.component_expression(query);
        let statement = format!(
            "{component}.setValue(new Date({}, {}, {}));",
            date.year(),
            date.month0(),
            date.day()
        );
        self.robot().run_script(&statement, None)?;
        Ok(())
    }

    /// Wait for `Ext.Msg` to show and click the button labelled `button_text`.
    fn answer_ext_message_box(&self, button_text: &str) -> Result<()> {
        let robot = self.robot();
        robot.wait_for_true("Ext.Msg.isVisible()", None)?;
        robot.click(button_text, Some(MESSAGE_BOX_SELECTOR))
    }

    fn ext_component_value_like(&self, query: &str, value: &Value) -> Result<bool> {
        let expression = format!("{VALUE_LIKE_FN}({}, {value})", quote(query));
        match self.robot().read_value_with_retry(&expression, None)? {
            Value::Bool(like) => Ok(like),
            other => Err(RobotError::AssertionFailed(format!(
                "{VALUE_LIKE_FN} returned {other} for {query:?}"
            ))),
        }
    }

    fn assert_ext_component_value_like(&self, query: &str, value: &Value, message: Option<&str>) -> Result<()> {
        if self.ext_component_value_like(query, value)? {
            return Ok(());
        }
        let detail = format!("value of {query:?} is not like {value}");
        Err(RobotError::AssertionFailed(match message {
            Some(message) => format!("{message}: {detail}"),
            None => detail,
        }))
    }
}

impl<D: SessionDriver> ExtJsRobot for BrowserRobot<D> {
    type Session = D;

    fn robot(&self) -> &BrowserRobot<D> {
        self
    }
}
