mod common;

use std::time::{Duration, Instant};

use brobot_core::{ExtJsRobot, RobotError};
use brobot_drivers::Locator;
use chrono::NaiveDate;
use common::{robot, value, FakeElement, FakeSession};
use serde_json::json;

const SAVE_QUERY: &str = "button[itemId=save]";

#[test]
fn component_expression_quotes_the_query() {
    let robot = robot(FakeSession::new());
    assert_eq!(
        robot.component_expression("textfield[name='city']"),
        r"Ext.ComponentQuery.query('textfield[name=\'city\']')[0]"
    );
}

#[test]
fn click_component_looks_the_element_up_by_id() {
    let button = FakeElement::new("Save");
    let handle = button.clone();
    let robot = robot(
        FakeSession::new()
            .with_scripts(|script| {
                assert!(script.contains("Ext.ComponentQuery.query('button[itemId=save]')[0]"));
                Ok(value(json!("button-1012")))
            })
            .with_lookups(move |locator| {
                assert_eq!(locator, &Locator::css(r#"[id="button-1012"]"#));
                Ok(vec![button.clone()])
            }),
    );

    robot.click_ext_component(SAVE_QUERY).unwrap();
    assert_eq!(handle.click_count(), 1);
}

#[test]
fn component_without_id_is_an_invalid_argument() {
    let mut robot = robot(FakeSession::new().with_scripts(|script| {
        if script.contains(" : ''") {
            Ok(value(json!("")))
        } else {
            Ok(value(json!(true)))
        }
    }));
    robot.set_execution_timeout(Duration::from_secs(10));
    let started = Instant::now();

    let err = robot.click_ext_component(SAVE_QUERY).unwrap_err();
    assert!(matches!(err, RobotError::InvalidArgument(_)), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(robot.session().queried.borrow().is_empty());
}

#[test]
fn missing_component_times_out() {
    let robot = robot(FakeSession::new().with_scripts(|_| Ok(value(json!(null)))));
    let err = robot.wait_for_ext_component("grid#orders").unwrap_err();
    match err {
        RobotError::Timeout { condition, .. } => assert!(condition.contains("grid#orders")),
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[test]
fn value_text_handles_combo_boxes_and_plain_fields() {
    let robot = robot(FakeSession::new().with_scripts(|script| {
        assert!(script.contains("isXType('combobox')"));
        assert!(script.contains("record.get(c.displayField)"));
        assert!(script.contains("String(c.getValue()).indexOf('Berlin') != -1"));
        Ok(value(json!(true)))
    }));

    robot
        .wait_for_ext_component_value_text("combo[name=city]", "Berlin")
        .unwrap();
}

#[test]
fn set_value_serialises_the_value_as_json() {
    let robot = robot(FakeSession::new().with_scripts(|_| Ok(value(json!(null)))));

    robot
        .set_ext_component_value("tagfield", &json!(["a", "b's"]))
        .unwrap();
    assert_eq!(
        robot
            .session()
            .submitted_containing(r#"Ext.ComponentQuery.query('tagfield')[0].setValue(["a","b's"]);"#),
        1
    );
}

#[test]
fn set_date_uses_zero_based_months() {
    let robot = robot(FakeSession::new().with_scripts(|_| Ok(value(json!(null)))));
    let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

    robot.set_ext_date_value("datefield[name=due]", date).unwrap();
    assert_eq!(
        robot
            .session()
            .submitted_containing("setValue(new Date(2024, 0, 31));"),
        1
    );
}

#[test]
fn message_box_answer_clicks_inside_the_dialog() {
    let yes = FakeElement::new("Yes");
    let handle = yes.clone();
    let dialog = FakeElement::containing(vec![yes, FakeElement::new("No")]);
    let robot = robot(
        FakeSession::new()
            .with_scripts(|script| {
                assert!(script.contains("Ext.Msg.isVisible()"));
                Ok(value(json!(true)))
            })
            .with_lookups(move |locator| {
                assert_eq!(locator, &Locator::css(".x-message-box"));
                Ok(vec![dialog.clone()])
            }),
    );

    robot.answer_ext_message_box("Yes").unwrap();
    assert_eq!(handle.click_count(), 1);
}

#[test]
fn value_like_assertion() {
    let robot = robot(FakeSession::new().with_scripts(|script| {
        assert!(script.contains("Zan.qa.BrowserTestInterop.isValueLike('numberfield[name=qty]', 42)"));
        Ok(value(json!(script.contains("42"))))
    }));

    assert!(robot.ext_component_value_like("numberfield[name=qty]", &json!(42)).unwrap());
    robot
        .assert_ext_component_value_like("numberfield[name=qty]", &json!(42), None)
        .unwrap();
}

#[test]
fn failed_value_like_assertion_carries_message() {
    let robot = robot(FakeSession::new().with_scripts(|_| Ok(value(json!(false)))));

    let err = robot
        .assert_ext_component_value_like("textfield[name=city]", &json!("Berlin"), Some("city after save"))
        .unwrap_err();
    match err {
        RobotError::AssertionFailed(message) => {
            assert!(message.starts_with("city after save: "));
            assert!(message.contains("\"Berlin\""));
        }
        other => panic!("expected an assertion failure, got {other:?}"),
    }
}
