//! Probes and the per-attempt result they report to the poll engine.
use brobot_common::{Result, RobotError};
use serde_json::Value;

/// Outcome of one probe invocation.
///
/// `NotReady` is the out-of-band "nothing yet" signal; a `Ready` value is
/// never compared against a sentinel, so `false`, `0` and `""` stay usable
/// as real results.
#[derive(Debug)]
pub enum Attempt<T> {
    Ready(T),
    NotReady,
    Failed(RobotError),
}

impl<T> Attempt<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attempt<U> {
        match self {
            Attempt::Ready(value) => Attempt::Ready(f(value)),
            Attempt::NotReady => Attempt::NotReady,
            Attempt::Failed(err) => Attempt::Failed(err),
        }
    }
}

impl<T> From<Result<T>> for Attempt<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Attempt::Ready(value),
            Err(err) => Attempt::Failed(err),
        }
    }
}

impl<T> From<Option<T>> for Attempt<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Attempt::NotReady, Attempt::Ready)
    }
}

impl From<bool> for Attempt<Value> {
    fn from(value: bool) -> Self {
        Attempt::Ready(Value::Bool(value))
    }
}

impl From<Result<bool>> for Attempt<Value> {
    fn from(result: Result<bool>) -> Self {
        Attempt::from(result.map(Value::Bool))
    }
}

/// Fixed truthiness used by [`crate::poll::wait_for`].
///
/// `null`, `false`, numeric zero, `""`, `[]` and `{}` are falsy.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for Value {
    fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(fields) => !fields.is_empty(),
        }
    }
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

pub type ProbeFn<'a> = Box<dyn FnMut() -> Attempt<Value> + 'a>;

/// Something a wait can invoke repeatedly.
pub enum Probe<'a> {
    /// A script expression evaluated in the page; its decoded value is the
    /// result.
    Script(String),
    /// An arbitrary closure, e.g. a DOM lookup followed by a click.
    Function { description: String, check: ProbeFn<'a> },
}

impl<'a> Probe<'a> {
    pub fn script(expression: impl Into<String>) -> Self {
        Probe::Script(expression.into())
    }

    /// Wrap a closure returning anything convertible into an [`Attempt`]
    /// (`bool`, `Result<bool>`, `Result<Value>`, `Option<Value>`, ...).
    pub fn function<F, R>(description: impl Into<String>, mut check: F) -> Self
    where
        F: FnMut() -> R + 'a,
        R: Into<Attempt<Value>>,
    {
        Probe::Function {
            description: description.into(),
            check: Box::new(move || check().into()),
        }
    }

    /// Human-readable name embedded in timeout errors.
    pub fn description(&self) -> &str {
        match self {
            Probe::Script(expression) => expression,
            Probe::Function { description, .. } => description,
        }
    }
}

impl std::fmt::Debug for Probe<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Probe::Script(expression) => f.debug_tuple("Script").field(expression).finish(),
            Probe::Function { description, .. } => f
                .debug_struct("Function")
                .field("description", description)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_values() {
        for value in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
            assert!(!value.is_truthy(), "{value} should be falsy");
        }
    }

    #[test]
    fn truthy_values() {
        for value in [json!(true), json!(-1), json!(0.5), json!("0"), json!([0]), json!({"a": null})] {
            assert!(value.is_truthy(), "{value} should be truthy");
        }
    }

    #[test]
    fn conversions_into_attempts() {
        assert!(matches!(Attempt::<Value>::from(false), Attempt::Ready(Value::Bool(false))));
        assert!(matches!(Attempt::<Value>::from(None::<Value>), Attempt::NotReady));

        let failed: Attempt<Value> =
            Err::<bool, _>(RobotError::InvalidArgument("nope".into())).into();
        assert!(matches!(failed, Attempt::Failed(RobotError::InvalidArgument(_))));
    }

    #[test]
    fn function_probe_keeps_description() {
        let mut calls = 0;
        let mut probe = Probe::function("element with text \"Save\"", || {
            calls += 1;
            calls > 1
        });
        assert_eq!(probe.description(), "element with text \"Save\"");
        if let Probe::Function { check, .. } = &mut probe {
            assert!(matches!(check(), Attempt::Ready(Value::Bool(false))));
            assert!(matches!(check(), Attempt::Ready(Value::Bool(true))));
        }
    }
}
