//! The `ScriptEnvironment` hook boundary (§6 "Script-host hook"): the
//! editor core calls `evaluate` with the contents of config files and
//! server messages, but the expression parser/runtime for the embedded
//! language are external and out of scope here — this crate only
//! establishes the trait surface plus a `NoopScriptEnvironment` used
//! until a real host is wired in.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// A script-visible value. Intentionally small: enough for config
/// define/lookup round-trips without committing to the embedded
/// language's own type system.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Subset of the error kinds relevant to script evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("cancelled")]
    Cancelled,
}

pub type ScriptFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ScriptError>> + Send + 'a>>;

/// The opaque script-host boundary: `define`/`lookup` give the embedded
/// language access to host-provided bindings; `evaluate` runs one
/// expression and resolves asynchronously (script execution may itself
/// await I/O or other buffers).
pub trait ScriptEnvironment: Send + Sync {
    fn define(&mut self, name: &str, value: Value);
    fn lookup(&self, namespace: &str, name: &str) -> Option<Value>;
    fn evaluate(&mut self, expression_source: &str) -> ScriptFuture<'_>;
}

impl<T: ScriptEnvironment + ?Sized> ScriptEnvironment for &mut T {
    fn define(&mut self, name: &str, value: Value) {
        (**self).define(name, value)
    }
    fn lookup(&self, namespace: &str, name: &str) -> Option<Value> {
        (**self).lookup(namespace, name)
    }
    fn evaluate(&mut self, expression_source: &str) -> ScriptFuture<'_> {
        (**self).evaluate(expression_source)
    }
}

/// Host with no interpreter attached: `define`/`lookup` work against an
/// in-memory global namespace (global definitions only, no other
/// namespaces), and `evaluate` always resolves to `NotFound` since no
/// parser is installed.
#[derive(Default)]
pub struct NoopScriptEnvironment {
    globals: HashMap<String, Value>,
}

impl NoopScriptEnvironment {
    pub fn new() -> Self {
        Self::default()
    }
}

const GLOBAL_NAMESPACE: &str = "global";

impl ScriptEnvironment for NoopScriptEnvironment {
    fn define(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_string(), value);
    }

    fn lookup(&self, namespace: &str, name: &str) -> Option<Value> {
        if namespace != GLOBAL_NAMESPACE {
            return None;
        }
        self.globals.get(name).cloned()
    }

    fn evaluate(&mut self, expression_source: &str) -> ScriptFuture<'_> {
        let message = format!("no script runtime installed to evaluate: {expression_source}");
        Box::pin(async move { Err(ScriptError::NotFound(message)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_lookup_in_global_namespace() {
        let mut env = NoopScriptEnvironment::new();
        env.define("margin", Value::Int(2));
        assert_eq!(env.lookup(GLOBAL_NAMESPACE, "margin"), Some(Value::Int(2)));
    }

    #[test]
    fn lookup_outside_global_namespace_is_none() {
        let mut env = NoopScriptEnvironment::new();
        env.define("margin", Value::Int(2));
        assert_eq!(env.lookup("buffer", "margin"), None);
    }

    #[test]
    fn lookup_of_undefined_name_is_none() {
        let env = NoopScriptEnvironment::new();
        assert_eq!(env.lookup(GLOBAL_NAMESPACE, "missing"), None);
    }

    #[tokio::test]
    async fn evaluate_without_a_runtime_resolves_not_found() {
        let mut env = NoopScriptEnvironment::new();
        let result = env.evaluate("(+ 1 2)").await;
        assert!(matches!(result, Err(ScriptError::NotFound(_))));
    }
}
