//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use oxide_route::{compile, CompiledPattern, Controller, InvokeResult, PathParams, Registry};
use serde_json::json;

/// Compiles a template with `(name, pattern)` constraints.
pub fn pattern(template: &str, constraints: &[(&str, &str)]) -> CompiledPattern {
    let constraints: BTreeMap<String, String> = constraints
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    compile(template, &constraints).unwrap()
}

/// Matches a path and expects a hit, returning `(name, value)` pairs.
pub fn hit(pattern: &CompiledPattern, path: &str) -> Vec<(String, String)> {
    let params = pattern
        .match_path(path)
        .unwrap()
        .unwrap_or_else(|| panic!("{path} should match {}", pattern.template()));
    params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Asserts that a path does not match.
pub fn miss(pattern: &CompiledPattern, path: &str) {
    assert!(
        pattern.match_path(path).unwrap().is_none(),
        "{path} should not match {}",
        pattern.template()
    );
}

/// Controller that echoes its method name and arguments.
pub struct Echo {
    pub methods: &'static [&'static str],
}

impl Controller for Echo {
    fn has_method(&self, name: &str) -> bool {
        self.methods.contains(&name)
    }

    fn call(&self, method: &str, args: &PathParams) -> InvokeResult {
        if method == "fail" {
            return Err(format!("{method} refused {} arguments", args.len()).into());
        }
        Ok(json!({ "method": method, "args": args }))
    }
}

/// Registry with `App\Controllers\Foo` exposing `bar`, `show` and `fail`,
/// the last of which always errors.
pub fn registry() -> Registry {
    Registry::new().register("App\\Controllers\\Foo", || {
        Arc::new(Echo {
            methods: &["bar", "show", "fail"],
        }) as Arc<dyn Controller>
    })
}
