//! Route settings and their inheritance rules.
//!
//! Settings flow from groups to routes once, at registration time:
//! a child calls [`RouteSettings::merge`] with its parent's
//! [`RouteSettings::export`] and keeps the result. Nothing holds on to the
//! parent afterwards.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::method::Method;

/// Configuration attached to a route or a group.
///
/// Empty collections and `None` mean "not set"; such fields contribute
/// nothing when merged into a child.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteSettings {
    /// Namespace used to qualify class-based targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Accepted request methods. Empty accepts any method.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub methods: BTreeSet<Method>,

    /// Per-parameter sub-patterns.
    #[serde(rename = "where", skip_serializing_if = "BTreeMap::is_empty")]
    pub constraints: BTreeMap<String, String>,

    /// Sub-pattern for parameters without a constraint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_constraint: Option<String>,

    /// Explicitly bound parameter values. `None` is an explicit null.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Option<String>>,

    /// Middleware identifiers, outermost first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub middleware: Vec<String>,
}

impl RouteSettings {
    /// Creates empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Adds an accepted method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.methods.insert(method);
        self
    }

    /// Adds several accepted methods.
    #[must_use]
    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods.extend(methods);
        self
    }

    /// Adds a constraint for one parameter.
    #[must_use]
    pub fn constraint(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.constraints.insert(name.into(), pattern.into());
        self
    }

    /// Sets the sub-pattern for unconstrained parameters.
    #[must_use]
    pub fn default_constraint(mut self, pattern: impl Into<String>) -> Self {
        self.default_constraint = Some(pattern.into());
        self
    }

    /// Binds a parameter to a literal value.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), Some(value.into()));
        self
    }

    /// Binds a parameter to an explicit null.
    #[must_use]
    pub fn null_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), None);
        self
    }

    /// Appends a middleware identifier.
    #[must_use]
    pub fn middleware(mut self, id: impl Into<String>) -> Self {
        self.middleware.push(id.into());
        self
    }

    /// Replaces the accepted methods.
    pub fn replace_methods(&mut self, methods: impl IntoIterator<Item = Method>) {
        self.methods = methods.into_iter().collect();
    }

    /// Replaces the middleware chain.
    pub fn replace_middleware<I, S>(&mut self, chain: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware = chain.into_iter().map(Into::into).collect();
    }

    /// Returns `true` if nothing is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespace.is_none()
            && self.methods.is_empty()
            && self.constraints.is_empty()
            && self.default_constraint.is_none()
            && self.parameters.is_empty()
            && self.middleware.is_empty()
    }

    /// Returns only the fields that are actually set, for propagation to
    /// children. Blank strings count as unset.
    #[must_use]
    pub fn export(&self) -> Self {
        Self {
            namespace: non_blank(self.namespace.as_deref()),
            default_constraint: non_blank(self.default_constraint.as_deref()),
            ..self.clone()
        }
    }

    /// Combines these settings with inherited ones.
    ///
    /// - `namespace` and `default_constraint` are inherited only when unset.
    /// - `methods` is the union of both sets.
    /// - `constraints` and `parameters` are unions; own entries win.
    /// - Inherited middleware runs first, followed by own entries that are
    ///   not already inherited. An ancestor middleware therefore never runs
    ///   after the route's own, and merging the same parent twice gives the
    ///   same chain as merging it once.
    #[must_use]
    pub fn merge(&self, inherited: &Self) -> Self {
        let mut merged = self.clone();

        if merged.namespace.is_none() {
            merged.namespace.clone_from(&inherited.namespace);
        }
        if merged.default_constraint.is_none() {
            merged
                .default_constraint
                .clone_from(&inherited.default_constraint);
        }

        merged.methods.extend(inherited.methods.iter().copied());

        for (name, pattern) in &inherited.constraints {
            merged
                .constraints
                .entry(name.clone())
                .or_insert_with(|| pattern.clone());
        }
        for (name, value) in &inherited.parameters {
            merged
                .parameters
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }

        merged.middleware = inherited
            .middleware
            .iter()
            .chain(
                self.middleware
                    .iter()
                    .filter(|id| !inherited.middleware.contains(*id)),
            )
            .cloned()
            .collect();

        debug!(
            namespace = ?merged.namespace,
            methods = merged.methods.len(),
            constraints = merged.constraints.len(),
            middleware = merged.middleware.len(),
            "Merged route settings"
        );

        merged
    }

    /// Merges `parent` into these settings in place.
    pub fn import_from(&mut self, parent: &Self) {
        *self = self.merge(parent);
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn own() -> RouteSettings {
        RouteSettings::new()
            .method(Method::Get)
            .constraint("id", "[0-9]+")
            .parameter("page", "1")
            .middleware("C")
    }

    #[test]
    fn test_merge_with_empty_parent_is_noop() {
        let own = own();
        assert_eq!(own.merge(&RouteSettings::new()), own);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let parent = RouteSettings::new()
            .namespace("App\\Controllers")
            .method(Method::Post)
            .constraint("slug", "[a-z-]+")
            .middleware("A")
            .middleware("B");
        let once = own().merge(&parent);
        let twice = once.merge(&parent);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_middleware_parent_first() {
        let parent = RouteSettings::new().middleware("A").middleware("B");
        let merged = own().merge(&parent);
        assert_eq!(merged.middleware, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_ancestor_middleware_stays_ahead_of_own_copy() {
        let parent = RouteSettings::new().middleware("A").middleware("B");
        let own = RouteSettings::new().middleware("C").middleware("A");

        let merged = own.merge(&parent);
        assert_eq!(merged.middleware, vec!["A", "B", "C"]);
        assert_eq!(merged.merge(&parent), merged);
    }

    #[test]
    fn test_namespace_inherited_only_when_unset() {
        let parent = RouteSettings::new().namespace("Parent");
        assert_eq!(
            own().merge(&parent).namespace.as_deref(),
            Some("Parent")
        );
        let child = own().namespace("Child");
        assert_eq!(child.merge(&parent).namespace.as_deref(), Some("Child"));
    }

    #[test]
    fn test_own_entries_win() {
        let parent = RouteSettings::new()
            .constraint("id", "[a-z]+")
            .constraint("lang", "en|de")
            .parameter("page", "9")
            .null_parameter("sort");
        let merged = own().merge(&parent);

        assert_eq!(merged.constraints["id"], "[0-9]+");
        assert_eq!(merged.constraints["lang"], "en|de");
        assert_eq!(merged.parameters["page"].as_deref(), Some("1"));
        assert_eq!(merged.parameters["sort"], None);
    }

    #[test]
    fn test_methods_union() {
        let parent = RouteSettings::new().methods([Method::Post, Method::Get]);
        let merged = own().merge(&parent);
        assert_eq!(
            merged.methods.into_iter().collect::<Vec<_>>(),
            vec![Method::Get, Method::Post]
        );
    }

    #[test]
    fn test_export_drops_blank_fields() {
        let settings = RouteSettings {
            namespace: Some("  ".to_string()),
            ..RouteSettings::new()
        };
        assert!(settings.export().is_empty());

        let child = RouteSettings::new().namespace("Child");
        assert_eq!(
            child.merge(&settings.export()).namespace.as_deref(),
            Some("Child")
        );
    }

    #[test]
    fn test_replacement_setters() {
        let mut settings = own().method(Method::Put);
        settings.replace_methods([Method::Delete]);
        settings.replace_middleware(["X"]);
        assert_eq!(settings.methods.len(), 1);
        assert_eq!(settings.middleware, vec!["X"]);
    }

    #[test]
    fn test_serialize_skips_unset_fields() {
        let json = serde_json::to_value(RouteSettings::new().middleware("auth")).unwrap();
        assert_eq!(json, serde_json::json!({ "middleware": ["auth"] }));

        let parsed: RouteSettings = serde_json::from_value(serde_json::json!({
            "namespace": "App",
            "methods": ["GET", "POST"],
            "where": { "id": "[0-9]+" },
            "parameters": { "page": "1", "sort": null }
        }))
        .unwrap();
        assert_eq!(parsed.namespace.as_deref(), Some("App"));
        assert_eq!(parsed.methods.len(), 2);
        assert_eq!(parsed.constraints["id"], "[0-9]+");
        assert_eq!(parsed.parameters["sort"], None);
    }
}
