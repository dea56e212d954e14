//! JSON route manifests.
//!
//! A manifest describes nested groups and the routes inside them. Loading
//! one runs the same registration-time merge a host router performs and
//! yields the compiled routes with their effective settings.

use std::path::Path;

use anyhow::{Context, Result};
use oxide_route::{CompiledRoute, PatternCompiler, Route, RouteGroup, RouteSettings, Target};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

/// Top-level manifest document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Namespace for class targets when no group or route sets one.
    pub default_namespace: Option<String>,
    /// Routes outside any group.
    pub routes: Vec<RouteEntry>,
    /// Top-level groups.
    pub groups: Vec<GroupEntry>,
}

/// A group and everything nested in it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GroupEntry {
    pub prefix: String,
    pub settings: RouteSettings,
    pub routes: Vec<RouteEntry>,
    pub groups: Vec<GroupEntry>,
}

/// A single route.
#[derive(Debug, Deserialize)]
pub struct RouteEntry {
    pub template: String,
    /// `Class@method` reference. Routes without one echo their arguments.
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub settings: RouteSettings,
}

impl Manifest {
    /// Reads a manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        let manifest: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing manifest {}", path.display()))?;
        info!(
            path = %path.display(),
            routes = manifest.routes.len(),
            groups = manifest.groups.len(),
            "Loaded manifest"
        );
        Ok(manifest)
    }

    /// Compiles every route, applying group settings on the way down.
    ///
    /// `default_namespace` takes precedence over the manifest's own.
    pub fn register(
        &self,
        compiler: &PatternCompiler,
        default_namespace: Option<&str>,
    ) -> Result<Vec<CompiledRoute>> {
        let registrar = Registrar {
            compiler,
            default_namespace: default_namespace.or(self.default_namespace.as_deref()),
        };
        let mut compiled = Vec::new();
        let root = RouteGroup::default();
        registrar.routes(&root, &self.routes, &mut compiled)?;
        for entry in &self.groups {
            registrar.group(&root, entry, &mut compiled)?;
        }
        Ok(compiled)
    }
}

struct Registrar<'a> {
    compiler: &'a PatternCompiler,
    default_namespace: Option<&'a str>,
}

impl Registrar<'_> {
    fn group(
        &self,
        parent: &RouteGroup,
        entry: &GroupEntry,
        out: &mut Vec<CompiledRoute>,
    ) -> Result<()> {
        let group =
            parent.nest(RouteGroup::new(entry.prefix.as_str()).with_settings(entry.settings.clone()));
        debug!(prefix = %group.prefix(), "Registering group");
        self.routes(&group, &entry.routes, out)?;
        for child in &entry.groups {
            self.group(&group, child, out)?;
        }
        Ok(())
    }

    fn routes(
        &self,
        group: &RouteGroup,
        entries: &[RouteEntry],
        out: &mut Vec<CompiledRoute>,
    ) -> Result<()> {
        for entry in entries {
            let target = match &entry.target {
                Some(reference) => reference
                    .parse::<Target>()
                    .with_context(|| format!("route {}", entry.template))?,
                None => Target::function(|args| Ok(json!(args))),
            };
            let mut route =
                Route::new(entry.template.as_str(), target).with_settings(&entry.settings);
            if let Some(namespace) = self.default_namespace {
                route = route.default_namespace(namespace);
            }
            let route = group
                .apply(route)
                .compile_with(self.compiler)
                .with_context(|| format!("compiling route {}", entry.template))?;
            out.push(route);
        }
        Ok(())
    }
}

/// Describes a compiled route as JSON.
pub fn describe(route: &CompiledRoute) -> Value {
    let target = match route.target() {
        Target::Function(_) => Value::from("<function>"),
        Target::Method { method, .. } => Value::from(format!(
            "{}@{method}",
            route.qualified_class().unwrap_or_default()
        )),
    };
    json!({
        "template": route.template(),
        "regex": route.pattern().regex().as_str(),
        "params": route.pattern().params(),
        "target": target,
        "settings": route.settings(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        serde_json::from_value(json!({
            "default_namespace": "App\\Controllers",
            "routes": [
                { "template": "/", "target": "Home@index" }
            ],
            "groups": [
                {
                    "prefix": "/admin",
                    "settings": { "namespace": "App\\Admin", "middleware": ["auth"] },
                    "routes": [
                        { "template": "/users/{id}", "target": "Users@show",
                          "settings": { "where": { "id": "[0-9]+" }, "middleware": ["audit"] } }
                    ],
                    "groups": [
                        {
                            "prefix": "/reports",
                            "settings": { "methods": ["GET"] },
                            "routes": [ { "template": "/{year?}" } ]
                        }
                    ]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_register_applies_inheritance() {
        let routes = manifest()
            .register(&PatternCompiler::default(), None)
            .unwrap();
        assert_eq!(routes.len(), 3);

        assert_eq!(
            routes[0].qualified_class().as_deref(),
            Some("App\\Controllers\\Home")
        );

        let users = &routes[1];
        assert_eq!(users.template(), "/admin/users/{id}");
        assert_eq!(users.middleware(), ["auth", "audit"]);
        assert_eq!(users.qualified_class().as_deref(), Some("App\\Admin\\Users"));
        assert!(users.match_path("/admin/users/x").unwrap().is_none());

        let reports = &routes[2];
        assert_eq!(reports.template(), "/admin/reports/{year?}");
        assert_eq!(reports.middleware(), ["auth"]);
        assert!(reports.match_path("/admin/reports").unwrap().is_some());
    }

    #[test]
    fn test_flag_namespace_wins() {
        let routes = manifest()
            .register(&PatternCompiler::default(), Some("Cli"))
            .unwrap();
        assert_eq!(routes[0].qualified_class().as_deref(), Some("Cli\\Home"));
    }

    #[test]
    fn test_bad_target_is_reported() {
        let manifest: Manifest = serde_json::from_value(json!({
            "routes": [ { "template": "/", "target": "NoMethod" } ]
        }))
        .unwrap();
        let err = manifest
            .register(&PatternCompiler::default(), None)
            .unwrap_err();
        assert!(err.to_string().contains("route /"));
    }

    #[test]
    fn test_describe() {
        let routes = manifest()
            .register(&PatternCompiler::default(), None)
            .unwrap();
        let value = describe(&routes[1]);
        assert_eq!(value["target"], "App\\Admin\\Users@show");
        assert_eq!(value["params"], json!([{ "name": "id", "required": true }]));
        assert_eq!(value["settings"]["where"]["id"], "[0-9]+");
    }
}
