//! Routes and route groups.
//!
//! A [`Route`] is mutable while it is being registered. Calling
//! [`Route::compile`] freezes it into a [`CompiledRoute`], which is
//! immutable and can be shared across threads for matching.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::dispatch::{qualify, Target};
use crate::error::Result;
use crate::method::Method;
use crate::params::PathParams;
use crate::pattern::{CompiledPattern, CompilerOptions, PatternCompiler};
use crate::settings::RouteSettings;

/// A route under registration.
#[derive(Debug, Clone)]
pub struct Route {
    /// Path template.
    template: String,
    /// Unit of work.
    target: Target,
    /// Own settings, merged with inherited ones during registration.
    settings: RouteSettings,
    /// Namespace used when the settings do not name one.
    default_namespace: Option<String>,
}

impl Route {
    /// Creates a new route.
    pub fn new(template: impl Into<String>, target: Target) -> Self {
        Self {
            template: template.into(),
            target,
            settings: RouteSettings::new(),
            default_namespace: None,
        }
    }

    /// Adds an accepted method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.settings.methods.insert(method);
        self
    }

    /// Adds a parameter constraint.
    #[must_use]
    pub fn constraint(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.settings.constraints.insert(name.into(), pattern.into());
        self
    }

    /// Sets the namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.settings.namespace = Some(namespace.into());
        self
    }

    /// Sets the fallback namespace.
    #[must_use]
    pub fn default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = Some(namespace.into());
        self
    }

    /// Binds a parameter to a literal value.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings
            .parameters
            .insert(name.into(), Some(value.into()));
        self
    }

    /// Appends a middleware identifier.
    #[must_use]
    pub fn middleware(mut self, id: impl Into<String>) -> Self {
        self.settings.middleware.push(id.into());
        self
    }

    /// Merges explicit settings into the route's own. The given namespace,
    /// default constraint, constraints and parameters win on conflicts.
    /// Middleware already on the route stays first; the given chain is
    /// appended, skipping entries the route already has.
    #[must_use]
    pub fn with_settings(mut self, settings: &RouteSettings) -> Self {
        self.settings = settings.merge(&self.settings);
        self
    }

    /// Inherits settings from a parent.
    #[must_use]
    pub fn inherit(mut self, parent: &RouteSettings) -> Self {
        self.import_from(parent);
        self
    }

    /// Inherits settings from a parent in place.
    pub fn import_from(&mut self, parent: &RouteSettings) {
        self.settings.import_from(parent);
    }

    /// Returns the template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the current settings.
    #[must_use]
    pub const fn settings(&self) -> &RouteSettings {
        &self.settings
    }

    /// Returns the settings for explicit replacement calls.
    pub fn settings_mut(&mut self) -> &mut RouteSettings {
        &mut self.settings
    }

    /// Compiles the route with the default compiler options.
    ///
    /// # Errors
    ///
    /// Returns any error from [`PatternCompiler::compile`].
    pub fn compile(self) -> Result<CompiledRoute> {
        self.compile_with(&PatternCompiler::default())
    }

    /// Compiles the route with a specific compiler. A `default_constraint`
    /// in the route settings overrides the compiler's.
    ///
    /// # Errors
    ///
    /// Returns any error from [`PatternCompiler::compile`].
    pub fn compile_with(self, compiler: &PatternCompiler) -> Result<CompiledRoute> {
        let compiler = match &self.settings.default_constraint {
            Some(default) => Cow::Owned(PatternCompiler::new(CompilerOptions {
                default_constraint: default.clone(),
                ..compiler.options().clone()
            })),
            None => Cow::Borrowed(compiler),
        };
        let pattern = compiler.compile(&self.template, &self.settings.constraints)?;

        Ok(CompiledRoute {
            pattern,
            target: self.target,
            settings: self.settings,
            default_namespace: self.default_namespace,
        })
    }
}

/// A registered route with its effective settings. Read-only.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pattern: CompiledPattern,
    target: Target,
    settings: RouteSettings,
    default_namespace: Option<String>,
}

impl CompiledRoute {
    /// Returns the template.
    #[must_use]
    pub fn template(&self) -> &str {
        self.pattern.template()
    }

    /// Returns the compiled pattern.
    #[must_use]
    pub const fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    /// Returns the target.
    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    /// Returns the effective settings.
    #[must_use]
    pub const fn settings(&self) -> &RouteSettings {
        &self.settings
    }

    /// Returns the middleware chain, outermost first.
    #[must_use]
    pub fn middleware(&self) -> &[String] {
        &self.settings.middleware
    }

    /// Returns the namespace for class-based targets: the configured one,
    /// or the default namespace if none is set.
    #[must_use]
    pub fn effective_namespace(&self) -> Option<&str> {
        self.settings
            .namespace
            .as_deref()
            .or(self.default_namespace.as_deref())
    }

    /// Returns the fully qualified class name for class-based targets.
    #[must_use]
    pub fn qualified_class(&self) -> Option<String> {
        match &self.target {
            Target::Method { class, .. } => Some(qualify(self.effective_namespace(), class)),
            Target::Function(_) => None,
        }
    }

    /// Returns `true` if the route accepts the method. A route without
    /// methods accepts any.
    #[must_use]
    pub fn accepts(&self, method: Method) -> bool {
        self.settings.methods.is_empty() || self.settings.methods.contains(&method)
    }

    /// Matches a path, ignoring the request method.
    ///
    /// # Errors
    ///
    /// See [`CompiledPattern::match_path`].
    pub fn match_path(&self, path: &str) -> Result<Option<PathParams>> {
        self.pattern.match_path(path)
    }

    /// Matches a request. Returns `Ok(None)` when the method is not accepted
    /// or the path does not match.
    ///
    /// # Errors
    ///
    /// See [`CompiledPattern::match_path`].
    pub fn match_request(&self, method: Method, path: &str) -> Result<Option<PathParams>> {
        if !self.accepts(method) {
            return Ok(None);
        }
        self.pattern.match_path(path)
    }
}

/// A container of settings shared by the routes and groups nested in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteGroup {
    /// Path prefix prepended to nested templates.
    prefix: String,
    /// Own settings.
    settings: RouteSettings,
}

impl RouteGroup {
    /// Creates a new route group with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            settings: RouteSettings::new(),
        }
    }

    /// Replaces the group's settings.
    #[must_use]
    pub fn with_settings(mut self, settings: RouteSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.settings.namespace = Some(namespace.into());
        self
    }

    /// Adds an accepted method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.settings.methods.insert(method);
        self
    }

    /// Adds a parameter constraint.
    #[must_use]
    pub fn constraint(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.settings.constraints.insert(name.into(), pattern.into());
        self
    }

    /// Adds middleware to this group.
    #[must_use]
    pub fn middleware(mut self, id: impl Into<String>) -> Self {
        self.settings.middleware.push(id.into());
        self
    }

    /// Returns the prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the group's settings.
    #[must_use]
    pub const fn settings(&self) -> &RouteSettings {
        &self.settings
    }

    /// Returns the settings to propagate to children.
    #[must_use]
    pub fn export(&self) -> RouteSettings {
        self.settings.export()
    }

    /// Nests a child group: prefixes are joined and the child inherits this
    /// group's settings.
    #[must_use]
    pub fn nest(&self, child: Self) -> Self {
        Self {
            prefix: join_path(&self.prefix, &child.prefix),
            settings: child.settings.merge(&self.export()),
        }
    }

    /// Registers a route in this group: its template is prefixed and it
    /// inherits this group's settings.
    #[must_use]
    pub fn apply(&self, mut route: Route) -> Route {
        route.template = join_path(&self.prefix, &route.template);
        route.import_from(&self.export());
        route
    }
}

/// Joins a prefix and a path with exactly one separator between them.
fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let path = path.trim_start_matches('/');
    match (prefix.is_empty(), path.is_empty()) {
        (true, _) => format!("/{path}"),
        (false, true) => format!("/{prefix}"),
        (false, false) => format!("/{prefix}/{path}"),
    }
}
