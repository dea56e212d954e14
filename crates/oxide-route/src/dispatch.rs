//! Resolving a matched route into a unit of work.
//!
//! A route dispatches either to a plain function or to a method on a class
//! the host knows how to build. Class lookup goes through the [`Container`]
//! capability so the host decides how names map to instances.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{InvokeError, Result, RouteError};
use crate::params::PathParams;
use crate::route::CompiledRoute;

/// Separator between namespace segments in a qualified class name.
pub const NAMESPACE_SEPARATOR: char = '\\';

/// Result of running a target.
pub type InvokeResult = std::result::Result<Value, InvokeError>;

/// A plain function target. Receives the final arguments in positional order.
pub type Handler = Arc<dyn Fn(&PathParams) -> InvokeResult + Send + Sync>;

/// Builds a fresh controller instance.
pub type Factory = Arc<dyn Fn() -> Arc<dyn Controller> + Send + Sync>;

/// The unit of work a route points at.
#[derive(Clone)]
pub enum Target {
    /// A directly callable function.
    Function(Handler),
    /// A method on a class resolved through a [`Container`].
    Method {
        /// Class name, relative to the route namespace unless it starts
        /// with `\`.
        class: String,
        /// Method name.
        method: String,
    },
}

impl Target {
    /// Creates a function target.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&PathParams) -> InvokeResult + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// Creates a class-method target.
    pub fn method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Method {
            class: class.into(),
            method: method.into(),
        }
    }
}

impl FromStr for Target {
    type Err = RouteError;

    /// Parses a `Class@method` reference.
    fn from_str(reference: &str) -> Result<Self> {
        match reference.split_once('@') {
            Some((class, method))
                if !class.is_empty() && !method.is_empty() && !method.contains('@') =>
            {
                Ok(Self::method(class, method))
            }
            _ => Err(RouteError::InvalidTarget(reference.to_string())),
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Method { class, method } => write!(f, "Method({class}@{method})"),
        }
    }
}

/// An instance that exposes named methods.
pub trait Controller: Send + Sync {
    /// Returns `true` if the method exists on this instance.
    fn has_method(&self, name: &str) -> bool;

    /// Calls a method with the final arguments.
    ///
    /// # Errors
    ///
    /// Returns whatever failure the method reports.
    fn call(&self, method: &str, args: &PathParams) -> InvokeResult;
}

/// Host capability that builds controllers from qualified class names.
pub trait Container: Send + Sync {
    /// Returns a new instance, or `None` if the class is unknown.
    fn instantiate(&self, class: &str) -> Option<Arc<dyn Controller>>;
}

/// A [`Container`] backed by a map of factories.
#[derive(Clone, Default)]
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under a fully qualified class name.
    #[must_use]
    pub fn register<F>(mut self, class: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Controller> + Send + Sync + 'static,
    {
        self.factories.insert(class.into(), Arc::new(factory));
        self
    }

    /// Returns `true` if a class is registered under this name.
    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }
}

impl Container for Registry {
    fn instantiate(&self, class: &str) -> Option<Arc<dyn Controller>> {
        self.factories.get(class).map(|factory| factory())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

/// A target ready to be invoked.
#[derive(Clone)]
pub enum ResolvedTarget {
    /// A plain function.
    Function(Handler),
    /// A method on an instantiated controller.
    Method {
        /// Fully qualified class name.
        class: String,
        /// Method name, known to exist on `instance`.
        method: String,
        /// The controller instance.
        instance: Arc<dyn Controller>,
    },
}

impl ResolvedTarget {
    /// Invokes the target.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Invocation`] if the target reports a failure.
    pub fn invoke(&self, args: &PathParams) -> Result<Value> {
        let outcome = match self {
            Self::Function(handler) => handler(args),
            Self::Method {
                method, instance, ..
            } => instance.call(method, args),
        };
        outcome.map_err(|source| {
            let target = self.label();
            warn!(handler = %target, error = %source, "Target invocation failed");
            RouteError::Invocation { target, source }
        })
    }

    fn label(&self) -> String {
        match self {
            Self::Function(_) => "<function>".to_string(),
            Self::Method { class, method, .. } => format!("{class}@{method}"),
        }
    }

    /// Returns the controller instance for class-based targets.
    #[must_use]
    pub fn instance(&self) -> Option<&Arc<dyn Controller>> {
        match self {
            Self::Function(_) => None,
            Self::Method { instance, .. } => Some(instance),
        }
    }
}

impl fmt::Debug for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Method { class, method, .. } => write!(f, "Method({class}@{method})"),
        }
    }
}

/// Outcome of a dispatch.
#[derive(Debug)]
pub struct Dispatched {
    /// Value returned by the target.
    pub output: Value,
    /// The resolved target, including the controller instance if any.
    pub target: ResolvedTarget,
}

/// Resolves and invokes route targets.
#[derive(Debug, Clone)]
pub struct Dispatcher<C> {
    container: C,
}

impl<C: Container> Dispatcher<C> {
    /// Creates a dispatcher over a container.
    pub const fn new(container: C) -> Self {
        Self { container }
    }

    /// Returns the container.
    pub const fn container(&self) -> &C {
        &self.container
    }

    /// Resolves the route's target.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::TargetClassNotFound`] if the container does not
    /// know the qualified class, and [`RouteError::TargetMethodNotFound`] if
    /// the instance lacks the method.
    pub fn resolve(&self, route: &CompiledRoute) -> Result<ResolvedTarget> {
        match route.target() {
            Target::Function(handler) => Ok(ResolvedTarget::Function(Arc::clone(handler))),
            Target::Method { class, method } => {
                let qualified = qualify(route.effective_namespace(), class);
                let Some(instance) = self.container.instantiate(&qualified) else {
                    warn!(route = %route.template(), class = %qualified, "Target class not found");
                    return Err(RouteError::TargetClassNotFound(qualified));
                };
                if !instance.has_method(method) {
                    warn!(
                        route = %route.template(),
                        class = %qualified,
                        method = %method,
                        "Target method not found"
                    );
                    return Err(RouteError::TargetMethodNotFound {
                        class: qualified,
                        method: method.clone(),
                    });
                }
                debug!(route = %route.template(), class = %qualified, method = %method, "Resolved target");
                Ok(ResolvedTarget::Method {
                    class: qualified,
                    method: method.clone(),
                    instance,
                })
            }
        }
    }

    /// Resolves the route's target and invokes it with the matched
    /// parameters combined with the route's bound parameters.
    ///
    /// # Errors
    ///
    /// Propagates resolution errors from [`Dispatcher::resolve`] and
    /// invocation errors from [`ResolvedTarget::invoke`].
    pub fn dispatch(&self, route: &CompiledRoute, matched: &PathParams) -> Result<Dispatched> {
        let target = self.resolve(route)?;
        let args = build_arguments(route, matched);
        let output = target.invoke(&args)?;
        Ok(Dispatched { output, target })
    }
}

/// Joins a namespace and a class name.
///
/// A class starting with `\` is already absolute and ignores the namespace.
#[must_use]
pub fn qualify(namespace: Option<&str>, class: &str) -> String {
    if let Some(absolute) = class.strip_prefix(NAMESPACE_SEPARATOR) {
        return absolute.to_string();
    }
    match namespace
        .map(|ns| ns.trim_matches(NAMESPACE_SEPARATOR))
        .filter(|ns| !ns.is_empty())
    {
        Some(ns) => format!("{ns}{NAMESPACE_SEPARATOR}{class}"),
        None => class.to_string(),
    }
}

/// Builds the final argument list for a target.
///
/// Template parameters come first, in template order, each taking the
/// matched value or else the bound one. Bound parameters the template does
/// not declare follow. Parameters bound to an explicit null are dropped so
/// the target falls back to its own defaults.
#[must_use]
pub fn build_arguments(route: &CompiledRoute, matched: &PathParams) -> PathParams {
    let bound = &route.settings().parameters;
    let mut args = PathParams::new();

    for name in route.pattern().param_names() {
        let value = matched
            .get(name)
            .or_else(|| bound.get(name).and_then(Option::as_deref));
        if let Some(value) = value {
            args.insert(name, value);
        }
    }

    for (name, value) in bound {
        if let Some(value) = value {
            if !route.pattern().param_names().any(|p| p == name) {
                args.insert(name.as_str(), value.as_str());
            }
        }
    }

    args
}
