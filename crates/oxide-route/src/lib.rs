//! # oxide-route
//!
//! Route template compilation, matching, settings inheritance and dispatch.
//!
//! This crate provides:
//! - Template compilation into anchored regexes with named captures
//! - Required `{name}` and optional `{name?}` parameters
//! - Per-parameter constraints
//! - Settings inheritance from route groups
//! - Resolution of function and class-method targets
//!
//! ## Quick Start
//!
//! ```
//! use oxide_route::{Route, Target};
//! use serde_json::json;
//!
//! let route = Route::new("/user/{id}/edit/{slug?}", Target::function(|args| {
//!     Ok(json!(args.values().collect::<Vec<_>>()))
//! }))
//! .constraint("id", "[0-9]+")
//! .compile()
//! .unwrap();
//!
//! let params = route.match_path("/user/42/edit").unwrap().unwrap();
//! assert_eq!(params.get("id"), Some("42"));
//! assert_eq!(params.get("slug"), None);
//! assert!(route.match_path("/user/abc/edit").unwrap().is_none());
//! ```
//!
//! ## Groups
//!
//! Groups carry a prefix plus settings that nested groups and routes
//! inherit once, when they are registered:
//!
//! ```
//! use oxide_route::{Route, RouteGroup, Target};
//!
//! let api = RouteGroup::new("/api")
//!     .namespace("App\\Api")
//!     .middleware("auth");
//! let route = api
//!     .apply(Route::new("/users/{id}", Target::method("Users", "show")).middleware("audit"))
//!     .compile()
//!     .unwrap();
//!
//! assert_eq!(route.template(), "/api/users/{id}");
//! assert_eq!(route.middleware(), ["auth", "audit"]);
//! assert_eq!(route.qualified_class().as_deref(), Some("App\\Api\\Users"));
//! ```
//!
//! ## Dispatch
//!
//! Class-method targets are built through a [`Container`]. [`Registry`] is
//! a closure-backed implementation:
//!
//! ```ignore
//! let dispatcher = Dispatcher::new(Registry::new().register("App\\Api\\Users", || {
//!     Arc::new(UsersController) as Arc<dyn Controller>
//! }));
//! let params = route.match_path("/api/users/7")?.unwrap();
//! let dispatched = dispatcher.dispatch(&route, &params)?;
//! ```

mod dispatch;
mod error;
mod method;
mod params;
mod pattern;
mod route;
mod settings;

pub use dispatch::{
    build_arguments, qualify, Container, Controller, Dispatched, Dispatcher, Factory, Handler,
    InvokeResult, Registry, ResolvedTarget, Target, NAMESPACE_SEPARATOR,
};
pub use error::{InvokeError, Result, RouteError};
pub use method::{Method, UnknownMethod};
pub use params::PathParams;
pub use pattern::{
    compile, CompiledPattern, CompilerOptions, LiteralEscaping, ParamSpec, PatternCompiler,
    DEFAULT_CONSTRAINT,
};
pub use route::{CompiledRoute, Route, RouteGroup};
pub use settings::RouteSettings;
