//! Error types for route compilation, matching and dispatch.

use thiserror::Error;

/// Error reported by a dispatch target that ran and failed.
pub type InvokeError = Box<dyn std::error::Error + Send + Sync>;

/// Route-specific errors.
///
/// A path that simply does not match a route is not an error; matching
/// returns `Ok(None)` for that case.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The template could not be parsed.
    #[error("invalid route template {template:?}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// The same parameter name appears twice in one template.
    #[error("duplicate parameter {name:?} in template {template:?}")]
    DuplicateParameter { template: String, name: String },

    /// A constraint or template produced a pattern the regex engine rejects.
    #[error("invalid route pattern: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// A required parameter was absent although the pattern matched.
    #[error("missing required parameter {name:?} for route {template:?}")]
    MissingRequiredParameter { template: String, name: String },

    /// A `Class@method` reference could not be split.
    #[error("invalid target reference: {0}")]
    InvalidTarget(String),

    /// The container has no class under the resolved name.
    #[error("target class not found: {0}")]
    TargetClassNotFound(String),

    /// The class exists but does not expose the method.
    #[error("method {method:?} not found on {class}")]
    TargetMethodNotFound { class: String, method: String },

    /// The target was invoked and returned an error.
    #[error("target {target} failed: {source}")]
    Invocation {
        target: String,
        source: InvokeError,
    },
}

impl RouteError {
    /// Returns the HTTP status a host should answer with for this error.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::MissingRequiredParameter { .. } | Self::TargetMethodNotFound { .. } => 404,
            Self::InvalidTemplate { .. }
            | Self::DuplicateParameter { .. }
            | Self::InvalidRegex(_)
            | Self::InvalidTarget(_)
            | Self::TargetClassNotFound(_)
            | Self::Invocation { .. } => 500,
        }
    }

    /// Returns `true` for server-side faults: broken configuration or a
    /// failing target.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        self.status() >= 500
    }
}

/// Result type alias for route operations.
pub type Result<T> = std::result::Result<T, RouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let missing = RouteError::TargetMethodNotFound {
            class: "App\\Foo".to_string(),
            method: "bar".to_string(),
        };
        assert_eq!(missing.status(), 404);
        assert!(!missing.is_fatal());

        let class = RouteError::TargetClassNotFound("App\\Foo".to_string());
        assert_eq!(class.status(), 500);
        assert!(class.is_fatal());
    }

    #[test]
    fn test_invocation_is_server_fault() {
        let err = RouteError::Invocation {
            target: "App\\Foo@bar".to_string(),
            source: "database unavailable".into(),
        };
        assert_eq!(err.status(), 500);
        assert_eq!(
            err.to_string(),
            "target App\\Foo@bar failed: database unavailable"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display() {
        let err = RouteError::DuplicateParameter {
            template: "/{id}/{id}".to_string(),
            name: "id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate parameter \"id\" in template \"/{id}/{id}\""
        );
    }
}
