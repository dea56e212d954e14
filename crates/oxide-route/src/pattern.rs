//! Template compilation and path matching.
//!
//! A template such as `/user/{id}/edit/{slug?}` is scanned once, left to
//! right, into an anchored regular expression with one named capture group
//! per placeholder. `{name}` declares a required parameter and `{name?}` an
//! optional one. A placeholder absorbs the `/` written in front of it, so an
//! omitted optional parameter does not leave a dangling separator behind.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::error::{Result, RouteError};
use crate::params::PathParams;

/// Sub-pattern used for parameters without a constraint.
pub const DEFAULT_CONSTRAINT: &str = r"[\w\-]+";

/// Escaped path separator as it appears in compiled patterns.
const SEPARATOR: &str = r"\/";

/// Suffix appended after each capture by [`LiteralEscaping::Legacy`].
const LEGACY_STOP_TOKEN: &str = r"[^\/]?";

/// How literal template characters are written into the pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralEscaping {
    /// Every regex metacharacter in a literal segment is escaped.
    #[default]
    Strict,
    /// Only `/` and `.` are escaped; other characters are copied verbatim,
    /// so literal segments may embed raw regex. Captures are followed by an
    /// optional non-separator stop token.
    Legacy,
}

/// Options for [`PatternCompiler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Literal escaping mode.
    pub escaping: LiteralEscaping,
    /// Sub-pattern for parameters without a constraint.
    pub default_constraint: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            escaping: LiteralEscaping::Strict,
            default_constraint: DEFAULT_CONSTRAINT.to_string(),
        }
    }
}

/// Metadata for one template parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    /// Parameter name, without the optional marker.
    pub name: String,
    /// Whether the parameter must be present for a match.
    pub required: bool,
}

/// A compiled template: anchored regex plus ordered parameter metadata.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// The template as authored.
    template: String,
    /// Anchored pattern with one named group per parameter.
    regex: Regex,
    /// Parameters in template order.
    params: Vec<ParamSpec>,
}

/// Compiles a template with the default options.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use oxide_route::compile;
///
/// let constraints = BTreeMap::from([("id".to_string(), "[0-9]+".to_string())]);
/// let pattern = compile("/item/{id}", &constraints).unwrap();
/// assert!(pattern.match_path("/item/abc").unwrap().is_none());
/// let params = pattern.match_path("/item/7").unwrap().unwrap();
/// assert_eq!(params.get("id"), Some("7"));
/// ```
///
/// # Errors
///
/// See [`PatternCompiler::compile`].
pub fn compile(template: &str, constraints: &BTreeMap<String, String>) -> Result<CompiledPattern> {
    PatternCompiler::default().compile(template, constraints)
}

/// Turns templates into [`CompiledPattern`]s.
#[derive(Debug, Clone, Default)]
pub struct PatternCompiler {
    options: CompilerOptions,
}

impl PatternCompiler {
    /// Creates a compiler with the given options.
    #[must_use]
    pub const fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    /// Returns the compiler options.
    #[must_use]
    pub const fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compiles `template`, using `constraints` to override the sub-pattern
    /// of individual parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidTemplate`] for unclosed, nested or badly
    /// named placeholders, [`RouteError::DuplicateParameter`] when a name is
    /// declared twice, and [`RouteError::InvalidRegex`] when a constraint
    /// does not form a valid pattern.
    pub fn compile(
        &self,
        template: &str,
        constraints: &BTreeMap<String, String>,
    ) -> Result<CompiledPattern> {
        let mut pattern = String::from("^");
        let mut params: Vec<ParamSpec> = Vec::new();
        let mut name = String::new();
        let mut in_placeholder = false;

        for ch in template.chars() {
            match (in_placeholder, ch) {
                (false, '{') => {
                    if pattern.ends_with(SEPARATOR) {
                        pattern.truncate(pattern.len() - SEPARATOR.len());
                    }
                    in_placeholder = true;
                }
                (true, '{') => {
                    return Err(invalid(template, "nested placeholder"));
                }
                (true, '}') => {
                    let spec = parse_placeholder(template, &name, &params)?;
                    let sub = constraints
                        .get(&spec.name)
                        .map_or(self.options.default_constraint.as_str(), String::as_str);
                    self.push_capture(&mut pattern, &spec, sub);
                    params.push(spec);
                    name.clear();
                    in_placeholder = false;
                }
                (true, c) => name.push(c),
                (false, c) => self.push_literal(&mut pattern, c),
            }
        }

        if in_placeholder {
            return Err(invalid(template, "unclosed placeholder"));
        }

        pattern.push_str(SEPARATOR);
        pattern.push_str("?$");

        let regex = Regex::new(&pattern)?;
        debug!(
            template,
            regex = %regex,
            params = params.len(),
            "Compiled route template"
        );

        Ok(CompiledPattern {
            template: template.to_string(),
            regex,
            params,
        })
    }

    fn push_literal(&self, pattern: &mut String, ch: char) {
        match (ch, self.options.escaping) {
            ('/', _) => pattern.push_str(SEPARATOR),
            ('.', LiteralEscaping::Legacy) => pattern.push_str(r"\."),
            (c, LiteralEscaping::Legacy) => pattern.push(c),
            (c, LiteralEscaping::Strict) => {
                let mut buf = [0u8; 4];
                pattern.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            }
        }
    }

    fn push_capture(&self, pattern: &mut String, spec: &ParamSpec, sub: &str) {
        let stop = match self.options.escaping {
            LiteralEscaping::Strict => "",
            LiteralEscaping::Legacy => LEGACY_STOP_TOKEN,
        };
        let capture = format!("{SEPARATOR}?(?P<{}>{sub}){stop}", spec.name);
        if spec.required {
            pattern.push_str(&capture);
        } else {
            pattern.push_str("(?:");
            pattern.push_str(&capture);
            pattern.push_str(")?");
        }
    }
}

fn invalid(template: &str, reason: &str) -> RouteError {
    RouteError::InvalidTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_placeholder(template: &str, raw: &str, seen: &[ParamSpec]) -> Result<ParamSpec> {
    let (name, required) = match raw.strip_suffix('?') {
        Some(name) => (name, false),
        None => (raw, true),
    };

    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(invalid(
            template,
            &format!("invalid parameter name {name:?}"),
        ));
    }

    if seen.iter().any(|p| p.name == name) {
        return Err(RouteError::DuplicateParameter {
            template: template.to_string(),
            name: name.to_string(),
        });
    }

    Ok(ParamSpec {
        name: name.to_string(),
        required,
    })
}

impl CompiledPattern {
    /// Attempts to match a path against this pattern.
    ///
    /// Returns `Ok(None)` when the path does not match, and the bound
    /// parameters in template order when it does. Optional parameters that
    /// were not supplied are left out.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::MissingRequiredParameter`] if the pattern
    /// matched but a required capture came back empty. That only happens
    /// when a constraint accepts the empty string.
    pub fn match_path(&self, path: &str) -> Result<Option<PathParams>> {
        let Some(caps) = self.regex.captures(path) else {
            trace!(template = %self.template, path, "No match");
            return Ok(None);
        };

        let mut params = PathParams::new();
        for spec in &self.params {
            let value = caps
                .name(&spec.name)
                .map(|m| m.as_str())
                .filter(|v| !v.is_empty());
            match value {
                Some(v) => params.insert(spec.name.as_str(), v),
                None if spec.required => {
                    error!(
                        template = %self.template,
                        param = %spec.name,
                        path,
                        "Required parameter absent from a matching path"
                    );
                    return Err(RouteError::MissingRequiredParameter {
                        template: self.template.clone(),
                        name: spec.name.clone(),
                    });
                }
                None => {}
            }
        }

        trace!(template = %self.template, path, bound = params.len(), "Matched");
        Ok(Some(params))
    }

    /// Returns `true` if the path matches, without extracting parameters.
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Returns the original template string.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the compiled regex.
    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns the parameter specs in template order.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Returns the parameter names in template order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }
}
