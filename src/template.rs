//! Template interpolation for source catalogs
//!
//! Handles `{{ variable }}` interpolation in catalog paths, parameters and
//! headers. Three roots are recognised:
//! - `{{ locator }}`: the id or name a traversal starts from
//! - `{{ auth.<name> }}`: credentials
//! - `{{ param.<name> }}`: caller-supplied parameters

use crate::error::{Error, Result};
use crate::types::StringMap;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}").unwrap()
});

/// Variable roots a template may refer to
pub const TEMPLATE_ROOTS: &[&str] = &["locator", "auth", "param"];

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Id or name the traversal starts from
    pub locator: String,
    /// Credentials
    pub auth: StringMap,
    /// Caller-supplied parameters
    pub param: StringMap,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context for a locator
    pub fn with_locator(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            ..Default::default()
        }
    }

    /// Set credentials
    pub fn set_auth(&mut self, auth: StringMap) -> &mut Self {
        self.auth = auth;
        self
    }

    /// Set caller parameters
    pub fn set_params(&mut self, params: StringMap) -> &mut Self {
        self.param = params;
        self
    }

    /// The same credentials and parameters for another locator
    pub fn for_locator(&self, locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            ..self.clone()
        }
    }

    /// Get a value by path (e.g., "auth.access_token")
    pub fn get(&self, path: &str) -> Option<&str> {
        match path.split_once('.') {
            None if path == "locator" => Some(self.locator.as_str()),
            Some(("auth", name)) => self.auth.get(name).map(String::as_str),
            Some(("param", name)) => self.param.get(name).map(String::as_str),
            _ => None,
        }
    }
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut missing = Vec::new();

    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &Captures<'_>| {
        let var_path = &cap[1];
        match ctx.get(var_path) {
            Some(value) => value.to_string(),
            None => {
                missing.push(var_path.to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Render every value of a map
pub fn render_map(map: &StringMap, ctx: &TemplateContext) -> Result<StringMap> {
    map.iter()
        .map(|(key, value)| Ok((key.clone(), render(value, ctx)?)))
        .collect()
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Extract all variable names from a template
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Check that every variable of a template has a known root
pub fn validate(template: &str) -> Result<()> {
    for variable in extract_variables(template) {
        let root = variable.split('.').next().unwrap_or_default();
        let known = match root {
            "locator" => variable == "locator",
            "auth" | "param" => variable.matches('.').count() == 1,
            _ => false,
        };
        if !known {
            return Err(Error::template(format!(
                "unknown variable '{variable}' in '{template}', expected one of {}",
                TEMPLATE_ROOTS.join(", ")
            )));
        }
    }
    Ok(())
}
