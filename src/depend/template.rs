// src/depend/template.rs

//! Path templates with `${NAME}` placeholders.
//!
//! Placeholders stay symbolic; the downstream workflow engine expands them
//! per cycle. This module only finds them so they can be validated.

use std::fmt;
use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;
use serde::Serialize;

use crate::calendar::time::serialize_opt_hms;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid")
});

/// Placeholders expanded from the cycle time itself.
pub const CYCLE_FIELDS: &[&str] = &["PDY", "HH", "CDATE", "YYYY", "MM", "DD"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PathTemplate(String);

impl PathTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Placeholder names in order of appearance (duplicates kept).
    pub fn placeholders(&self) -> Vec<&str> {
        PLACEHOLDER_RE
            .captures_iter(&self.0)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PathTemplate {
    fn from(s: &str) -> Self {
        PathTemplate::new(s)
    }
}

impl From<String> for PathTemplate {
    fn from(s: String) -> Self {
        PathTemplate::new(s)
    }
}

/// A template evaluated at a cycle offset from the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimedPath {
    pub template: PathTemplate,
    #[serde(serialize_with = "serialize_opt_hms", skip_serializing_if = "Option::is_none")]
    pub offset: Option<Duration>,
}

impl TimedPath {
    pub fn at(template: impl Into<PathTemplate>, offset: Option<Duration>) -> Self {
        Self {
            template: template.into(),
            offset,
        }
    }
}

/// `${ROTDIR}/<run>.${PDY}/${HH}/atmos/<rest>`
pub fn rotdir_path(run: &str, rest: &str) -> PathTemplate {
    PathTemplate::new(format!("${{ROTDIR}}/{run}.${{PDY}}/${{HH}}/atmos/{rest}"))
}

/// `${ROTDIR}/<run>.${PDY}/${HH}/atmos/<run>.t${HH}z.<file>`
pub fn rotdir_file(run: &str, file: &str) -> PathTemplate {
    rotdir_path(run, &format!("{run}.t${{HH}}z.{file}"))
}
