// src/depend/expr.rs

//! Boolean dependency expressions.
//!
//! An expression is a tree: leaves are [`Predicate`]s and interior nodes
//! combine children with AND, OR or NOR. Trees are built once and never
//! mutated; sharing a sub-expression between tasks is a clone.

use std::fmt;

use chrono::Duration;
use serde::Serialize;

use crate::calendar::time::{format_hms, serialize_opt_hms};
use crate::depend::template::{PathTemplate, TimedPath};

/// Boolean combinator of an interior node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// Every child holds.
    All,
    /// At least one child holds.
    Any,
    /// No child holds.
    None,
}

impl Combinator {
    pub fn keyword(&self) -> &'static str {
        match self {
            Combinator::All => "and",
            Combinator::Any => "or",
            Combinator::None => "nor",
        }
    }
}

/// Readiness check on a file in the experiment tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataCheck {
    pub path: TimedPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<TimedPath>,
    #[serde(serialize_with = "serialize_opt_hms", skip_serializing_if = "Option::is_none")]
    pub min_age: Option<Duration>,
}

impl DataCheck {
    pub fn new(path: impl Into<PathTemplate>) -> Self {
        Self {
            path: TimedPath::at(path, None),
            suffix: None,
            min_age: None,
        }
    }

    /// Evaluate the path at `offset` from the current cycle.
    pub fn offset(mut self, offset: Duration) -> Self {
        self.path.offset = Some(offset);
        self
    }

    /// Append `suffix`, evaluated at the current cycle.
    pub fn suffix(mut self, suffix: impl Into<PathTemplate>) -> Self {
        self.suffix = Some(TimedPath::at(suffix, None));
        self
    }

    /// Append `suffix`, evaluated at `offset` from the current cycle.
    pub fn suffix_at(mut self, suffix: impl Into<PathTemplate>, offset: Duration) -> Self {
        self.suffix = Some(TimedPath::at(suffix, Some(offset)));
        self
    }

    /// File must be at least `age` old.
    pub fn min_age(mut self, age: Duration) -> Self {
        self.min_age = Some(age);
        self
    }

    pub fn templates(&self) -> impl Iterator<Item = &PathTemplate> {
        std::iter::once(&self.path.template).chain(self.suffix.iter().map(|s| &s.template))
    }
}

/// Leaf of a dependency expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// A task completed at the cycle `offset` from this one.
    Task {
        name: String,
        #[serde(serialize_with = "serialize_opt_hms", skip_serializing_if = "Option::is_none")]
        offset: Option<Duration>,
    },
    /// Every member of a metatask completed.
    Metatask {
        name: String,
        #[serde(serialize_with = "serialize_opt_hms", skip_serializing_if = "Option::is_none")]
        offset: Option<Duration>,
    },
    Data(DataCheck),
    /// A cycle exists (or, negated, does not exist) at `offset`.
    CycleExist {
        #[serde(serialize_with = "crate::calendar::time::serialize_hms")]
        offset: Duration,
        negate: bool,
    },
    /// Two strings compare equal once placeholders are expanded.
    StrEq { left: String, right: String },
}

impl Predicate {
    /// Name and offset of a referenced task or metatask.
    pub fn reference(&self) -> Option<(&str, Option<Duration>)> {
        match self {
            Predicate::Task { name, offset } | Predicate::Metatask { name, offset } => {
                Some((name.as_str(), *offset))
            }
            _ => None,
        }
    }

    pub fn is_metatask(&self) -> bool {
        matches!(self, Predicate::Metatask { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Combination {
    op: Combinator,
    children: Vec<Dependency>,
}

/// Dependency expression: a single predicate or a combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Dependency {
    Leaf(Predicate),
    Node(Combination),
}

impl Dependency {
    pub fn peer(name: impl Into<String>) -> Self {
        Dependency::Leaf(Predicate::Task {
            name: name.into(),
            offset: None,
        })
    }

    pub fn peer_at(name: impl Into<String>, offset: Duration) -> Self {
        Dependency::Leaf(Predicate::Task {
            name: name.into(),
            offset: Some(offset),
        })
    }

    pub fn metatask(name: impl Into<String>) -> Self {
        Dependency::Leaf(Predicate::Metatask {
            name: name.into(),
            offset: None,
        })
    }

    pub fn metatask_at(name: impl Into<String>, offset: Duration) -> Self {
        Dependency::Leaf(Predicate::Metatask {
            name: name.into(),
            offset: Some(offset),
        })
    }

    pub fn artifact(check: DataCheck) -> Self {
        Dependency::Leaf(Predicate::Data(check))
    }

    pub fn cycle_exists(offset: Duration, negate: bool) -> Self {
        Dependency::Leaf(Predicate::CycleExist { offset, negate })
    }

    pub fn string_eq(left: impl Into<String>, right: impl Into<String>) -> Self {
        Dependency::Leaf(Predicate::StrEq {
            left: left.into(),
            right: right.into(),
        })
    }

    pub fn all_of(children: Vec<Dependency>) -> Self {
        Self::combine(Combinator::All, children)
    }

    pub fn any_of(children: Vec<Dependency>) -> Self {
        Self::combine(Combinator::Any, children)
    }

    pub fn none_of(children: Vec<Dependency>) -> Self {
        Self::combine(Combinator::None, children)
    }

    pub fn combine(op: Combinator, children: Vec<Dependency>) -> Self {
        Dependency::Node(Combination { op, children })
    }

    /// Combinator of an interior node; `None` for a leaf.
    pub fn combinator(&self) -> Option<Combinator> {
        match self {
            Dependency::Leaf(_) => None,
            Dependency::Node(c) => Some(c.op),
        }
    }

    /// Direct children; empty for a leaf.
    pub fn children(&self) -> &[Dependency] {
        match self {
            Dependency::Leaf(_) => &[],
            Dependency::Node(c) => &c.children,
        }
    }

    /// Every leaf in depth-first order.
    pub fn leaves(&self) -> Vec<&Predicate> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Predicate>) {
        match self {
            Dependency::Leaf(p) => out.push(p),
            Dependency::Node(c) => c.children.iter().for_each(|d| d.collect_leaves(out)),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = |offset: &Option<Duration>| match offset {
            Some(d) if *d != Duration::zero() => format!("@{}", format_hms(*d)),
            _ => String::new(),
        };
        match self {
            Predicate::Task { name, offset } => write!(f, "task {name}{}", at(offset)),
            Predicate::Metatask { name, offset } => write!(f, "metatask {name}{}", at(offset)),
            Predicate::Data(check) => {
                write!(f, "data {}{}", check.path.template, at(&check.path.offset))?;
                if let Some(suffix) = &check.suffix {
                    write!(f, "+{}{}", suffix.template, at(&suffix.offset))?;
                }
                if let Some(age) = check.min_age {
                    write!(f, " age>={}", format_hms(age))?;
                }
                Ok(())
            }
            Predicate::CycleExist { offset, negate } => {
                let word = if *negate { "no-cycle" } else { "cycle" };
                write!(f, "{word}@{}", format_hms(*offset))
            }
            Predicate::StrEq { left, right } => write!(f, "streq({left}, {right})"),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Leaf(p) => fmt::Display::fmt(p, f),
            Dependency::Node(c) => {
                write!(f, "{}(", c.op.keyword())?;
                for (i, child) in c.children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}
