// src/depend/builder.rs

use chrono::Duration;

use crate::depend::expr::{DataCheck, Dependency};

/// Append-only collector of sibling dependencies.
///
/// Finishing with [`Deps::all`] or [`Deps::any`] collapses a single child to
/// itself and yields `None` when nothing was added, so optional upstream
/// tasks can be chained with `*_if` without special-casing.
#[derive(Debug, Clone, Default)]
pub struct Deps {
    children: Vec<Dependency>,
}

impl Deps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dep: Dependency) -> Self {
        self.children.push(dep);
        self
    }

    pub fn with_if(self, cond: bool, dep: impl FnOnce() -> Dependency) -> Self {
        if cond { self.with(dep()) } else { self }
    }

    pub fn with_opt(self, dep: Option<Dependency>) -> Self {
        match dep {
            Some(d) => self.with(d),
            None => self,
        }
    }

    pub fn task(self, name: impl Into<String>) -> Self {
        self.with(Dependency::peer(name))
    }

    pub fn task_if(self, cond: bool, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with_if(cond, || Dependency::peer(name))
    }

    pub fn task_at(self, name: impl Into<String>, offset: Duration) -> Self {
        self.with(Dependency::peer_at(name, offset))
    }

    pub fn metatask(self, name: impl Into<String>) -> Self {
        self.with(Dependency::metatask(name))
    }

    pub fn data(self, check: DataCheck) -> Self {
        self.with(Dependency::artifact(check))
    }

    pub fn cycle_missing(self, offset: Duration) -> Self {
        self.with(Dependency::cycle_exists(offset, true))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// AND of the children, collapsing a single child.
    pub fn all(self) -> Option<Dependency> {
        self.finish(Dependency::all_of)
    }

    /// OR of the children, collapsing a single child.
    pub fn any(self) -> Option<Dependency> {
        self.finish(Dependency::any_of)
    }

    /// NOR of the children. Never collapses: NOR of one child is its negation.
    pub fn none(self) -> Option<Dependency> {
        if self.children.is_empty() {
            None
        } else {
            Some(Dependency::none_of(self.children))
        }
    }

    fn finish(mut self, wrap: fn(Vec<Dependency>) -> Dependency) -> Option<Dependency> {
        match self.children.len() {
            0 => None,
            1 => self.children.pop(),
            _ => Some(wrap(self.children)),
        }
    }
}
