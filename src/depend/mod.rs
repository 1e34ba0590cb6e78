// src/depend/mod.rs

//! Dependency algebra: predicates, combinators and path templates.

pub mod builder;
pub mod expr;
pub mod template;

pub use builder::Deps;
pub use expr::{Combinator, DataCheck, Dependency, Predicate};
pub use template::{CYCLE_FIELDS, PathTemplate, TimedPath, rotdir_file, rotdir_path};
