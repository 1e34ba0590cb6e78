// tests/integration/main.rs

#[path = "../common/mod.rs"]
mod common;

mod compile_modes;
mod error_handling;
mod load_from_file;
mod resources;
