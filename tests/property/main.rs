// tests/property/main.rs

#[path = "../common/mod.rs"]
mod common;

mod fan_out;
mod graph_order;
