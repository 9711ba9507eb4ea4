//! The interpreter: runtime data structures, the evaluator, built-ins and the host API.

#[macro_use]
pub mod eval;
pub mod api;
pub mod config;
pub mod ds;
pub mod module;
pub mod std_lib;
