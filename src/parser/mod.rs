mod api;
pub mod ast;
pub mod static_semantics;
#[cfg(test)]
mod unit_tests;
mod util;

pub use api::{JsParser, ParseError};
pub use util::DEFAULT_EXPORT_BINDING;
