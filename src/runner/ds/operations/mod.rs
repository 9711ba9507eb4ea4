//! Abstract operations over the value, object and environment model.

pub mod lex_env;
pub mod object;
pub mod test_and_comparison;
pub mod type_conversion;
