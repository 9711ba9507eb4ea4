//! # realmjs - a tree-walking JavaScript interpreter with realm isolation
//!
//! - PEG parser with an ESTree style AST
//! - Control flow as explicit completion records
//! - Declarative, object, function and global environment records
//! - Independent realms, each with its own global object and intrinsics
//! - `ShadowRealm`: evaluate code or import modules in a separate realm, with only
//!   primitives and callables crossing the boundary
//!
//! ## Quick Start
//!
//! ### Parsing JavaScript
//!
//! ```
//! use realmjs::parser::JsParser;
//!
//! let ast = JsParser::parse_script("var x = 5 + 3;").unwrap();
//! println!("Parsed {} statements", ast.body.len());
//! ```
//!
//! ### Running JavaScript
//!
//! ```
//! use realmjs::runner::api::JsEngine;
//! use realmjs::runner::ds::value::JsValue;
//!
//! let mut engine = JsEngine::new().unwrap();
//! engine.evaluate_script("function add(a, b) { return a + b; }").unwrap();
//! let result = engine.evaluate_script("add(40, 2)").unwrap();
//! assert_eq!(result, JsValue::Number(42.0));
//! ```
//!
//! ### Shadow realms
//!
//! Code evaluated in a shadow realm sees its own globals. Functions coming back out are
//! wrapped so that calling them still runs in the realm they were created in.
//!
//! ```
//! use realmjs::runner::api::JsEngine;
//! use realmjs::runner::ds::value::JsValue;
//!
//! let mut engine = JsEngine::new().unwrap();
//! let result = engine
//!     .evaluate_script(
//!         r#"
//!         var y = "outer";
//!         var r = new ShadowRealm();
//!         var f = r.evaluate("globalThis.y = 5; () => y");
//!         f()
//!         "#,
//!     )
//!     .unwrap();
//! assert_eq!(result, JsValue::Number(5.0));
//! ```
//!
//! ## Architecture
//!
//! - **[`parser`]** - PEG parser, AST types and static semantics
//! - **[`runner`]** - The interpreter
//!   - **[`runner::ds`]** - Data structures (values, objects, environment records, realms)
//!   - **[`runner::eval`]** - Tree-walking evaluator
//!   - **[`runner::std_lib`]** - Built-ins installed into every realm
//!   - **[`runner::module`]** - Module loading
//!   - **[`runner::api`]** - Host API

#[macro_use]
extern crate lazy_static;

pub mod parser;
pub mod runner;
