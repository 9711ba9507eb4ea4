//! Console built-in object.
//!
//! Provides console.log, console.error, console.warn and console.info.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::object::object_create;
use crate::runner::ds::realm::{get_intrinsic, JsCodeRealmType, WellKnownIntrinsics};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::types::{Completion, EvalResult};
use crate::runner::std_lib::install_methods;

pub fn create_console_object(realm: &JsCodeRealmType) -> Result<JsObjectType, JErrorType> {
    let console = object_create(Some(get_intrinsic(
        realm,
        WellKnownIntrinsics::ObjectPrototype,
    )?));
    install_methods(
        realm,
        &console,
        &[
            ("log", console_log, 0),
            ("error", console_error, 0),
            ("warn", console_warn, 0),
            ("info", console_info, 0),
        ],
    )?;
    Ok(console)
}

/// Format all arguments for console output.
fn format_args(args: &[JsValue]) -> String {
    args.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn console_log(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    println!("{}", format_args(&args));
    Ok(Completion::normal_with_value(JsValue::Undefined))
}

fn console_error(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    eprintln!("{}", format_args(&args));
    Ok(Completion::normal_with_value(JsValue::Undefined))
}

fn console_warn(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    eprintln!("{}", format_args(&args));
    Ok(Completion::normal_with_value(JsValue::Undefined))
}

fn console_info(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
    _new_target: Option<JsObjectType>,
) -> EvalResult {
    println!("{}", format_args(&args));
    Ok(Completion::normal_with_value(JsValue::Undefined))
}
