//! Module loading and evaluation.
//!
//! Source text comes from a [`ModuleLoader`] supplied by the host. Each realm keeps its own
//! module map, so a module imported into two realms is evaluated twice and the two copies
//! share nothing.

pub mod loader;
pub mod record;

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::parser::static_semantics::export_entries;
use crate::parser::{JsParser, ParseError};
use crate::runner::ds::env_record::new_declarative_environment;
use crate::runner::ds::error::EngineError;
use crate::runner::ds::execution_context::ExecutionContext;
use crate::runner::ds::realm::JsCodeRealmType;
use crate::runner::eval::context::EvalContext;
use crate::runner::eval::declaration::var_scope_declaration_instantiation;
use crate::runner::eval::statement::evaluate_statement_list;
use crate::runner::std_lib::error::describe_thrown_value;

use self::record::{ModuleRecord, ModuleRecordType, ModuleStatus};

/// Supplies module source text by specifier.
pub trait ModuleLoader {
    fn load_source(&self, specifier: &str) -> Result<String, ModuleError>;
}

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("module '{0}' not found")]
    NotFound(String),
    #[error("invalid module specifier '{0}'")]
    InvalidSpecifier(String),
    #[error("failed to read module '{specifier}': {source}")]
    Io {
        specifier: String,
        #[source]
        source: io::Error,
    },
    #[error("syntax error in module '{specifier}': {source}")]
    Syntax {
        specifier: String,
        #[source]
        source: ParseError,
    },
    #[error("{0}")]
    Evaluation(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A loader that knows no modules.
pub struct NoModules;
impl ModuleLoader for NoModules {
    fn load_source(&self, specifier: &str) -> Result<String, ModuleError> {
        Err(ModuleError::NotFound(specifier.to_string()))
    }
}

fn errored(specifier: &str, message: &str) -> ModuleError {
    ModuleError::Evaluation(format!(
        "evaluation of module '{}' failed: {}",
        specifier, message
    ))
}

/// Loads, links and evaluates `specifier` in `realm`, or returns the cached record when the
/// realm has seen it before.
#[tracing::instrument(level = "debug", skip(ctx, realm))]
pub fn load_module(
    ctx: &mut EvalContext,
    realm: &JsCodeRealmType,
    specifier: &str,
) -> Result<ModuleRecordType, ModuleError> {
    let cached = (**realm).borrow().module_map.get(specifier).cloned();
    if let Some(module) = cached {
        let status = module.borrow().status.clone();
        return match status {
            ModuleStatus::Evaluated => Ok(module),
            ModuleStatus::Errored(message) => Err(errored(specifier, &message)),
        };
    }

    let loader = ctx.module_loader.clone();
    let source = loader.load_source(specifier)?;
    let program = JsParser::parse_module(&source).map_err(|e| ModuleError::Syntax {
        specifier: specifier.to_string(),
        source: e,
    })?;

    let mut ec = ExecutionContext::new_for_realm(realm, true).map_err(EngineError::from)?;
    let module_env = new_declarative_environment(Some(ec.lex_env.clone()));
    ec.lex_env = module_env.clone();
    ec.var_env = module_env.clone();

    let module = Rc::new(RefCell::new(ModuleRecord {
        specifier: specifier.to_string(),
        environment: module_env.clone(),
        exports: export_entries(&program.body),
        status: ModuleStatus::Evaluated,
    }));

    let result = ctx.with_execution_context(ec, |ctx| {
        var_scope_declaration_instantiation(ctx, &program.body, &module_env)
            .map_err(EngineError::from)?;
        evaluate_statement_list(&program.body, ctx)
    })?;

    let status = if result.is_abrupt() {
        let (name, message) = describe_thrown_value(&result.get_value());
        if name.is_empty() {
            ModuleStatus::Errored(message)
        } else {
            ModuleStatus::Errored(format!("{}: {}", name, message))
        }
    } else {
        ModuleStatus::Evaluated
    };
    module.borrow_mut().status = status.clone();
    realm
        .borrow_mut()
        .module_map
        .insert(specifier.to_string(), module.clone());
    debug!(?status, "module evaluated");

    match status {
        ModuleStatus::Evaluated => Ok(module),
        ModuleStatus::Errored(message) => Err(errored(specifier, &message)),
    }
}
