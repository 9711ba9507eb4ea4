use std::cell::RefCell;
use std::rc::Rc;

use crate::parser::static_semantics::ExportEntry;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::value::JsValue;

#[derive(Debug, Clone, PartialEq)]
pub enum ModuleStatus {
    Evaluated,
    /// Evaluation threw. Every later import of the module reports the same failure.
    Errored(String),
}

pub type ModuleRecordType = Rc<RefCell<ModuleRecord>>;

/// A module evaluated in some realm. Exports are live: reading one reads the binding in
/// the module's environment at that moment.
pub struct ModuleRecord {
    pub specifier: String,
    pub environment: JsLexEnvironmentType,
    pub exports: Vec<ExportEntry>,
    pub status: ModuleStatus,
}
impl ModuleRecord {
    /// The current value of the export called `export_name`, `None` when there is no such
    /// export.
    pub fn get_export(&self, export_name: &str) -> Result<Option<JsValue>, JErrorType> {
        let entry = match self.exports.iter().find(|e| e.export_name == export_name) {
            Some(e) => e,
            None => return Ok(None),
        };
        let env = (*self.environment).borrow();
        let value = env
            .inner
            .as_env_record()
            .get_binding_value(&entry.local_name, true)?;
        Ok(Some(value))
    }

    pub fn export_names(&self) -> Vec<&str> {
        self.exports.iter().map(|e| e.export_name.as_str()).collect()
    }
}
