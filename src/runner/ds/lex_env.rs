use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::env_record::EnvironmentRecordType;

pub type JsLexEnvironmentType = Rc<RefCell<LexEnvironment>>;

/// One link of a scope chain. `outer` is `None` only for a realm's global environment.
pub struct LexEnvironment {
    pub inner: Box<EnvironmentRecordType>,
    pub outer: Option<JsLexEnvironmentType>,
}
