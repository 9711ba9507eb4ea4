use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;
use uuid::Uuid;

use crate::runner::ds::env_record::new_global_environment;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{JsObjectType, ObjectKind, ObjectType};
use crate::runner::module::record::ModuleRecordType;
use crate::runner::std_lib::core::{create_intrinsics, set_default_global_bindings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownIntrinsics {
    ObjectPrototype,
    FunctionPrototype,
    Error,
    ErrorPrototype,
    RangeError,
    RangeErrorPrototype,
    ReferenceError,
    ReferenceErrorPrototype,
    ShadowRealm,
    ShadowRealmPrototype,
    Symbol,
    SyntaxError,
    SyntaxErrorPrototype,
    TypeError,
    TypeErrorPrototype,
}

pub type JsCodeRealmType = Rc<RefCell<CodeRealm>>;

/// A realm: one global object, one global scope and one set of intrinsics. Nothing here is
/// shared with another realm.
pub struct CodeRealm {
    pub id: Uuid,
    pub intrinsics: HashMap<WellKnownIntrinsics, JsObjectType>,
    pub global_this: Option<JsObjectType>,
    pub global_env: Option<JsLexEnvironmentType>,
    /// Modules loaded into this realm, by specifier.
    pub module_map: HashMap<String, ModuleRecordType>,
}
impl CodeRealm {
    pub fn new() -> Self {
        CodeRealm {
            id: Uuid::new_v4(),
            intrinsics: HashMap::new(),
            global_this: None,
            global_env: None,
            module_map: HashMap::new(),
        }
    }

    pub fn get_intrinsics_value(
        &self,
        int_name: WellKnownIntrinsics,
    ) -> Result<JsObjectType, JErrorType> {
        self.intrinsics.get(&int_name).cloned().ok_or_else(|| {
            JErrorType::InternalError(format!("Intrinsic {:?} is not installed", int_name))
        })
    }

    pub fn get_global_object(&self) -> Result<JsObjectType, JErrorType> {
        self.global_this.clone().ok_or_else(|| {
            JErrorType::InternalError("Realm has no global object".to_string())
        })
    }

    pub fn get_global_env(&self) -> Result<JsLexEnvironmentType, JErrorType> {
        self.global_env.clone().ok_or_else(|| {
            JErrorType::InternalError("Realm has no global environment".to_string())
        })
    }
}
impl Default for CodeRealm {
    fn default() -> Self {
        CodeRealm::new()
    }
}

pub fn get_intrinsic(
    realm: &JsCodeRealmType,
    int_name: WellKnownIntrinsics,
) -> Result<JsObjectType, JErrorType> {
    (**realm).borrow().get_intrinsics_value(int_name)
}

/// SetRealmGlobalObject. Without an explicit object an ordinary one inheriting from the
/// realm's `Object.prototype` is made.
pub fn set_realm_global_object(
    realm: &JsCodeRealmType,
    global_obj: Option<JsObjectType>,
) -> Result<(), JErrorType> {
    let global_obj = match global_obj {
        Some(g) => g,
        None => {
            let proto = get_intrinsic(realm, WellKnownIntrinsics::ObjectPrototype)?;
            ObjectType::new(Some(proto), ObjectKind::Ordinary).into_js_object()
        }
    };
    let mut r = realm.borrow_mut();
    r.global_env = Some(new_global_environment(global_obj.clone()));
    r.global_this = Some(global_obj);
    Ok(())
}

/// InitializeHostDefinedRealm: a fresh realm with its intrinsics and global bindings.
pub fn initialize_host_defined_realm() -> Result<JsCodeRealmType, JErrorType> {
    let realm = Rc::new(RefCell::new(CodeRealm::new()));
    create_intrinsics(&realm)?;
    set_realm_global_object(&realm, None)?;
    set_default_global_bindings(&realm)?;
    let id = (*realm).borrow().id;
    debug!(realm = %id, "realm created");
    Ok(realm)
}
