use std::fmt;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// A symbol value. Identity is the generated id, never the description.
#[derive(Clone)]
pub struct SymbolData {
    id: Uuid,
    description: Option<String>,
}

impl SymbolData {
    pub fn new(description: Option<String>) -> Self {
        SymbolData {
            id: Uuid::new_v4(),
            description,
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
impl PartialEq for SymbolData {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for SymbolData {}
impl Hash for SymbolData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}
impl Display for SymbolData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or(""))
    }
}
impl fmt::Debug for SymbolData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self, self.id.to_hyphenated())
    }
}

/* Well known symbols, shared by every realm */
lazy_static! {
    pub static ref SYMBOL_TO_STRING_TAG: SymbolData =
        SymbolData::new(Some("Symbol.toStringTag".to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_with_same_description_are_distinct() {
        let a = SymbolData::new(Some("a".to_string()));
        let b = SymbolData::new(Some("a".to_string()));
        assert!(a != b);
        assert!(a == a.clone());
        assert_eq!(a.to_string(), "Symbol(a)");
    }
}
