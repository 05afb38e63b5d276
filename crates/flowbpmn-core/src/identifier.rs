//! Identifier management using string interning.
//!
//! Flowchart node ids are compared and hashed constantly during parsing,
//! layout and generation. The [`Id`] type interns them once and is `Copy`
//! from then on.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for identifier storage.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock")
}

/// Interned identifier of a flowchart node or subgraph.
///
/// Equality and hashing use the interned symbol, so comparing two ids never
/// touches the interner.
///
/// # Examples
///
/// ```
/// use flowbpmn_core::identifier::Id;
///
/// let a = Id::new("Approve");
/// let b: Id = "Approve".into();
/// assert_eq!(a, b);
/// assert_eq!(a, "Approve");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from its textual form.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Returns `true` when the identifier text satisfies `predicate`.
    pub fn matches(&self, predicate: impl FnOnce(&str) -> bool) -> bool {
        let interner = interner();
        let text = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        predicate(text)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner();
        let text = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        f.write_str(text)
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    /// Allows direct comparison with string slices: `id == "string"`
    fn eq(&self, other: &str) -> bool {
        self.matches(|text| text == other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let id1 = Id::new("Task");
        let id2 = Id::new("Task");
        let id3 = Id::new("Gateway");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1, "Task");
    }

    #[test]
    fn test_display_trait() {
        let id = Id::new("display_test");
        assert_eq!(format!("{id}"), "display_test");
        assert_eq!(id.to_string(), "display_test");
    }

    #[test]
    fn test_from_trait() {
        let id1: Id = "from_str_id".into();
        let id2 = Id::new("from_str_id");

        assert_eq!(id1, id2);
    }

    #[test]
    fn test_matches() {
        let id = Id::new("end42");
        assert!(id.matches(|text| text.starts_with("end")));
        assert!(!id.matches(|text| text.contains('|')));
    }

    #[test]
    fn test_partial_eq_str_ref() {
        let id = Id::new("Component");
        let name = String::from("Component");

        assert!(id == name.as_str());
        assert!(id != "Element");
    }

    #[test]
    fn test_hash_and_eq() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(Id::new("key1"), "value1");
        map.insert(Id::new("key2"), "value2");

        assert_eq!(map.get(&Id::new("key1")), Some(&"value1"));
        assert_eq!(map.len(), 2);
    }
}
