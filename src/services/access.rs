//! Role-based access rules for catalog routes

use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Kind of operation a catalog request performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Derive the operation from the trailing path segment:
    /// `.../create`, `.../update` and `.../delete` write, everything else reads.
    pub fn classify(path: &str) -> Self {
        let last = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();

        match last {
            "create" => Operation::Create,
            "update" => Operation::Update,
            "delete" => Operation::Delete,
            _ => Operation::Read,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations each role may perform
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionTable {
    pub reader: Vec<Operation>,
    pub editor: Vec<Operation>,
    pub admin: Vec<Operation>,
}

impl Default for PermissionTable {
    fn default() -> Self {
        use Operation::*;
        Self {
            reader: vec![Read],
            editor: vec![Read, Create, Update],
            admin: vec![Read, Create, Update, Delete],
        }
    }
}

impl PermissionTable {
    pub fn permitted(&self, role: Role) -> &[Operation] {
        match role {
            Role::Reader => &self.reader,
            Role::Editor => &self.editor,
            Role::Admin => &self.admin,
        }
    }

    /// Stored role values outside the known set are denied everything.
    pub fn allows(&self, role: i16, operation: Operation) -> bool {
        match Role::try_from(role) {
            Ok(role) => self.permitted(role).contains(&operation),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_trailing_segment() {
        assert_eq!(Operation::classify("/catalog/book/create"), Operation::Create);
        assert_eq!(Operation::classify("/catalog/author/42/update"), Operation::Update);
        assert_eq!(Operation::classify("/catalog/author/42/delete/"), Operation::Delete);
        assert_eq!(Operation::classify("/catalog/books"), Operation::Read);
        assert_eq!(Operation::classify("/catalog/book/42"), Operation::Read);
        assert_eq!(Operation::classify("/"), Operation::Read);
        assert_eq!(Operation::classify(""), Operation::Read);
    }

    #[test]
    fn test_default_table() {
        let table = PermissionTable::default();

        assert!(table.allows(0, Operation::Read));
        assert!(!table.allows(0, Operation::Create));
        assert!(!table.allows(0, Operation::Delete));

        assert!(table.allows(1, Operation::Create));
        assert!(table.allows(1, Operation::Update));
        assert!(!table.allows(1, Operation::Delete));

        for op in [Operation::Read, Operation::Create, Operation::Update, Operation::Delete] {
            assert!(table.allows(2, op));
        }
    }

    #[test]
    fn test_unknown_role_is_denied() {
        let table = PermissionTable::default();
        assert!(!table.allows(3, Operation::Read));
        assert!(!table.allows(-1, Operation::Read));
    }
}
