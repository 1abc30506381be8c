//! Dialect profiles
//!
//! What a target engine accepts for constraint definitions: the modify rules
//! it permits, how long identifiers may be, and whether names fold case.

use serde::Serialize;

use crate::engine::types::ModifyRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DialectProfile {
    pub id: &'static str,
    pub modify_rules: &'static [ModifyRule],
    pub max_identifier_length: usize,
    /// Whether `Orders` and `ORDERS` name the same object
    pub case_insensitive_names: bool,
}

impl DialectProfile {
    pub const SQLSERVER: DialectProfile = DialectProfile {
        id: "sqlserver",
        modify_rules: &ModifyRule::ALL,
        max_identifier_length: 128,
        case_insensitive_names: true,
    };

    pub const POSTGRES: DialectProfile = DialectProfile {
        id: "postgres",
        modify_rules: &ModifyRule::ALL,
        max_identifier_length: 63,
        case_insensitive_names: false,
    };

    // InnoDB parses SET DEFAULT but rejects it at table creation
    pub const MYSQL: DialectProfile = DialectProfile {
        id: "mysql",
        modify_rules: &[
            ModifyRule::NoAction,
            ModifyRule::Cascade,
            ModifyRule::Restrict,
            ModifyRule::SetNull,
        ],
        max_identifier_length: 64,
        case_insensitive_names: true,
    };

    pub const SQLITE: DialectProfile = DialectProfile {
        id: "sqlite",
        modify_rules: &ModifyRule::ALL,
        max_identifier_length: 1024,
        case_insensitive_names: true,
    };

    /// Client-side overlay keys carry no cascading behaviour
    pub const VIRTUAL: DialectProfile = DialectProfile {
        id: "virtual",
        modify_rules: &[ModifyRule::NoAction],
        max_identifier_length: 1024,
        case_insensitive_names: false,
    };

    pub fn from_driver_id(driver_id: &str) -> Option<Self> {
        match driver_id.to_lowercase().as_str() {
            "sqlserver" | "mssql" => Some(Self::SQLSERVER),
            "postgres" | "postgresql" => Some(Self::POSTGRES),
            "mysql" | "mariadb" => Some(Self::MYSQL),
            "sqlite" => Some(Self::SQLITE),
            "virtual" => Some(Self::VIRTUAL),
            _ => None,
        }
    }

    pub fn allows(&self, rule: ModifyRule) -> bool {
        self.modify_rules.contains(&rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_driver_id() {
        assert_eq!(DialectProfile::from_driver_id("MSSQL"), Some(DialectProfile::SQLSERVER));
        assert_eq!(DialectProfile::from_driver_id("mariadb"), Some(DialectProfile::MYSQL));
        assert_eq!(DialectProfile::from_driver_id("mongodb"), None);
    }

    #[test]
    fn test_allowed_rules() {
        assert!(DialectProfile::SQLSERVER.allows(ModifyRule::SetDefault));
        assert!(!DialectProfile::MYSQL.allows(ModifyRule::SetDefault));
        assert!(DialectProfile::VIRTUAL.allows(ModifyRule::NoAction));
        assert!(!DialectProfile::VIRTUAL.allows(ModifyRule::Cascade));
    }
}
