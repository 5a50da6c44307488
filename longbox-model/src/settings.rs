use serde::{Deserialize, Serialize};

/// One configurable, DB-backed runtime setting (§3, §4.11).
///
/// Unlike `longbox-server`'s startup `Config`, these are mutable at runtime
/// and drive admin-facing UI, hence the extra presentation fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub data_type: SettingType,
    pub category: String,
    pub label: String,
    pub description: Option<String>,
    /// Valid choices when `data_type` is `Select`; empty otherwise.
    pub options: Vec<String>,
    /// Another setting's key that must be truthy for this one to apply.
    pub depends_on: Option<String>,
    /// Excluded from the admin-facing settings list but still readable.
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum SettingType {
    String,
    Int,
    Bool,
    Select,
}

impl Setting {
    pub fn as_bool(&self) -> Option<bool> {
        match self.data_type {
            SettingType::Bool => self.value.parse().ok(),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.data_type {
            SettingType::Int => self.value.parse().ok(),
            _ => None,
        }
    }
}
