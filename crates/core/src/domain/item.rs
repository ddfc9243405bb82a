use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Module/object id identifying a transaction to the workflow service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Moid(pub String);

impl std::fmt::Display for Moid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque module-specific identifier for a queue row (amendment id,
/// PO number, employee reference).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey(pub String);

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the operator working the queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub user_name: String,
    pub role_id: String,
}

/// One row in a module's approval queue. Immutable client-side and
/// superseded wholesale on every refresh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingItem {
    pub key: ItemKey,
    pub moid: Moid,
    pub title: String,
    pub code: String,
    pub amount: Option<Decimal>,
    pub submitted_at: Option<DateTime<Utc>>,
    /// Remaining module display fields, already stringified.
    pub fields: BTreeMap<String, String>,
}

impl PendingItem {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Full record fetched lazily for a selected [`PendingItem`]. Only valid
/// against the selection that produced the fetch key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub key: ItemKey,
    pub moid: Moid,
    /// Reference/transaction number, the remarks lookup key when present.
    pub ref_no: Option<String>,
    /// Module-defined numeric input to the workflow service, 0 when absent.
    pub check_amount: Decimal,
    pub fields: BTreeMap<String, String>,
    /// Nested module collections (line items, family members, documents).
    pub collections: BTreeMap<String, Value>,
}

impl DetailRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}
