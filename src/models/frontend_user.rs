use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Table holding federated frontend user accounts.
pub const FRONTEND_USER_TABLE: &str = "fe_users";

/// Store-generated identifier column of [`FRONTEND_USER_TABLE`].
pub const FRONTEND_USER_ID_COLUMN: &str = "uid";

/// A single column value of a frontend user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// A federated frontend user account.
///
/// The identifier is absent until the record is first persisted; the store
/// assigns it on insert. Profile data is an open column map so that attribute
/// mappings from different IdPs can write whichever columns they need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontendUser {
    uid: Option<i64>,
    data: BTreeMap<String, FieldValue>,
}

impl FrontendUser {
    /// A new, not yet persisted user.
    pub fn new() -> Self {
        Self::default()
    }

    /// A user loaded from (or known to exist in) the store.
    pub fn with_uid(uid: i64, data: BTreeMap<String, FieldValue>) -> Self {
        Self {
            uid: Some(uid),
            data,
        }
    }

    pub fn uid(&self) -> Option<i64> {
        self.uid
    }

    pub(crate) fn set_uid(&mut self, uid: i64) {
        self.uid = Some(uid);
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.data.get(column)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.data.insert(column.into(), value.into());
        self
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn username(&self) -> Option<&str> {
        self.get("username").and_then(FieldValue::as_str)
    }

    /// The column values to write, excluding the identifier.
    pub fn to_persistable_fields(&self) -> BTreeMap<String, FieldValue> {
        self.data.clone()
    }
}

/// Write operation for [`FrontendUser`] persistence, decided once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOp {
    /// Not yet persisted: insert and back-fill the generated identifier.
    Create,
    /// Already persisted: update the row with this identifier.
    Update(i64),
}

impl UpsertOp {
    pub fn for_record(user: &FrontendUser) -> Self {
        match user.uid() {
            None => UpsertOp::Create,
            Some(uid) => UpsertOp::Update(uid),
        }
    }
}
