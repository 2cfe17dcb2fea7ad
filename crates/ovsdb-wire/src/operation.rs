//! Database operations (RFC 7047 section 5.2).

use crate::schema::{Table, UUID_COLUMN};
use crate::tables::Row;
use crate::value::{Atom, Datum};
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Condition function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Equal,
    NotEqual,
    Includes,
    Excludes,
}

impl Function {
    pub fn as_str(&self) -> &'static str {
        match self {
            Function::Equal => "==",
            Function::NotEqual => "!=",
            Function::Includes => "includes",
            Function::Excludes => "excludes",
        }
    }
}

/// A `[column, function, value]` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub column: String,
    pub function: Function,
    pub value: Datum,
}

impl Condition {
    pub fn equal(column: impl Into<String>, value: impl Into<Atom>) -> Self {
        Self {
            column: column.into(),
            function: Function::Equal,
            value: Datum::Atom(value.into()),
        }
    }

    /// `_uuid == uuid`
    pub fn uuid_equal(uuid: Uuid) -> Self {
        Self::equal(UUID_COLUMN, uuid)
    }

    pub fn to_json(&self) -> Value {
        json!([self.column, self.function.as_str(), self.value.to_json()])
    }
}

/// Mutator of a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutator {
    Insert,
    Delete,
}

impl Mutator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mutator::Insert => "insert",
            Mutator::Delete => "delete",
        }
    }
}

/// A `[column, mutator, value]` mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub column: String,
    pub mutator: Mutator,
    pub value: Datum,
}

impl Mutation {
    pub fn insert(column: impl Into<String>, value: Datum) -> Self {
        Self {
            column: column.into(),
            mutator: Mutator::Insert,
            value,
        }
    }

    pub fn delete(column: impl Into<String>, value: Datum) -> Self {
        Self {
            column: column.into(),
            mutator: Mutator::Delete,
            value,
        }
    }

    pub fn to_json(&self) -> Value {
        json!([self.column, self.mutator.as_str(), self.value.to_json()])
    }
}

/// One operation of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Insert {
        row: Row,
        uuid_name: String,
    },
    Update {
        row: Row,
        conditions: Vec<Condition>,
    },
    Mutate {
        table: Table,
        mutations: Vec<Mutation>,
        conditions: Vec<Condition>,
    },
    Delete {
        table: Table,
        conditions: Vec<Condition>,
    },
    Comment(String),
}

impl Operation {
    /// Returns the table this operation targets, if any.
    pub fn table(&self) -> Option<Table> {
        match self {
            Operation::Insert { row, .. } | Operation::Update { row, .. } => Some(row.table()),
            Operation::Mutate { table, .. } | Operation::Delete { table, .. } => Some(*table),
            Operation::Comment(_) => None,
        }
    }

    pub fn op_name(&self) -> &'static str {
        match self {
            Operation::Insert { .. } => "insert",
            Operation::Update { .. } => "update",
            Operation::Mutate { .. } => "mutate",
            Operation::Delete { .. } => "delete",
            Operation::Comment(_) => "comment",
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Operation::Insert { .. })
    }

    /// Temporary names this operation references (not defines).
    pub fn named_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        match self {
            Operation::Insert { row, .. } | Operation::Update { row, .. } => {
                refs.extend(row.named_refs());
            }
            Operation::Mutate { mutations, .. } => {
                for m in mutations {
                    refs.extend(m.value.named_refs());
                }
            }
            Operation::Delete { .. } | Operation::Comment(_) => {}
        }
        if let Operation::Update { conditions, .. }
        | Operation::Mutate { conditions, .. }
        | Operation::Delete { conditions, .. } = self
        {
            for c in conditions {
                refs.extend(c.value.named_refs());
            }
        }
        refs
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("op".to_string(), json!(self.op_name()));
        let where_json =
            |conditions: &[Condition]| Value::Array(conditions.iter().map(Condition::to_json).collect());
        match self {
            Operation::Insert { row, uuid_name } => {
                obj.insert("table".to_string(), json!(row.table().name()));
                obj.insert("row".to_string(), row.to_json());
                obj.insert("uuid-name".to_string(), json!(uuid_name));
            }
            Operation::Update { row, conditions } => {
                obj.insert("table".to_string(), json!(row.table().name()));
                obj.insert("where".to_string(), where_json(conditions));
                obj.insert("row".to_string(), row.to_json());
            }
            Operation::Mutate {
                table,
                mutations,
                conditions,
            } => {
                obj.insert("table".to_string(), json!(table.name()));
                obj.insert("where".to_string(), where_json(conditions));
                obj.insert(
                    "mutations".to_string(),
                    Value::Array(mutations.iter().map(Mutation::to_json).collect()),
                );
            }
            Operation::Delete { table, conditions } => {
                obj.insert("table".to_string(), json!(table.name()));
                obj.insert("where".to_string(), where_json(conditions));
            }
            Operation::Comment(text) => {
                obj.insert("comment".to_string(), json!(text));
            }
        }
        Value::Object(obj)
    }
}
