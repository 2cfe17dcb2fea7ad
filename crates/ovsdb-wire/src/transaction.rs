//! Two-phase transaction builder.

use crate::operation::{Condition, Mutation, Operation};
use crate::schema::{DatabaseSchema, Table};
use crate::tables::TypedRow;
use crate::value::Atom;
use crate::{WireError, WireResult};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// Accumulates the operations of one reconciliation pass.
///
/// Inserts and all other operations are staged in two separate phases.
/// [`operations`](Self::operations) yields every insert first and then
/// every update, mutate, delete and comment, each phase in append order.
/// A row inserted by one reconciler can therefore be mutated or
/// referenced by any other reconciler of the same pass, regardless of the
/// order in which they ran.
#[derive(Debug)]
pub struct TransactionBuilder {
    schema: DatabaseSchema,
    inserts: Vec<Operation>,
    others: Vec<Operation>,
    named: BTreeSet<String>,
}

impl TransactionBuilder {
    pub fn new(schema: DatabaseSchema) -> Self {
        Self {
            schema,
            inserts: Vec::new(),
            others: Vec::new(),
            named: BTreeSet::new(),
        }
    }

    pub fn schema(&self) -> &DatabaseSchema {
        &self.schema
    }

    /// Returns true if `name` was defined by an insert of this batch.
    pub fn is_staged(&self, name: &str) -> bool {
        self.named.contains(name)
    }

    /// Derives a temporary name from `base` that is valid on the wire and
    /// not yet used in this batch.
    ///
    /// Characters outside `[a-zA-Z0-9_]` become `_`, a leading digit gets
    /// a `_` prefix, and a `_<n>` suffix is appended only on collision.
    pub fn unique_name(&self, base: &str) -> String {
        let mut name: String = base
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if name.chars().next().map_or(true, |c| c.is_ascii_digit()) {
            name.insert(0, '_');
        }
        if !self.named.contains(&name) {
            return name;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}_{}", name, n);
            if !self.named.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Stages an insert and returns the forward reference to the new row.
    ///
    /// # Errors
    ///
    /// Fails if `uuid_name` is not a valid identifier or was already used
    /// in this batch.
    pub fn insert<R: TypedRow>(&mut self, row: R, uuid_name: &str) -> WireResult<Atom> {
        if !is_valid_name(uuid_name) {
            return Err(WireError::InvalidNamedUuid(uuid_name.to_string()));
        }
        if !self.named.insert(uuid_name.to_string()) {
            return Err(WireError::DuplicateNamedUuid(uuid_name.to_string()));
        }
        self.inserts.push(Operation::Insert {
            row: row.into_row(),
            uuid_name: uuid_name.to_string(),
        });
        Ok(Atom::named(uuid_name))
    }

    pub fn update<R: TypedRow>(&mut self, row: R, conditions: Vec<Condition>) {
        self.others.push(Operation::Update {
            row: row.into_row(),
            conditions,
        });
    }

    pub fn mutate(&mut self, table: Table, mutation: Mutation, conditions: Vec<Condition>) {
        self.others.push(Operation::Mutate {
            table,
            mutations: vec![mutation],
            conditions,
        });
    }

    pub fn delete(&mut self, table: Table, conditions: Vec<Condition>) {
        self.others.push(Operation::Delete { table, conditions });
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.others.push(Operation::Comment(text.into()));
    }

    /// All staged operations, inserts first.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.inserts.iter().chain(self.others.iter())
    }

    pub fn into_operations(self) -> Vec<Operation> {
        let mut ops = self.inserts;
        ops.extend(self.others);
        ops
    }

    pub fn len(&self) -> usize {
        self.inserts.len() + self.others.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.others.is_empty()
    }

    /// Temporary names referenced by staged operations but defined by no
    /// insert of this batch. The server rejects a batch when this is not
    /// empty.
    pub fn unresolved_named_refs(&self) -> BTreeSet<String> {
        self.operations()
            .flat_map(Operation::named_refs)
            .filter(|name| !self.named.contains(*name))
            .map(str::to_string)
            .collect()
    }

    /// Encodes the `transact` params: `[database, op, op, ...]`.
    pub fn to_json(&self) -> Value {
        let mut params = vec![json!(self.schema.name)];
        params.extend(self.operations().map(Operation::to_json));
        Value::Array(params)
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
