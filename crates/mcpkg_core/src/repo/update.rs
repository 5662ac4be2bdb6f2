//! Partial-update statement builder.
//!
//! # Invariants
//! - Only columns from the entity's fixed allowed set can be assigned.
//! - Every value is bound as a parameter; column names come from `'static`
//!   allow-lists, never from caller strings.

use crate::db::NOW_MS_SQL;
use crate::model::EntityKind;
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use std::collections::BTreeMap;

pub(crate) struct UpdateBuilder {
    entity: EntityKind,
    table: &'static str,
    allowed: &'static [&'static str],
    touch_column: Option<&'static str>,
    assignments: BTreeMap<&'static str, Value>,
}

impl UpdateBuilder {
    pub(crate) fn new(
        entity: EntityKind,
        table: &'static str,
        allowed: &'static [&'static str],
    ) -> Self {
        Self {
            entity,
            table,
            allowed,
            touch_column: None,
            assignments: BTreeMap::new(),
        }
    }

    /// Refreshes `column` on every update, strictly advancing it.
    pub(crate) fn touch(mut self, column: &'static str) -> Self {
        self.touch_column = Some(column);
        self
    }

    pub(crate) fn set(&mut self, field: &str, value: impl Into<Value>) -> RepoResult<()> {
        let column = self
            .allowed
            .iter()
            .copied()
            .find(|allowed| *allowed == field)
            .ok_or_else(|| RepoError::UnknownField {
                entity: self.entity,
                field: field.to_string(),
            })?;
        self.assignments.insert(column, value.into());
        Ok(())
    }

    /// Sets `field` only when a value was supplied.
    pub(crate) fn set_opt<V: Into<Value>>(&mut self, field: &str, value: Option<V>) -> RepoResult<()> {
        match value {
            Some(value) => self.set(field, value),
            None => Ok(()),
        }
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.assignments.is_empty() && self.touch_column.is_none()
    }

    /// Renders `UPDATE <table> SET ... WHERE <key> = ? AND ...` with bind values.
    ///
    /// Callers must assign at least one field or set a touch column.
    pub(crate) fn build(self, keys: &[(&'static str, Value)]) -> (String, Vec<Value>) {
        debug_assert!(
            !self.assignments.is_empty() || self.touch_column.is_some(),
            "UPDATE {} has no SET clause",
            self.table
        );
        let mut clauses = Vec::with_capacity(self.assignments.len() + 1);
        let mut values = Vec::with_capacity(self.assignments.len() + keys.len());
        for (column, value) in self.assignments {
            values.push(value);
            clauses.push(format!("{column} = ?{}", values.len()));
        }
        if let Some(column) = self.touch_column {
            clauses.push(format!("{column} = MAX({column} + 1, {NOW_MS_SQL})"));
        }

        let mut predicates = Vec::with_capacity(keys.len());
        for (column, value) in keys {
            values.push(value.clone());
            predicates.push(format!("{column} = ?{}", values.len()));
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {};",
            self.table,
            clauses.join(", "),
            predicates.join(" AND ")
        );
        (sql, values)
    }
}
