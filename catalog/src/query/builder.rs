//! General-purpose single-table statement builder.
//!
//! A builder is bound to one table and accumulates equality conditions,
//! insert rows and update data. Rendering is side-effect free and idempotent:
//! building twice without mutation yields identical output. State is never
//! cleared, so a builder serves exactly one logical request; callers discard
//! it and construct a fresh one for the next statement.

use crate::query::SqlValue;
use crate::store::CatalogError;

pub struct QueryBuilder {
    table: String,
    conditions: Vec<(String, SqlValue)>,
    insert_rows: Vec<Vec<(String, SqlValue)>>,
    update_data: Vec<(String, SqlValue)>,
}

impl QueryBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            conditions: Vec::new(),
            insert_rows: Vec::new(),
            update_data: Vec::new(),
        }
    }

    /// Append an equality predicate. Conditions are ANDed in append order.
    pub fn add_condition(&mut self, field: impl Into<String>, value: impl Into<SqlValue>) {
        self.conditions.push((field.into(), value.into()));
    }

    /// Stage one row for insertion. The column list of the first staged row
    /// defines the column order for every row.
    pub fn add_insert_data(&mut self, row: Vec<(&str, SqlValue)>) {
        self.insert_rows
            .push(row.into_iter().map(|(c, v)| (c.to_string(), v)).collect());
    }

    /// Set the SET data for an update statement.
    pub fn add_update_data(&mut self, data: Vec<(&str, SqlValue)>) {
        self.update_data = data.into_iter().map(|(c, v)| (c.to_string(), v)).collect();
    }

    /// Render a SELECT over the bound table: `SELECT * FROM <table>` with no
    /// conditions, otherwise with a parameterized `WHERE` clause.
    pub fn build_query(&self) -> (String, Vec<SqlValue>) {
        if self.conditions.is_empty() {
            return (format!("SELECT * FROM {}", self.table), Vec::new());
        }

        let mut params = Vec::with_capacity(self.conditions.len());
        let predicates: Vec<String> = self
            .conditions
            .iter()
            .map(|(field, value)| {
                params.push(value.clone());
                format!("{} = ${}", field, params.len())
            })
            .collect();

        (
            format!(
                "SELECT * FROM {} WHERE {}",
                self.table,
                predicates.join(" AND ")
            ),
            params,
        )
    }

    /// Render an INSERT for the staged rows, or `None` when nothing was
    /// staged. Every value becomes a `$n` placeholder.
    pub fn build_insert_query(&self) -> Option<(String, Vec<SqlValue>)> {
        let first = self.insert_rows.first()?;
        let columns: Vec<&str> = first.iter().map(|(c, _)| c.as_str()).collect();

        let mut params = Vec::new();
        let mut groups = Vec::with_capacity(self.insert_rows.len());
        for row in &self.insert_rows {
            let placeholders: Vec<String> = row
                .iter()
                .map(|(_, value)| {
                    params.push(value.clone());
                    format!("${}", params.len())
                })
                .collect();
            groups.push(format!("({})", placeholders.join(", ")));
        }

        Some((
            format!(
                "INSERT INTO {} ({}) VALUES {} RETURNING *",
                self.table,
                columns.join(", "),
                groups.join(", ")
            ),
            params,
        ))
    }

    /// Render an UPDATE for the staged SET data. Requires at least one
    /// condition so a builder misconfiguration can never produce a full-table
    /// update; fails with [`CatalogError::Configuration`] otherwise.
    pub fn build_update_query(&self) -> Result<(String, Vec<SqlValue>), CatalogError> {
        if self.update_data.is_empty() {
            return Err(CatalogError::Configuration(
                "update query requires SET data".into(),
            ));
        }
        if self.conditions.is_empty() {
            return Err(CatalogError::Configuration(
                "update query requires at least one condition to specify which records to update"
                    .into(),
            ));
        }

        let mut params = Vec::with_capacity(self.update_data.len() + self.conditions.len());
        let assignments: Vec<String> = self
            .update_data
            .iter()
            .map(|(column, value)| {
                params.push(value.clone());
                format!("{} = ${}", column, params.len())
            })
            .collect();
        let predicates: Vec<String> = self
            .conditions
            .iter()
            .map(|(field, value)| {
                params.push(value.clone());
                format!("{} = ${}", field, params.len())
            })
            .collect();

        Ok((
            format!(
                "UPDATE {} SET {} WHERE {} RETURNING *",
                self.table,
                assignments.join(", "),
                predicates.join(" AND ")
            ),
            params,
        ))
    }
}
