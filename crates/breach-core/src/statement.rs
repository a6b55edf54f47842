//! Multi-row INSERT rendering

use crate::errors::CoreError;
use crate::types::{Batch, Statement};

/// Renders batches as `INSERT INTO <table>(user, pass) VALUES ...;`
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    table: String,
}

impl StatementBuilder {
    /// The table name is spliced into SQL verbatim, so only plain or
    /// schema-qualified identifiers are accepted.
    pub fn new(table: impl Into<String>) -> Result<Self, CoreError> {
        let table = table.into();
        if !is_valid_table_name(&table) {
            return Err(CoreError::InvalidTableName(table));
        }
        Ok(Self { table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn build(&self, batch: &Batch) -> Statement {
        let values_len: usize = batch
            .records()
            .iter()
            .map(|r| r.identifier().len() + r.secret().len() + 8)
            .sum();
        let mut sql = String::with_capacity(self.table.len() + 40 + values_len);

        sql.push_str("INSERT INTO ");
        sql.push_str(&self.table);
        sql.push_str("(user, pass) VALUES ");
        for (i, record) in batch.records().iter().enumerate() {
            if i > 0 {
                sql.push(',');
            }
            sql.push_str("('");
            sql.push_str(record.identifier());
            sql.push_str("','");
            sql.push_str(record.secret());
            sql.push_str("')");
        }
        sql.push(';');

        Statement::new(sql, batch.len())
    }
}

fn is_valid_table_name(name: &str) -> bool {
    let mut parts = name.split('.');
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
            }
            _ => false,
        }
    };
    match (parts.next(), parts.next(), parts.next()) {
        (Some(table), None, None) => valid_part(table),
        (Some(schema), Some(table), None) => valid_part(schema) && valid_part(table),
        _ => false,
    }
}
