use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("table name must not be empty")]
    EmptyTableName,
    #[error("duplicate column {column} in table {table}")]
    DuplicateColumn { table: String, column: String },
    #[error("primary key column {column} is not part of table {table}")]
    UnknownKeyColumn { table: String, column: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
