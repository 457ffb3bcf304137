use sqlx::FromRow;

/// A row of the key-value store backing persisted session state
#[derive(Debug, FromRow, Clone)]
pub struct KvRecord {
    pub key: String,
    pub value: String,
    pub updated: String,
}
