use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("referenced parent does not exist")]
    MissingParent,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid import payload: {0}")]
    Decode(String),

    #[error("CSV file is empty or invalid")]
    EmptyImport,

    #[error("import file is {size} bytes, limit is {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("import queue is closed")]
    QueueClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
