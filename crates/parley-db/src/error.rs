use rusqlite::ErrorCode;
use rusqlite::ffi;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A unique or primary key constraint rejected the write.
    #[error("duplicate key: {0}")]
    Conflict(String),

    #[error("database lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, msg) = &err {
            let unique = failure.code == ErrorCode::ConstraintViolation
                && (failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY);
            if unique {
                return Error::Conflict(msg.clone().unwrap_or_else(|| failure.to_string()));
            }
        }
        Error::Sqlite(err)
    }
}
