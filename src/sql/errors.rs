use thiserror::Error;

use crate::errors::Error as BridgeError;

const SQL_EXCEPTION: &str = "java/sql/SQLException";

/// Errors raised by the SQL client, shaped after the DB-API exception
/// hierarchy.
///
/// Every variant except [`Error::Bridge`] carries the message of the Java
/// exception (or of the client-side check) that caused it.
#[derive(Debug, Error)]
pub enum Error {
    /// An important warning, e.g. data truncation.
    #[error("Warning: {0}")]
    Warning(String),

    /// Misuse of the client itself, such as using a closed connection.
    #[error("Interface error: {0}")]
    InterfaceError(String),

    /// Problems with the processed data, such as an unsupported column type.
    #[error("Data error: {0}")]
    DataError(String),

    /// The database failed to connect, prepare or execute.
    #[error("Operational error: {0}")]
    OperationalError(String),

    /// The relational integrity of the database is affected.
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    /// The database hit an internal error.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// The statement is wrong: bad parameters, wrong parameter count and
    /// similar.
    #[error("Programming error: {0}")]
    ProgrammingError(String),

    /// The driver or the client doesn't support the operation.
    #[error("Not supported: {0}")]
    NotSupportedError(String),

    /// A failure in the JNI bridge underneath.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl Error {
    /// True for the variants that DB-API groups under `DatabaseError`.
    pub fn is_database_error(&self) -> bool {
        matches!(
            self,
            Error::DataError(_)
                | Error::OperationalError(_)
                | Error::IntegrityError(_)
                | Error::InternalError(_)
                | Error::ProgrammingError(_)
                | Error::NotSupportedError(_)
        )
    }
}

/// Result type of the SQL client.
pub type Result<T> = std::result::Result<T, Error>;

/// The step a bridge error happened in. It decides which DB-API error a
/// Java exception turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Stage {
    Connect,
    Prepare,
    Bind,
    Execute,
    Fetch,
}

/// Translate a bridge error raised during `stage`.
///
/// Errors that aren't Java exceptions pass through as [`Error::Bridge`].
pub(super) fn translate(err: BridgeError, stage: Stage) -> Error {
    let Some(exc) = err.java_exception() else {
        return Error::Bridge(err);
    };
    let message = exc
        .message()
        .map(str::to_owned)
        .unwrap_or_else(|| exc.to_string());
    let is_sql = exc.is_instance_of(SQL_EXCEPTION).unwrap_or(false);
    java_error(stage, is_sql, message)
}

/// The DB-API error for a Java exception thrown during `stage`.
///
/// Non-`SQLException`s outside of binding and executing come from the
/// driver or the bridge rather than the database: `InterfaceError`.
fn java_error(stage: Stage, is_sql: bool, message: String) -> Error {
    match (stage, is_sql) {
        (Stage::Bind, _) | (Stage::Execute, false) => Error::ProgrammingError(message),
        (_, true) => Error::OperationalError(message),
        (Stage::Connect | Stage::Prepare | Stage::Fetch, false) => Error::InterfaceError(message),
    }
}

/// Shorthand for `map_err(|e| translate(e, stage))`.
pub(super) trait Translate<T> {
    fn during(self, stage: Stage) -> Result<T>;
}

impl<T> Translate<T> for crate::errors::Result<T> {
    fn during(self, stage: Stage) -> Result<T> {
        self.map_err(|e| translate(e, stage))
    }
}
