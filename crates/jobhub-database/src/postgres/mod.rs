//! PostgreSQL store backends.

mod completion;
mod notification;
mod subject;

pub use completion::PgCompletionStore;
pub use notification::PgNotificationStore;
pub use subject::PgSubjectStore;

use jobhub_core::error::{AppError, ErrorKind};

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

fn decode_error(column: &str, err: String) -> AppError {
    AppError::database(format!("Invalid value in column '{column}': {err}"))
}
