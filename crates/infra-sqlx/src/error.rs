// sqlx::Error -> ProbeError mapping
// Done with helper functions: orphan rules forbid From<sqlx::Error> for ProbeError here

use pulsecheck_core::domain::ProbeError;

/// Describe a database-reported error with its vendor code when present
fn describe_database_error(db_err: &dyn sqlx::error::DatabaseError) -> String {
    match db_err.code() {
        Some(code) => format!("[{}] {}", code, db_err.message()),
        None => db_err.message().to_string(),
    }
}

/// Errors raised while parsing the target address
pub(crate) fn map_address_error(err: sqlx::Error) -> ProbeError {
    ProbeError::InvalidAddress(err.to_string())
}

/// Errors raised while opening a connection
pub(crate) fn map_open_error(err: sqlx::Error) -> ProbeError {
    match &err {
        // Authentication rejected, unknown database...
        sqlx::Error::Database(db_err) => {
            ProbeError::Connectivity(describe_database_error(db_err.as_ref()))
        }
        sqlx::Error::Io(io_err) => ProbeError::Connectivity(format!("I/O error: {}", io_err)),
        sqlx::Error::Tls(tls_err) => ProbeError::Connectivity(format!("TLS error: {}", tls_err)),
        sqlx::Error::Configuration(cfg_err) => {
            ProbeError::InvalidAddress(format!("Configuration error: {}", cfg_err))
        }
        _ => ProbeError::Connectivity(err.to_string()),
    }
}

/// Errors raised while executing the diagnostic command
pub(crate) fn map_query_error(err: sqlx::Error) -> ProbeError {
    match &err {
        // Malformed syntax, permission denied, object not found...
        sqlx::Error::Database(db_err) => {
            ProbeError::Execution(describe_database_error(db_err.as_ref()))
        }
        // Connection lost mid-command
        sqlx::Error::Io(io_err) => ProbeError::Connectivity(format!("I/O error: {}", io_err)),
        sqlx::Error::Protocol(msg) => ProbeError::Connectivity(format!("Protocol error: {}", msg)),
        _ => ProbeError::Execution(err.to_string()),
    }
}

/// Errors raised while decoding the scalar result
pub(crate) fn map_decode_error(err: sqlx::Error) -> ProbeError {
    ProbeError::Execution(format!("Cannot decode result: {}", err))
}

/// Errors raised while closing the connection
pub(crate) fn map_close_error(err: sqlx::Error) -> ProbeError {
    ProbeError::Connectivity(format!("Close failed: {}", err))
}
