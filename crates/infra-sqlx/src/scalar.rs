// Scalar decoding: first column of a row -> ScalarValue
// Dispatches on the runtime type name so any diagnostic command can be probed

use crate::error::map_decode_error;
use pulsecheck_core::domain::{ProbeError, ScalarValue};
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

pub(crate) fn sqlite_scalar(row: &SqliteRow) -> Result<ScalarValue, ProbeError> {
    if row.is_empty() {
        return Ok(ScalarValue::Null);
    }

    let raw = row.try_get_raw(0).map_err(map_decode_error)?;
    if raw.is_null() {
        return Ok(ScalarValue::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();

    let value = match type_name.as_str() {
        "INTEGER" | "INT" | "BIGINT" => {
            ScalarValue::Integer(row.try_get(0).map_err(map_decode_error)?)
        }
        "BOOLEAN" => ScalarValue::Bool(row.try_get(0).map_err(map_decode_error)?),
        "REAL" | "FLOAT" | "DOUBLE" => ScalarValue::Real(row.try_get(0).map_err(map_decode_error)?),
        "TEXT" => ScalarValue::Text(row.try_get(0).map_err(map_decode_error)?),
        "BLOB" => ScalarValue::Bytes(row.try_get(0).map_err(map_decode_error)?),
        _ => ScalarValue::Other(type_name),
    };

    Ok(value)
}

pub(crate) fn postgres_scalar(row: &PgRow) -> Result<ScalarValue, ProbeError> {
    if row.is_empty() {
        return Ok(ScalarValue::Null);
    }

    let raw = row.try_get_raw(0).map_err(map_decode_error)?;
    if raw.is_null() {
        return Ok(ScalarValue::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();

    let value = match type_name.as_str() {
        "INT2" => ScalarValue::Integer(row.try_get::<i16, _>(0).map_err(map_decode_error)?.into()),
        "INT4" => ScalarValue::Integer(row.try_get::<i32, _>(0).map_err(map_decode_error)?.into()),
        "INT8" => ScalarValue::Integer(row.try_get::<i64, _>(0).map_err(map_decode_error)?),
        "FLOAT4" => ScalarValue::Real(row.try_get::<f32, _>(0).map_err(map_decode_error)?.into()),
        "FLOAT8" => ScalarValue::Real(row.try_get::<f64, _>(0).map_err(map_decode_error)?),
        "BOOL" => ScalarValue::Bool(row.try_get(0).map_err(map_decode_error)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "UNKNOWN" => {
            ScalarValue::Text(row.try_get(0).map_err(map_decode_error)?)
        }
        "BYTEA" => ScalarValue::Bytes(row.try_get(0).map_err(map_decode_error)?),
        _ => ScalarValue::Other(type_name),
    };

    Ok(value)
}
