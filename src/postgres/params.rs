use std::error::Error;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;
use tokio_postgres::Statement;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_util::bytes::BytesMut;

use super::numeric;
use crate::error::SqlFixtureError;
use crate::types::RowValues;

/// A `RowValues` converted for one prepared parameter slot.
///
/// `tokio-postgres` writes the binary format of the Rust type it is given, so an `i64` bound to
/// an `INT4` column would send eight bytes. Conversion picks the representation from the
/// parameter type the server reported when the statement was prepared.
#[derive(Debug, Clone, PartialEq)]
pub enum PgParam {
    Null,
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    /// Decimal text, written in the binary `NUMERIC` format
    Numeric(String),
    Text(String),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(chrono::NaiveDate),
    Json(JsonValue),
    Bytes(Vec<u8>),
}

impl PgParam {
    /// Convert one value for a parameter of type `ty`.
    ///
    /// # Errors
    /// Returns `SqlFixtureError::ParameterError` if the value cannot be represented in `ty`
    /// (an integer out of range, non-numeric text for a number column, a fractional float for
    /// an integer column).
    pub fn for_type(value: &RowValues, ty: &Type) -> Result<Self, SqlFixtureError> {
        match value {
            RowValues::Null => Ok(PgParam::Null),
            RowValues::Bool(b) => Ok(PgParam::Bool(*b)),
            RowValues::Int(i) => Self::int_for_type(*i, ty),
            RowValues::Float(f) => Self::float_for_type(*f, ty),
            RowValues::Text(s) => Self::text_for_type(s, ty),
            RowValues::Timestamp(dt) => Ok(match *ty {
                Type::TIMESTAMPTZ => PgParam::TimestampTz(dt.and_utc()),
                Type::DATE => PgParam::Date(dt.date()),
                _ => PgParam::Timestamp(*dt),
            }),
            RowValues::JSON(v) => Ok(PgParam::Json(v.clone())),
            RowValues::Blob(bytes) => Ok(PgParam::Bytes(bytes.clone())),
        }
    }

    fn int_for_type(value: i64, ty: &Type) -> Result<Self, SqlFixtureError> {
        let out_of_range =
            |e| SqlFixtureError::ParameterError(format!("{value} does not fit in {ty}: {e}"));
        match *ty {
            Type::INT2 => i16::try_from(value).map(PgParam::Int2).map_err(out_of_range),
            Type::INT4 => i32::try_from(value).map(PgParam::Int4).map_err(out_of_range),
            Type::NUMERIC => Ok(PgParam::Numeric(value.to_string())),
            #[allow(clippy::cast_precision_loss)]
            Type::FLOAT4 => Ok(PgParam::Float4(value as f32)),
            #[allow(clippy::cast_precision_loss)]
            Type::FLOAT8 => Ok(PgParam::Float8(value as f64)),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                Ok(PgParam::Text(value.to_string()))
            }
            _ => Ok(PgParam::Int8(value)),
        }
    }

    fn float_for_type(value: f64, ty: &Type) -> Result<Self, SqlFixtureError> {
        match *ty {
            #[allow(clippy::cast_possible_truncation)]
            Type::FLOAT4 => Ok(PgParam::Float4(value as f32)),
            Type::NUMERIC => numeric::float_to_decimal_text(value)
                .map(PgParam::Numeric)
                .map_err(|e| SqlFixtureError::ParameterError(e.to_string())),
            Type::INT2 | Type::INT4 | Type::INT8 => {
                if value.fract() != 0.0 || !value.is_finite() {
                    return Err(SqlFixtureError::ParameterError(format!(
                        "{value} is not an integer and cannot bind to {ty}"
                    )));
                }
                #[allow(clippy::cast_possible_truncation)]
                let whole = value as i64;
                Self::int_for_type(whole, ty)
            }
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                Ok(PgParam::Text(value.to_string()))
            }
            _ => Ok(PgParam::Float8(value)),
        }
    }

    fn text_for_type(value: &str, ty: &Type) -> Result<Self, SqlFixtureError> {
        let parse_err =
            |e: &dyn std::fmt::Display| SqlFixtureError::ParameterError(format!("{value:?} as {ty}: {e}"));
        match *ty {
            Type::INT2 | Type::INT4 | Type::INT8 => {
                let parsed = value.trim().parse::<i64>().map_err(|e| parse_err(&e))?;
                Self::int_for_type(parsed, ty)
            }
            Type::FLOAT4 | Type::FLOAT8 => {
                let parsed = value.trim().parse::<f64>().map_err(|e| parse_err(&e))?;
                Self::float_for_type(parsed, ty)
            }
            Type::NUMERIC => {
                // Validate now so a bad literal is a parameter error, not a wire error.
                numeric::encode(value, &mut BytesMut::new()).map_err(|e| parse_err(&e))?;
                Ok(PgParam::Numeric(value.trim().to_string()))
            }
            Type::BOOL => match value.trim().to_ascii_lowercase().as_str() {
                "t" | "true" | "1" | "yes" | "on" => Ok(PgParam::Bool(true)),
                "f" | "false" | "0" | "no" | "off" => Ok(PgParam::Bool(false)),
                _ => Err(parse_err(&"expected a boolean")),
            },
            Type::TIMESTAMP | Type::TIMESTAMPTZ | Type::DATE => {
                let dt = RowValues::Text(value.to_string())
                    .as_timestamp()
                    .ok_or_else(|| parse_err(&"expected YYYY-MM-DD HH:MM:SS[.f]"))?;
                Self::for_type(&RowValues::Timestamp(dt), ty)
            }
            _ => Ok(PgParam::Text(value.to_string())),
        }
    }
}

impl ToSql for PgParam {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        // Inner values go through `to_sql_checked` so a type the driver cannot write
        // (for example text into a UUID column) fails instead of sending garbage bytes.
        match self {
            PgParam::Null => Ok(IsNull::Yes),
            PgParam::Bool(v) => v.to_sql_checked(ty, out),
            PgParam::Int2(v) => v.to_sql_checked(ty, out),
            PgParam::Int4(v) => v.to_sql_checked(ty, out),
            PgParam::Int8(v) => v.to_sql_checked(ty, out),
            PgParam::Float4(v) => v.to_sql_checked(ty, out),
            PgParam::Float8(v) => v.to_sql_checked(ty, out),
            PgParam::Numeric(text) => {
                if *ty != Type::NUMERIC {
                    return Err(format!("cannot write NUMERIC text into {ty}").into());
                }
                numeric::encode(text, out)?;
                Ok(IsNull::No)
            }
            PgParam::Text(v) => v.to_sql_checked(ty, out),
            PgParam::Timestamp(v) => v.to_sql_checked(ty, out),
            PgParam::TimestampTz(v) => v.to_sql_checked(ty, out),
            PgParam::Date(v) => v.to_sql_checked(ty, out),
            PgParam::Json(v) => v.to_sql_checked(ty, out),
            PgParam::Bytes(v) => v.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Container for converted parameters, aligned with the statement's `$n` slots.
pub struct Params {
    values: Vec<PgParam>,
}

impl Params {
    /// Convert `params` against the parameter types of a prepared statement.
    ///
    /// Surplus values (more params than placeholders) are converted with an untyped fallback
    /// and left for the server to reject, so a count mismatch surfaces as a statement error.
    ///
    /// # Errors
    /// Returns `SqlFixtureError::ParameterError` if any value cannot be converted.
    pub fn convert(stmt: &Statement, params: &[RowValues]) -> Result<Self, SqlFixtureError> {
        let types = stmt.params();
        let values = params
            .iter()
            .enumerate()
            .map(|(i, value)| PgParam::for_type(value, types.get(i).unwrap_or(&Type::UNKNOWN)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Params { values })
    }

    /// References suitable for `query_raw`.
    pub fn as_refs(&self) -> impl ExactSizeIterator<Item = &(dyn ToSql + Sync)> {
        self.values.iter().map(|p| p as &(dyn ToSql + Sync))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
