use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use deadpool_postgres::ClientWrapper;
use futures_util::TryStreamExt;
use serde_json::Value;
use tokio_postgres::{Row, Statement};
use tracing::debug;

use super::numeric::NumericText;
use super::params::Params;
use crate::error::SqlFixtureError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Prepare (cached per connection), bind and run one statement on `client`.
///
/// Rows are collected for every statement kind; `rows_affected` comes from the command tag, so
/// an `INSERT` without `RETURNING` yields an empty result set with `rows_affected == 1`.
///
/// # Errors
/// Returns `SqlFixtureError::QueryError` if the server rejects the statement and
/// `SqlFixtureError::ParameterError` if a value cannot be bound to its placeholder.
pub async fn run_on_client(
    client: &ClientWrapper,
    query: &str,
    params: &[RowValues],
) -> Result<ResultSet, SqlFixtureError> {
    let stmt = client.prepare_cached(query).await?;
    let converted = Params::convert(&stmt, params)?;

    let stream = client.query_raw(&stmt, converted.as_refs()).await?;
    let mut stream = std::pin::pin!(stream);
    let mut rows = Vec::new();
    while let Some(row) = stream.try_next().await? {
        rows.push(row);
    }
    let rows_affected = stream
        .rows_affected()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(rows.len());

    let mut result_set = build_result_set_from_statement(&stmt, &rows)?;
    result_set.rows_affected = rows_affected;
    debug!(rows = result_set.len(), rows_affected, "statement finished");
    Ok(result_set)
}

/// Build a result set using statement metadata for column names.
///
/// # Errors
/// Returns errors from row value extraction.
pub fn build_result_set_from_statement(
    stmt: &Statement,
    rows: &[Row],
) -> Result<ResultSet, SqlFixtureError> {
    let column_names: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    let column_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(rows.len());
    result_set.set_column_names(Arc::new(column_names));

    for row in rows {
        let mut row_values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            row_values.push(postgres_extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Extracts a `RowValues` from a `tokio_postgres` Row at the given index.
///
/// `numeric` columns come back as [`RowValues::Text`] with the column's scale intact
/// (`"199.99"`, `"25.00"`).
///
/// # Errors
/// Returns `SqlFixtureError` if the column cannot be retrieved.
pub fn postgres_extract_value(row: &Row, idx: usize) -> Result<RowValues, SqlFixtureError> {
    let type_info = row.columns()[idx].type_();

    let value = match type_info.name() {
        "int2" => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|v| RowValues::Int(i64::from(v))),
        "int4" => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|v| RowValues::Int(i64::from(v))),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.map(RowValues::Int),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| RowValues::Float(f64::from(v))),
        "float8" => row.try_get::<_, Option<f64>>(idx)?.map(RowValues::Float),
        "numeric" => row
            .try_get::<_, Option<NumericText>>(idx)?
            .map(|NumericText(text)| RowValues::Text(text)),
        "bool" => row.try_get::<_, Option<bool>>(idx)?.map(RowValues::Bool),
        "timestamp" => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(RowValues::Timestamp),
        "timestamptz" => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(|v| RowValues::Timestamp(v.naive_utc())),
        "date" => row
            .try_get::<_, Option<NaiveDate>>(idx)?
            .map(|v| RowValues::Timestamp(v.and_time(chrono::NaiveTime::MIN))),
        "json" | "jsonb" => row.try_get::<_, Option<Value>>(idx)?.map(RowValues::JSON),
        "bytea" => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(RowValues::Blob),
        "text" | "varchar" | "bpchar" | "name" => {
            row.try_get::<_, Option<String>>(idx)?.map(RowValues::Text)
        }
        // Anything else: hand back the raw bytes as text if they are UTF-8.
        _ => row
            .try_get::<_, Option<RawText>>(idx)?
            .map(|RawText(text)| RowValues::Text(text)),
    };
    Ok(value.unwrap_or(RowValues::Null))
}

struct RawText(String);

impl<'a> tokio_postgres::types::FromSql<'a> for RawText {
    fn from_sql(
        _: &tokio_postgres::types::Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(RawText(String::from_utf8(raw.to_vec())?))
    }

    fn accepts(_: &tokio_postgres::types::Type) -> bool {
        true
    }
}
