//! Conversion of raw input values into the canonical column types.

use crate::error::{fail, ErrorType};
use crate::model::{schema, Amount, Column, ColumnType, RawRow, Transaction, Value};
use crate::Result;
use super::codec;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as Json;
use std::str::FromStr;
use tracing::warn;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Builds a canonical row from raw input: mandatory columns are checked, missing optional columns
/// are filled from the schema defaults and every value is coerced. The returned row has an empty
/// id; a caller-supplied `id` is ignored.
pub(crate) fn normalize(raw: &RawRow) -> Result<Transaction> {
    let mut supplied = Vec::with_capacity(raw.len());
    for (name, value) in raw {
        let column = Column::from_str(name)?;
        if column == Column::Id {
            warn!("Ignoring caller supplied id '{value}', ids are assigned by the store");
            continue;
        }
        supplied.push((column, value));
    }

    for column in schema::mandatory_columns() {
        let present = supplied
            .iter()
            .any(|(c, v)| *c == column && !is_missing(column, v));
        if !present {
            fail!(
                ErrorType::MissingColumn,
                "Mandatory column '{column}' is missing"
            );
        }
    }

    let mut row = Transaction::new(String::new(), NaiveDateTime::default(), "", 0.0);
    for (column, default) in schema::non_mandatory_defaults() {
        row.set(column, default)?;
    }
    for (column, value) in supplied {
        row.set(column, coerce(column, value)?)?;
    }
    Ok(row)
}

/// Coerces every entry of `raw`, e.g. the filters of a query or the changes of an update.
pub(crate) fn coerce_row(raw: &RawRow) -> Result<Vec<(Column, Value)>> {
    raw.iter()
        .map(|(name, value)| {
            let column = Column::from_str(name)?;
            Ok((column, coerce(column, value)?))
        })
        .collect()
}

/// Converts `value` to the canonical type of `column`. A null, or a blank string in a non-text
/// column, becomes the column default; mandatory columns have none and fail.
pub(crate) fn coerce(column: Column, value: &Json) -> Result<Value> {
    if is_missing(column, value) {
        return match column.default().value() {
            Some(default) => Ok(default),
            None => fail!(
                ErrorType::MissingColumn,
                "Column '{column}' requires a value"
            ),
        };
    }

    match column.column_type() {
        ColumnType::Text | ColumnType::Categorical => text(column, value).map(Value::Text),
        ColumnType::Date => date(column, value).map(Value::Date),
        ColumnType::Number => number(column, value).map(Value::Number),
        ColumnType::Bool => boolean(column, value).map(Value::Bool),
    }
}

fn is_missing(column: Column, value: &Json) -> bool {
    match value {
        Json::Null => true,
        Json::String(s) => {
            s.trim().is_empty()
                && !matches!(
                    column.column_type(),
                    ColumnType::Text | ColumnType::Categorical
                )
        }
        _ => false,
    }
}

fn text(column: Column, value: &Json) -> Result<String> {
    match value {
        Json::String(s) => Ok(s.clone()),
        Json::Number(n) => Ok(n.to_string()),
        Json::Bool(b) => Ok(b.to_string()),
        other => fail!(
            ErrorType::Coercion,
            "Unable to use {other} as text for column '{column}'"
        ),
    }
}

fn date(column: Column, value: &Json) -> Result<NaiveDateTime> {
    let s = match value {
        Json::String(s) => s.trim(),
        other => fail!(
            ErrorType::Coercion,
            "Unable to use {other} as a date for column '{column}'"
        ),
    };
    match parse_date(s) {
        Some(dt) if codec::is_storable(&dt) => Ok(dt),
        Some(dt) => fail!(
            ErrorType::Coercion,
            "The date {dt} for column '{column}' is outside the storable range"
        ),
        None => fail!(
            ErrorType::Coercion,
            "Unable to parse '{s}' as a date for column '{column}'"
        ),
    }
}

fn parse_date(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn number(column: Column, value: &Json) -> Result<f64> {
    match value {
        Json::Number(n) => match n.as_f64() {
            Some(f) => Ok(f),
            None => fail!(ErrorType::Coercion, "Number {n} is out of range for '{column}'"),
        },
        Json::String(s) => match Amount::from_str(s) {
            Ok(amount) => Ok(amount.to_f64()),
            Err(e) => fail!(ErrorType::Coercion, "Column '{column}': {e}"),
        },
        other => fail!(
            ErrorType::Coercion,
            "Unable to use {other} as a number for column '{column}'"
        ),
    }
}

fn boolean(column: Column, value: &Json) -> Result<bool> {
    match value {
        Json::Bool(b) => Ok(*b),
        Json::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(true)),
        Json::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Ok(true),
            "false" | "f" | "no" | "n" | "0" => Ok(false),
            _ => fail!(
                ErrorType::Coercion,
                "Unable to parse '{s}' as a boolean for column '{column}'"
            ),
        },
        other => fail!(
            ErrorType::Coercion,
            "Unable to use {other} as a boolean for column '{column}'"
        ),
    }
}
