//! The schema registry: the single source of truth for the transaction table's columns, their
//! types and their defaults.

use crate::error::{fail, ErrorType};
use crate::model::Value;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// A column of the transactions table.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Id,
    Date,
    Payee,
    /// Older partition files call this column `cat`.
    #[serde(alias = "cat")]
    Category,
    Memo,
    Account,
    Inflow,
    Outflow,
    Reconciled,
    Amount,
}

serde_plain::derive_display_from_serialize!(Column);

/// The storage type of a column.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Date,
    /// A string column drawn from a small set of repeating values.
    Categorical,
    Number,
    Bool,
}

serde_plain::derive_display_from_serialize!(ColumnType);

/// How a column is populated when an input row does not supply it.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDefault {
    /// Assigned by the store on insert.
    Generated,
    /// Must be supplied by the caller.
    Required,
    /// The empty string.
    Empty,
    /// No value.
    Null,
    /// `0.0`
    Zero,
    /// `false`
    False,
}

impl ColumnDefault {
    /// The value to fill in, if this default produces one.
    pub fn value(&self) -> Option<Value> {
        match self {
            ColumnDefault::Generated | ColumnDefault::Required => None,
            ColumnDefault::Empty => Some(Value::Text(String::new())),
            ColumnDefault::Null => Some(Value::Null),
            ColumnDefault::Zero => Some(Value::Number(0.0)),
            ColumnDefault::False => Some(Value::Bool(false)),
        }
    }
}

/// Describes one column of the schema.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ColumnSpec {
    pub column: Column,
    pub column_type: ColumnType,
    pub default: ColumnDefault,
}

const fn spec(column: Column, column_type: ColumnType, default: ColumnDefault) -> ColumnSpec {
    ColumnSpec {
        column,
        column_type,
        default,
    }
}

/// All columns in their canonical order.
pub const SCHEMA: [ColumnSpec; 10] = [
    spec(Column::Id, ColumnType::Text, ColumnDefault::Generated),
    spec(Column::Date, ColumnType::Date, ColumnDefault::Required),
    spec(Column::Payee, ColumnType::Text, ColumnDefault::Required),
    spec(Column::Category, ColumnType::Categorical, ColumnDefault::Empty),
    spec(Column::Memo, ColumnType::Text, ColumnDefault::Empty),
    spec(Column::Account, ColumnType::Categorical, ColumnDefault::Null),
    spec(Column::Inflow, ColumnType::Number, ColumnDefault::Zero),
    spec(Column::Outflow, ColumnType::Number, ColumnDefault::Zero),
    spec(Column::Reconciled, ColumnType::Bool, ColumnDefault::False),
    spec(Column::Amount, ColumnType::Number, ColumnDefault::Required),
];

impl Column {
    pub fn spec(&self) -> &'static ColumnSpec {
        // SCHEMA is declared in variant order.
        &SCHEMA[*self as usize]
    }

    pub fn column_type(&self) -> ColumnType {
        self.spec().column_type
    }

    pub fn default(&self) -> ColumnDefault {
        self.spec().default
    }

    pub fn name(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Date => "date",
            Column::Payee => "payee",
            Column::Category => "category",
            Column::Memo => "memo",
            Column::Account => "account",
            Column::Inflow => "inflow",
            Column::Outflow => "outflow",
            Column::Reconciled => "reconciled",
            Column::Amount => "amount",
        }
    }

    pub fn is_mandatory(&self) -> bool {
        self.default() == ColumnDefault::Required
    }
}

impl FromStr for Column {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match serde_plain::from_str::<Column>(s.trim()) {
            Ok(column) => Ok(column),
            Err(_) => fail!(
                ErrorType::UnknownColumn,
                "Invalid transaction column name '{s}'"
            ),
        }
    }
}

/// Columns every raw input row must supply.
pub fn mandatory_columns() -> Vec<Column> {
    SCHEMA
        .iter()
        .map(|s| s.column)
        .filter(Column::is_mandatory)
        .collect()
}

/// Columns that may be omitted from input, with the value they take when they are.
pub fn non_mandatory_defaults() -> BTreeMap<Column, Value> {
    SCHEMA
        .iter()
        .filter_map(|s| s.default.value().map(|v| (s.column, v)))
        .collect()
}

/// Column names in canonical order, aligned with `all_column_defaults`.
pub fn all_column_names() -> Vec<&'static str> {
    SCHEMA.iter().map(|s| s.column.name()).collect()
}

/// Column defaults in canonical order, aligned with `all_column_names`.
pub fn all_column_defaults() -> Vec<ColumnDefault> {
    SCHEMA.iter().map(|s| s.default).collect()
}

pub fn numeric_columns() -> Vec<Column> {
    SCHEMA
        .iter()
        .filter(|s| s.column_type == ColumnType::Number)
        .map(|s| s.column)
        .collect()
}
