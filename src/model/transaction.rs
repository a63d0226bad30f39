use crate::error::{fail, ErrorType};
use crate::model::{Column, Value};
use crate::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A row that can be inserted directly into the store because it already carries its own id and
/// canonical types.
pub trait Record {
    /// The id that the row will be stored under.
    fn id(&self) -> &str;

    /// The row as it will appear in the transactions table.
    fn to_table_row(&self) -> Transaction;
}

/// One row of the transactions table, in canonical types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub(crate) id: String,
    pub(crate) date: NaiveDateTime,
    pub(crate) payee: String,
    pub(crate) category: String,
    pub(crate) memo: String,
    pub(crate) account: Option<String>,
    pub(crate) inflow: f64,
    pub(crate) outflow: f64,
    pub(crate) reconciled: bool,
    pub(crate) amount: f64,
}

impl Transaction {
    /// Creates a transaction with the given mandatory values and defaults everywhere else.
    pub fn new(
        id: impl Into<String>,
        date: NaiveDateTime,
        payee: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            payee: payee.into(),
            category: String::new(),
            memo: String::new(),
            account: None,
            inflow: 0.0,
            outflow: 0.0,
            reconciled: false,
            amount,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn payee(&self) -> &str {
        &self.payee
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn inflow(&self) -> f64 {
        self.inflow
    }

    pub fn outflow(&self) -> f64 {
        self.outflow
    }

    pub fn reconciled(&self) -> bool {
        self.reconciled
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Returns the value of `column` for this row.
    pub fn get(&self, column: Column) -> Value {
        match column {
            Column::Id => Value::Text(self.id.clone()),
            Column::Date => Value::Date(self.date),
            Column::Payee => Value::Text(self.payee.clone()),
            Column::Category => Value::Text(self.category.clone()),
            Column::Memo => Value::Text(self.memo.clone()),
            Column::Account => self.account.clone().into(),
            Column::Inflow => Value::Number(self.inflow),
            Column::Outflow => Value::Number(self.outflow),
            Column::Reconciled => Value::Bool(self.reconciled),
            Column::Amount => Value::Number(self.amount),
        }
    }

    /// Sets `column` to `value`. The value must already be of the column's canonical type.
    pub fn set(&mut self, column: Column, value: Value) -> Result<()> {
        match (column, value) {
            (Column::Id, Value::Text(s)) => self.id = s,
            (Column::Date, Value::Date(d)) => self.date = d,
            (Column::Payee, Value::Text(s)) => self.payee = s,
            (Column::Category, Value::Text(s)) => self.category = s,
            (Column::Memo, Value::Text(s)) => self.memo = s,
            (Column::Account, Value::Text(s)) => self.account = Some(s),
            (Column::Account, Value::Null) => self.account = None,
            (Column::Inflow, Value::Number(n)) => self.inflow = n,
            (Column::Outflow, Value::Number(n)) => self.outflow = n,
            (Column::Reconciled, Value::Bool(b)) => self.reconciled = b,
            (Column::Amount, Value::Number(n)) => self.amount = n,
            (column, value) => fail!(
                ErrorType::Coercion,
                "Value {value:?} is not a valid {} for column '{column}'",
                column.column_type()
            ),
        }
        Ok(())
    }
}

impl Record for Transaction {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_table_row(&self) -> Transaction {
        self.clone()
    }
}
