use crate::model::{Column, Transaction, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An ordered collection of transaction rows. The store keeps the whole dataset in one `Table`,
/// and queries return subsets as new `Table`s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Transaction>,
}

impl Table {
    pub fn new(rows: Vec<Transaction>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Transaction> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.rows.iter()
    }

    /// The ids of all rows, in table order.
    pub fn ids(&self) -> Vec<&str> {
        self.rows.iter().map(|t| t.id()).collect()
    }

    /// The first row with the given id.
    pub fn find(&self, id: &str) -> Option<&Transaction> {
        self.rows.iter().find(|t| t.id() == id)
    }

    pub(crate) fn find_mut(&mut self, id: &str) -> Option<&mut Transaction> {
        self.rows.iter_mut().find(|t| t.id() == id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Rows whose id is in `ids`, in table order.
    pub fn select_ids<S: AsRef<str>>(&self, ids: &[S]) -> Table {
        let wanted: HashSet<&str> = ids.iter().map(|s| s.as_ref()).collect();
        self.select(|t| wanted.contains(t.id()))
    }

    /// Rows where every `(column, value)` pair matches.
    pub fn select_eq(&self, filters: &[(Column, Value)]) -> Table {
        self.select(|t| filters.iter().all(|(c, v)| t.get(*c) == *v))
    }

    pub fn select<F>(&self, predicate: F) -> Table
    where
        F: Fn(&Transaction) -> bool,
    {
        Table::new(self.rows.iter().filter(|t| predicate(t)).cloned().collect())
    }

    pub(crate) fn push(&mut self, row: Transaction) {
        self.rows.push(row)
    }

    pub(crate) fn extend(&mut self, rows: impl IntoIterator<Item = Transaction>) {
        self.rows.extend(rows)
    }

    /// Removes every row whose id is in `ids` and returns how many were removed.
    pub(crate) fn remove_ids<S: AsRef<str>>(&mut self, ids: &[S]) -> usize {
        let doomed: HashSet<&str> = ids.iter().map(|s| s.as_ref()).collect();
        let before = self.rows.len();
        self.rows.retain(|t| !doomed.contains(t.id()));
        before - self.rows.len()
    }
}

impl FromIterator<Transaction> for Table {
    fn from_iter<T: IntoIterator<Item = Transaction>>(iter: T) -> Self {
        Table::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Table {
    type Item = Transaction;
    type IntoIter = std::vec::IntoIter<Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
