//! The partitioned transactions store.
//!
//! The whole dataset is held in memory as one `Table`. On disk it is split into one Parquet file
//! per calendar month, `<root>/<year>/<month>.pq`. Every mutation works out which months it
//! touched and rewrites exactly those files from the in-memory state, so the files are always a
//! lossless decomposition of the table.
//!
//! Writes are not atomic across partitions: when a save covering several months fails part way,
//! the months written before the failure keep their new content.

mod codec;
mod coerce;
mod partition;

pub use codec::{read_partition, write_partition};
pub use partition::PartitionKey;

use crate::error::{fail, ErrorType, IntoResult};
use crate::model::{Column, RawRow, Record, Table};
use crate::{utils, Result};
use anyhow::Context;
use std::collections::{BTreeSet, HashSet};
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How many times a colliding id is re-drawn before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

/// Supplies ids for newly inserted transactions.
pub trait IdGenerator {
    fn create_uuid(&self) -> String;
}

/// Generates random UUID v4 ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn create_uuid(&self) -> String {
        utils::create_uuid()
    }
}

/// The transactions database. Owns the in-memory table and keeps the partition files under
/// `root` in sync with it.
pub struct TransactionsDb {
    root: PathBuf,
    table: Table,
    ids: Box<dyn IdGenerator>,
}

impl Debug for TransactionsDb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionsDb")
            .field("root", &self.root)
            .field("rows", &self.table.len())
            .finish()
    }
}

impl TransactionsDb {
    /// Loads every partition under `root` using random UUIDs for new ids.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(root, Box::new(UuidGenerator))
    }

    /// Loads every partition under `root` with a custom id generator.
    pub fn open_with(root: impl Into<PathBuf>, ids: Box<dyn IdGenerator>) -> Result<Self> {
        let root = root.into();
        let table = Self::connect(&root)?;
        info!(
            "Loaded {} transactions from {}",
            table.len(),
            root.display()
        );
        Ok(Self { root, table, ids })
    }

    /// Reads every partition file below `root`, one folder per year and one file per month, and
    /// concatenates them into one table. A missing `root` is created and yields an empty table.
    ///
    /// Only files named like a partition are read, `<year>/<month>.pq`, where the month may or
    /// may not be zero-padded. Anything else is skipped.
    ///
    /// # Errors
    /// - `ErrorType::Storage` if a directory cannot be listed or a file cannot be decoded.
    pub fn connect(root: &Path) -> Result<Table> {
        if !root.exists() {
            fs::create_dir_all(root)
                .with_context(|| format!("Unable to create store root {}", root.display()))
                .pub_result(ErrorType::Storage)?;
            return Ok(Table::default());
        }

        let mut table = Table::default();
        for year_dir in list_dir(root)? {
            if !year_dir.is_dir() {
                debug!("Skipping {}, it is not a year folder", year_dir.display());
                continue;
            }
            for file in list_dir(&year_dir)? {
                if !file.is_file() || PartitionKey::from_file(&file).is_none() {
                    debug!("Skipping {}, it is not a partition file", file.display());
                    continue;
                }
                let rows = read_partition(&file)?;
                debug!("Loaded {} rows from {}", rows.len(), file.display());
                table.extend(rows);
            }
        }
        Ok(table)
    }

    /// Always fails. Every mutation is persisted as it happens, so there is nothing to flush.
    pub fn disconnect(&mut self) -> Result<()> {
        fail!(
            ErrorType::Unsupported,
            "Disconnecting from a partitioned store is not supported, changes are saved as they \
            are made"
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The unified in-memory table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The partitions that currently hold at least one row.
    pub fn partitions(&self) -> BTreeSet<PartitionKey> {
        self.table
            .iter()
            .map(|t| PartitionKey::from_date(&t.date()))
            .collect()
    }

    /// Overwrites the partition file of each key with the rows of that month, even when there are
    /// none. The result depends only on the in-memory table.
    ///
    /// Other files that hold the same month under a different name, e.g. `3.pq` next to `03.pq`,
    /// are removed once the new file is written.
    pub fn save_db(&self, keys: impl IntoIterator<Item = PartitionKey>) -> Result<()> {
        for key in keys {
            let path = key.path(&self.root);
            let rows = self.table.iter().filter(|t| key.contains(&t.date()));
            write_partition(&path, rows)?;
            self.remove_stale_files(key, &path)?;
            debug!("Saved partition {key} to {}", path.display());
        }
        Ok(())
    }

    /// Saves the partitions that hold the given ids.
    ///
    /// # Errors
    /// - `ErrorType::NotFound` if any id is not in the table; nothing is written in that case.
    pub fn save_db_from_uuid<S: AsRef<str>>(&self, ids: &[S]) -> Result<()> {
        let months = self.months_from_ids(ids)?;
        self.save_db(months)
    }

    /// Rows whose id is in `ids`, in table order. Unknown ids are skipped.
    pub fn get_data_by_id<S: AsRef<str>>(&self, ids: &[S]) -> Table {
        self.table.select_ids(ids)
    }

    /// Rows that match every `column -> value` pair in `filters`. Values are coerced to the
    /// column's type first, so a date can be given as `"2023-03-15"`. No filters returns the whole
    /// table.
    ///
    /// # Errors
    /// - `ErrorType::UnknownColumn` for a column name that is not in the schema.
    /// - `ErrorType::Coercion` for a value that does not fit its column.
    pub fn get_data_by_col_val(&self, filters: &RawRow) -> Result<Table> {
        let filters = coerce::coerce_row(filters)?;
        Ok(self.table.select_eq(&filters))
    }

    /// Inserts new transactions from raw rows and returns their generated ids.
    ///
    /// Each row is normalized first: mandatory columns are checked, missing columns take their
    /// defaults and all values are coerced. If any row fails nothing is inserted. Only the
    /// partitions of the new rows are rewritten.
    pub fn insert_data(&mut self, rows: &[RawRow]) -> Result<Vec<String>> {
        let mut new_rows = rows
            .iter()
            .map(coerce::normalize)
            .collect::<Result<Vec<_>>>()?;

        let mut taken: HashSet<String> = self.table.iter().map(|t| t.id().to_string()).collect();
        let mut ids = Vec::with_capacity(new_rows.len());
        for row in new_rows.iter_mut() {
            let id = self.unique_id(&taken)?;
            taken.insert(id.clone());
            row.id = id.clone();
            ids.push(id);
        }

        self.table.extend(new_rows);
        self.save_db_from_uuid(&ids)?;
        debug!("Inserted {} transactions", ids.len());
        Ok(ids)
    }

    /// Inserts a record that already has its id and canonical types, and rewrites its partition.
    ///
    /// # Errors
    /// - `ErrorType::DuplicateId` if a row with the same id exists.
    /// - `ErrorType::Coercion` if its date cannot be stored.
    pub fn insert_record<R>(&mut self, record: &R) -> Result<()>
    where
        R: Record + ?Sized,
    {
        let id = record.id();
        if id.is_empty() {
            fail!(ErrorType::MissingColumn, "The record has an empty id");
        }
        if self.table.contains_id(id) {
            fail!(
                ErrorType::DuplicateId,
                "A transaction with id '{id}' already exists"
            );
        }
        let mut row = record.to_table_row();
        if !codec::is_storable(&row.date()) {
            fail!(
                ErrorType::Coercion,
                "The date {} of record '{id}' is outside the storable range",
                row.date()
            );
        }
        row.id = id.to_string();
        self.table.push(row);
        self.save_db_from_uuid(&[id])?;
        debug!("Inserted record '{id}'");
        Ok(())
    }

    /// Applies `changes` to every row in `ids` and returns the updated rows.
    ///
    /// Both the partitions the rows were in and the partitions they end up in are rewritten, so a
    /// change of `date` moves the row between files.
    ///
    /// # Errors
    /// - `ErrorType::NotFound` if any id is unknown; nothing is changed in that case.
    /// - `ErrorType::UnknownColumn` if `changes` names an unknown column or `id`.
    /// - `ErrorType::Coercion` or `ErrorType::MissingColumn` for unusable values.
    pub fn update_data<S: AsRef<str>>(&mut self, ids: &[S], changes: &RawRow) -> Result<Table> {
        let changes = coerce::coerce_row(changes)?;
        if changes.iter().any(|(c, _)| *c == Column::Id) {
            fail!(ErrorType::UnknownColumn, "The 'id' column cannot be updated");
        }
        let mut months = self.months_from_ids(ids)?;

        for id in ids {
            let id = id.as_ref();
            let row = self
                .table
                .find_mut(id)
                .with_context(|| format!("Transaction '{id}' vanished during update"))?;
            for (column, value) in &changes {
                row.set(*column, value.clone())?;
            }
            months.insert(PartitionKey::from_date(&row.date()));
        }

        self.save_db(months)?;
        debug!("Updated {} transactions", ids.len());
        Ok(self.get_data_by_id(ids))
    }

    /// Removes the rows in `ids` and rewrites the partitions they were in. A partition that ends
    /// up empty is written as a zero-row file. Returns the number of rows removed.
    ///
    /// # Errors
    /// - `ErrorType::NotFound` if any id is unknown; nothing is removed in that case.
    pub fn delete_data<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<usize> {
        // The months must be looked up before the rows are gone.
        let months = self.months_from_ids(ids)?;
        let removed = self.table.remove_ids(ids);
        self.save_db(months)?;
        debug!("Deleted {removed} transactions");
        Ok(removed)
    }

    /// The distinct partitions holding `ids`.
    pub(crate) fn months_from_ids<S: AsRef<str>>(
        &self,
        ids: &[S],
    ) -> Result<BTreeSet<PartitionKey>> {
        let mut months = BTreeSet::new();
        for id in ids {
            let id = id.as_ref();
            match self.table.find(id) {
                Some(row) => {
                    months.insert(PartitionKey::from_date(&row.date()));
                }
                None => fail!(ErrorType::NotFound, "Transaction not found: '{id}'"),
            }
        }
        Ok(months)
    }

    /// Removes the files other than `current` that `connect` would load as partition `key`.
    fn remove_stale_files(&self, key: PartitionKey, current: &Path) -> Result<()> {
        for file in list_dir(&key.dir(&self.root))? {
            if file == current || !file.is_file() || PartitionKey::from_file(&file) != Some(key) {
                continue;
            }
            fs::remove_file(&file)
                .with_context(|| format!("Unable to remove stale partition {}", file.display()))
                .pub_result(ErrorType::Storage)?;
            debug!("Removed stale partition file {}", file.display());
        }
        Ok(())
    }

    fn unique_id(&self, taken: &HashSet<String>) -> Result<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.create_uuid();
            if !id.is_empty() && !taken.contains(&id) {
                return Ok(id);
            }
            debug!("Generated id '{id}' is already in use, drawing another");
        }
        fail!(
            ErrorType::Internal,
            "Unable to generate a unique id after {MAX_ID_ATTEMPTS} attempts"
        )
    }
}

/// The entries of `dir`, sorted by path.
fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)
        .and_then(|entries| {
            entries
                .map(|e| e.map(|e| e.path()))
                .collect::<std::io::Result<Vec<_>>>()
        })
        .with_context(|| format!("Unable to list directory {}", dir.display()))
        .pub_result(ErrorType::Storage)?;
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Transaction, Value};
    use crate::test::{raw, ymd, ScriptedIds, SequenceIds};
    use serde_json::json;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> TransactionsDb {
        TransactionsDb::open_with(dir.path().join("db"), Box::new(SequenceIds::new("t"))).unwrap()
    }

    fn store_row(date: &str, payee: &str, amount: f64) -> RawRow {
        raw(json!({ "date": date, "payee": payee, "amount": amount }))
    }

    /// Every row found in every partition file on disk, sorted by id.
    fn on_disk(db: &TransactionsDb) -> Vec<Transaction> {
        let mut rows = TransactionsDb::connect(db.root()).unwrap().into_rows();
        rows.sort_by(|a, b| a.id().cmp(b.id()));
        rows
    }

    fn in_memory(db: &TransactionsDb) -> Vec<Transaction> {
        let mut rows = db.table().clone().into_rows();
        rows.sort_by(|a, b| a.id().cmp(b.id()));
        rows
    }

    #[test]
    fn test_connect_empty_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("missing");
        let table = TransactionsDb::connect(&root).unwrap();
        assert!(table.is_empty());
        assert!(root.is_dir());
    }

    #[test]
    fn test_connect_ignores_loose_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README"), "hello").unwrap();
        let table = TransactionsDb::connect(dir.path()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_connect_malformed_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("2023")).unwrap();
        fs::write(dir.path().join("2023").join("03.pq"), "garbage").unwrap();
        let e = TransactionsDb::connect(dir.path()).unwrap_err();
        assert_eq!(e.error_type(), ErrorType::Storage);
    }

    #[test]
    fn test_disconnect_unsupported() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        let e = db.disconnect().unwrap_err();
        assert_eq!(e.error_type(), ErrorType::Unsupported);
    }

    #[test]
    fn test_insert_scenario() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        let ids = db
            .insert_data(&[store_row("2023-03-15", "Store", 42.50)])
            .unwrap();
        assert_eq!(ids, vec!["t-1".to_string()]);

        let path = db.root().join("2023").join("03.pq");
        let rows = read_partition(&path).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.id(), "t-1");
        assert_eq!(row.date(), ymd(2023, 3, 15));
        assert_eq!(row.payee(), "Store");
        assert_eq!(row.category(), "");
        assert_eq!(row.memo(), "");
        assert_eq!(row.account(), None);
        assert_eq!(row.inflow(), 0.0);
        assert_eq!(row.outflow(), 0.0);
        assert!(!row.reconciled());
        assert_eq!(row.amount(), 42.5);
    }

    #[test]
    fn test_insert_then_get_by_id() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        let raw_row = raw(json!({
            "date": "2023-04-01",
            "payee": "Landlord",
            "amount": "-1,200.00",
            "category": "Rent",
            "account": "Checking",
            "reconciled": true
        }));
        let ids = db.insert_data(&[raw_row]).unwrap();
        let found = db.get_data_by_id(&ids);
        assert_eq!(found.len(), 1);
        let row = &found.rows()[0];
        assert_eq!(row.id(), ids[0]);
        assert_eq!(row.amount(), -1200.0);
        assert_eq!(row.category(), "Rent");
        assert_eq!(row.account(), Some("Checking"));
        assert!(row.reconciled());
    }

    #[test]
    fn test_insert_only_rewrites_touched_partitions() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        db.insert_data(&[store_row("2023-01-05", "A", 1.0)]).unwrap();
        let jan = db.root().join("2023").join("01.pq");
        fs::write(&jan, "sentinel").unwrap();

        db.insert_data(&[store_row("2023-02-05", "B", 2.0)]).unwrap();
        assert_eq!(fs::read_to_string(&jan).unwrap(), "sentinel");
        assert!(db.root().join("2023").join("02.pq").is_file());
    }

    #[test]
    fn test_insert_failure_inserts_nothing() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        let rows = vec![
            store_row("2023-01-05", "A", 1.0),
            raw(json!({ "date": "2023-01-06", "payee": "B", "amount": "many" })),
        ];
        let e = db.insert_data(&rows).unwrap_err();
        assert_eq!(e.error_type(), ErrorType::Coercion);
        assert!(db.table().is_empty());
        assert!(!db.root().join("2023").exists());
    }

    #[test]
    fn test_insert_missing_mandatory() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        let e = db
            .insert_data(&[raw(json!({ "date": "2023-01-05", "amount": 1 }))])
            .unwrap_err();
        assert_eq!(e.error_type(), ErrorType::MissingColumn);
    }

    #[test]
    fn test_ids_are_unique() {
        let dir = TempDir::new().unwrap();
        let ids = ScriptedIds::new(["a", "a", "", "b", "a", "c"]);
        let mut db = TransactionsDb::open_with(dir.path(), Box::new(ids)).unwrap();
        let first = db.insert_data(&[store_row("2023-01-05", "A", 1.0)]).unwrap();
        let rest = db
            .insert_data(&[
                store_row("2023-01-06", "B", 2.0),
                store_row("2023-01-07", "C", 3.0),
            ])
            .unwrap();
        assert_eq!(first, vec!["a"]);
        assert_eq!(rest, vec!["b", "c"]);
        let all: HashSet<&str> = db.table().ids().into_iter().collect();
        assert_eq!(all.len(), db.table().len());
    }

    #[test]
    fn test_id_generation_gives_up() {
        let dir = TempDir::new().unwrap();
        let ids = ScriptedIds::new(std::iter::repeat("same").take(MAX_ID_ATTEMPTS + 1));
        let mut db = TransactionsDb::open_with(dir.path(), Box::new(ids)).unwrap();
        db.insert_data(&[store_row("2023-01-05", "A", 1.0)]).unwrap();
        let e = db
            .insert_data(&[store_row("2023-01-06", "B", 2.0)])
            .unwrap_err();
        assert_eq!(e.error_type(), ErrorType::Internal);
        assert_eq!(db.table().len(), 1);
    }

    #[test]
    fn test_random_ids() {
        let dir = TempDir::new().unwrap();
        let mut db = TransactionsDb::open(dir.path()).unwrap();
        let ids = db
            .insert_data(&[
                store_row("2023-01-05", "A", 1.0),
                store_row("2023-01-05", "A", 1.0),
            ])
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_insert_record() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        let record = Transaction::new("rec-1", ymd(2021, 7, 4), "Fireworks", -80.0);
        db.insert_record(&record).unwrap();
        let rows = read_partition(&db.root().join("2021").join("07.pq")).unwrap();
        assert_eq!(rows, vec![record.clone()]);

        let e = db.insert_record(&record).unwrap_err();
        assert_eq!(e.error_type(), ErrorType::DuplicateId);
        assert_eq!(db.table().len(), 1);
    }

    #[test]
    fn test_delete_scenario() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        db.insert_record(&Transaction::new("X", ymd(2022, 1, 10), "Cafe", -4.5))
            .unwrap();
        db.insert_record(&Transaction::new("Y", ymd(2022, 2, 10), "Cafe", -4.5))
            .unwrap();
        let feb = db.root().join("2022").join("02.pq");
        fs::write(&feb, "untouched").unwrap();

        let removed = db.delete_data(&["X"]).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(db.table().len(), 1);
        assert!(db.get_data_by_id(&["X"]).is_empty());

        let jan = read_partition(&db.root().join("2022").join("01.pq")).unwrap();
        assert!(jan.is_empty());
        assert_eq!(fs::read_to_string(&feb).unwrap(), "untouched");
    }

    #[test]
    fn test_delete_unknown_id_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        let ids = db.insert_data(&[store_row("2023-01-05", "A", 1.0)]).unwrap();
        let e = db.delete_data(&[ids[0].as_str(), "nope"]).unwrap_err();
        assert_eq!(e.error_type(), ErrorType::NotFound);
        assert_eq!(db.table().len(), 1);
    }

    #[test]
    fn test_update_moves_between_partitions() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        let ids = db.insert_data(&[store_row("2023-01-31", "A", 1.0)]).unwrap();
        let updated = db
            .update_data(
                &ids,
                &raw(json!({ "date": "2023-02-01", "memo": "moved", "account": "Savings" })),
            )
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated.rows()[0].memo(), "moved");
        assert_eq!(updated.rows()[0].account(), Some("Savings"));

        let jan = read_partition(&db.root().join("2023").join("01.pq")).unwrap();
        let feb = read_partition(&db.root().join("2023").join("02.pq")).unwrap();
        assert!(jan.is_empty());
        assert_eq!(feb.len(), 1);
        assert_eq!(feb[0].memo(), "moved");
    }

    #[test]
    fn test_update_errors() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        let ids = db.insert_data(&[store_row("2023-01-31", "A", 1.0)]).unwrap();

        let e = db.update_data(&["nope"], &raw(json!({ "memo": "x" }))).unwrap_err();
        assert_eq!(e.error_type(), ErrorType::NotFound);

        let e = db.update_data(&ids, &raw(json!({ "id": "new" }))).unwrap_err();
        assert_eq!(e.error_type(), ErrorType::UnknownColumn);

        let e = db.update_data(&ids, &raw(json!({ "amount": null }))).unwrap_err();
        assert_eq!(e.error_type(), ErrorType::MissingColumn);

        assert_eq!(db.table().rows()[0].memo(), "");
    }

    #[test]
    fn test_filters() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        db.insert_data(&[
            raw(json!({ "date": "2023-01-01", "payee": "1", "amount": 1, "account": "A", "category": "C" })),
            raw(json!({ "date": "2023-01-02", "payee": "2", "amount": 2, "account": "A", "category": "D" })),
            raw(json!({ "date": "2023-01-03", "payee": "3", "amount": 3, "account": "B", "category": "C" })),
            raw(json!({ "date": "2023-01-04", "payee": "4", "amount": 4 })),
        ])
        .unwrap();

        let both = db
            .get_data_by_col_val(&raw(json!({ "account": "A", "category": "C" })))
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both.rows()[0].payee(), "1");

        assert_eq!(db.get_data_by_col_val(&RawRow::new()).unwrap().len(), 4);

        let no_account = db
            .get_data_by_col_val(&raw(json!({ "account": null })))
            .unwrap();
        assert_eq!(no_account.len(), 1);
        assert_eq!(no_account.rows()[0].get(Column::Payee), Value::from("4"));

        let by_date = db
            .get_data_by_col_val(&raw(json!({ "date": "2023-01-03" })))
            .unwrap();
        assert_eq!(by_date.len(), 1);

        let e = db
            .get_data_by_col_val(&raw(json!({ "colour": "red" })))
            .unwrap_err();
        assert_eq!(e.error_type(), ErrorType::UnknownColumn);
    }

    #[test]
    fn test_partitions_match_table_after_mutations() {
        let dir = TempDir::new().unwrap();
        let year = dir.path().join("db").join("2023");
        let legacy = Transaction::new("legacy", ymd(2023, 1, 20), "L", 6.0);
        write_partition(&year.join("1.pq"), [&legacy]).unwrap();
        fs::write(year.join("01.pq.bak"), "stale copy").unwrap();
        fs::write(year.join("notes.txt"), "not a partition").unwrap();
        let mut db = open(&dir);
        assert_eq!(db.table().len(), 1);

        let ids = db
            .insert_data(&[
                store_row("2022-12-31", "A", 1.0),
                store_row("2023-01-01", "B", 2.0),
                store_row("2023-01-15", "C", 3.0),
                store_row("2023-03-01", "D", 4.0),
            ])
            .unwrap();
        db.delete_data(&[ids[1].as_str()]).unwrap();
        db.update_data(&[ids[3].as_str()], &raw(json!({ "date": "2022-12-01" })))
            .unwrap();
        db.insert_record(&Transaction::new("r", ymd(2023, 3, 9), "E", 5.0))
            .unwrap();

        assert_eq!(on_disk(&db), in_memory(&db));
        assert_eq!(db.table().len(), 5);
        assert!(!year.join("1.pq").exists());
        assert!(year.join("01.pq").is_file());
        assert!(year.join("01.pq.bak").is_file());

        let reopened = TransactionsDb::open(db.root()).unwrap();
        assert_eq!(in_memory(&reopened), in_memory(&db));
    }

    #[test]
    fn test_save_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        db.insert_data(&[
            store_row("2023-05-01", "A", 1.0),
            store_row("2023-05-02", "B", 2.0),
        ])
        .unwrap();
        let key = PartitionKey::new(2023, 5).unwrap();
        let path = key.path(db.root());

        db.save_db([key]).unwrap();
        let first = fs::read(&path).unwrap();
        let first_rows = read_partition(&path).unwrap();
        db.save_db([key]).unwrap();
        assert_eq!(read_partition(&path).unwrap(), first_rows);
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_save_empty_partition() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        let key = PartitionKey::new(1999, 12).unwrap();
        db.save_db([key]).unwrap();
        assert!(read_partition(&key.path(db.root())).unwrap().is_empty());
    }

    #[test]
    fn test_months_from_ids() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        let ids = db
            .insert_data(&[
                store_row("2023-01-01", "A", 1.0),
                store_row("2023-01-20", "B", 2.0),
                store_row("2024-06-01", "C", 3.0),
            ])
            .unwrap();
        let months = db.months_from_ids(&ids).unwrap();
        assert_eq!(
            months.into_iter().collect::<Vec<_>>(),
            vec![
                PartitionKey::new(2023, 1).unwrap(),
                PartitionKey::new(2024, 6).unwrap()
            ]
        );
        let e = db.months_from_ids(&["missing"]).unwrap_err();
        assert_eq!(e.error_type(), ErrorType::NotFound);
    }

    #[test]
    fn test_loads_legacy_month_names() {
        let dir = TempDir::new().unwrap();
        let rows = vec![Transaction::new("old", ymd(2020, 3, 2), "Legacy", 9.0)];
        write_partition(&dir.path().join("2020").join("3.pq"), &rows).unwrap();
        let db = TransactionsDb::open(dir.path()).unwrap();
        assert_eq!(db.table().rows(), rows.as_slice());
    }

    #[test]
    fn test_legacy_month_file_replaced_on_save() {
        let dir = TempDir::new().unwrap();
        let year = dir.path().join("db").join("2020");
        let rows = vec![Transaction::new("old", ymd(2020, 3, 2), "Legacy", 9.0)];
        write_partition(&year.join("3.pq"), &rows).unwrap();

        let mut db = open(&dir);
        assert_eq!(db.delete_data(&["old"]).unwrap(), 1);
        assert!(!year.join("3.pq").exists());
        assert!(year.join("03.pq").is_file());
        assert!(TransactionsDb::open(db.root()).unwrap().table().is_empty());

        db.insert_data(&[store_row("2020-03-05", "New", 1.0)]).unwrap();
        let reopened = TransactionsDb::open(db.root()).unwrap();
        assert_eq!(reopened.table().len(), 1);
        assert_eq!(in_memory(&reopened), in_memory(&db));
    }

    #[test]
    fn test_connect_skips_files_that_are_not_partitions() {
        let dir = TempDir::new().unwrap();
        let year = dir.path().join("2020");
        let rows = vec![Transaction::new("a", ymd(2020, 3, 2), "A", 1.0)];
        write_partition(&year.join("03.pq"), &rows).unwrap();
        write_partition(&year.join("03.pq.bak"), &rows).unwrap();
        write_partition(&year.join("13.pq"), &rows).unwrap();
        fs::write(year.join("notes.txt"), "hello").unwrap();

        let table = TransactionsDb::connect(dir.path()).unwrap();
        assert_eq!(table.rows(), rows.as_slice());
    }

    #[test]
    fn test_insert_unstorable_date_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        let e = db
            .insert_data(&[
                store_row("2023-01-05", "A", 1.0),
                store_row("2300-01-01", "B", 2.0),
            ])
            .unwrap_err();
        assert_eq!(e.error_type(), ErrorType::Coercion);
        assert!(db.table().is_empty());
        assert!(on_disk(&db).is_empty());

        let e = db
            .insert_record(&Transaction::new("far", ymd(2300, 1, 1), "C", 3.0))
            .unwrap_err();
        assert_eq!(e.error_type(), ErrorType::Coercion);
        assert!(db.table().is_empty());
        assert!(on_disk(&db).is_empty());
    }

    #[test]
    fn test_update_unstorable_date_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut db = open(&dir);
        let ids = db.insert_data(&[store_row("2023-01-05", "A", 1.0)]).unwrap();
        let before = in_memory(&db);

        let e = db
            .update_data(&ids, &raw(json!({ "date": "2300-01-01", "memo": "later" })))
            .unwrap_err();
        assert_eq!(e.error_type(), ErrorType::Coercion);
        assert_eq!(in_memory(&db), before);
        assert_eq!(on_disk(&db), before);
    }
}
