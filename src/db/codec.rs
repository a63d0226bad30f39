//! Encoding and decoding of a single partition file.
//!
//! A partition is one Parquet file whose columns follow the schema registry order. Categorical
//! columns are dictionary encoded. Reading is lenient about physical types: any string or
//! dictionary column, any timestamp unit or date, and any numeric type is cast to the canonical
//! type, so files written by other tools can be loaded as long as the column names match.

use crate::error::{ErrorType, IntoResult};
use crate::model::schema::SCHEMA;
use crate::model::{Column, ColumnType, Transaction};
use crate::Result;
use anyhow::{anyhow, bail, Context};
use arrow::array::{
    Array, ArrayRef, BooleanArray, BooleanBuilder, Float64Array, Float64Builder, StringArray,
    StringBuilder, StringDictionaryBuilder, TimestampNanosecondArray, TimestampNanosecondBuilder,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Int32Type, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::trace;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

fn writer_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .set_dictionary_enabled(true)
        .build()
}

/// Whether `date` fits the nanosecond timestamps that partition files store, roughly the years
/// 1677 to 2262.
pub(crate) fn is_storable(date: &NaiveDateTime) -> bool {
    date.and_utc().timestamp_nanos_opt().is_some()
}

/// The storage type of each column as written to disk.
fn storage_type(column_type: ColumnType) -> DataType {
    match column_type {
        ColumnType::Text => DataType::Utf8,
        ColumnType::Categorical => {
            DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
        }
        ColumnType::Date => DataType::Timestamp(TimeUnit::Nanosecond, None),
        ColumnType::Number => DataType::Float64,
        ColumnType::Bool => DataType::Boolean,
    }
}

/// The type a column is cast to when reading, before values are extracted.
fn read_type(column_type: ColumnType) -> DataType {
    match column_type {
        ColumnType::Categorical => DataType::Utf8,
        other => storage_type(other),
    }
}

/// The Arrow schema of a partition file.
fn partition_schema() -> SchemaRef {
    Arc::new(Schema::new(
        SCHEMA
            .iter()
            .map(|s| {
                Field::new(
                    s.column.name(),
                    storage_type(s.column_type),
                    s.column == Column::Account,
                )
            })
            .collect::<Vec<_>>(),
    ))
}

/// Writes `rows` to `path`, replacing any existing file. An empty slice still produces a valid
/// file that carries the schema and zero rows.
pub fn write_partition<'a>(
    path: &Path,
    rows: impl IntoIterator<Item = &'a Transaction>,
) -> Result<()> {
    let rows: Vec<&Transaction> = rows.into_iter().collect();
    write_inner(path, &rows)
        .with_context(|| format!("Unable to write partition file {}", path.display()))
        .pub_result(ErrorType::Storage)
}

/// Reads every row of the partition file at `path`.
pub fn read_partition(path: &Path) -> Result<Vec<Transaction>> {
    read_inner(path)
        .with_context(|| format!("Unable to read partition file {}", path.display()))
        .pub_result(ErrorType::Storage)
}

fn write_inner(path: &Path, rows: &[&Transaction]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Unable to create directory {}", parent.display()))?;
    }
    let schema = partition_schema();
    let batch = to_batch(schema.clone(), rows)?;
    let file = fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(writer_props()))?;
    writer.write(&batch)?;
    writer.close()?;
    trace!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn to_batch(schema: SchemaRef, rows: &[&Transaction]) -> anyhow::Result<RecordBatch> {
    let columns = SCHEMA
        .iter()
        .map(|s| build_column(s.column, rows))
        .collect::<anyhow::Result<Vec<ArrayRef>>>()?;
    Ok(RecordBatch::try_new(schema, columns)?)
}

fn build_column(column: Column, rows: &[&Transaction]) -> anyhow::Result<ArrayRef> {
    let text = |f: fn(&Transaction) -> &str| -> ArrayRef {
        let mut b = StringBuilder::new();
        for r in rows.iter().copied() {
            b.append_value(f(r));
        }
        Arc::new(b.finish())
    };
    let number = |f: fn(&Transaction) -> f64| -> ArrayRef {
        let mut b = Float64Builder::with_capacity(rows.len());
        for r in rows.iter().copied() {
            b.append_value(f(r));
        }
        Arc::new(b.finish())
    };

    let array: ArrayRef = match column {
        Column::Id => text(|t| t.id()),
        Column::Payee => text(|t| t.payee()),
        Column::Memo => text(|t| t.memo()),
        Column::Date => {
            let mut b = TimestampNanosecondBuilder::with_capacity(rows.len());
            for r in rows {
                let nanos = r.date().and_utc().timestamp_nanos_opt().ok_or_else(|| {
                    anyhow!("Date {} of '{}' cannot be stored", r.date(), r.id())
                })?;
                b.append_value(nanos);
            }
            Arc::new(b.finish())
        }
        Column::Category => {
            let mut b = StringDictionaryBuilder::<Int32Type>::new();
            for r in rows {
                b.append_value(r.category());
            }
            Arc::new(b.finish())
        }
        Column::Account => {
            let mut b = StringDictionaryBuilder::<Int32Type>::new();
            for r in rows {
                match r.account() {
                    Some(account) => {
                        b.append_value(account);
                    }
                    None => b.append_null(),
                }
            }
            Arc::new(b.finish())
        }
        Column::Inflow => number(|t| t.inflow()),
        Column::Outflow => number(|t| t.outflow()),
        Column::Amount => number(|t| t.amount()),
        Column::Reconciled => {
            let mut b = BooleanBuilder::with_capacity(rows.len());
            for r in rows {
                b.append_value(r.reconciled());
            }
            Arc::new(b.finish())
        }
    };
    Ok(array)
}

fn read_inner(path: &Path) -> anyhow::Result<Vec<Transaction>> {
    let file = fs::File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        rows.extend(from_batch(&batch)?);
    }
    trace!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// The canonically typed columns of one record batch.
struct Columns {
    id: StringArray,
    date: TimestampNanosecondArray,
    payee: StringArray,
    category: StringArray,
    memo: StringArray,
    account: StringArray,
    inflow: Float64Array,
    outflow: Float64Array,
    reconciled: BooleanArray,
    amount: Float64Array,
}

fn from_batch(batch: &RecordBatch) -> anyhow::Result<Vec<Transaction>> {
    let c = Columns {
        id: typed(batch, Column::Id)?,
        date: typed(batch, Column::Date)?,
        payee: typed(batch, Column::Payee)?,
        category: typed(batch, Column::Category)?,
        memo: typed(batch, Column::Memo)?,
        account: typed(batch, Column::Account)?,
        inflow: typed(batch, Column::Inflow)?,
        outflow: typed(batch, Column::Outflow)?,
        reconciled: typed(batch, Column::Reconciled)?,
        amount: typed(batch, Column::Amount)?,
    };

    let mut rows = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        if c.id.is_null(i) {
            bail!("Row {i} has no id");
        }
        let id = c.id.value(i);
        if c.date.is_null(i) {
            bail!("Row '{id}' has no date");
        }
        if c.amount.is_null(i) {
            bail!("Row '{id}' has no amount");
        }
        let text = |a: &StringArray| a.is_valid(i).then(|| a.value(i).to_string());
        let number = |a: &Float64Array| if a.is_valid(i) { a.value(i) } else { 0.0 };

        rows.push(Transaction {
            id: id.to_string(),
            date: from_nanos(c.date.value(i))
                .with_context(|| format!("Row '{id}' has an invalid date"))?,
            payee: text(&c.payee).unwrap_or_default(),
            category: text(&c.category).unwrap_or_default(),
            memo: text(&c.memo).unwrap_or_default(),
            account: text(&c.account),
            inflow: number(&c.inflow),
            outflow: number(&c.outflow),
            reconciled: c.reconciled.is_valid(i) && c.reconciled.value(i),
            amount: c.amount.value(i),
        });
    }
    Ok(rows)
}

/// Finds `column` in `batch`, casts it to its canonical read type and downcasts it.
fn typed<A>(batch: &RecordBatch, column: Column) -> anyhow::Result<A>
where
    A: Array + Clone + 'static,
{
    let array = batch
        .column_by_name(column.name())
        .or_else(|| match column {
            Column::Category => batch.column_by_name("cat"),
            _ => None,
        })
        .with_context(|| format!("Column '{column}' is missing"))?;
    let target = read_type(column.column_type());
    let cast_array = cast(array, &target).with_context(|| {
        format!(
            "Column '{column}' has type {} which cannot be read as {target}",
            array.data_type()
        )
    })?;
    cast_array
        .as_any()
        .downcast_ref::<A>()
        .cloned()
        .with_context(|| format!("Column '{column}' did not cast to {target}"))
}

fn from_nanos(nanos: i64) -> anyhow::Result<NaiveDateTime> {
    let secs = nanos.div_euclid(NANOS_PER_SECOND);
    let subsec = nanos.rem_euclid(NANOS_PER_SECOND) as u32;
    DateTime::from_timestamp(secs, subsec)
        .map(|dt| dt.naive_utc())
        .with_context(|| format!("Timestamp {nanos} is out of range"))
}
