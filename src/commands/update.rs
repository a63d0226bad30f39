//! Update command handler.

use crate::args::UpdateArgs;
use crate::commands::{assignments_to_raw, plural, Out};
use crate::model::Table;
use crate::{Config, Result};

/// Applies the `column=value` changes to every listed transaction and returns the updated rows.
///
/// This operation is all-or-nothing in memory: if any id is not found or any value cannot be
/// converted, nothing is changed. Changing `date` moves a transaction to another month file.
pub async fn update_transactions(config: Config, args: UpdateArgs) -> Result<Out<Table>> {
    let mut db = config.open_db()?;
    let updated = db.update_data(args.ids(), &assignments_to_raw(args.changes()))?;
    let message = format!("Updated {}", plural(updated.len(), "transaction"));
    Ok(Out::new(message, updated))
}
