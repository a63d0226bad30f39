//! Read-only commands.

use crate::args::{FindArgs, GetArgs};
use crate::commands::{assignments_to_raw, plural, Out};
use crate::model::Table;
use crate::{Config, Result};

/// Looks transactions up by id. Ids that do not exist are skipped.
pub async fn get_transactions(config: Config, args: GetArgs) -> Result<Out<Table>> {
    let db = config.open_db()?;
    let table = db.get_data_by_id(args.ids());
    let message = format!(
        "Found {} of {} requested",
        plural(table.len(), "transaction"),
        args.ids().len()
    );
    Ok(Out::new(message, table))
}

/// Returns the transactions matching every `column=value` filter. Without filters every
/// transaction is returned.
pub async fn find_transactions(config: Config, args: FindArgs) -> Result<Out<Table>> {
    let db = config.open_db()?;
    let table = db.get_data_by_col_val(&assignments_to_raw(args.filters()))?;
    let message = format!("Found {}", plural(table.len(), "transaction"));
    Ok(Out::new(message, table))
}
