use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory and:
/// - Creates an initial `config.json` file
/// - Creates the empty transactions store directory
///
/// # Arguments
/// - `findash_home` - The directory that will be the root of data directory, e.g. `$HOME/findash`
/// - `trans_db_path` - Where to keep the store, relative to `findash_home` or absolute.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(findash_home: &Path, trans_db_path: Option<&Path>) -> Result<Out<()>> {
    let config = Config::create(findash_home, trans_db_path.map(Path::to_path_buf))
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the findash directory and config, transactions are stored in {}",
        config.trans_db_path().display()
    )
    .into())
}
