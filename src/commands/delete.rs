//! Delete command handler.

use crate::args::DeleteArgs;
use crate::commands::{plural, Out};
use crate::{Config, Result};

/// Deletes one or more transactions by id.
///
/// If any id is not found nothing is deleted. The month files that held the deleted transactions
/// are rewritten, possibly with zero rows.
pub async fn delete_transactions(config: Config, args: DeleteArgs) -> Result<Out<Vec<String>>> {
    let mut db = config.open_db()?;
    let count = db.delete_data(args.ids())?;
    let message = format!("Deleted {}", plural(count, "transaction"));
    Ok(Out::new(message, args.ids().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use crate::ErrorType;

    #[tokio::test]
    async fn test_delete_transactions_success() {
        let env = TestEnv::new().await;
        let ids = env.insert_test_transactions(&[
            ("2022-01-10", "Cafe", -4.5),
            ("2022-02-10", "Cafe", -4.5),
        ]);

        let args = DeleteArgs::new(vec![ids[0].clone()]);
        let out = delete_transactions(env.config(), args).await.unwrap();
        assert!(out.message().contains("Deleted 1 transaction"));
        assert_eq!(out.structure().unwrap(), &vec![ids[0].clone()]);

        let db = env.db();
        assert!(db.get_data_by_id(&ids[..1]).is_empty());
        assert_eq!(db.table().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_transactions_not_found_error() {
        let env = TestEnv::new().await;
        let ids = env.insert_test_transactions(&[("2022-01-10", "Cafe", -4.5)]);

        let args = DeleteArgs::new(vec![ids[0].clone(), "nonexistent-id".into()]);
        let e = delete_transactions(env.config(), args).await.unwrap_err();
        assert_eq!(e.error_type(), ErrorType::NotFound);
        assert!(e.to_string().contains("Transaction not found"));
        assert_eq!(env.db().table().len(), 1);
    }
}
