use crate::args::SaveArgs;
use crate::commands::{plural, Out};
use crate::db::PartitionKey;
use crate::{Config, Result};

/// Rewrites the requested month files from the loaded data. A month without transactions is
/// written as an empty file. With `--all`, every month that holds a transaction is rewritten.
pub async fn save(config: Config, args: SaveArgs) -> Result<Out<Vec<PartitionKey>>> {
    let db = config.open_db()?;
    let months: Vec<PartitionKey> = if args.all() {
        db.partitions().into_iter().collect()
    } else {
        args.months().to_vec()
    };
    db.save_db(months.iter().copied())?;
    let message = format!("Saved {}", plural(months.len(), "month"));
    Ok(Out::new(message, months))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::read_partition;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_save_all() {
        let env = TestEnv::new().await;
        env.insert_test_transactions(&[
            ("2023-01-02", "Grocer", -20.0),
            ("2023-02-03", "Cafe", -4.5),
        ]);
        let root = env.config().trans_db_path();

        let out = save(env.config(), SaveArgs::new(Vec::new(), true))
            .await
            .unwrap();
        assert_eq!(out.message(), "Saved 2 months");
        assert_eq!(
            out.structure().unwrap(),
            &vec![
                PartitionKey::new(2023, 1).unwrap(),
                PartitionKey::new(2023, 2).unwrap()
            ]
        );
        assert_eq!(read_partition(&root.join("2023").join("02.pq")).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_empty_month() {
        let env = TestEnv::new().await;
        let key = PartitionKey::new(2020, 6).unwrap();
        let out = save(env.config(), SaveArgs::new(vec![key], false))
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap(), &vec![key]);
        let path = key.path(&env.config().trans_db_path());
        assert!(read_partition(&path).unwrap().is_empty());
    }
}
