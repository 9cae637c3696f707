use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;

use adsync_core::connected_accounts::{ConnectedAccount, ConnectedAccountRepositoryTrait};
use adsync_core::errors::{DatabaseError, Error, Result};

use super::model::ConnectedAccountDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::{with_unique_value, IntoCore};
use crate::schema::connected_accounts;
use crate::schema::connected_accounts::dsl::*;

pub struct ConnectedAccountRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ConnectedAccountRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ConnectedAccountRepository { pool, writer }
    }

    fn load_one<F>(&self, query: F) -> Result<Option<ConnectedAccount>>
    where
        F: FnOnce(&mut SqliteConnection) -> QueryResult<Option<ConnectedAccountDB>>,
    {
        let mut conn = get_connection(&self.pool)?;
        let row = query(&mut conn).into_core()?;
        row.map(|row| {
            let mut account = row.into_domain()?;
            account.normalize(Utc::now());
            Ok(account)
        })
        .transpose()
    }
}

#[async_trait]
impl ConnectedAccountRepositoryTrait for ConnectedAccountRepository {
    fn get_by_user(&self, user: &str) -> Result<Option<ConnectedAccount>> {
        self.load_one(|conn| {
            connected_accounts
                .filter(user_id.eq(user))
                .select(ConnectedAccountDB::as_select())
                .first(conn)
                .optional()
        })
    }

    fn get_by_remote_id(&self, remote_id: &str) -> Result<Option<ConnectedAccount>> {
        self.load_one(|conn| {
            connected_accounts
                .filter(remote_account_id.eq(remote_id))
                .select(ConnectedAccountDB::as_select())
                .first(conn)
                .optional()
        })
    }

    async fn create(&self, mut account: ConnectedAccount) -> Result<ConnectedAccount> {
        account.normalize(Utc::now());
        let row = ConnectedAccountDB::from_domain(&account)?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ConnectedAccount> {
                diesel::insert_into(connected_accounts::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()
                    .map_err(|e| {
                        with_unique_value(
                            e,
                            &[
                                ("user_id", row.user_id.as_str()),
                                ("remote_account_id", row.remote_account_id.as_str()),
                            ],
                        )
                    })?;
                Ok(account)
            })
            .await
    }

    async fn save(&self, mut account: ConnectedAccount) -> Result<ConnectedAccount> {
        account.normalize(Utc::now());
        let expected = account.version;
        account.version = expected + 1;
        let row = ConnectedAccountDB::from_domain(&account)?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ConnectedAccount> {
                let updated = diesel::update(
                    connected_accounts
                        .filter(remote_account_id.eq(&row.remote_account_id))
                        .filter(version.eq(expected)),
                )
                .set(&row)
                .execute(conn)
                .into_core()?;

                if updated == 0 {
                    let exists = connected_accounts
                        .filter(remote_account_id.eq(&row.remote_account_id))
                        .count()
                        .get_result::<i64>(conn)
                        .into_core()?
                        > 0;
                    if !exists {
                        return Err(Error::Database(DatabaseError::NotFound(format!(
                            "connected account {}",
                            row.remote_account_id
                        ))));
                    }
                    debug!(
                        "Version {} of connected account {} is stale",
                        expected, row.remote_account_id
                    );
                    return Err(Error::Database(DatabaseError::WriteConflict(format!(
                        "connected account {} changed since version {}",
                        row.remote_account_id, expected
                    ))));
                }
                Ok(account)
            })
            .await
    }

    async fn replace_for_user(&self, mut account: ConnectedAccount) -> Result<ConnectedAccount> {
        account.normalize(Utc::now());
        let row = ConnectedAccountDB::from_domain(&account)?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ConnectedAccount> {
                let removed = diesel::delete(connected_accounts.filter(user_id.eq(&row.user_id)))
                    .execute(conn)
                    .into_core()?;
                diesel::insert_into(connected_accounts::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()
                    .map_err(|e| {
                        with_unique_value(
                            e,
                            &[
                                ("user_id", row.user_id.as_str()),
                                ("remote_account_id", row.remote_account_id.as_str()),
                            ],
                        )
                    })?;
                debug!(
                    "Replaced {} connected account(s) of {} with {}",
                    removed, row.user_id, row.remote_account_id
                );
                Ok(account)
            })
            .await
    }

    async fn delete_by_user(&self, user: &str) -> Result<usize> {
        let user = user.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(connected_accounts.filter(user_id.eq(user)))
                    .execute(conn)
                    .into_core()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use adsync_core::connected_accounts::{ConnectionStatus, NewConnectedAccount};
    use chrono::Duration;
    use tempfile::tempdir;

    async fn create_test_repository() -> (ConnectedAccountRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        (ConnectedAccountRepository::new(pool, writer), temp_dir)
    }

    fn new_account(user: &str, remote: &str) -> ConnectedAccount {
        ConnectedAccount::new(
            NewConnectedAccount {
                user_id: user.to_string(),
                remote_account_id: remote.to_string(),
                username: " shop ".to_string(),
                access_credential: "access-1".to_string(),
                refresh_credential: Some("refresh-1".to_string()),
            },
            Utc::now(),
        )
        .expect("valid account")
    }

    #[tokio::test]
    async fn test_create_and_load_keeps_credentials() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.create(new_account("user-1", "remote-1")).await.unwrap();

        let loaded = repo.get_by_user("user-1").unwrap().expect("account");
        assert_eq!(loaded.access_credential, "access-1");
        assert_eq!(loaded.refresh_credential.as_deref(), Some("refresh-1"));
        assert_eq!(loaded.username, "shop");
        assert_eq!(loaded.version, 0);
        assert!(repo.get_by_remote_id("remote-1").unwrap().is_some());
        assert!(repo.get_by_user("user-2").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_account_for_user_is_a_unique_violation() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.create(new_account("user-1", "remote-1")).await.unwrap();

        let err = repo
            .create(new_account("user-1", "remote-2"))
            .await
            .unwrap_err();
        match err {
            Error::Database(DatabaseError::UniqueViolation { field, value }) => {
                assert_eq!(field, "user_id");
                assert_eq!(value.as_deref(), Some("user-1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_save_rejects_stale_version() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.create(new_account("user-1", "remote-1")).await.unwrap();

        let first = repo.get_by_user("user-1").unwrap().unwrap();
        let second = first.clone();

        let saved = repo.save(first).await.unwrap();
        assert_eq!(saved.version, 1);

        let err = repo.save(second).await.unwrap_err();
        assert!(err.is_write_conflict());
        assert_eq!(repo.get_by_user("user-1").unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_expired_credential_is_never_stored_as_connected() {
        let (repo, _temp_dir) = create_test_repository().await;
        let mut account = new_account("user-1", "remote-1");
        account.last_credential_refresh = Utc::now() - Duration::days(31);
        repo.create(account).await.unwrap();

        let mut conn = get_connection(&repo.pool).unwrap();
        let stored: String = connected_accounts
            .filter(user_id.eq("user-1"))
            .select(connection_status)
            .first(&mut conn)
            .unwrap();
        assert_eq!(stored, "disconnected");

        let loaded = repo.get_by_user("user-1").unwrap().unwrap();
        assert_eq!(loaded.connection_status, ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_load_normalizes_credentials_that_expired_at_rest() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.create(new_account("user-1", "remote-1")).await.unwrap();

        let old = crate::utils::encode_timestamp(Utc::now() - Duration::days(40));
        let mut conn = get_connection(&repo.pool).unwrap();
        diesel::update(connected_accounts.filter(user_id.eq("user-1")))
            .set(last_credential_refresh.eq(old))
            .execute(&mut conn)
            .unwrap();

        let loaded = repo.get_by_user("user-1").unwrap().unwrap();
        assert_eq!(loaded.connection_status, ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_replace_for_user_swaps_remote_account() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.create(new_account("user-1", "remote-1")).await.unwrap();

        let replaced = repo
            .replace_for_user(new_account("user-1", "remote-2"))
            .await
            .unwrap();

        assert_eq!(replaced.remote_account_id, "remote-2");
        let loaded = repo.get_by_user("user-1").unwrap().unwrap();
        assert_eq!(loaded.remote_account_id, "remote-2");
        assert!(repo.get_by_remote_id("remote-1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_previous_account() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.create(new_account("user-1", "remote-1")).await.unwrap();
        repo.create(new_account("user-2", "remote-2")).await.unwrap();

        let err = repo
            .replace_for_user(new_account("user-1", "remote-2"))
            .await
            .unwrap_err();

        match err {
            Error::Database(DatabaseError::UniqueViolation { field, .. }) => {
                assert_eq!(field, "remote_account_id");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let kept = repo.get_by_user("user-1").unwrap().unwrap();
        assert_eq!(kept.remote_account_id, "remote-1");
    }

    #[tokio::test]
    async fn test_delete_by_user() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.create(new_account("user-1", "remote-1")).await.unwrap();

        assert_eq!(repo.delete_by_user("user-1").await.unwrap(), 1);
        assert_eq!(repo.delete_by_user("user-1").await.unwrap(), 0);
        assert!(repo.get_by_user("user-1").unwrap().is_none());
    }
}
