//! Connected account repository trait.

use async_trait::async_trait;

use super::connected_accounts_model::ConnectedAccount;
use crate::errors::Result;

/// Persistence contract for connected accounts.
///
/// Every read returns the account already normalized against the current time
/// (see [`ConnectedAccount::normalize`]), and every write normalizes before
/// persisting, so an expired credential is never stored as connected.
#[async_trait]
pub trait ConnectedAccountRepositoryTrait: Send + Sync {
    fn get_by_user(&self, user_id: &str) -> Result<Option<ConnectedAccount>>;

    fn get_by_remote_id(&self, remote_account_id: &str) -> Result<Option<ConnectedAccount>>;

    /// Inserts a new account.
    ///
    /// A second account for the same user or remote id fails with
    /// `DatabaseError::UniqueViolation`.
    async fn create(&self, account: ConnectedAccount) -> Result<ConnectedAccount>;

    /// Compare-and-swap save keyed by `remote_account_id` and `version`.
    ///
    /// Fails with `DatabaseError::WriteConflict` when the stored version moved
    /// since `account` was loaded. Returns the account with its new version.
    async fn save(&self, account: ConnectedAccount) -> Result<ConnectedAccount>;

    /// Replaces whatever account the user has with `account` in one write.
    ///
    /// The previous row is removed only if the insert succeeds. A remote id
    /// already linked to another user fails with `DatabaseError::UniqueViolation`.
    async fn replace_for_user(&self, account: ConnectedAccount) -> Result<ConnectedAccount>;

    /// Removes the user's account. Returns the number of deleted rows.
    async fn delete_by_user(&self, user_id: &str) -> Result<usize>;
}
