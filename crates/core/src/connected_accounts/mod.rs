//! Connected accounts - the Credential Store and embedded ad accounts.

mod connected_accounts_model;
mod connected_accounts_traits;
mod credential;

pub use connected_accounts_model::{
    AdAccountPatch, AdAccountRef, AdAccountStatus, ConnectedAccount, ConnectionStatus,
    ConnectionSummary, NewConnectedAccount,
};
pub use connected_accounts_traits::ConnectedAccountRepositoryTrait;
pub use credential::credential_max_age;

#[cfg(test)]
mod tests;
