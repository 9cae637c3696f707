//! SQLite storage implementation for connected accounts.

mod model;
mod repository;

pub use model::ConnectedAccountDB;
pub use repository::ConnectedAccountRepository;
