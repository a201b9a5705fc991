pub mod credential;
pub mod session;
pub mod token;

pub use credential::PostgresCredentialStore;
pub use session::PostgresSessionStore;
pub use token::PostgresTokenRepository;

use crate::account::errors::AccountError;

fn store_error(e: sqlx::Error) -> AccountError {
    AccountError::StoreUnavailable(e.to_string())
}
