mod credential_store;
mod error;
mod session;

pub use credential_store::FileCredentialStore;
pub use error::AuthError;
pub use session::AuthData;
