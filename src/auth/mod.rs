pub mod claims;
pub mod context;
pub mod credentials;

pub use claims::TokenClaims;
pub use context::SessionContext;
pub use credentials::{CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore};
