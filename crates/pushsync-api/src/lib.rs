// pushsync-api: Async clients for the push topic registry and device-token service

pub mod auth;
pub mod error;
pub mod models;
pub mod registry;
pub mod token;
pub mod transport;

pub use auth::Credentials;
pub use error::Error;
pub use models::{BatchOperation, PermissionState, TokenResponse};
pub use registry::RegistryClient;
pub use token::TokenClient;
pub use transport::{TlsMode, TransportConfig};
