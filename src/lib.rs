pub mod core;
pub mod orchestration;
pub mod security;
pub mod transport;

pub use self::core::*;
pub use orchestration::DoiPublisher;
pub use security::SecureTokenManager;
pub use transport::HttpTransport;
