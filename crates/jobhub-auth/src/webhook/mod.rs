//! Completion webhook authentication.

pub mod authenticator;
pub mod error;
pub mod signature;

pub use authenticator::WebhookAuthenticator;
pub use error::WebhookAuthError;
pub use signature::{SIGNATURE_HEADER, SIGNATURE_PREFIX, TIMESTAMP_HEADER, WebhookSigner};
