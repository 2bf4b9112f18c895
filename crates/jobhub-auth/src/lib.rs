//! # jobhub-auth
//!
//! Authentication of the completion callback surface.
//!
//! ## Modules
//!
//! - `webhook` — canonical body serialization, HMAC-SHA256 signing, and the
//!   authenticator that checks signature and timestamp freshness

pub mod webhook;

pub use webhook::{
    SIGNATURE_HEADER, TIMESTAMP_HEADER, WebhookAuthError, WebhookAuthenticator, WebhookSigner,
};
