//! Clients for the external data-management platform.
//!
//! All collaborators are opaque HTTP endpoints addressed by configured
//! base URLs ([`PlatformConfig`]):
//!
//! - [`transfer`] — file download and transactional upload (behind the
//!   [`FileTransfer`] trait so handlers can be tested without a network).
//! - [`policy`] — metadata validation, consulted before every upload.
//! - [`subscriptions`] — registration of event-match subscriptions with
//!   the notification service.
//!
//! None of these clients retry: any failure propagates to the caller and
//! is recorded on the task row by the runner.

pub mod config;
pub mod policy;
pub mod subscriptions;
pub mod transfer;

pub use config::{AuthMode, PlatformConfig};
pub use policy::PolicyClient;
pub use subscriptions::SubscriptionClient;
pub use transfer::{FileTransfer, HttpTransfer, UploadFile};

use dispatchd_core::predicate::PredicateError;

/// Error type shared by the platform clients.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote service returned a non-2xx status code.
    #[error("{url} returned HTTP {status}")]
    HttpStatus { status: u16, url: String },

    /// The policy service rejected the proposed upload metadata.
    #[error("policy validation rejected upload: {0}")]
    PolicyRejected(String),

    /// A subscription predicate failed to compile.
    #[error("invalid subscription predicate: {0}")]
    Predicate(#[from] PredicateError),

    /// Reading or writing a local file failed.
    #[error("file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The remote service answered 2xx but with an unusable body.
    #[error("unexpected response from {url}: {detail}")]
    InvalidResponse { url: String, detail: String },
}
