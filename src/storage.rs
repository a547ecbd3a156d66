//! Storage protocol registry.
//!
//! The set of storage URI schemes a model server's storage initializer knows
//! how to download from. The webhook uses it as the default allow-list for
//! `spec.model.storageUri`.

use std::fmt;

/// Separator used when rendering the allow-list into error messages
pub const PROTOCOL_SEPARATOR: &str = ", ";

/// A supported storage backend, identified by its URI prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Google Cloud Storage
    Gcs,
    /// Amazon S3 and S3-compatible object stores
    S3,
    /// PersistentVolumeClaim mounted into the model server
    Pvc,
    /// Local filesystem path inside the container
    File,
    /// Plain HTTPS download
    Https,
    /// Plain HTTP download
    Http,
}

impl Protocol {
    /// All protocols in registry order
    pub const ALL: [Protocol; 6] = [
        Protocol::Gcs,
        Protocol::S3,
        Protocol::Pvc,
        Protocol::File,
        Protocol::Https,
        Protocol::Http,
    ];

    /// The URI prefix for this protocol (scheme including `://`)
    pub fn prefix(self) -> &'static str {
        match self {
            Protocol::Gcs => "gs://",
            Protocol::S3 => "s3://",
            Protocol::Pvc => "pvc://",
            Protocol::File => "file://",
            Protocol::Https => "https://",
            Protocol::Http => "http://",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Every registered protocol prefix, in registry order.
pub fn all_protocols() -> Vec<String> {
    Protocol::ALL.iter().map(|p| p.prefix().to_string()).collect()
}
