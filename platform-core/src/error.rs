//! Error taxonomy shared by the client-less parts of the reconciliation engine.
use thiserror::Error;

/// Errors produced by [`crate::override_engine`], [`crate::renderer`] and [`crate::tree`].
///
/// This mirrors the `Render` / `Validation` / `PatchApply` / `Mask` members of the taxonomy in
/// the design document; the I/O-carrying members (`SchemaLookup`, `DryRun`, `Apply`, `Throttled`)
/// live in `platform-runtime::error` since this crate never touches the network.
#[derive(Debug, Error)]
pub enum Error {
    /// A template failed to expand against its render context.
    #[error("render failed: {0}")]
    Render(String),

    /// An annotation failed syntactic or security validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The `patch` annotation did not parse as RFC 6902, or failed to apply.
    #[error("invalid patch: {0}")]
    PatchApply(String),

    /// `ignore-fields` referenced an invalid RFC 6901 pointer, or masking failed.
    #[error("mask failed: {0}")]
    Mask(String),

    /// The object was rejected for carrying `patch` on a sensitive kind.
    #[error("patch annotation is not permitted on sensitive kind {0}")]
    SensitiveKindPatch(String),
}

/// Convenience alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
