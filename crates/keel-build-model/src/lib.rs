//! Shared build identity types used across Keel crates.
//!
//! A [`BuildDescriptor`] is the deduplication key for builds: projects whose descriptors compare
//! equal belong to the same build. The collaborator traits here ([`IdentityResolver`],
//! [`MemberEnumerator`]) are how the workspace registry learns about projects without knowing
//! where that information is stored.

mod model;

pub use model::*;

use std::path::PathBuf;

/// A build-enabled project whose persisted settings cannot be turned into a descriptor.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: missing required setting `{key}`")]
    MissingSetting { path: PathBuf, key: &'static str },

    #[error("{path}: invalid value `{value}` for `{key}`: {reason}")]
    InvalidSetting {
        path: PathBuf,
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid build descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("project {member} is build-enabled but has no build identity")]
    NoIdentity { member: String },
}

/// Workspace metadata itself could not be read, so no per-project answer is possible.
#[derive(Debug, thiserror::Error)]
pub enum EnumerationError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse XML in {path}: {message}")]
    Xml { path: PathBuf, message: String },

    #[error("{0}")]
    Message(String),
}

impl EnumerationError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Answers the two questions the registry asks about a project.
pub trait IdentityResolver: Send + Sync + std::fmt::Debug {
    /// Whether `member` participates in a build at all.
    ///
    /// Must be free of side effects; the registry may call it repeatedly.
    fn is_build_enabled(&self, member: &WorkspaceMember) -> Result<bool, EnumerationError>;

    /// The descriptor of the build `member` belongs to.
    ///
    /// `Ok(None)` means the member has no identity yet (for example settings that were not
    /// written). Malformed settings are an error.
    fn descriptor_for(
        &self,
        member: &WorkspaceMember,
    ) -> Result<Option<BuildDescriptor>, IdentityError>;
}

/// Lists every project currently in the workspace.
pub trait MemberEnumerator: Send + Sync + std::fmt::Debug {
    fn all_members(&self) -> Result<Vec<WorkspaceMember>, EnumerationError>;
}
