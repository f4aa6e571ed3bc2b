//! Deduplicated Gradle build handles for a workspace.
//!
//! Many projects in a workspace usually belong to few builds (all subprojects of a multi-project
//! build share one root). [`WorkspaceBuildRegistry`] collapses them: it asks an
//! [`IdentityResolver`](keel_build_model::IdentityResolver) for each project's
//! [`BuildDescriptor`](keel_build_model::BuildDescriptor) and hands out one [`GradleBuild`] per
//! distinct descriptor.

mod build;
mod registry;

pub use build::{GradleBuild, GradleBuilds};
pub use registry::WorkspaceBuildRegistry;

pub use keel_build_model::{
    BuildDescriptor, EnumerationError, GradleDistribution, IdentityError, IdentityResolver,
    MemberEnumerator, OutputPreferences, WorkspaceMember,
};

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Enumeration(#[from] EnumerationError),
}
