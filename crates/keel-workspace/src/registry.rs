use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use keel_build_model::{
    BuildDescriptor, EnumerationError, IdentityError, IdentityResolver, MemberEnumerator,
    WorkspaceMember,
};
use keel_project::{FsWorkspace, ProjectError};

use crate::{GradleBuild, GradleBuilds, WorkspaceError};

/// Maps workspace projects to the Gradle builds they belong to.
///
/// The registry keeps no state of its own: every call asks the collaborators afresh, so results
/// follow the workspace as projects come and go. Builds are deduplicated by descriptor equality.
#[derive(Debug, Clone)]
pub struct WorkspaceBuildRegistry {
    resolver: Arc<dyn IdentityResolver>,
    members: Arc<dyn MemberEnumerator>,
}

impl WorkspaceBuildRegistry {
    pub fn new(resolver: Arc<dyn IdentityResolver>, members: Arc<dyn MemberEnumerator>) -> Self {
        Self { resolver, members }
    }

    /// Registry over the projects found on disk below `root`, using its `keel.toml` defaults.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let workspace = FsWorkspace::open(root)?;
        Ok(Self::for_workspace(&workspace))
    }

    pub fn for_workspace(workspace: &FsWorkspace) -> Self {
        Self::new(
            Arc::new(workspace.identity_resolver()),
            Arc::new(workspace.member_enumerator()),
        )
    }

    /// The build `member` belongs to, or `None` when it is not part of a Gradle build.
    ///
    /// Unlike [`Self::resolve_builds`], a build-enabled project whose identity cannot be
    /// resolved is an error here.
    pub fn resolve_build(
        &self,
        member: &WorkspaceMember,
    ) -> Result<Option<GradleBuild>, WorkspaceError> {
        if !self.resolver.is_build_enabled(member)? {
            return Ok(None);
        }

        let descriptor = self
            .resolver
            .descriptor_for(member)?
            .ok_or_else(|| IdentityError::NoIdentity {
                member: member.to_string(),
            })?;
        Ok(Some(GradleBuild::new(descriptor)?))
    }

    /// Handle for a descriptor obtained elsewhere. No enablement check is made.
    pub fn build_from_descriptor(
        &self,
        descriptor: BuildDescriptor,
    ) -> Result<GradleBuild, IdentityError> {
        GradleBuild::new(descriptor)
    }

    /// One build per distinct descriptor among the build-enabled `members`.
    ///
    /// Projects whose identity cannot be resolved are left out. Only a failing enablement check
    /// fails the whole call.
    pub fn resolve_builds<'a>(
        &self,
        members: impl IntoIterator<Item = &'a WorkspaceMember>,
    ) -> Result<GradleBuilds, EnumerationError> {
        let mut descriptors = HashSet::new();

        for member in members {
            if !self.resolver.is_build_enabled(member)? {
                continue;
            }

            match self.resolver.descriptor_for(member) {
                Ok(Some(descriptor)) => {
                    descriptors.insert(descriptor);
                }
                Ok(None) => {
                    tracing::debug!(
                        target: "keel.workspace",
                        member = %member,
                        "skipping build-enabled project without a build identity"
                    );
                }
                Err(err) => {
                    tracing::debug!(
                        target: "keel.workspace",
                        member = %member,
                        error = %err,
                        "skipping project whose build identity cannot be resolved"
                    );
                }
            }
        }

        let mut builds = GradleBuilds::new();
        for descriptor in descriptors {
            match GradleBuild::new(descriptor) {
                Ok(build) => {
                    builds.insert(build);
                }
                Err(err) => {
                    tracing::debug!(
                        target: "keel.workspace",
                        error = %err,
                        "skipping invalid build descriptor"
                    );
                }
            }
        }
        Ok(builds)
    }

    /// Builds of every project currently in the workspace.
    pub fn resolve_all_builds(&self) -> Result<GradleBuilds, EnumerationError> {
        let members = self.members.all_members()?;
        let builds = self.resolve_builds(&members)?;
        tracing::debug!(
            target: "keel.workspace",
            members = members.len(),
            builds = builds.len(),
            "resolved workspace builds"
        );
        Ok(builds)
    }
}
