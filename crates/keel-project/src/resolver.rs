use keel_build_model::{
    BuildDescriptor, EnumerationError, IdentityError, IdentityResolver, WorkspaceMember,
};
use keel_config::WorkspaceBuildDefaults;

use crate::builder::DescriptorBuilder;
use crate::description::read_project_description;
use crate::settings::read_project_settings;

/// Resolves build identity from the files a project keeps on disk.
///
/// Enablement comes from the Gradle nature in `.project`; the descriptor comes from the project's
/// persisted settings merged with the workspace defaults.
#[derive(Debug, Clone, Default)]
pub struct FsIdentityResolver {
    defaults: WorkspaceBuildDefaults,
}

impl FsIdentityResolver {
    pub fn new(defaults: WorkspaceBuildDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &WorkspaceBuildDefaults {
        &self.defaults
    }
}

impl IdentityResolver for FsIdentityResolver {
    fn is_build_enabled(&self, member: &WorkspaceMember) -> Result<bool, EnumerationError> {
        Ok(read_project_description(&member.location)?
            .is_some_and(|description| description.is_gradle_project()))
    }

    fn descriptor_for(
        &self,
        member: &WorkspaceMember,
    ) -> Result<Option<BuildDescriptor>, IdentityError> {
        let Some(settings) = read_project_settings(&member.location)? else {
            tracing::debug!(
                target: "keel.project",
                member = %member,
                "project has no persisted build settings"
            );
            return Ok(None);
        };

        DescriptorBuilder::from_project_settings(&member.location, &settings, &self.defaults)
            .build()
            .map(Some)
    }
}
