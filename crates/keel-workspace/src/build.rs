use std::collections::hash_set;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use keel_build_model::{BuildDescriptor, IdentityError};
use serde::{Serialize, Serializer};

/// Handle to the Gradle build identified by a [`BuildDescriptor`].
///
/// Handles are cheap and are created fresh on every lookup. Two handles are equal exactly when
/// their descriptors are equal, regardless of which project they were resolved from.
#[derive(Debug, Clone)]
pub struct GradleBuild {
    descriptor: Arc<BuildDescriptor>,
}

impl GradleBuild {
    /// Handle for `descriptor`, after checking it is structurally valid.
    pub fn new(descriptor: BuildDescriptor) -> Result<Self, IdentityError> {
        descriptor.validate()?;
        Ok(Self {
            descriptor: Arc::new(descriptor),
        })
    }

    pub fn descriptor(&self) -> &BuildDescriptor {
        &self.descriptor
    }

    pub fn root_dir(&self) -> &Path {
        &self.descriptor.root_dir
    }
}

impl PartialEq for GradleBuild {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.descriptor, &other.descriptor) || self.descriptor == other.descriptor
    }
}

impl Eq for GradleBuild {}

impl Hash for GradleBuild {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.descriptor.hash(state);
    }
}

impl Serialize for GradleBuild {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.descriptor.serialize(serializer)
    }
}

/// Set of builds, at most one per distinct descriptor. Iteration order is unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradleBuilds {
    builds: HashSet<GradleBuild>,
}

impl GradleBuilds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `build`; returns `false` if a build with an equal descriptor was already present.
    pub fn insert(&mut self, build: GradleBuild) -> bool {
        self.builds.insert(build)
    }

    pub fn len(&self) -> usize {
        self.builds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }

    pub fn contains(&self, build: &GradleBuild) -> bool {
        self.builds.contains(build)
    }

    /// Whether a build with this descriptor is present.
    pub fn contains_descriptor(&self, descriptor: &BuildDescriptor) -> bool {
        self.builds.iter().any(|b| b.descriptor() == descriptor)
    }

    pub fn iter(&self) -> hash_set::Iter<'_, GradleBuild> {
        self.builds.iter()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &BuildDescriptor> {
        self.builds.iter().map(GradleBuild::descriptor)
    }
}

impl IntoIterator for GradleBuilds {
    type Item = GradleBuild;
    type IntoIter = hash_set::IntoIter<GradleBuild>;

    fn into_iter(self) -> Self::IntoIter {
        self.builds.into_iter()
    }
}

impl<'a> IntoIterator for &'a GradleBuilds {
    type Item = &'a GradleBuild;
    type IntoIter = hash_set::Iter<'a, GradleBuild>;

    fn into_iter(self) -> Self::IntoIter {
        self.builds.iter()
    }
}

impl FromIterator<GradleBuild> for GradleBuilds {
    fn from_iter<I: IntoIterator<Item = GradleBuild>>(iter: I) -> Self {
        Self {
            builds: iter.into_iter().collect(),
        }
    }
}

impl Extend<GradleBuild> for GradleBuilds {
    fn extend<I: IntoIterator<Item = GradleBuild>>(&mut self, iter: I) {
        self.builds.extend(iter);
    }
}
