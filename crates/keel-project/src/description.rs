use std::path::{Path, PathBuf};

use keel_build_model::EnumerationError;

/// File holding a project's name and natures.
pub const PROJECT_DESCRIPTION_FILE: &str = ".project";

/// Nature marking a project as part of a Gradle build.
pub const GRADLE_NATURE: &str = "org.eclipse.buildship.core.gradleprojectnature";

/// The parts of a `.project` descriptor that matter for build identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectDescription {
    pub name: Option<String>,
    pub natures: Vec<String>,
}

impl ProjectDescription {
    pub fn has_nature(&self, nature: &str) -> bool {
        self.natures.iter().any(|n| n == nature)
    }

    pub fn is_gradle_project(&self) -> bool {
        self.has_nature(GRADLE_NATURE)
    }
}

pub fn project_description_path(project_dir: &Path) -> PathBuf {
    project_dir.join(PROJECT_DESCRIPTION_FILE)
}

/// Read `<project_dir>/.project`.
///
/// A missing descriptor is `Ok(None)`: the directory is simply not a project.
pub fn read_project_description(
    project_dir: &Path,
) -> Result<Option<ProjectDescription>, EnumerationError> {
    let path = project_description_path(project_dir);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(EnumerationError::Io { path, source }),
    };

    parse_project_description(&contents)
        .map(Some)
        .map_err(|message| EnumerationError::Xml { path, message })
}

pub fn parse_project_description(contents: &str) -> Result<ProjectDescription, String> {
    let doc = roxmltree::Document::parse(contents).map_err(|err| err.to_string())?;
    let root = doc.root_element();
    if root.tag_name().name() != "projectDescription" {
        return Err(format!(
            "expected <projectDescription> root element, found <{}>",
            root.tag_name().name()
        ));
    }

    let name = child_text(&root, "name");
    let natures = root
        .children()
        .filter(|n| n.has_tag_name("natures"))
        .flat_map(|natures| natures.children().filter(|n| n.has_tag_name("nature")))
        .filter_map(|n| n.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    Ok(ProjectDescription { name, natures })
}

fn child_text(node: &roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
