use keel_build_model::{EnumerationError, MemberEnumerator};
use keel_project::{DiscoveryOptions, FsMemberEnumerator, ProjectSettings};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use super::{write_gradle_project, write_project};

#[test]
fn finds_nested_projects_and_names_them() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let root = dir.path();
    write_gradle_project(&root.join("shop"), "shop", &ProjectSettings::new(""));
    write_gradle_project(&root.join("shop/app"), "shop-app", &ProjectSettings::new(".."));
    write_project(&root.join("notes"), "notes", &[]);
    std::fs::create_dir_all(root.join("scratch"))?;

    let members = FsMemberEnumerator::new(root).all_members()?;
    let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["notes", "shop", "shop-app"]);
    assert_eq!(members[2].location, root.join("shop").join("app"));
    Ok(())
}

#[test]
fn skips_build_output_and_hidden_directories() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let root = dir.path();
    write_project(&root.join("app"), "app", &[]);
    write_project(&root.join("app/build/tmp"), "generated", &[]);
    write_project(&root.join(".metadata/plugins"), "hidden", &[]);

    let members = FsMemberEnumerator::new(root).all_members()?;
    let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["app"]);
    Ok(())
}

#[test]
fn falls_back_to_directory_name() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let project = dir.path().join("unnamed");
    std::fs::create_dir_all(&project)?;
    std::fs::write(project.join(".project"), "<projectDescription/>")?;

    let members = FsMemberEnumerator::new(dir.path()).all_members()?;
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].name, "unnamed");
    Ok(())
}

#[test]
fn respects_max_depth() -> anyhow::Result<()> {
    let dir = tempdir()?;
    write_project(&dir.path().join("a/b/c"), "deep", &[]);

    let shallow =
        FsMemberEnumerator::with_options(dir.path(), DiscoveryOptions { max_depth: 2 });
    assert!(shallow.all_members()?.is_empty());
    assert_eq!(FsMemberEnumerator::new(dir.path()).all_members()?.len(), 1);
    Ok(())
}

#[test]
fn missing_root_is_an_enumeration_error() {
    let dir = tempdir().unwrap();
    let err = FsMemberEnumerator::new(dir.path().join("nope"))
        .all_members()
        .unwrap_err();
    assert!(matches!(err, EnumerationError::Io { .. }), "{err:?}");
}
