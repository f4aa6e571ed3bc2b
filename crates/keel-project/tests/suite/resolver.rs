use std::path::PathBuf;

use keel_build_model::{GradleDistribution, IdentityError, IdentityResolver, WorkspaceMember};
use keel_config::WorkspaceBuildDefaults;
use keel_project::{FsIdentityResolver, FsWorkspace, ProjectSettings};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use super::{write_gradle_project, write_project};

fn member(dir: &std::path::Path) -> WorkspaceMember {
    WorkspaceMember::new(
        dir.file_name().unwrap().to_string_lossy().into_owned(),
        dir.to_path_buf(),
    )
}

#[test]
fn subprojects_of_one_build_share_a_descriptor() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let root = dir.path().join("shop");
    let app = root.join("app");
    write_gradle_project(&root, "shop", &ProjectSettings::new(""));
    write_gradle_project(&app, "app", &ProjectSettings::new(".."));

    let resolver = FsIdentityResolver::default();
    assert!(resolver.is_build_enabled(&member(&root))?);
    assert!(resolver.is_build_enabled(&member(&app))?);

    let root_descriptor = resolver.descriptor_for(&member(&root))?.expect("root descriptor");
    let app_descriptor = resolver.descriptor_for(&member(&app))?.expect("app descriptor");
    assert_eq!(root_descriptor, app_descriptor);
    assert_eq!(root_descriptor.root_dir, dunce::canonicalize(&root)?);
    assert_eq!(root_descriptor.distribution, GradleDistribution::Wrapper);
    Ok(())
}

#[test]
fn projects_without_the_gradle_nature_are_not_enabled() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let plain = dir.path().join("plain");
    write_project(&plain, "plain", &["org.eclipse.jdt.core.javanature"]);
    let bare = dir.path().join("bare");
    std::fs::create_dir_all(&bare)?;

    let resolver = FsIdentityResolver::default();
    assert!(!resolver.is_build_enabled(&member(&plain))?);
    assert!(!resolver.is_build_enabled(&member(&bare))?);
    Ok(())
}

#[test]
fn malformed_project_description_fails_the_enablement_check() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let broken = dir.path().join("broken");
    std::fs::create_dir_all(&broken)?;
    std::fs::write(broken.join(".project"), "<projectDescription><name>")?;

    let resolver = FsIdentityResolver::default();
    let err = resolver.is_build_enabled(&member(&broken)).unwrap_err();
    assert!(
        matches!(err, keel_build_model::EnumerationError::Xml { .. }),
        "{err:?}"
    );
    Ok(())
}

#[test]
fn missing_settings_resolve_to_no_identity() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let project = dir.path().join("fresh");
    write_project(&project, "fresh", &[keel_project::GRADLE_NATURE]);

    let resolver = FsIdentityResolver::default();
    assert!(resolver.is_build_enabled(&member(&project))?);
    assert_eq!(resolver.descriptor_for(&member(&project))?, None);
    Ok(())
}

#[test]
fn corrupt_settings_are_identity_errors() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let project = dir.path().join("corrupt");
    write_project(&project, "corrupt", &[keel_project::GRADLE_NATURE]);
    std::fs::create_dir_all(project.join(".settings"))?;
    std::fs::write(
        project.join(keel_project::PROJECT_SETTINGS_FILE),
        "connection.gradle.distribution=GRADLE_DISTRIBUTION(WRAPPER)\n",
    )?;

    let resolver = FsIdentityResolver::default();
    let err = resolver.descriptor_for(&member(&project)).unwrap_err();
    assert!(matches!(err, IdentityError::MissingSetting { .. }), "{err:?}");
    Ok(())
}

#[test]
fn build_root_that_does_not_exist_is_an_identity_error() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let project = dir.path().join("orphan");
    write_gradle_project(&project, "orphan", &ProjectSettings::new("../gone"));

    let resolver = FsIdentityResolver::default();
    let err = resolver.descriptor_for(&member(&project)).unwrap_err();
    assert!(matches!(err, IdentityError::Io { .. }), "{err:?}");
    Ok(())
}

#[test]
fn workspace_defaults_apply_unless_project_overrides() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let inherits = dir.path().join("inherits");
    let overrides = dir.path().join("overrides");

    let mut inherit_settings = ProjectSettings::new("");
    inherit_settings.jvm_arguments = vec!["-Xmx8g".to_string()];
    inherit_settings.output.show_console_view = true;
    write_gradle_project(&inherits, "inherits", &inherit_settings);

    let mut override_settings = ProjectSettings::new("");
    override_settings.override_workspace_settings = true;
    override_settings.jvm_arguments = vec!["-Xmx8g".to_string()];
    override_settings.distribution = Some(GradleDistribution::Version("7.6".to_string()));
    write_gradle_project(&overrides, "overrides", &override_settings);

    let defaults = WorkspaceBuildDefaults {
        distribution: GradleDistribution::Version("8.5".to_string()),
        jvm_arguments: vec!["-Xmx2g".to_string()],
        offline_mode: true,
        ..WorkspaceBuildDefaults::default()
    };
    let resolver = FsIdentityResolver::new(defaults);

    let inherited = resolver
        .descriptor_for(&member(&inherits))?
        .expect("descriptor");
    assert_eq!(inherited.jvm_arguments, vec!["-Xmx2g".to_string()]);
    assert_eq!(
        inherited.distribution,
        GradleDistribution::Version("8.5".to_string())
    );
    assert!(inherited.offline_mode);
    assert!(inherited.output.show_console_view);

    let overridden = resolver
        .descriptor_for(&member(&overrides))?
        .expect("descriptor");
    assert_eq!(overridden.jvm_arguments, vec!["-Xmx8g".to_string()]);
    assert_eq!(
        overridden.distribution,
        GradleDistribution::Version("7.6".to_string())
    );
    assert!(!overridden.offline_mode);
    Ok(())
}

#[test]
fn relative_java_home_resolves_against_the_project() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let project = dir.path().join("app");
    let mut settings = ProjectSettings::new("");
    settings.override_workspace_settings = true;
    settings.java_home = Some(PathBuf::from("jdk"));
    write_gradle_project(&project, "app", &settings);

    let descriptor = FsIdentityResolver::default()
        .descriptor_for(&member(&project))?
        .expect("descriptor");
    assert_eq!(descriptor.java_home, Some(project.join("jdk")));
    Ok(())
}

#[test]
fn workspace_config_supplies_defaults() -> anyhow::Result<()> {
    let dir = tempdir()?;
    std::fs::write(
        dir.path().join("keel.toml"),
        "[build]\narguments = [\"--stacktrace\"]\nbuild_scans = true\n",
    )?;
    let project = dir.path().join("app");
    write_gradle_project(&project, "app", &ProjectSettings::new(""));

    let workspace = keel_config::with_config_env_lock(|| FsWorkspace::open(dir.path()))?;
    assert!(workspace.config_path.is_some());

    let descriptor = workspace
        .identity_resolver()
        .descriptor_for(&member(&project))?
        .expect("descriptor");
    assert_eq!(descriptor.arguments, vec!["--stacktrace".to_string()]);
    assert!(descriptor.build_scans);
    Ok(())
}

#[test]
fn latin1_settings_written_by_other_tools_resolve() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let project = dir.path().join("legacy");
    write_project(&project, "legacy", &[keel_project::GRADLE_NATURE]);
    std::fs::create_dir_all(project.join(".settings"))?;
    std::fs::write(
        project.join(keel_project::PROJECT_SETTINGS_FILE),
        b"connection.project.dir=\noverride.workspace.settings=true\njvm.arguments=-Duser.name=Jos\xE9\n",
    )?;

    let descriptor = FsIdentityResolver::default()
        .descriptor_for(&member(&project))?
        .expect("descriptor");
    assert_eq!(
        descriptor.jvm_arguments,
        vec!["-Duser.name=Jos\u{e9}".to_string()]
    );
    Ok(())
}

#[test]
fn resolved_descriptor_serializes_every_identity_field() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let project = dir.path().join("app");
    let mut settings = ProjectSettings::new("");
    settings.override_workspace_settings = true;
    settings.arguments = vec!["--offline".to_string()];
    settings.output.show_executions_view = true;
    write_gradle_project(&project, "app", &settings);

    let descriptor = FsIdentityResolver::default()
        .descriptor_for(&member(&project))?
        .expect("descriptor");
    assert_eq!(
        serde_json::to_value(&descriptor)?,
        serde_json::json!({
            "root_dir": dunce::canonicalize(&project)?,
            "distribution": { "type": "wrapper" },
            "gradle_user_home": null,
            "java_home": null,
            "jvm_arguments": [],
            "arguments": ["--offline"],
            "offline_mode": false,
            "build_scans": false,
            "output": { "show_console_view": false, "show_executions_view": true },
        })
    );
    Ok(())
}
