use std::path::Path;

use keel_project::{write_project_settings, ProjectSettings, GRADLE_NATURE};

mod discovery;
mod resolver;

pub(crate) fn write_project(dir: &Path, name: &str, natures: &[&str]) {
    std::fs::create_dir_all(dir).expect("create project dir");
    let natures = natures
        .iter()
        .map(|n| format!("        <nature>{n}</nature>\n"))
        .collect::<String>();
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<projectDescription>\n    <name>{name}</name>\n    <natures>\n{natures}    </natures>\n</projectDescription>\n"
    );
    std::fs::write(dir.join(".project"), xml).expect("write .project");
}

pub(crate) fn write_gradle_project(dir: &Path, name: &str, settings: &ProjectSettings) {
    write_project(dir, name, &["org.eclipse.jdt.core.javanature", GRADLE_NATURE]);
    write_project_settings(dir, settings).expect("write project settings");
}
