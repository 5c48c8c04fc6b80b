//! `stager init` — project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::manifest::{StagerManifest, MANIFEST_FILE};

/// Create a new stager project in the directory `name`, relative to cwd.
pub fn run(name: &str) -> Result<()> {
    create_project(Path::new(name), name)
}

pub(crate) fn create_project(project_dir: &Path, name: &str) -> Result<()> {
    if project_dir.exists() {
        bail!("directory '{}' already exists", project_dir.display());
    }

    fs::create_dir_all(project_dir)
        .with_context(|| format!("creating {}", project_dir.display()))?;
    fs::write(
        project_dir.join(MANIFEST_FILE),
        StagerManifest::template(name),
    )
    .with_context(|| format!("writing {MANIFEST_FILE}"))?;

    println!("Created project '{name}'");
    println!("  {name}/{MANIFEST_FILE}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_project_structure() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("test-init-project");

        create_project(&project_path, "test-init-project").unwrap();

        assert!(project_path.join(MANIFEST_FILE).is_file());
        let entries = fs::read_dir(&project_path).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn init_generates_loadable_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("valid-manifest");

        create_project(&project_path, "valid-manifest").unwrap();

        let (manifest, found) = StagerManifest::find_and_load(&project_path).unwrap().unwrap();
        assert_eq!(found, project_path);
        assert_eq!(manifest.project.name, "valid-manifest");
        manifest.expr().unwrap();
    }

    #[test]
    fn init_refuses_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("existing");
        fs::create_dir(&project_path).unwrap();

        let err = create_project(&project_path, "existing").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
