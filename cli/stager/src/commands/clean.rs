//! `stager clean` — undo what `stager plan` configured.

use anyhow::{Context, Result};
use stager_core::component::{clean_all, Info};

use crate::commands::specialize::specialize_manifest;
use crate::manifest::StagerManifest;

/// Fully evaluate and clean every surviving component, parents first.
pub fn clean_manifest(
    manifest: &StagerManifest,
    overrides: &[(String, bool)],
) -> Result<Vec<String>> {
    let specialized = specialize_manifest(manifest, false, overrides)?;
    let info = Info::collect(manifest.project.name.clone(), &specialized.graph);
    clean_all(&specialized.graph, &info)
        .with_context(|| format!("cleaning '{}'", manifest.project.name))
}

pub fn run(manifest: &StagerManifest, overrides: &[(String, bool)]) -> Result<()> {
    let cleaned = clean_manifest(manifest, overrides)?;
    for module in &cleaned {
        println!("Cleaned {module}");
    }
    if cleaned.is_empty() {
        println!("Already clean: no components");
    }
    Ok(())
}
