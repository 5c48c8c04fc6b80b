//! `stager inspect` — render a diagnostic view of the graph at some stage.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use stager_core::builder::create;
use stager_core::graph::Graph;
use stager_core::pass::normalize_with;
use stager_observe::{view_for, RenderContext, ViewFormat, ViewKind};

use crate::commands::specialize::specialize_manifest;
use crate::manifest::StagerManifest;

/// How far to push the graph through the pipeline before rendering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Raw,
    Normalized,
    Evaluated,
}

impl Stage {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "raw" => Ok(Stage::Raw),
            "normalized" | "normal" => Ok(Stage::Normalized),
            "evaluated" | "eval" => Ok(Stage::Evaluated),
            _ => bail!("unknown stage '{s}'. Available stages: raw, normalized, evaluated"),
        }
    }
}

pub fn graph_at(manifest: &StagerManifest, stage: Stage, overrides: &[(String, bool)]) -> Result<Graph> {
    match stage {
        Stage::Raw => {
            let (_, graph) = create(&manifest.expr()?).context("building configuration graph")?;
            Ok(graph)
        }
        Stage::Normalized => {
            let (_, graph) = create(&manifest.expr()?).context("building configuration graph")?;
            let (graph, _) =
                normalize_with(graph, manifest.rewrite_limit()).context("normalizing graph")?;
            Ok(graph)
        }
        Stage::Evaluated => Ok(specialize_manifest(manifest, false, overrides)?.graph),
    }
}

pub fn render(
    manifest: &StagerManifest,
    view: Option<&str>,
    stage: Option<&str>,
    overrides: &[(String, bool)],
    format: Option<&str>,
) -> Result<String> {
    let kind = ViewKind::parse(view.unwrap_or("summary"))?;
    let stage = Stage::parse(stage.unwrap_or("raw"))?;
    let graph = graph_at(manifest, stage, overrides)?;

    let ctx = RenderContext::for_project(&manifest.project.name);
    let output = view_for(kind).render(&graph, &ctx)?;
    Ok(output.render(ViewFormat::parse(format.unwrap_or("text")))?)
}

pub fn run(
    manifest: &StagerManifest,
    view: Option<&str>,
    stage: Option<&str>,
    overrides: &[(String, bool)],
    format: Option<&str>,
    export: Option<&Path>,
) -> Result<()> {
    let text = render(manifest, view, stage, overrides, format)?;
    match export {
        Some(path) => {
            fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
