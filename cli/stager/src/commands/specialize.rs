//! `stager specialize` — normalize and evaluate the configuration graph.

use anyhow::{Context, Result};
use serde::Serialize;
use stager_core::component::module_names;
use stager_core::graph::traverse::try_iter;
use stager_core::graph::vertex::VertexKind;
use stager_core::graph::GraphError;
use stager_core::pass::EvalMode;
use stager_core::pipeline::{specialize, SpecializeConfig, SpecializeReport, Specialized};

use crate::manifest::StagerManifest;

/// A surviving vertex, in parent-before-child order.
#[derive(Debug, Serialize)]
pub struct VertexSummary {
    pub kind: &'static str,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SpecializeOutput {
    pub project: String,
    pub report: SpecializeReport,
    pub vertices: Vec<VertexSummary>,
}

/// Run the pipeline over the manifest's root expression.
pub fn specialize_manifest(
    manifest: &StagerManifest,
    partial: bool,
    overrides: &[(String, bool)],
) -> Result<Specialized> {
    let expr = manifest.expr()?;
    let bindings = manifest.bindings(overrides);
    let mode = if partial {
        EvalMode::Partial
    } else {
        EvalMode::Full
    };
    let config = SpecializeConfig {
        mode,
        limit: manifest.rewrite_limit(),
    };
    specialize(&expr, &bindings, &config).with_context(|| {
        format!("specializing '{}'", manifest.project.name)
    })
}

pub fn summarize(manifest: &StagerManifest, specialized: Specialized) -> Result<SpecializeOutput> {
    let instances = module_names(&specialized.graph)?;
    let mut vertices = Vec::new();
    try_iter(&specialized.graph, |v| {
        let name = match &v.kind {
            VertexKind::Conditional(key) => key.name.clone(),
            VertexKind::Apply => "$".to_string(),
            VertexKind::Component(c) => instances
                .get(&v.id)
                .cloned()
                .unwrap_or_else(|| c.module_name().to_string()),
        };
        vertices.push(VertexSummary {
            kind: v.kind.tag(),
            name,
        });
        Ok::<_, GraphError>(())
    })?;

    Ok(SpecializeOutput {
        project: manifest.project.name.clone(),
        report: specialized.report,
        vertices,
    })
}

pub fn run(
    manifest: &StagerManifest,
    partial: bool,
    overrides: &[(String, bool)],
    format: Option<&str>,
) -> Result<()> {
    let specialized = specialize_manifest(manifest, partial, overrides)?;
    let output = summarize(manifest, specialized)?;

    if format == Some("json") {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let r = &output.report;
    println!(
        "Specialized '{}' ({} evaluation)",
        output.project,
        if partial { "partial" } else { "full" }
    );
    println!("  Vertices:      {} -> {}", r.initial_vertices, r.final_vertices);
    println!("  Hoisted:       {}", r.hoisted);
    println!("  Flattened:     {}", r.flattened);
    println!("  Resolved:      {}", r.resolved);
    println!("  Pruned:        {}", r.pruned);
    println!(
        "  Fully reduced: {}",
        if r.fully_reduced { "yes" } else { "no" }
    );
    println!();
    for v in &output.vertices {
        println!("  [{}] {}", v.kind, v.name);
    }
    Ok(())
}
