//! `stager check` — build and validate the configuration graph.

use anyhow::{Context, Result};
use serde::Serialize;
use stager_core::builder::create;
use stager_core::hash::{hash_hex, shape_hash};
use stager_core::pass::{normalize_with, NormalizeStats};

use crate::manifest::StagerManifest;

/// What `stager check` found.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub project: String,
    pub vertices: usize,
    pub edges: usize,
    pub keys: Vec<String>,
    pub normalized_vertices: usize,
    pub normalize: NormalizeStats,
    pub shape_hash: String,
}

pub fn check(manifest: &StagerManifest) -> Result<CheckReport> {
    let expr = manifest.expr()?;
    let (_, graph) = create(&expr).context("building configuration graph")?;
    let vertices = graph.vertex_count();
    let edges = graph.edge_count();

    let (normalized, normalize) =
        normalize_with(graph, manifest.rewrite_limit()).context("normalizing graph")?;
    let root = normalized.validate().context("validating normalized graph")?;
    let hash = shape_hash(&normalized, &root).context("hashing normalized graph")?;

    Ok(CheckReport {
        project: manifest.project.name.clone(),
        vertices,
        edges,
        keys: manifest.keys.keys().cloned().collect(),
        normalized_vertices: normalized.vertex_count(),
        normalize,
        shape_hash: hash_hex(&hash),
    })
}

pub fn run(manifest: &StagerManifest, format: Option<&str>) -> Result<()> {
    let report = check(manifest)?;

    if format == Some("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Checked '{}'", report.project);
    println!("  Vertices:   {}", report.vertices);
    println!("  Edges:      {}", report.edges);
    println!("  Keys:       {}", report.keys.join(", "));
    println!(
        "  Normalized: {} vertices ({} hoisted, {} flattened, {} pruned)",
        report.normalized_vertices,
        report.normalize.hoist.rewrites,
        report.normalize.flatten.rewrites,
        report.normalize.hoist.pruned + report.normalize.flatten.pruned,
    );
    println!("  Shape:      {}", &report.shape_hash[..16]);
    Ok(())
}
