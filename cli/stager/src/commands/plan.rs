//! `stager plan` — fully evaluate, configure every component and print the
//! code that connects them.

use anyhow::{Context, Result};
use serde::Serialize;
use stager_core::component::{module_names, Info};
use stager_core::graph::explode::{explode, Exploded};
use stager_core::graph::traverse::topological_sort;

use crate::commands::specialize::specialize_manifest;
use crate::manifest::StagerManifest;

/// One connected component instance.
#[derive(Debug, Serialize)]
pub struct PlanStep {
    pub module: String,
    pub component: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct Plan {
    pub info: Info,
    pub steps: Vec<PlanStep>,
}

/// Build the connection plan, dependencies first.
pub fn build_plan(manifest: &StagerManifest, overrides: &[(String, bool)]) -> Result<Plan> {
    let specialized = specialize_manifest(manifest, false, overrides)?;
    let graph = &specialized.graph;
    let info = Info::collect(manifest.project.name.clone(), graph);
    let instances = module_names(graph)?;

    let mut steps = Vec::new();
    for id in topological_sort(graph)?.into_iter().rev() {
        let Exploded::Component {
            component,
            args,
            deps,
        } = explode(graph, &id)?
        else {
            continue;
        };
        let module = instances
            .get(&id)
            .cloned()
            .unwrap_or_else(|| component.module_name().to_string());
        let inputs: Vec<String> = args
            .iter()
            .chain(deps.iter())
            .filter_map(|child| instances.get(child).cloned())
            .collect();

        component
            .configure(&info)
            .with_context(|| format!("configuring {module}"))?;
        let code = component.connect(&info, &module, &inputs);
        steps.push(PlanStep {
            module,
            component: component.name().to_string(),
            code,
        });
    }

    Ok(Plan { info, steps })
}

pub fn run(
    manifest: &StagerManifest,
    overrides: &[(String, bool)],
    format: Option<&str>,
) -> Result<()> {
    let plan = build_plan(manifest, overrides)?;

    if format == Some("json") {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!(
        "Plan for '{}' ({} components)",
        plan.info.name, plan.info.component_count
    );
    if !plan.info.packages.is_empty() {
        let packages: Vec<String> = plan.info.packages.iter().map(|p| p.to_string()).collect();
        println!("  packages:  {}", packages.join(", "));
    }
    if !plan.info.libraries.is_empty() {
        let libraries: Vec<&str> = plan.info.libraries.iter().map(String::as_str).collect();
        println!("  libraries: {}", libraries.join(", "));
    }
    println!();
    for step in &plan.steps {
        println!("let {} = {}", step.module, step.code);
    }
    Ok(())
}
