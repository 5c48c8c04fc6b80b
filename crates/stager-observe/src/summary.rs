//! Summary view: vertex counts, depth, reduction state and collected build
//! information.

use serde_json::json;
use stager_core::component::Info;
use stager_core::graph::traverse::{collect, topological_sort, Count, Monoid};
use stager_core::graph::vertex::VertexKind;
use stager_core::graph::Graph;
use stager_core::pass::is_fully_reduced;

use crate::error::ObserveError;
use crate::format::{compute_levels, vertex_label};
use crate::view::{RenderContext, View, ViewKind, ViewOutput};

/// Summary of a configuration graph.
pub struct SummaryView;

#[derive(Default)]
struct KindCounts {
    components: Count,
    conditionals: Count,
    applies: Count,
}

impl Monoid for KindCounts {
    fn empty() -> Self {
        Self::default()
    }

    fn combine(self, other: Self) -> Self {
        Self {
            components: self.components.combine(other.components),
            conditionals: self.conditionals.combine(other.conditionals),
            applies: self.applies.combine(other.applies),
        }
    }
}

impl View for SummaryView {
    fn kind(&self) -> ViewKind {
        ViewKind::Summary
    }

    fn render(&self, graph: &Graph, ctx: &RenderContext<'_>) -> Result<ViewOutput, ObserveError> {
        let sorted = topological_sort(graph)?;
        let levels = compute_levels(graph, &sorted);
        let depth = levels.values().max().map_or(0, |l| l + 1);

        let counts: KindCounts = collect(graph, |kind| {
            let mut c = KindCounts::default();
            match kind {
                VertexKind::Component(_) => c.components = Count(1),
                VertexKind::Conditional(_) => c.conditionals = Count(1),
                VertexKind::Apply => c.applies = Count(1),
            }
            c
        });
        let reduced = is_fully_reduced(graph);
        let info = Info::collect(ctx.project_name(), graph);

        let root = match graph.root() {
            Ok(id) => Some(vertex_label(graph.vertex(&id)?, &Default::default())),
            Err(_) => None,
        };

        let mut text = String::new();
        text.push_str(&format!("=== {} ===\n\n", info.name));
        text.push_str(&format!("  Vertices:      {}\n", graph.vertex_count()));
        text.push_str(&format!("    component:   {}\n", counts.components.0));
        text.push_str(&format!("    conditional: {}\n", counts.conditionals.0));
        text.push_str(&format!("    apply:       {}\n", counts.applies.0));
        text.push_str(&format!("  Edges:         {}\n", graph.edge_count()));
        text.push_str(&format!("  Depth:         {depth}\n"));
        text.push_str(&format!(
            "  Root:          {}\n",
            root.as_deref().unwrap_or("(none)")
        ));
        text.push_str(&format!(
            "  Fully reduced: {}\n",
            if reduced { "yes" } else { "no" }
        ));

        if !info.packages.is_empty() {
            text.push_str("\n--- Packages ---\n");
            for package in &info.packages {
                text.push_str(&format!("  {package}\n"));
            }
        }
        if !info.libraries.is_empty() {
            text.push_str("\n--- Libraries ---\n");
            for library in &info.libraries {
                text.push_str(&format!("  {library}\n"));
            }
        }
        if !info.keys.is_empty() {
            text.push_str("\n--- Keys ---\n");
            for key in &info.keys {
                text.push_str(&format!("  {key}\n"));
            }
        }

        let data = json!({
            "view": "summary",
            "vertex_count": graph.vertex_count(),
            "edge_count": graph.edge_count(),
            "components": counts.components.0,
            "conditionals": counts.conditionals.0,
            "applies": counts.applies.0,
            "depth": depth,
            "root": root,
            "fully_reduced": reduced,
            "info": serde_json::to_value(&info)?,
        });

        Ok(ViewOutput { text, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stager_core::builder::create;
    use stager_core::component::{Device, Package};
    use stager_core::expr::Expr;
    use stager_core::key::{Bindings, Key};
    use stager_core::pass::{eval, normalize, EvalMode};

    fn sample() -> Expr {
        let wrap = Device::new("wrap")
            .with_package(Package::new("logs").with_min("0.5"))
            .with_library("logs.unix");
        Expr::app(
            Expr::component(wrap.into_component()),
            Expr::if_(
                Key::new("k"),
                Expr::component(Device::new("a").into_component()),
                Expr::component(Device::new("b").into_component()),
            ),
        )
    }

    #[test]
    fn empty_graph() {
        let output = SummaryView.render(&Graph::new(), &RenderContext::empty()).unwrap();
        assert_eq!(output.data["vertex_count"], 0);
        assert_eq!(output.data["depth"], 0);
        assert!(output.data["root"].is_null());
        assert!(output.text.contains("(none)"));
    }

    #[test]
    fn counts_raw_graph() {
        let (_, g) = create(&sample()).unwrap();
        let output = SummaryView
            .render(&g, &RenderContext::for_project("demo"))
            .unwrap();
        assert_eq!(output.data["components"], 3);
        assert_eq!(output.data["conditionals"], 1);
        assert_eq!(output.data["applies"], 1);
        assert_eq!(output.data["depth"], 3);
        assert_eq!(output.data["root"], "$");
        assert_eq!(output.data["fully_reduced"], false);
        assert_eq!(output.data["info"]["name"], "demo");
        assert!(output.text.contains("logs (>= 0.5)"));
        assert!(output.text.contains("logs.unix"));
    }

    #[test]
    fn reduced_graph() {
        let (_, g) = create(&sample()).unwrap();
        let (g, _) = normalize(g).unwrap();
        let (g, _) = eval(g, &Bindings::new().with("k", false), EvalMode::Full).unwrap();
        let output = SummaryView.render(&g, &RenderContext::empty()).unwrap();
        assert_eq!(output.data["vertex_count"], 2);
        assert_eq!(output.data["depth"], 2);
        assert_eq!(output.data["root"], "wrap");
        assert_eq!(output.data["fully_reduced"], true);
        assert!(output.text.contains("Fully reduced: yes"));
    }
}
