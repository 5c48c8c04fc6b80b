//! View trait and core abstractions for the observability layer.

use serde_json::Value;
use stager_core::graph::Graph;

use crate::error::ObserveError;

/// The kind of view to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Dot,
    Summary,
}

impl ViewKind {
    /// Parse a view kind from a string.
    pub fn parse(s: &str) -> Result<Self, ObserveError> {
        match s {
            "dot" | "graphviz" => Ok(ViewKind::Dot),
            "summary" | "stats" => Ok(ViewKind::Summary),
            _ => Err(ObserveError::UnknownView {
                name: s.to_string(),
            }),
        }
    }

    /// Display name for this view kind.
    pub fn name(&self) -> &'static str {
        match self {
            ViewKind::Dot => "dot",
            ViewKind::Summary => "summary",
        }
    }
}

/// The output format for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewFormat {
    Text,
    Json,
}

impl ViewFormat {
    /// Parse a view format from a string.
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => ViewFormat::Json,
            _ => ViewFormat::Text,
        }
    }
}

/// The output of a view render.
#[derive(Debug)]
pub struct ViewOutput {
    /// Terminal-friendly text rendering.
    pub text: String,
    /// Machine-readable JSON (always populated).
    pub data: Value,
}

impl ViewOutput {
    /// Render in the requested format.
    pub fn render(&self, format: ViewFormat) -> Result<String, ObserveError> {
        match format {
            ViewFormat::Text => Ok(self.text.clone()),
            ViewFormat::Json => Ok(serde_json::to_string_pretty(&self.data)?),
        }
    }
}

/// Context passed to views for rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    /// Project name shown in headers and collected build info.
    pub project: Option<&'a str>,
}

impl<'a> RenderContext<'a> {
    /// Create an empty render context.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn for_project(project: &'a str) -> Self {
        Self {
            project: Some(project),
        }
    }

    pub(crate) fn project_name(&self) -> &'a str {
        self.project.unwrap_or("stager")
    }
}

/// Trait for all observability views.
pub trait View {
    /// Render this view for the given graph and context.
    fn render(&self, graph: &Graph, ctx: &RenderContext<'_>) -> Result<ViewOutput, ObserveError>;

    /// The kind of view this is.
    fn kind(&self) -> ViewKind;
}

/// List all available view kinds.
pub fn available_views() -> &'static [ViewKind] {
    &[ViewKind::Dot, ViewKind::Summary]
}

/// Instantiate the view for `kind`.
pub fn view_for(kind: ViewKind) -> Box<dyn View> {
    match kind {
        ViewKind::Dot => Box::new(crate::dot::DotView),
        ViewKind::Summary => Box::new(crate::summary::SummaryView),
    }
}
