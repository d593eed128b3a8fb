//! # LayoutKit
//!
//! Interactive vector annotation of document page images: text regions,
//! tables, text lines with baselines, words, glyphs and groups drawn over
//! scanned pages.
//!
//! ## Architecture
//!
//! LayoutKit is organized as a workspace with multiple crates:
//!
//! 1. **layoutkit-core** - Geometry kernel, error types, shared constants
//! 2. **layoutkit-settings** - Configuration loading and validation
//! 3. **layoutkit-editor** - Document model, scene, edit modes, tables, history
//! 4. **layoutkit** - Command-line checker that integrates all crates
//!
//! ## Features
//!
//! - **Derived Bands**: text line polygons generated from their baselines
//! - **Live Validation**: geometry checked while editing and on completion
//! - **Edit Modes**: composable select, vertex, text, drag, draw and group behaviors
//! - **Tables**: grid line dragging and row/column insertion and deletion
//! - **Undo/Redo**: bounded snapshot history with coalescing

pub use layoutkit_core::{Error, Point2D, Result};
pub use layoutkit_editor::{
    Annotator, Document, EditKey, EditMode, EditSession, Handled, InputEvent, Node, NodeKind,
    Scene, Unwound, Viewport,
};
pub use layoutkit_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Outcome of checking one loaded document.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub pages: usize,
    pub nodes: usize,
    pub failures: Vec<(String, Error)>,
    pub irregular_tables: Vec<String>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the completion validators over every node and flags tables whose
/// cells no longer form a grid.
pub fn check_document(scene: &Scene) -> CheckReport {
    let document = scene.document();
    let mut report = CheckReport {
        pages: document.pages().count(),
        ..CheckReport::default()
    };
    for node in document.iter() {
        report.nodes += 1;
        if let Err(err) = scene.validate_node(&node.id) {
            tracing::warn!("{} failed validation: {}", node.id, err);
            report.failures.push((node.id.clone(), err));
        }
        if matches!(node.kind, NodeKind::TableRegion { .. })
            && !scene.is_grid_table(&node.id).unwrap_or(false)
        {
            report.irregular_tables.push(node.id.clone());
        }
    }
    report
}
