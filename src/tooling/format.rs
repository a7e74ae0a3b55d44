//! Format explorer forests and catalogs as text.

use crate::catalog::Catalog;
use crate::views::{AnnotatedNode, AnnotatedRoot};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Indented tree listing, one section per category.
///
/// Directories end in `/`; `*` marks unsaved buffers and `>` the active node.
pub fn format_forest_text(roots: &[AnnotatedRoot]) -> String {
    let mut out = String::new();
    for root in roots {
        out.push_str(&format!("{}\n", format_section_heading(root.category.as_str())));
        if root.nodes.is_empty() {
            out.push_str("  (empty)\n");
        }
        push_nodes(&mut out, &root.nodes, 1);
        out.push('\n');
    }
    out.trim_end().to_string()
}

fn push_nodes(out: &mut String, nodes: &[AnnotatedNode], depth: usize) {
    for node in nodes {
        let marker = if node.active { ">" } else { " " };
        let label = match &node.children {
            Some(_) => format!("{}/", node.label.blue().bold()),
            None => node.label.clone(),
        };
        let dirty = if node.modified {
            format!(" {}", "*".yellow())
        } else {
            String::new()
        };
        out.push_str(&format!(
            "{}{}{}{}\n",
            "  ".repeat(depth - 1),
            marker,
            label,
            dirty
        ));
        if let Some(children) = &node.children {
            push_nodes(out, children, depth + 1);
        }
    }
}

/// Catalog entries as a table ordered by project name.
pub fn format_catalog_table(catalog: &Catalog) -> String {
    if catalog.is_empty() {
        return "Catalog is empty.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Project", "Author", "Origin", "URL"]);
    for entry in catalog.entries() {
        table.add_row(vec![
            entry.project_name.clone(),
            entry.author.clone(),
            entry.origin.clone(),
            entry.url.clone(),
        ]);
    }
    format!("{}\n\n{} projects", table, catalog.len())
}
