//! Plain-text rendering of a [`GraphIR`] for terminals.

use unicode_width::UnicodeWidthStr;

use crate::ir::{ColumnIR, GraphIR};

pub struct TextRenderer {
    pub indent: usize,
    pub gap: usize,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self { indent: 2, gap: 2 }
    }
}

impl TextRenderer {
    pub fn render(&self, ir: &GraphIR) -> String {
        let mut out = String::new();

        for (i, node) in ir.nodes.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&node.id);
            out.push('\n');

            let name_width = column_width(&node.columns, |c| c.name.as_str());
            let type_width = column_width(&node.columns, |c| c.typ.as_str());
            for col in &node.columns {
                let mut line = " ".repeat(self.indent);
                line.push_str(&pad(&col.name, name_width + self.gap));
                line.push_str(&pad(&col.typ, type_width + self.gap));
                line.push_str(&markers(col));
                out.push_str(line.trim_end());
                out.push('\n');
            }
        }

        if !ir.edges.is_empty() {
            out.push_str("\nreferences\n");
            for edge in &ir.edges {
                out.push_str(&format!(
                    "{}{}.{} -> {}.{} ({})\n",
                    " ".repeat(self.indent),
                    edge.from,
                    edge.from_column,
                    edge.to,
                    edge.to_column,
                    edge.constraint
                ));
            }
        }

        out
    }
}

/// Terminal display width, so wide (CJK) identifiers still line up.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

fn column_width<'a>(columns: &'a [ColumnIR], field: impl Fn(&'a ColumnIR) -> &'a str) -> usize {
    columns
        .iter()
        .map(|c| display_width(field(c)))
        .max()
        .unwrap_or(0)
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(text));
    format!("{text}{}", " ".repeat(fill))
}

fn markers(col: &ColumnIR) -> String {
    let mut tags = Vec::new();
    if col.is_pk {
        tags.push("PK");
    }
    if col.is_fk {
        tags.push("FK");
    }
    if col.not_null {
        tags.push("NOT NULL");
    }
    tags.join(" ")
}
