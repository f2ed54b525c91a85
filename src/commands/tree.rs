//! Tree command implementation.
//!
//! Prints the rebuilt span tree as a timeline: one row per node, indented
//! by depth, with a bar placed by the node's offset inside its trace.

use crate::aggregator::{build_trace_tree, flatten_timeline, TimelineRow};
use crate::commands::models::TreeArgs;
use crate::commands::profile::load_traces;
use anyhow::Result;
use colored::Colorize;
use log::info;

/// Width of the timeline bar column in characters
const BAR_COLUMNS: usize = 40;

/// Execute the tree command
pub fn execute_tree(args: TreeArgs) -> Result<()> {
    let parsed = load_traces(&args.source, &args.load)?;
    let tree = build_trace_tree(&parsed.traces);
    info!("Rebuilt {} root spans", tree.roots.len());

    let rows: Vec<TimelineRow> = flatten_timeline(&tree.roots)
        .into_iter()
        .filter(|row| args.max_depth.map_or(true, |max| row.depth <= max))
        .collect();

    println!("{}", render_timeline(&rows));
    Ok(())
}

/// Render timeline rows as colored text
pub fn render_timeline(rows: &[TimelineRow]) -> String {
    rows.iter()
        .map(render_row)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_row(row: &TimelineRow) -> String {
    let indent = "  ".repeat(row.depth);
    let label = if row.depth == 0 {
        row.label.bold().to_string()
    } else {
        row.label.normal().to_string()
    };

    format!(
        "{}{} {} {} {}",
        indent,
        label,
        timeline_bar(row.offset_percent, row.width_percent).cyan(),
        format!("{} ns", row.total).dimmed(),
        format!("(self {} ns)", row.self_time).dimmed()
    )
}

/// Draw `[   ====      ]` with the span placed inside the trace
fn timeline_bar(offset_percent: f64, width_percent: f64) -> String {
    let to_columns = |percent: f64| ((percent / 100.0) * BAR_COLUMNS as f64).round() as usize;

    let width = to_columns(width_percent).clamp(1, BAR_COLUMNS);
    let start = to_columns(offset_percent).min(BAR_COLUMNS - width);
    let rest = BAR_COLUMNS - start - width;

    format!("[{}{}{}]", " ".repeat(start), "=".repeat(width), " ".repeat(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_bar_full_width() {
        let bar = timeline_bar(0.0, 100.0);
        assert_eq!(bar.len(), BAR_COLUMNS + 2);
        assert!(!bar.contains(' '));
    }

    #[test]
    fn test_timeline_bar_placement() {
        let bar = timeline_bar(50.0, 25.0);
        assert_eq!(bar, format!("[{}{}{}]", " ".repeat(20), "=".repeat(10), " ".repeat(10)));
    }

    #[test]
    fn test_timeline_bar_never_overflows() {
        let bar = timeline_bar(100.0, 0.0);
        assert_eq!(bar.len(), BAR_COLUMNS + 2);
        assert!(bar.ends_with("=]"));
    }

    #[test]
    fn test_render_timeline_indents_children() {
        colored::control::set_override(false);
        let rows = vec![
            TimelineRow {
                depth: 0,
                span_id: "a".to_string(),
                label: "svc:root".to_string(),
                offset_percent: 0.0,
                width_percent: 100.0,
                total: 100,
                self_time: 60,
            },
            TimelineRow {
                depth: 1,
                span_id: "b".to_string(),
                label: "svc:child".to_string(),
                offset_percent: 10.0,
                width_percent: 40.0,
                total: 40,
                self_time: 40,
            },
        ];

        let text = render_timeline(&rows);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("svc:root "));
        assert!(lines[1].starts_with("  svc:child "));
        assert!(lines[1].contains("(self 40 ns)"));
    }
}
