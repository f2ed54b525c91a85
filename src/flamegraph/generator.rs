//! SVG flamegraph generation from flame profiles.
//!
//! Renders a `FlameProfile` directly:
//! - Color coding by span kind (HTTP, database, messaging, ...)
//! - Inverted layout (Root at bottom)
//! - Horizontal position taken from each sample's time offset

use super::profile::{FlameProfile, Sample};
use crate::parser::schema::HotSpan;
use crate::utils::error::FlamegraphError;
use log::info;

/// Categories for flamegraph nodes to determine colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    Http,
    Database,
    Cache,
    Messaging,
    Rpc,
    Internal,
    Root,
}

impl NodeCategory {
    /// Classify a node based on its "service:name" label
    pub fn from_label(label: &str) -> Self {
        let name = label
            .split_once(':')
            .map(|(_, name)| name)
            .unwrap_or(label)
            .to_ascii_lowercase();

        if name == "total" {
            Self::Root
        } else if ["get ", "post ", "put ", "patch ", "delete ", "http"]
            .iter()
            .any(|p| name.starts_with(p))
        {
            Self::Http
        } else if ["redis", "memcache", "cache"].iter().any(|p| name.contains(p)) {
            Self::Cache
        } else if ["select", "insert", "update ", "sql", "db.", "query", "mongo"]
            .iter()
            .any(|p| name.contains(p))
        {
            Self::Database
        } else if ["kafka", "publish", "consume", "queue", "amqp"]
            .iter()
            .any(|p| name.contains(p))
        {
            Self::Messaging
        } else if name.contains("grpc") || name.contains("rpc") {
            Self::Rpc
        } else {
            Self::Internal
        }
    }
}

/// Flamegraph configuration
#[derive(Debug, Clone)]
pub struct FlamegraphConfig {
    pub title: String,
    pub width: usize,
}

impl Default for FlamegraphConfig {
    fn default() -> Self {
        Self {
            title: "Linsight Trace Profile".to_string(),
            width: 1200,
        }
    }
}

impl FlamegraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }
}

/// Generate SVG flamegraph from a flame profile
pub fn generate_flamegraph(
    profile: &FlameProfile,
    config: Option<&FlamegraphConfig>,
) -> Result<String, FlamegraphError> {
    if profile.is_empty() {
        return Err(FlamegraphError::EmptyProfile);
    }

    let config = config.cloned().unwrap_or_default();
    let levels = profile.flamebearer.levels.len();
    info!(
        "Generating flamegraph with {} samples over {} levels",
        profile.flamebearer.names.len(),
        levels
    );

    let mut svg_content = String::new();
    let width = config.width;
    let height_per_level = 20;
    let graph_height = levels * height_per_level;
    let legend_height = 80;
    let total_height = graph_height + legend_height;

    // Header
    svg_content.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        width, total_height, width, total_height
    ));

    // Styles
    svg_content.push_str(
        r#"<style>.func { font: 12px sans-serif; } .func:hover { stroke: black; stroke-width: 1; cursor: pointer; opacity: 0.9; }</style>"#
    );

    // Title
    svg_content.push_str(&format!(
        r#"<text x="{}" y="20" font-size="16" text-anchor="middle" font-weight="bold">{}</text>"#,
        width / 2,
        escape_xml(&config.title)
    ));

    // Widest root defines the time scale when there are several
    let scale_ticks = profile
        .samples(0)
        .iter()
        .map(|s| s.offset.saturating_add(s.total))
        .max()
        .unwrap_or(0)
        .max(profile.flamebearer.num_ticks)
        .max(1);

    let mut ctx = RenderContext {
        output: &mut svg_content,
        line_height: height_per_level,
        graph_height,
        px_per_tick: width as f64 / scale_ticks as f64,
        units: &profile.metadata.units,
    };

    for level in 0..levels {
        for sample in profile.samples(level) {
            let name = profile.name(&sample).unwrap_or("?");
            render_sample(&sample, name, level, &mut ctx);
        }
    }

    render_legend(&mut svg_content, graph_height);

    svg_content.push_str("</svg>");

    info!(
        "Flamegraph generated successfully ({} bytes)",
        svg_content.len()
    );
    Ok(svg_content)
}

fn get_node_color(category: NodeCategory) -> &'static str {
    match category {
        NodeCategory::Http => "rgb(70, 130, 180)",      // Steel Blue
        NodeCategory::Database => "rgb(255, 140, 0)",   // Dark Orange
        NodeCategory::Cache => "rgb(34, 139, 34)",      // Forest Green
        NodeCategory::Messaging => "rgb(138, 43, 226)", // Blue Violet
        NodeCategory::Rpc => "rgb(100, 149, 237)",      // Cornflower Blue
        NodeCategory::Root => "rgb(75, 0, 130)",        // Indigo
        NodeCategory::Internal => "rgb(169, 169, 169)", // Gray
    }
}

fn get_ansi_color(category: NodeCategory) -> &'static str {
    match category {
        NodeCategory::Http => "\x1b[34m",      // Blue
        NodeCategory::Database => "\x1b[33m",  // Yellow
        NodeCategory::Cache => "\x1b[32m",     // Green
        NodeCategory::Messaging => "\x1b[35m", // Magenta
        NodeCategory::Rpc => "\x1b[36m",       // Cyan
        NodeCategory::Root => "\x1b[37;1m",    // Bold White
        NodeCategory::Internal => "\x1b[90m",  // Gray
    }
}

struct RenderContext<'a> {
    output: &'a mut String,
    line_height: usize,
    graph_height: usize,
    px_per_tick: f64,
    units: &'a str,
}

fn render_sample(sample: &Sample, name: &str, level: usize, ctx: &mut RenderContext) {
    let x = sample.offset as f64 * ctx.px_per_tick;
    let w = sample.total as f64 * ctx.px_per_tick;
    if w < 0.5 {
        return;
    } // Optimization: Don't render invisible blocks

    let color = get_node_color(NodeCategory::from_label(name));

    // Y position (Inverted: Graph Bottom - (Level * Height))
    // We add margin for title (30px)
    let y = (ctx.graph_height as f64)
        - (level as f64 * ctx.line_height as f64)
        - (ctx.line_height as f64)
        + 30.0;

    ctx.output.push_str(&format!(
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{}" fill="{}" stroke="white" stroke-width="0.5" class="func">"#,
        x, y, w, ctx.line_height, color
    ));
    ctx.output.push_str(&format!(
        r#"<title>{}: {} {} total / {} self</title></rect>"#,
        escape_xml(name),
        sample.total,
        ctx.units,
        sample.self_time
    ));

    if let Some(display_name) = get_truncated_name(name, w) {
        ctx.output.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" dx="4" dy="14" font-size="12" fill="white" pointer-events="none">{}</text>"#,
            x,
            y,
            escape_xml(&display_name)
        ));
    }
}

/// Calculate truncated name for a node based on width
pub fn get_truncated_name(name: &str, width: f64) -> Option<String> {
    const MIN_LABEL_WIDTH: f64 = 35.0;
    const CHAR_WIDTH: f64 = 7.0;

    if width <= MIN_LABEL_WIDTH {
        return None;
    }

    let max_chars = (width / CHAR_WIDTH) as usize;
    let char_count = name.chars().count();
    if char_count > max_chars && max_chars > 3 {
        let head: String = name.chars().take(max_chars - 3).collect();
        Some(format!("{}...", head))
    } else if !name.is_empty() {
        Some(name.to_string())
    } else {
        None
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_legend(out: &mut String, graph_height: usize) {
    let legend_y = graph_height + 50;

    out.push_str(&format!(
        r#"<text x="10" y="{}" font-size="14" font-weight="bold">Legend:</text>"#,
        legend_y
    ));

    let items = [
        ("HTTP", get_node_color(NodeCategory::Http)),
        ("Database", get_node_color(NodeCategory::Database)),
        ("Cache", get_node_color(NodeCategory::Cache)),
        ("Messaging", get_node_color(NodeCategory::Messaging)),
        ("RPC", get_node_color(NodeCategory::Rpc)),
        ("Internal", get_node_color(NodeCategory::Internal)),
    ];

    for (i, (label, color)) in items.iter().enumerate() {
        let x = 80 + (i * 120);
        out.push_str(&format!(
            r#"<rect x="{}" y="{}" width="15" height="15" fill="{}" rx="2"/>"#,
            x,
            legend_y - 12,
            color
        ));
        out.push_str(&format!(
            r#"<text x="{}" y="{}" font-size="12">{}</text>"#,
            x + 20,
            legend_y,
            label
        ));
    }
}

/// Create a rich text summary with percentages and table formatting
pub fn generate_text_summary(hot_spans: &[HotSpan], max_lines: usize) -> String {
    let mut lines = Vec::new();

    lines.extend(render_hot_span_table(hot_spans, max_lines));
    lines.push("".to_string());
    lines.extend(render_ascii_flamegraph(hot_spans));

    if hot_spans.len() > max_lines {
        lines.push("".to_string());
        lines.push(format!(
            "   (Showing top {} of {} spans)",
            max_lines,
            hot_spans.len()
        ));
    }

    lines.join("\n")
}

/// Helper to render the hot span table for terminal output
fn render_hot_span_table(hot_spans: &[HotSpan], max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("  HOT SPANS (by self time)".to_string());
    lines.push("  ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━┳━━━━━━━━━┓".to_string());
    lines.push(format!(
        "  ┃ {:<42} ┃ {:^12} ┃ {:^12} ┃ {:^7} ┃",
        "Span (Hottest First)", "SELF (ns)", "TOTAL (ns)", "%"
    ));
    lines.push("  ┣━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━╋━━━━━━━━━┫".to_string());

    for span in hot_spans.iter().take(max_lines) {
        let color = get_ansi_color(NodeCategory::from_label(&span.label));
        let reset = "\x1b[0m";

        lines.push(format!(
            "  ┃ {}{:<42}{} ┃ {:>12} ┃ {:>12} ┃ {:>6.1}% ┃",
            color,
            truncate_label(&span.label, 42),
            reset,
            span.self_time,
            span.total,
            span.percentage
        ));
    }

    lines.push("  ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━┻━━━━━━━━━┛".to_string());
    lines
}

/// Helper to render the ASCII flamegraph visualization
fn render_ascii_flamegraph(hot_spans: &[HotSpan]) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("  SELF TIME SHARE".to_string());

    for span in hot_spans.iter().take(5) {
        let bar_width = (span.percentage / 2.0) as usize; // Max 50 chars
        let bar = "█".repeat(bar_width.min(50));

        let color = get_ansi_color(NodeCategory::from_label(&span.label));
        let reset = "\x1b[0m";

        lines.push(format!(
            "  └─ {}{:<30}{} {}{:50}{} {:>5.1}%",
            color,
            truncate_label(&span.label, 30),
            reset,
            color,
            bar,
            reset,
            span.percentage
        ));
    }
    lines
}

/// Helper to truncate labels with a leading ellipsis for table display
fn truncate_label(s: &str, max_len: usize) -> String {
    let count = s.chars().count();
    if count > max_len {
        let tail: String = s.chars().skip(count - (max_len - 3)).collect();
        format!("...{}", tail)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("short", 10), "short");
        assert_eq!(truncate_label("svc:very_long_operation", 10), "...eration");
    }
}
