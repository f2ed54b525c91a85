//! Rebuild span trees from flat trace-query results.
//!
//! Spans arrive as flat lists grouped by process. We link them through
//! `parent_span_id`, merge same-named siblings and annotate every node
//! with total / self time plus the timing of the root it belongs to.
//!
//! Example: spans `a (100ns)` and `b (40ns, parent a)` give one root `a`
//! with `total = 100`, `self = 60` and a child `b` with `total = self = 40`.

use crate::parser::schema::{Span, Trace};
use crate::utils::config::{UNKNOWN_SERVICE, UNNAMED_SPAN};
use log::{debug, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A span placed in the tree, with derived timing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanNode {
    pub span: Span,

    pub children: Vec<SpanNode>,

    /// Own duration, or the children's sum when the span has none
    pub total: u64,

    /// `total` minus the children's total, never below zero
    pub self_time: u64,

    /// Start time of the root of this subtree
    pub trace_start: u64,

    /// Total time of the root of this subtree
    pub trace_total: u64,
}

impl SpanNode {
    fn new(span: Span) -> Self {
        Self {
            span,
            children: Vec::new(),
            total: 0,
            self_time: 0,
            trace_start: 0,
            trace_total: 0,
        }
    }

    pub fn span_id(&self) -> &str {
        &self.span.span_id
    }

    pub fn name(&self) -> Option<&str> {
        self.span.name.as_deref()
    }

    /// "service:name" label used by the flame profile and reports
    pub fn label(&self) -> String {
        format!(
            "{}:{}",
            self.span.service_name().unwrap_or(UNKNOWN_SERVICE),
            self.name().unwrap_or(UNNAMED_SPAN)
        )
    }

    /// Start offset relative to the root of this subtree
    pub fn offset(&self) -> u64 {
        self.span.start_time.saturating_sub(self.trace_start)
    }

    fn children_total(&self) -> u64 {
        self.children
            .iter()
            .fold(0u64, |acc, child| acc.saturating_add(child.total))
    }

    /// Visit this node and all descendants in pre-order with their depth
    pub fn walk<'a, F>(&'a self, depth: usize, visit: &mut F)
    where
        F: FnMut(&'a SpanNode, usize),
    {
        let mut stack = vec![(self, depth)];
        while let Some((node, depth)) = stack.pop() {
            visit(node, depth);
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
    }
}

// Deep span chains would otherwise recurse once per level on drop
impl Drop for SpanNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Result of tree reconstruction
#[derive(Debug, Clone, Default)]
pub struct TraceTree {
    /// Root spans in first-seen order
    pub roots: Vec<SpanNode>,

    /// Every stamped span by id (last write wins on collisions)
    pub spans: HashMap<String, Span>,
}

impl TraceTree {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of nodes reachable from the roots (merged siblings count once)
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        for root in &self.roots {
            root.walk(0, &mut |_, _| count += 1);
        }
        count
    }

    /// Find a node in the tree by span id
    pub fn find(&self, span_id: &str) -> Option<&SpanNode> {
        let mut found = None;
        for root in &self.roots {
            root.walk(0, &mut |node, _| {
                if found.is_none() && node.span_id() == span_id {
                    found = Some(node);
                }
            });
        }
        found
    }
}

/// Build annotated span trees from a list of traces
///
/// **Public** - main entry point for tree reconstruction
///
/// # Algorithm
/// 1. Stamp each span with its trace's process and index it by id
/// 2. Link spans to their parents; unresolvable parents make orphan roots
/// 3. Post-process each root depth-first: merge same-named siblings,
///    compute total / self time, then propagate the root's timing down
pub fn build_trace_tree(traces: &[Trace]) -> TraceTree {
    let (spans, index) = index_spans(traces);
    debug!(
        "Indexed {} unique spans from {} traces",
        spans.len(),
        traces.len()
    );

    let (mut roots, mut children, parent_of) = link_spans(&spans, &index);
    break_cycles(&mut roots, &mut children, &parent_of, &spans);

    let mut built: Vec<Option<SpanNode>> = Vec::new();
    built.resize_with(spans.len(), || None);

    let root_nodes: Vec<SpanNode> = roots
        .iter()
        .filter_map(|&pos| {
            let mut node = assemble(pos, &spans, &children, &mut built)?;
            let (start, total) = (node.span.start_time, node.total);
            propagate_trace_timing(&mut node, start, total);
            Some(node)
        })
        .collect();

    debug!("Built {} root spans", root_nodes.len());

    TraceTree {
        roots: root_nodes,
        spans: spans
            .into_iter()
            .map(|span| (span.span_id.clone(), span))
            .collect(),
    }
}

/// Merge sibling spans that share a name
///
/// **Public** - exposed for views that regroup nodes themselves
///
/// The first node of each group is kept (its own subtree included); its
/// duration and total become the group's sums and its self time is
/// recomputed. Groups keep first-seen order.
pub fn group_spans(nodes: Vec<SpanNode>) -> Vec<SpanNode> {
    let mut groups: Vec<SpanNode> = Vec::with_capacity(nodes.len());
    let mut by_name: HashMap<Option<String>, usize> = HashMap::new();

    for node in nodes {
        match by_name.get(&node.span.name) {
            Some(&pos) => merge_sibling(&mut groups[pos], &node),
            None => {
                by_name.insert(node.span.name.clone(), groups.len());
                groups.push(node);
            }
        }
    }

    groups
}

/// Fold `other` into the kept group head
fn merge_sibling(kept: &mut SpanNode, other: &SpanNode) {
    kept.span.duration = match (kept.span.duration, other.span.duration) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0).saturating_add(b.unwrap_or(0))),
    };
    kept.total = kept.total.saturating_add(other.total);
    kept.self_time = kept.total.saturating_sub(kept.children_total());
}

/// Stamp spans with their process and dedupe by id
///
/// **Private** - step 1 of build_trace_tree
fn index_spans(traces: &[Trace]) -> (Vec<Span>, HashMap<String, usize>) {
    let mut spans: Vec<Span> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for trace in traces {
        for span in &trace.spans {
            let mut span = span.clone();
            span.process = Some(trace.process.clone());

            match index.get(&span.span_id) {
                Some(&pos) => {
                    debug!("Span id {} seen twice, keeping the later one", span.span_id);
                    spans[pos] = span;
                }
                None => {
                    index.insert(span.span_id.clone(), spans.len());
                    spans.push(span);
                }
            }
        }
    }

    (spans, index)
}

/// Resolve parent links
///
/// **Private** - step 2 of build_trace_tree
#[allow(clippy::type_complexity)]
fn link_spans(
    spans: &[Span],
    index: &HashMap<String, usize>,
) -> (Vec<usize>, Vec<Vec<usize>>, Vec<Option<usize>>) {
    let mut roots = Vec::new();
    let mut children = vec![Vec::new(); spans.len()];
    let mut parent_of = vec![None; spans.len()];

    for (pos, span) in spans.iter().enumerate() {
        let Some(parent_id) = span.parent_span_id.as_deref() else {
            roots.push(pos);
            continue;
        };

        match index.get(parent_id) {
            Some(&parent) if parent != pos => {
                children[parent].push(pos);
                parent_of[pos] = Some(parent);
            }
            _ => {
                debug!(
                    "Span {} references missing parent {}, promoting to root",
                    span.span_id, parent_id
                );
                roots.push(pos);
            }
        }
    }

    (roots, children, parent_of)
}

/// Promote one member of each parent cycle to a root
///
/// **Private** - spans on a cycle are never reached from a root otherwise
fn break_cycles(
    roots: &mut Vec<usize>,
    children: &mut [Vec<usize>],
    parent_of: &[Option<usize>],
    spans: &[Span],
) {
    let mut reachable = vec![false; spans.len()];
    for &root in roots.iter() {
        mark_reachable(root, children, &mut reachable);
    }

    for pos in 0..spans.len() {
        if reachable[pos] {
            continue;
        }

        // Walk up until a node repeats; that node sits on the cycle
        let mut seen = HashSet::new();
        let mut on_cycle = pos;
        while seen.insert(on_cycle) {
            match parent_of[on_cycle] {
                Some(parent) => on_cycle = parent,
                None => break,
            }
        }

        let mut head = on_cycle;
        let mut cursor = parent_of[on_cycle];
        while let Some(member) = cursor {
            if member == on_cycle {
                break;
            }
            head = head.min(member);
            cursor = parent_of[member];
        }

        warn!(
            "Span {} is part of a parent cycle, promoting to root",
            spans[head].span_id
        );
        if let Some(parent) = parent_of[head] {
            children[parent].retain(|&child| child != head);
        }
        roots.push(head);
        mark_reachable(head, children, &mut reachable);
    }
}

fn mark_reachable(start: usize, children: &[Vec<usize>], reachable: &mut [bool]) {
    let mut stack = vec![start];
    while let Some(pos) = stack.pop() {
        if reachable[pos] {
            continue;
        }
        reachable[pos] = true;
        stack.extend(children[pos].iter().copied());
    }
}

/// Materialise and annotate the owned subtree rooted at `pos`
///
/// Nodes are built in reverse pre-order so every child exists before its
/// parent: siblings are merged, then total and self time computed.
fn assemble(
    pos: usize,
    spans: &[Span],
    children: &[Vec<usize>],
    built: &mut [Option<SpanNode>],
) -> Option<SpanNode> {
    let mut order = Vec::new();
    let mut stack = vec![pos];
    while let Some(current) = stack.pop() {
        order.push(current);
        stack.extend(children[current].iter().copied());
    }

    for &current in order.iter().rev() {
        let kids: Vec<SpanNode> = children[current]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();

        let mut node = SpanNode::new(spans[current].clone());
        node.children = group_spans(kids);
        annotate(&mut node);
        built[current] = Some(node);
    }

    built[pos].take()
}

/// Compute total and self time from already-merged children
fn annotate(node: &mut SpanNode) {
    let children_total = node.children_total();
    node.total = node.span.duration.unwrap_or(children_total);
    node.self_time = node.total.saturating_sub(children_total);
}

fn propagate_trace_timing(root: &mut SpanNode, trace_start: u64, trace_total: u64) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        node.trace_start = trace_start;
        node.trace_total = trace_total;
        stack.extend(node.children.iter_mut());
    }
}
