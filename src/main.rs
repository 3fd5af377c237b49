//! dirscope — directory treemap analyser.
//!
//! Thin binary entry point. All scanning and layout logic lives in the
//! `dirscope-core` crate; this consumer drains progress to the terminal
//! and renders the completed tree as a table plus a coarse character-cell
//! treemap.

use anyhow::Context;
use chrono::{DateTime, Local};
use dirscope_core::layout::{layout, Rect};
use dirscope_core::model::size::{format_count, format_size};
use dirscope_core::model::{NodeKind, SizeTree};
use dirscope_core::scanner::{start_scan, ScanEvent, ScanOptions};
use std::path::PathBuf;

/// Character-cell viewport for the text treemap.
const MAP_WIDTH: usize = 78;
const MAP_HEIGHT: usize = 22;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    // Optional start directory, handed to the scanner unchanged.
    let root = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let handle = start_scan(root.clone(), ScanOptions::default());

    // Status line while the worker runs; the loop ends when the scanner
    // thread drops its sender.
    for event in handle.events.clone() {
        match event {
            ScanEvent::Visiting { path } => {
                eprint!("\r\x1b[2KScanning: {}", path.display());
            }
            ScanEvent::Completed {
                duration,
                error_count,
            } => {
                eprintln!(
                    "\r\x1b[2KScan completed in {duration:.2?} ({error_count} unreadable entries)"
                );
            }
            ScanEvent::Cancelled => eprintln!("\r\x1b[2KScan cancelled."),
            ScanEvent::Failed { message } => eprintln!("\r\x1b[2KScan failed: {message}"),
        }
    }

    let tree = handle
        .join()
        .with_context(|| format!("scanning {}", root.display()))?;

    print_summary(&tree);
    print_treemap(&tree)?;
    Ok(())
}

/// Label for a child row: directories get a trailing slash, the synthetic
/// bucket reports how many entries it hides.
fn child_label(tree: &SizeTree, node: dirscope_core::model::NodeIndex) -> String {
    let n = tree.node(node);
    match &n.kind {
        NodeKind::Others { hidden_count } => {
            format!("(others: {} entries)", format_count(*hidden_count))
        }
        NodeKind::Entry { .. } if n.is_dir => format!("{}/", n.name),
        NodeKind::Entry { .. } => n.name.to_string(),
    }
}

fn print_summary(tree: &SizeTree) {
    let root = tree.root();
    let node = tree.node(root);
    println!();
    println!(
        "{}  —  {}",
        node.path.display(),
        format_size(tree.total_size)
    );
    println!("{:<36} {:>10} {:>6}  {}", "NAME", "SIZE", "%", "MODIFIED");

    for &child in tree.children(root) {
        let c = tree.node(child);
        let percent = if tree.total_size > 0 {
            100.0 * c.size as f64 / tree.total_size as f64
        } else {
            0.0
        };
        let modified = c
            .meta()
            .and_then(|m| m.modified)
            .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<36} {:>10} {percent:>5.1}%  {modified}",
            child_label(tree, child),
            format_size(c.size),
        );
    }
}

fn print_treemap(tree: &SizeTree) -> anyhow::Result<()> {
    let bounds = Rect::new(0.0, 0.0, MAP_WIDTH as f64, MAP_HEIGHT as f64);
    let rects = layout(tree, tree.root(), bounds)?;
    if rects.is_empty() {
        return Ok(());
    }

    let glyphs: Vec<char> = ('A'..='Z').chain('a'..='z').chain('0'..='9').collect();
    let mut grid = vec![[' '; MAP_WIDTH]; MAP_HEIGHT];

    for (i, lr) in rects.iter().enumerate() {
        let glyph = glyphs[i % glyphs.len()];
        let x0 = lr.rect.x.round().max(0.0) as usize;
        let y0 = lr.rect.y.round().max(0.0) as usize;
        let x1 = ((lr.rect.x + lr.rect.width).round() as usize).min(MAP_WIDTH);
        let y1 = ((lr.rect.y + lr.rect.height).round() as usize).min(MAP_HEIGHT);
        for row in grid.iter_mut().take(y1).skip(y0) {
            for cell in row.iter_mut().take(x1).skip(x0) {
                *cell = glyph;
            }
        }
    }

    println!();
    println!("+{}+", "-".repeat(MAP_WIDTH));
    for row in &grid {
        println!("|{}|", row.iter().collect::<String>());
    }
    println!("+{}+", "-".repeat(MAP_WIDTH));

    for (i, lr) in rects.iter().take(glyphs.len()).enumerate() {
        let n = tree.node(lr.node);
        if n.size == 0 {
            continue;
        }
        println!(
            "  {}  {:<36} {}",
            glyphs[i],
            child_label(tree, lr.node),
            format_size(n.size)
        );
    }
    Ok(())
}
