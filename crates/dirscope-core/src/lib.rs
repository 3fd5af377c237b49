/// dirscope Core — scanning, layout, and data model.
///
/// This crate contains all business logic with zero UI dependencies.
/// It is designed to be reusable across different frontends (GUI, CLI, TUI).
///
/// # Modules
///
/// - [`model`] — Arena-allocated size tree and supporting types.
/// - [`scanner`] — Background filesystem scanning with progress reporting
///   and cooperative cancellation.
/// - [`layout`] — Squarified treemap layout (Bruls–Huizing–van Wijk).
/// - [`color`] — Deterministic path-derived hue assignment.
/// - [`zoom`] — Zoom stack selecting which subtree is laid out.
pub mod color;
pub mod layout;
pub mod model;
pub mod scanner;
pub mod zoom;
