//! Pipeline stages for document-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch extraction backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ extract ──▶ markdown
//! (scratch)  (per-format) (assembly + cleanup)
//! ```
//!
//! 1. [`extract`]  — pull text out of the scratch artifact; dispatches on
//!    the filename extension and runs inside `spawn_blocking` because the
//!    extraction libraries are not async-safe
//! 2. [`markdown`] — assemble the extracted content into Markdown and apply
//!    deterministic cleanup rules (line endings, whitespace, blank lines)

pub mod extract;
pub mod markdown;
