//! Per-test HTML reports for Playwright runs.
//!
//! Lifecycle events from the host runner arrive as NDJSON, are folded into a
//! step tree per test execution, and each finished execution is rendered to
//! its own self-contained HTML file.

pub mod attachments;
pub mod config;
pub mod events;
pub mod failure;
pub mod models;
pub mod recorder;
pub mod render;
pub mod reporter;
pub mod selection;
pub mod source;
pub mod writer;

pub use reporter::{Reporter, drive};
