//! Canopy - live syntax-tree viewer for external parsers.
//!
//! Runs a parser written in another language (a Lua program) as a
//! subprocess, captures the JSON syntax tree it prints, and serves an
//! interactive browser view of it that re-renders whenever the watched
//! sources change:
//! - Subprocess bridge extracting the last non-blank output line as JSON
//! - AST to display-tree transformation with ambiguity grouping
//! - SSE event channel for live reload and re-parse signaling
//! - Static file server for the bundled viewer

pub mod config;
pub mod error;
pub mod events;
pub mod files;
pub mod lines;
pub mod parser;
pub mod serve;
pub mod syntax;
pub mod transform;
pub mod viewport;
pub mod watch;
