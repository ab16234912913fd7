//! Bounded-value binary trees with subtree search.
//!
//! Layers, innermost first:
//! - [`domain`]: arena-backed trees, builders, the pre-order codec, rendering and
//!   the subtree search engine
//! - [`application`]: services combining domain logic with I/O boundary traits
//! - [`infrastructure`]: real I/O implementations and service wiring
//! - [`cli`]: argument parsing, dispatch and the interactive menu

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
