// SPDX-License-Identifier: PMPL-1.0-or-later
//! accessscan - HTML accessibility scanner
//!
//! Analyses HTML with an external axe-style rule engine plus a set of
//! built-in checks, keeps a bounded history of saved reports, exports
//! results as text, CSV, JSON or PDF, and serves a small URL fetch proxy.
//!
//! ## Built-in checks
//!
//! - **Images** (1.1.1): `img` elements without `alt`
//! - **Forms** (1.3.1): inputs without an associated label
//! - **Contrast** (1.4.3): known low-contrast colour pairs (heuristic)
//! - **Skip link** (2.4.1): missing "skip to main" link
//! - **Semantic buttons** (4.1.2): `div`s with `role="button"`
//! - **Focus indicator** (2.4.7): `outline: none` (heuristic)
//! - **Target size** (2.5.5): 16px inline-sized links (heuristic)
//! - **Link text** (2.4.4): "click here" and similar

pub mod aggregate;
pub mod api;
pub mod checks;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod finding;
pub mod scanner;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
