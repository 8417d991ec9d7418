//! Converts word count application names to actual application code.
//!
//! # Example
//!
//! To get the whitespace word count application:
//! ```
//! # use anyhow::Result;
//! use mrl_wordcount::workload;
//! # fn main() -> Result<()> {
//! let wc = workload::named("wc")?;
//! # Ok(())
//! # }
//! ```

use anyhow::{bail, Result};

use crate::Workload;

pub mod sample;
pub mod wc;

/// Names accepted by [`named`].
pub const NAMES: [&str; 2] = ["wc", "wc-alnum"];

/// Gets the [`Workload`] named `name`.
///
/// Returns [`None`] if no application with the given name was found.
pub fn try_named(name: &str) -> Option<Workload> {
    match name {
        "wc" => Some(Workload {
            tokenize_fn: wc::tokenize,
            reduce_fn: wc::reduce,
        }),
        "wc-alnum" => Some(Workload {
            tokenize_fn: wc::tokenize_alphanumeric,
            reduce_fn: wc::reduce,
        }),
        _ => None,
    }
}

/// Gets the [`Workload`] named `name`.
///
/// Returns an [`anyhow::Error`] if no application with the given name was found.
pub fn named(name: &str) -> Result<Workload> {
    match try_named(name) {
        Some(app) => Ok(app),
        None => bail!(
            "No app named `{}` found (expected one of: {}).",
            name,
            NAMES.join(", ")
        ),
    }
}
