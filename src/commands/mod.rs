//! Subcommands of the `boc` binary.

pub mod calc;
pub mod parse;
pub mod run;

use anyhow::{Context, Result};
use std::path::Path;

pub(crate) fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
