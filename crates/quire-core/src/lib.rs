// SPDX-License-Identifier: MIT
//
// quire-core — Shared types, error taxonomy, configuration, and the
// natural-sort key used to order filesets deterministically.

pub mod config;
pub mod error;
pub mod sort;
pub mod types;

pub use config::EngineConfig;
pub use error::{QuireError, Result};
pub use sort::NaturalSortKey;
pub use types::*;
