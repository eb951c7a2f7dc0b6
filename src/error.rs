/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The error taxonomy a packing run can surface.
//!
//! `PackingError` is the closed, matchable set a library caller reasons
//! about; the CLI front end wraps it in [`anyhow::Error`] and adds ad hoc
//! context with `.with_context(...)`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackingError {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("run timed out after {elapsed_secs}s (cap {cap_secs}s)")]
    Timeout { elapsed_secs: f64, cap_secs: f64 },
}

pub type Result<T> = std::result::Result<T, PackingError>;
