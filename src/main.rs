/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::Parser;
mod cli;

pub fn main() -> Result<()> {
    env_logger::init();
    cli::main(cli::Cli::parse())
}
