// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use tracing::info;

use crate::cli::{Cli, RunArgs};
use crate::error::BinResult;
use crate::runtime::RuntimeBuilder;

/// Executes the `run` command to start the service.
pub async fn run(cli: &Cli, args: RunArgs) -> BinResult<()> {
    info!("Starting warden...");

    // Build the runtime
    let runtime = RuntimeBuilder::new()
        .config_path(&cli.config)
        .dev_mode(args.dev_mode)
        .build()
        .map_err(|e| e.with_context("Failed to start the warden service"))?;

    // Serve until shutdown
    runtime.run().await
}
