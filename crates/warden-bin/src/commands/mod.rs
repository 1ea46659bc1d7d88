// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! This module contains the implementation of all CLI commands:
//!
//! - `run`: Start the authentication service
//! - `validate`: Validate configuration file
//! - `version`: Show version information
//! - `gen-secret`: Generate a signing or service secret
//! - `mint-token`: Mint an access token for a subject
//! - `health`: Check service health

mod health;
mod run;
mod token;
mod validate;
mod version;

pub use health::health_check;
pub use run::run;
pub use token::{gen_secret, mint_token};
pub use validate::validate;
pub use version::version;

use crate::cli::{Cli, Commands};
use crate::error::BinResult;

/// Executes the appropriate command based on CLI arguments.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Run(args) => run::run(&cli, args).await,
        Commands::Validate(args) => validate::validate(&cli, args),
        Commands::Version => version::version(&cli),
        Commands::GenSecret(args) => token::gen_secret(&cli, args),
        Commands::MintToken(args) => token::mint_token(&cli, args),
        Commands::Health(args) => health::health_check(&cli, args).await,
    }
}
