// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! This module provides the command-line interface for warden using clap.
//! It supports multiple subcommands for different operations:
//!
//! - `run`: Start the authentication service (default)
//! - `validate`: Validate configuration file
//! - `version`: Show version information
//! - `gen-secret`: Generate a signing or service secret
//! - `mint-token`: Mint an access token for a subject
//! - `health`: Check service health

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// Warden - token-based request authentication service
///
/// Issues and rotates token pairs, validates every incoming request through
/// a fixed middleware chain, and records security-relevant decisions in an
/// append-only audit trail.
#[derive(Parser, Debug)]
#[command(
    name = "warden",
    author = "Sylvex <contact@sylvex.io>",
    version = warden_core::VERSION,
    about = "Token-based request authentication service (Enterprise Edition)",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "warden.yaml",
        env = "WARDEN_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "WARDEN_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, default_value = "text", env = "WARDEN_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Enable quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands for the warden CLI.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the authentication service
    ///
    /// This is the default command when no subcommand is specified.
    /// It starts the HTTP server with the full security middleware chain
    /// and serves until a shutdown signal arrives.
    Run(RunArgs),

    /// Validate the configuration file
    ///
    /// Parses and validates the configuration file without starting the
    /// service. Useful for checking configuration before deployment.
    Validate(ValidateArgs),

    /// Show detailed version information
    ///
    /// Displays version information for all components including
    /// build metadata.
    Version,

    /// Generate a random secret
    ///
    /// Generates a cryptographically secure secret suitable for the JWT
    /// signing key or the service-to-service shared secret.
    #[command(name = "gen-secret")]
    GenSecret(GenSecretArgs),

    /// Mint an access token for a subject
    ///
    /// Signs an access token with the configured key. Intended for
    /// smoke tests and operational debugging, not for production issuance.
    #[command(name = "mint-token")]
    MintToken(MintTokenArgs),

    /// Check service health
    ///
    /// Performs health checks on the configuration and the running service
    /// and reports status.
    Health(HealthArgs),
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Enable development mode (permissive CORS, detailed startup output)
    #[arg(long, env = "WARDEN_DEV_MODE")]
    pub dev_mode: bool,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `gen-secret` command.
#[derive(Args, Debug, Clone)]
pub struct GenSecretArgs {
    /// Output format for the secret
    #[arg(short, long, default_value = "base64")]
    pub format: SecretFormat,

    /// Secret length in bytes before encoding
    #[arg(short, long, default_value = "48")]
    pub length: usize,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `mint-token` command.
#[derive(Args, Debug, Clone)]
pub struct MintTokenArgs {
    /// Subject identifier to mint the token for
    pub subject: String,

    /// Subject email (default: derived from the subject identifier)
    #[arg(short, long)]
    pub email: Option<String>,

    /// Roles to grant, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub roles: Vec<String>,

    /// Permissions to grant, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub permissions: Vec<String>,

    /// Token lifetime in seconds (default: from configuration)
    #[arg(long)]
    pub expires_in: Option<i64>,
}

/// Arguments for the `health` command.
#[derive(Args, Debug, Clone)]
pub struct HealthArgs {
    /// Output format for health check results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Timeout for health checks in seconds
    #[arg(short, long, default_value = "10")]
    pub timeout: u64,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
    /// YAML format
    Yaml,
}

/// Secret output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SecretFormat {
    /// URL-safe base64 encoded
    #[default]
    Base64,
    /// Hexadecimal encoded
    Hex,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Check if verbose logging is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    /// Get the effective log level based on flags.
    pub fn effective_log_level(&self) -> &str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

impl Default for ValidateArgs {
    fn default() -> Self {
        Self {
            show_config: false,
            format: OutputFormat::Text,
            strict: false,
        }
    }
}

impl Default for GenSecretArgs {
    fn default() -> Self {
        Self {
            format: SecretFormat::Base64,
            length: 48,
            output: None,
        }
    }
}

impl Default for HealthArgs {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            timeout: 10,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
