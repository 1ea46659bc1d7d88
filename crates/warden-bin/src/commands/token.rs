// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of secret generation and token minting commands.

use std::fs;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;

use warden_api::JwtManager;
use warden_config::ConfigLoader;
use warden_core::SubjectProfile;

use crate::cli::{Cli, GenSecretArgs, MintTokenArgs, SecretFormat};
use crate::error::{BinError, BinResult};
use crate::runtime::jwt_config_from;

// =============================================================================
// gen-secret
// =============================================================================

/// Executes the `gen-secret` command to generate a random secret.
pub fn gen_secret(_cli: &Cli, args: GenSecretArgs) -> BinResult<()> {
    if args.length < warden_config::JwtConfig::MIN_SECRET_LEN {
        return Err(BinError::Configuration(format!(
            "Secret length must be at least {} bytes",
            warden_config::JwtConfig::MIN_SECRET_LEN
        )));
    }

    let mut bytes = vec![0u8; args.length];
    getrandom::fill(&mut bytes)
        .map_err(|e| BinError::Runtime(format!("Failed to gather entropy: {}", e)))?;

    let output = match args.format {
        SecretFormat::Base64 => URL_SAFE_NO_PAD.encode(&bytes),
        SecretFormat::Hex => hex::encode(&bytes),
    };

    if let Some(path) = &args.output {
        fs::write(path, &output)
            .map_err(|e| BinError::Io(format!("Failed to write secret file: {}", e)))?;
        eprintln!("Secret written to: {}", path.display());
    } else {
        println!("{}", output);
    }

    eprintln!();
    eprintln!("Store this secret securely! Typical uses:");
    eprintln!("  - JWT signing key:  export WARDEN_JWT_SECRET=<secret>");
    eprintln!("  - Service secret:   export WARDEN_SERVICE_SECRET=<secret>");

    Ok(())
}

// =============================================================================
// mint-token
// =============================================================================

/// Executes the `mint-token` command to sign an access token.
///
/// The token is signed with the configured key, so it passes validation on a
/// service running the same configuration. Intended for smoke tests and
/// operational debugging.
pub fn mint_token(cli: &Cli, args: MintTokenArgs) -> BinResult<()> {
    let config = ConfigLoader::new().load(&cli.config)?;

    let mut jwt_config = jwt_config_from(&config)?;
    if let Some(expires_in) = args.expires_in {
        if expires_in <= 0 {
            return Err(BinError::Configuration(
                "--expires-in must be a positive number of seconds".to_string(),
            ));
        }
        jwt_config.expires_in_secs = expires_in;
    }

    let manager = JwtManager::new(jwt_config)?;

    let email = args
        .email
        .clone()
        .unwrap_or_else(|| format!("{}@minted.local", args.subject));

    let mut profile = SubjectProfile::new(&args.subject, email);
    profile.roles = args.roles.clone();
    profile.permissions = args.permissions.clone();

    let token = manager.create_access_token(&profile)?;

    println!("{}", token);

    eprintln!();
    eprintln!("Subject:     {}", args.subject);
    if !args.roles.is_empty() {
        eprintln!("Roles:       {}", args.roles.join(", "));
    }
    if !args.permissions.is_empty() {
        eprintln!("Permissions: {}", args.permissions.join(", "));
    }
    let expires_at = Utc::now() + chrono::Duration::seconds(manager.expiration_secs());
    eprintln!("Expires:     {}", expires_at.to_rfc3339());

    Ok(())
}
