// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Refresh token lifecycle: opaque secrets, persisted rows, and the
//! rotate-on-every-use store contract.

mod error;
mod memory;
mod record;
mod secret;
mod store;

pub use error::{TokenResult, TokenStoreError};
pub use memory::MemoryTokenStore;
pub use record::RefreshTokenRecord;
pub use secret::TokenSecret;
pub use store::{IssuedToken, RefreshTokenStore};
