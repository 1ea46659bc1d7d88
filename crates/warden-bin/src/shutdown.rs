// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Graceful shutdown coordination.
//!
//! This module coordinates graceful shutdown across the service. It handles
//! OS signals (SIGTERM, SIGINT, SIGQUIT on Unix; Ctrl+C on Windows) and lets
//! components subscribe to shutdown notifications so in-flight requests can
//! drain before the process exits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;
use tracing::info;

// =============================================================================
// ShutdownCoordinator
// =============================================================================

/// Coordinates graceful shutdown across the service.
///
/// The coordinator provides:
/// - A broadcast channel for notifying all components of shutdown
/// - Signal handling for SIGTERM/SIGINT/SIGQUIT (Unix) or Ctrl+C (Windows)
/// - A future that resolves when shutdown is initiated
///
/// # Example
///
/// ```ignore
/// use warden_bin::shutdown::ShutdownCoordinator;
///
/// let coordinator = ShutdownCoordinator::new();
/// let signal = coordinator.shutdown_signal();
///
/// tokio::spawn({
///     let coordinator = coordinator.clone();
///     async move { coordinator.wait_for_shutdown().await }
/// });
///
/// // Hand `signal.wait()` to the server's graceful shutdown hook.
/// server.run_with_shutdown(signal.wait()).await?;
/// ```
#[derive(Clone)]
pub struct ShutdownCoordinator {
    sender: broadcast::Sender<()>,
    initiated: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    /// Creates a new shutdown coordinator.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender,
            initiated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribes to shutdown notifications.
    ///
    /// Returns a receiver that yields one message when shutdown is initiated.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Creates a future handle that resolves when shutdown is signaled.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
            initiated: self.initiated.clone(),
        }
    }

    /// Initiates shutdown and notifies all subscribers. Idempotent.
    pub fn initiate_shutdown(&self) {
        if self
            .initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!("Shutdown initiated");
            let _ = self.sender.send(());
        }
    }

    /// Returns true if shutdown has been initiated.
    pub fn is_shutdown_initiated(&self) -> bool {
        self.initiated.load(Ordering::SeqCst)
    }

    /// Waits for an OS shutdown signal, then notifies all subscribers.
    ///
    /// Returns immediately if shutdown was already initiated by another
    /// caller.
    pub async fn wait_for_shutdown(&self) {
        if self.initiated.load(Ordering::SeqCst) {
            return;
        }

        wait_for_os_signal().await;
        self.initiate_shutdown();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocks until the process receives a termination signal.
async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
        let mut sigint =
            signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");
        let mut sigquit = signal(SignalKind::quit()).expect("Failed to register SIGQUIT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
            _ = sigquit.recv() => {
                info!("Received SIGQUIT");
            }
        }
    }

    #[cfg(windows)]
    {
        use tokio::signal::ctrl_c;

        ctrl_c().await.expect("Failed to register Ctrl+C handler");
        info!("Received Ctrl+C");
    }
}

// =============================================================================
// ShutdownSignal
// =============================================================================

/// A handle that resolves once shutdown is signaled.
///
/// Obtained from [`ShutdownCoordinator::shutdown_signal`]; the future
/// returned by [`wait`](Self::wait) is what gets handed to APIs expecting a
/// graceful shutdown future (like axum's `with_graceful_shutdown`).
pub struct ShutdownSignal {
    receiver: broadcast::Receiver<()>,
    initiated: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Waits for the shutdown signal.
    ///
    /// Resolves immediately if shutdown was initiated before this handle
    /// started waiting.
    pub async fn wait(mut self) {
        if self.initiated.load(Ordering::SeqCst) {
            return;
        }

        // A lagged or closed channel still means shutdown was requested.
        let _ = self.receiver.recv().await;
    }
}

// =============================================================================
// Tests
// =============================================================================
