//! # Shutdown Coordination
//!
//! One [`ShutdownToken`] is shared by every task the supervisor launches.
//! Runners only get a [`ShutdownObserver`] and can wait on the token but not
//! trigger it. The [`ShutdownListener`] triggers it when an OS signal arrives.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tokio::signal;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::info;

use crate::error::SupervisorError;
use crate::supervisor::TaskExit;

/// Shared, triggerable cancellation signal
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    inner: CancellationToken,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every task observing this token. Idempotent.
    pub fn trigger(&self) {
        self.inner.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolves once the token has been triggered
    pub fn triggered(&self) -> WaitForCancellationFuture<'_> {
        self.inner.cancelled()
    }

    /// Observe-only view for tasks that must not trigger shutdown
    pub fn observer(&self) -> ShutdownObserver {
        ShutdownObserver {
            inner: self.inner.clone(),
        }
    }
}

/// Read-only view of a [`ShutdownToken`]
#[derive(Debug, Clone)]
pub struct ShutdownObserver {
    inner: CancellationToken,
}

impl ShutdownObserver {
    pub fn is_triggered(&self) -> bool {
        self.inner.is_cancelled()
    }

    pub fn triggered(&self) -> WaitForCancellationFuture<'_> {
        self.inner.cancelled()
    }
}

/// OS signal that started a shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceivedSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ReceivedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceivedSignal::Interrupt => f.write_str("interrupt"),
            ReceivedSignal::Terminate => f.write_str("terminated"),
        }
    }
}

/// Wait for Ctrl+C or SIGTERM
pub async fn shutdown_signal() -> std::io::Result<ReceivedSignal> {
    #[cfg(unix)]
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    #[cfg(unix)]
    let terminate = async move {
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = signal::ctrl_c() => {
            result?;
            Ok(ReceivedSignal::Interrupt)
        }
        _ = terminate => Ok(ReceivedSignal::Terminate),
    }
}

type SignalFuture = Pin<Box<dyn Future<Output = std::io::Result<ReceivedSignal>> + Send>>;

/// Waits for an external interruption and fans it out through the token
pub struct ShutdownListener {
    token: ShutdownToken,
    signal: SignalFuture,
}

impl fmt::Debug for ShutdownListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownListener")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl ShutdownListener {
    pub fn new<F>(token: ShutdownToken, signal: F) -> Self
    where
        F: Future<Output = std::io::Result<ReceivedSignal>> + Send + 'static,
    {
        Self {
            token,
            signal: Box::pin(signal),
        }
    }

    /// Returns [`TaskExit::Completed`] after triggering shutdown on a signal,
    /// or [`TaskExit::Cancelled`] if something else triggered it first.
    pub async fn listen(self) -> Result<TaskExit, SupervisorError> {
        let ShutdownListener { token, signal } = self;

        tokio::select! {
            biased;
            _ = token.triggered() => {
                info!("Shutdown triggered elsewhere, closing signal listener");
                Ok(TaskExit::Cancelled)
            }
            received = signal => {
                let received = received.map_err(SupervisorError::SignalHandler)?;
                info!(signal = %received, "Received signal: {}", received);
                token.trigger();
                Ok(TaskExit::Completed)
            }
        }
    }
}
