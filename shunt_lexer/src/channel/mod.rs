//! Bounded stage-to-stage channels
//!
//! Each stage owns one [`StageReceiver`] and one [`StageSender`]. Both wrap a
//! bounded tokio mpsc channel and race every operation against the pipeline's
//! [`CancelToken`], so a blocked stage always observes cancellation. Dropping
//! the sender is how a stage closes its output.

pub mod cancel;

pub use cancel::{CancelToken, CancellationSource};

use crate::logging::{codes, Code};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("Stage '{stage}' was cancelled")]
    Cancelled { stage: &'static str },

    #[error("Stage '{stage}' lost its downstream consumer")]
    Disconnected { stage: &'static str },
}

impl ChannelError {
    pub fn error_code(&self) -> Code {
        match self {
            ChannelError::Cancelled { .. } => codes::pipeline::PIPELINE_CANCELLED,
            ChannelError::Disconnected { .. } => codes::pipeline::STAGE_DISCONNECTED,
        }
    }
}

/// Create a bounded channel owned by `stage`. A zero capacity is raised to 1.
pub fn stage_channel<T>(
    capacity: usize,
    cancel: &CancelToken,
    stage: &'static str,
) -> (StageSender<T>, StageReceiver<T>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        StageSender {
            inner: sender,
            cancel: cancel.clone(),
            stage,
        },
        StageReceiver {
            inner: receiver,
            cancel: cancel.clone(),
            stage,
        },
    )
}

#[derive(Debug)]
pub struct StageSender<T> {
    inner: mpsc::Sender<T>,
    cancel: CancelToken,
    stage: &'static str,
}

impl<T> StageSender<T> {
    /// Send one item, waiting for capacity
    pub async fn send(&self, item: T) -> Result<(), ChannelError> {
        let stage = self.stage;
        if self.cancel.is_cancelled() {
            return Err(ChannelError::Cancelled { stage });
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ChannelError::Cancelled { stage }),
            sent = self.inner.send(item) => sent.map_err(|_| ChannelError::Disconnected { stage }),
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }
}

#[derive(Debug)]
pub struct StageReceiver<T> {
    inner: mpsc::Receiver<T>,
    cancel: CancelToken,
    stage: &'static str,
}

impl<T> StageReceiver<T> {
    /// Next item, `Ok(None)` once the sender has closed the channel
    pub async fn recv(&mut self) -> Result<Option<T>, ChannelError> {
        let stage = self.stage;
        if self.cancel.is_cancelled() {
            return Err(ChannelError::Cancelled { stage });
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ChannelError::Cancelled { stage }),
            item = self.inner.recv() => Ok(item),
        }
    }

    /// Name of the stage that feeds this receiver
    pub fn stage(&self) -> &'static str {
        self.stage
    }
}
