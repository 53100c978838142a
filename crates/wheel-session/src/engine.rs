//! Channel-level interface to the randomization engine.
//!
//! The session never talks to a transport directly: it holds a cloneable
//! [`EngineHandle`] whose methods each send one [`EngineRequest`] carrying
//! a oneshot reply sender, and await the reply.  Whatever services the
//! request receiver — the wire connection driver in production, a scripted
//! responder in tests — is the engine as far as the session is concerned.

use std::fmt;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use wheel_proto::config::WheelConfig;

/// Why an engine request did not produce its expected result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The engine answered, refusing the request.
    #[error("{0}")]
    Rejected(String),
    /// The engine connection is gone; no answer will come.
    #[error("engine connection lost")]
    Disconnected,
}

type Reply<T> = oneshot::Sender<Result<T, EngineError>>;

/// One queued request plus the channel its result goes back on.
pub enum EngineRequest {
    ListCatalog { reply: Reply<Vec<String>> },
    StartRoll { list: String, reply: Reply<()> },
    StopRoll { reply: Reply<()> },
    RandomBackground { list: String, reply: Reply<Option<(String, String)>> },
    GetConfig { reply: Reply<WheelConfig> },
    SetConfig { config: WheelConfig, reply: Reply<()> },
    AudioDevices { reply: Reply<Vec<(String, String)>> },
}

impl EngineRequest {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListCatalog { .. } => "ListCatalog",
            Self::StartRoll { .. } => "StartRoll",
            Self::StopRoll { .. } => "StopRoll",
            Self::RandomBackground { .. } => "RandomBackground",
            Self::GetConfig { .. } => "GetConfig",
            Self::SetConfig { .. } => "SetConfig",
            Self::AudioDevices { .. } => "AudioDevices",
        }
    }
}

impl fmt::Debug for EngineRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cheaply cloneable sender side of the engine request queue.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Create a handle plus the receiver an engine implementation services.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EngineRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    async fn send(&self, request: EngineRequest) -> Result<(), EngineError> {
        self.tx
            .send(request)
            .await
            .map_err(|_| EngineError::Disconnected)
    }

    pub async fn list_catalog(&self) -> Result<Vec<String>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineRequest::ListCatalog { reply }).await?;
        rx.await.map_err(|_| EngineError::Disconnected)?
    }

    pub async fn start_roll(&self, list: String) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineRequest::StartRoll { list, reply }).await?;
        rx.await.map_err(|_| EngineError::Disconnected)?
    }

    pub async fn stop_roll(&self) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineRequest::StopRoll { reply }).await?;
        rx.await.map_err(|_| EngineError::Disconnected)?
    }

    pub async fn random_background(
        &self,
        list: String,
    ) -> Result<Option<(String, String)>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineRequest::RandomBackground { list, reply })
            .await?;
        rx.await.map_err(|_| EngineError::Disconnected)?
    }

    pub async fn get_config(&self) -> Result<WheelConfig, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineRequest::GetConfig { reply }).await?;
        rx.await.map_err(|_| EngineError::Disconnected)?
    }

    pub async fn set_config(&self, config: WheelConfig) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineRequest::SetConfig { config, reply }).await?;
        rx.await.map_err(|_| EngineError::Disconnected)?
    }

    pub async fn audio_devices(&self) -> Result<Vec<(String, String)>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineRequest::AudioDevices { reply }).await?;
        rx.await.map_err(|_| EngineError::Disconnected)?
    }
}
