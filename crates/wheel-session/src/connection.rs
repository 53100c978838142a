//! Wire connection driver with separated reader/writer tasks.
//!
//! Architecture:
//!
//! ```text
//!   Connection::spawn_io(stream)
//!         │
//!         ├── writer_task   ← receives EngineRequest via mpsc, frames → socket
//!         └── reader_task   ← decodes frames from socket
//!                                ├── reply (has seq)  → matched pending sender
//!                                └── push             → per-kind broadcast channel
//! ```
//!
//! Replies may arrive in any order; the pending map keyed by sequence
//! number routes each to its caller.  When the transport dies, every
//! pending request fails with `Disconnected` and the push channels close.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, info, warn};

use wheel_proto::config::WheelConfig;
use wheel_proto::protocol::{Frame, Push, ReplyBody, Request};

use crate::config::ClientConfig;
use crate::engine::{EngineError, EngineHandle, EngineRequest};

/// Broadcast senders for the two push-event kinds.  Subscribing to one
/// yields events in the order the engine emitted them; ordering across the
/// two is not guaranteed.
pub struct PushFeeds {
    pub slot_list: broadcast::Sender<Vec<String>>,
    pub roll_stopped: broadcast::Sender<()>,
}

/// A live engine connection: the request handle plus the push feeds.
pub struct Connection {
    pub engine: EngineHandle,
    pub pushes: PushFeeds,
}

impl Connection {
    pub async fn connect(config: &ClientConfig) -> anyhow::Result<Self> {
        let address = config.engine_address();
        info!("connecting to engine at {address}");
        let stream = TcpStream::connect(&address).await?;
        Ok(Self::spawn_io(stream))
    }

    /// Wire a transport up to a fresh request queue and push feeds.
    /// Generic so tests can drive an in-memory duplex stream.
    pub fn spawn_io<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (engine, req_rx) = EngineHandle::channel(64);
        let slot_list = broadcast::channel(64).0;
        let roll_stopped = broadcast::channel(16).0;

        // pending map: seq → reply sender.  Shared between writer (inserts)
        // and reader (resolves).
        let pending: Arc<Mutex<HashMap<u64, PendingReply>>> = Arc::new(Mutex::new(HashMap::new()));

        let (read_half, write_half) = tokio::io::split(stream);
        tokio::spawn(writer_task(write_half, req_rx, pending.clone()));
        tokio::spawn(reader_task(
            read_half,
            pending,
            slot_list.clone(),
            roll_stopped.clone(),
        ));

        Self {
            engine,
            pushes: PushFeeds {
                slot_list,
                roll_stopped,
            },
        }
    }
}

/// Typed reply sender parked until the matching `Reply` frame arrives.
enum PendingReply {
    Lists(tokio::sync::oneshot::Sender<Result<Vec<String>, EngineError>>),
    Unit(tokio::sync::oneshot::Sender<Result<(), EngineError>>),
    Background(tokio::sync::oneshot::Sender<Result<Option<(String, String)>, EngineError>>),
    Config(tokio::sync::oneshot::Sender<Result<WheelConfig, EngineError>>),
    Devices(tokio::sync::oneshot::Sender<Result<Vec<(String, String)>, EngineError>>),
}

impl PendingReply {
    fn resolve(self, body: ReplyBody) {
        match (self, body) {
            (Self::Lists(tx), ReplyBody::Lists { names }) => {
                let _ = tx.send(Ok(names));
            }
            (Self::Unit(tx), ReplyBody::Ack) => {
                let _ = tx.send(Ok(()));
            }
            (Self::Background(tx), ReplyBody::Background { media }) => {
                let _ = tx.send(Ok(media));
            }
            (Self::Config(tx), ReplyBody::Config { config }) => {
                let _ = tx.send(Ok(config));
            }
            (Self::Devices(tx), ReplyBody::Devices { devices }) => {
                let _ = tx.send(Ok(devices));
            }
            (reply, ReplyBody::Err { message }) => reply.fail(EngineError::Rejected(message)),
            (reply, body) => {
                warn!("engine sent mismatched reply body: {body:?}");
                reply.fail(EngineError::Rejected(
                    "engine sent mismatched reply".to_string(),
                ));
            }
        }
    }

    fn fail(self, err: EngineError) {
        match self {
            Self::Lists(tx) => {
                let _ = tx.send(Err(err));
            }
            Self::Unit(tx) => {
                let _ = tx.send(Err(err));
            }
            Self::Background(tx) => {
                let _ = tx.send(Err(err));
            }
            Self::Config(tx) => {
                let _ = tx.send(Err(err));
            }
            Self::Devices(tx) => {
                let _ = tx.send(Err(err));
            }
        }
    }
}

/// Split a queued request into its wire form and the parked reply sender.
fn split_request(request: EngineRequest) -> (Request, PendingReply) {
    match request {
        EngineRequest::ListCatalog { reply } => (Request::ListCatalog, PendingReply::Lists(reply)),
        EngineRequest::StartRoll { list, reply } => {
            (Request::StartRoll { list }, PendingReply::Unit(reply))
        }
        EngineRequest::StopRoll { reply } => (Request::StopRoll, PendingReply::Unit(reply)),
        EngineRequest::RandomBackground { list, reply } => (
            Request::RandomBackground { list },
            PendingReply::Background(reply),
        ),
        EngineRequest::GetConfig { reply } => (Request::GetConfig, PendingReply::Config(reply)),
        EngineRequest::SetConfig { config, reply } => {
            (Request::SetConfig { config }, PendingReply::Unit(reply))
        }
        EngineRequest::AudioDevices { reply } => {
            (Request::AudioDevices, PendingReply::Devices(reply))
        }
    }
}

async fn writer_task<W>(
    mut write_half: W,
    mut req_rx: mpsc::Receiver<EngineRequest>,
    pending: Arc<Mutex<HashMap<u64, PendingReply>>>,
) where
    W: AsyncWrite + Unpin,
{
    let mut next_seq: u64 = 1;
    while let Some(request) = req_rx.recv().await {
        debug!("sending {request:?} to engine");
        let (wire_request, reply) = split_request(request);
        let seq = next_seq;
        next_seq += 1;

        let frame = Frame::Request {
            seq,
            request: wire_request,
        };
        let bytes = match frame.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("failed to encode request frame: {e}");
                reply.fail(EngineError::Disconnected);
                continue;
            }
        };

        pending.lock().await.insert(seq, reply);
        if let Err(e) = write_half.write_all(&bytes).await {
            warn!("engine write error: {e}");
            if let Some(reply) = pending.lock().await.remove(&seq) {
                reply.fail(EngineError::Disconnected);
            }
            break;
        }
    }
    debug!("engine writer task finished");
}

async fn reader_task<R>(
    mut read_half: R,
    pending: Arc<Mutex<HashMap<u64, PendingReply>>>,
    slot_list: broadcast::Sender<Vec<String>>,
    roll_stopped: broadcast::Sender<()>,
) where
    R: AsyncRead + Unpin,
{
    let mut buffer: Vec<u8> = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    'read: loop {
        match read_half.read(&mut chunk).await {
            Ok(0) => {
                info!("engine closed the connection");
                break 'read;
            }
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                loop {
                    if buffer.len() < 4 {
                        break;
                    }
                    let len =
                        u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
                    if buffer.len() < 4 + len {
                        break;
                    }
                    match Frame::decode(&buffer) {
                        Ok((frame, consumed)) => {
                            buffer.drain(..consumed);
                            dispatch(frame, &pending, &slot_list, &roll_stopped).await;
                        }
                        Err(e) => {
                            warn!("malformed frame from engine: {e}");
                            break 'read;
                        }
                    }
                }
            }
            Err(e) => {
                warn!("engine read error: {e}");
                break 'read;
            }
        }
    }

    // Transport is gone: no parked request will ever be answered.
    let mut map = pending.lock().await;
    for (_, reply) in map.drain() {
        reply.fail(EngineError::Disconnected);
    }
}

async fn dispatch(
    frame: Frame,
    pending: &Arc<Mutex<HashMap<u64, PendingReply>>>,
    slot_list: &broadcast::Sender<Vec<String>>,
    roll_stopped: &broadcast::Sender<()>,
) {
    match frame {
        Frame::Reply(reply) => match pending.lock().await.remove(&reply.seq) {
            Some(parked) => parked.resolve(reply.body),
            None => warn!("reply for unknown seq {}", reply.seq),
        },
        Frame::Push(Push::SlotList { items }) => {
            // No receivers yet is fine; pre-subscription events are dropped.
            let _ = slot_list.send(items);
        }
        Frame::Push(Push::RollStopped) => {
            let _ = roll_stopped.send(());
        }
        Frame::Request { seq, .. } => {
            warn!("unexpected request frame (seq {seq}) from engine");
        }
    }
}
