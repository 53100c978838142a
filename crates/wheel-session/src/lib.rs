//! Session core for the wheel randomizer front-end.
//!
//! The randomization engine — spin physics, item selection, list and media
//! storage, config persistence — lives elsewhere and is reached only
//! through request/response calls and two push-event subscriptions.  This
//! crate owns everything on the near side of that line: the roll lifecycle
//! state machine, push subscription management, background media
//! selection, settings synchronization, and the notification queue.
//!
//! Hosts create an engine connection (or any other servicer of
//! [`engine::EngineRequest`]), build a [`session::Session`] around it,
//! call `bootstrap`, and drive the returned event loop:
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use wheel_session::config::ClientConfig;
//! use wheel_session::connection::Connection;
//! use wheel_session::session::Session;
//!
//! let connection = Connection::connect(&ClientConfig::load()?).await?;
//! let (mut session, events) = Session::new(connection.engine.clone());
//! session.bootstrap(&connection.pushes).await;
//! let store = session.store();
//! let signals = session.signals();
//! tokio::spawn(session.run(events));
//! # Ok(())
//! # }
//! ```

pub mod background;
pub mod config;
pub mod connection;
pub mod engine;
pub mod notice;
pub mod session;
pub mod settings;
pub mod state;
pub mod subscription;
pub mod txn;
