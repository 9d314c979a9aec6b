//! # ca-session
//!
//! Session-level PV caching, bounded connection waits, and monitoring over
//! EPICS Channel Access.
//!
//! ## Overview
//!
//! `ca-session` sits above a channel-access client abstraction and turns
//! possibly-unconnected PV handles into a de-duplicated, reusable cache. It
//! performs a bounded polling wait for connection establishment, exposes
//! simplified get/put/info operations with consistent absence semantics,
//! and manages a registry of long-lived monitored PVs with pluggable
//! notification sinks. The wire protocol itself lives behind the
//! `ChannelProvider`/`ProcessVariable` traits.
//!
//! ## Quick Start
//!
//! ```rust
//! use ca_session::{CaSession, PvValue};
//! use ca_session::provider::mock::MockProvider;
//!
//! # async fn example() -> ca_session::Result<()> {
//! // Create a session over the in-process mock provider
//! let provider = MockProvider::default();
//! provider.register("XPP:GON:X.VAL", PvValue::Double(1.25));
//!
//! let session = CaSession::new(provider);
//!
//! // Simple get — `None` means the PV could not be connected in time
//! if let Some(value) = session.get("XPP:GON:X.VAL").await? {
//!     println!("XPP:GON:X.VAL = {}", value);
//! }
//!
//! // Monitor — changes are formatted onto the session's output sink
//! // whenever the embedding code pumps provider().poll()
//! session.monitor("XPP:GON:X.VAL").await?;
//! session.provider().poll().await;
//! session.monitor_clear("XPP:GON:X.VAL").await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Semantics
//!
//! - A name that connects once is cached and trusted for the session's
//!   lifetime; the cache never evicts.
//! - A name that cannot connect within the timeout yields `Ok(None)` from
//!   every operation, plus one `cannot connect to <name>` diagnostic on the
//!   output sink — never an error, never a panic. A later retry may still
//!   succeed.
//! - Collaborator failures (read, write, metadata) propagate unchanged.
//!
//! ## Architecture
//!
//! - **ChannelProvider** / **ProcessVariable** traits — the consumed
//!   client abstraction all backends implement
//! - **CaSession** — PV cache, connection gate, accessors, monitor registry
//! - **NotificationSink** — formatted-write or user-callback delivery,
//!   selected per monitor
//! - **MockProvider** — in-process simulated backend for testing and
//!   offline use

pub mod error;
pub mod provider;
pub mod session;
pub mod sink;
pub mod types;

// Re-export core types
pub use error::{CaError, Result};
pub use provider::{ChannelProvider, MonitorCallback, ProcessVariable, PvRef};
pub use session::{CaSession, SessionConfig};
pub use sink::{format_notification, MemorySink, NotificationSink, OutputSink, StdoutSink};
pub use types::{ControlInfo, Notification, PutResult, PvValue};

// Re-export the mock provider for convenience
pub use provider::mock::{MockProvider, MockPv};
