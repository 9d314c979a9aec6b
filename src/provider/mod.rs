//! Collaborator traits — the channel-access client abstraction
//!
//! The wire protocol lives behind these traits. A `ChannelProvider` hands out
//! `ProcessVariable` handles and pumps the event loop; the session layer only
//! ever talks to these two interfaces.

use crate::error::Result;
use crate::types::{ControlInfo, Notification, PutResult, PvValue};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub mod mock;

/// Shared handle to a process variable
pub type PvRef = Arc<dyn ProcessVariable>;

/// Change-notification callback
///
/// Receives the structured record by value. Invoked from the provider's
/// event-delivery context, which may run concurrently with the caller's
/// main flow — implementations must bring their own synchronization.
pub type MonitorCallback = Arc<dyn Fn(Notification) + Send + Sync>;

/// One process variable on a channel-access backend
///
/// Implementations handle the transport-specific details of connection,
/// reads, writes, and change subscription. The session treats handles as
/// opaque beyond this surface.
#[async_trait]
pub trait ProcessVariable: Send + Sync {
    /// PV name this handle was created for
    fn name(&self) -> &str;

    /// Initiate connection — non-blocking, returns before the handshake completes
    async fn connect(&self) -> Result<()>;

    /// Whether the transport-level handshake has completed
    fn connected(&self) -> bool;

    /// Fetch the current value
    async fn get(&self) -> Result<PvValue>;

    /// Fetch the current value rendered as a string
    /// (formatted double, enum state string, etc.)
    async fn get_as_string(&self) -> Result<String>;

    /// Fetch control-variable metadata (enum strings, precision, limits)
    async fn get_ctrlvars(&self) -> Result<ControlInfo>;

    /// Write a value
    ///
    /// With `wait`, blocks until device-side processing completes or
    /// `timeout` elapses.
    async fn put(&self, value: PvValue, wait: bool, timeout: Duration) -> Result<PutResult>;

    /// Subscribe a change-notification callback
    ///
    /// Callbacks fire when the embedding application pumps the provider's
    /// event loop via [`ChannelProvider::poll`].
    fn add_callback(&self, callback: MonitorCallback);

    /// Remove all change-notification callbacks from this handle
    fn clear_callbacks(&self);

    /// Human-readable multi-line status report
    fn info(&self) -> String;
}

/// Channel-access client context
///
/// Creates PV handles and owns the process-wide event pump. One provider
/// backs one session; multiple simultaneous client contexts are out of scope.
#[async_trait]
pub trait ChannelProvider: Send + Sync {
    /// Construct an unconnected handle for `name`
    ///
    /// Pure construction — no network I/O until [`ProcessVariable::connect`].
    fn create_pv(&self, name: &str) -> PvRef;

    /// Process pending channel-access events, dispatching monitor callbacks
    ///
    /// Must be invoked periodically by the embedding application for
    /// monitors to fire. The session never calls this itself.
    async fn poll(&self);

    /// Provider name (e.g., "mock", "ca")
    fn name(&self) -> &str;
}
