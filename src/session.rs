//! Channel-access session — PV cache, connection gate, accessors, monitors
//!
//! `CaSession` wraps any `ChannelProvider` with a de-duplicating PV cache,
//! a bounded polling wait for connection establishment, simplified
//! get/put/info operations, and a registry of monitored PVs. Thread-safe
//! via internal locks.

use crate::provider::{ChannelProvider, PvRef};
use crate::sink::{NotificationSink, OutputSink, StdoutSink};
use crate::types::{PutResult, PvValue};
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

/// Timing knobs for a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline for the connection gate's polling wait
    pub connect_timeout: Duration,

    /// Default bound on a waited put's device-side processing
    pub put_timeout: Duration,

    /// Interval between connection-status checks in the gate
    pub poll_interval: Duration,

    /// Pause after each fetch so the external event pump can run
    ///
    /// A cooperative yield, not a correctness guard — adjustable, but keep
    /// it short.
    pub event_yield: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            put_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(1),
            event_yield: Duration::from_millis(1),
        }
    }
}

/// Session-level convenience layer over a channel-access provider
///
/// Both registries live for the session's lifetime: the PV cache never
/// evicts, and a monitor runs until explicitly cleared or the session is
/// dropped. Failed connections are surfaced once as `Ok(None)` with a
/// diagnostic line; callers needing retry re-invoke the operation.
pub struct CaSession {
    provider: Box<dyn ChannelProvider>,
    config: SessionConfig,
    sink: Arc<dyn OutputSink>,

    /// Connected handles (PV name → handle), created lazily, never removed
    pvs: Arc<RwLock<HashMap<String, PvRef>>>,

    /// Monitored handles (PV name → handle with a callback attached)
    monitors: Arc<RwLock<HashMap<String, PvRef>>>,

    /// Serializes the cache-miss path so a connect attempt is issued at
    /// most once per name under concurrent callers
    resolve_lock: Mutex<()>,
}

impl CaSession {
    /// Create a session with default configuration, writing to stdout
    pub fn new(provider: impl ChannelProvider + 'static) -> Self {
        Self::with_config(provider, SessionConfig::default())
    }

    /// Create a session with explicit configuration
    pub fn with_config(provider: impl ChannelProvider + 'static, config: SessionConfig) -> Self {
        Self {
            provider: Box::new(provider),
            config,
            sink: Arc::new(StdoutSink),
            pvs: Arc::new(RwLock::new(HashMap::new())),
            monitors: Arc::new(RwLock::new(HashMap::new())),
            resolve_lock: Mutex::new(()),
        }
    }

    /// Replace the output sink used for diagnostics, `info` printing, and
    /// default monitor formatting
    pub fn set_sink(&mut self, sink: Arc<dyn OutputSink>) {
        self.sink = sink;
    }

    /// Get the provider name
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Get a reference to the underlying provider
    ///
    /// The embedding application pumps monitor delivery through
    /// `provider().poll()` — the session never pumps events itself.
    pub fn provider(&self) -> &dyn ChannelProvider {
        self.provider.as_ref()
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolve a name to a connected handle, waiting up to the configured
    /// connection timeout
    pub async fn resolve(&self, name: &str) -> Result<Option<PvRef>> {
        self.resolve_within(name, self.config.connect_timeout).await
    }

    /// Resolve a name to a connected handle with an explicit deadline
    ///
    /// Cache hits return immediately — a name that connected once is
    /// trusted thereafter. On a miss, a new handle is created and its
    /// connection status polled until it connects or `timeout` elapses.
    /// Timed-out handles are not cached; one `cannot connect to <name>`
    /// diagnostic goes to the output sink and `Ok(None)` is returned.
    pub async fn resolve_within(&self, name: &str, timeout: Duration) -> Result<Option<PvRef>> {
        if let Some(pv) = self.pvs.read().await.get(name) {
            return Ok(Some(pv.clone()));
        }

        let _guard = self.resolve_lock.lock().await;

        // Another caller may have resolved this name while we waited
        if let Some(pv) = self.pvs.read().await.get(name) {
            return Ok(Some(pv.clone()));
        }

        let pv = self.provider.create_pv(name);
        pv.connect().await?;

        let deadline = Instant::now() + timeout;
        while !pv.connected() {
            if Instant::now() >= deadline {
                tracing::warn!(
                    pv = %name,
                    timeout_ms = timeout.as_millis() as u64,
                    "Connection timed out"
                );
                self.sink.write_line(&format!("cannot connect to {}", name));
                return Ok(None);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }

        self.pvs.write().await.insert(name.to_string(), pv.clone());
        tracing::debug!(pv = %name, "PV connected and cached");
        Ok(Some(pv))
    }

    /// Fetch a PV's current value
    ///
    /// Returns `Ok(None)` if the PV cannot be connected within the
    /// configured timeout.
    pub async fn get(&self, name: &str) -> Result<Option<PvValue>> {
        let Some(pv) = self.resolve(name).await? else {
            return Ok(None);
        };
        let value = pv.get().await?;
        tokio::time::sleep(self.config.event_yield).await;
        Ok(Some(value))
    }

    /// Fetch a PV's current value rendered as a string
    ///
    /// Performs one control-variable metadata fetch (needed for enum and
    /// format strings) before the formatted fetch.
    pub async fn get_as_string(&self, name: &str) -> Result<Option<String>> {
        let Some(pv) = self.resolve(name).await? else {
            return Ok(None);
        };
        pv.get().await?;
        tokio::time::sleep(self.config.event_yield).await;
        pv.get_ctrlvars().await?;
        tokio::time::sleep(self.config.event_yield).await;
        Ok(Some(pv.get_as_string().await?))
    }

    /// Write a value without waiting for device-side processing
    pub async fn put(&self, name: &str, value: PvValue) -> Result<Option<PutResult>> {
        self.put_with(name, value, false, self.config.put_timeout)
            .await
    }

    /// Write a value, optionally blocking until the device finishes
    /// processing or `timeout` elapses
    ///
    /// The put timeout is independent of the connection timeout used
    /// during resolution.
    pub async fn put_with(
        &self,
        name: &str,
        value: PvValue,
        wait: bool,
        timeout: Duration,
    ) -> Result<Option<PutResult>> {
        let Some(pv) = self.resolve(name).await? else {
            return Ok(None);
        };
        Ok(Some(pv.put(value, wait, timeout).await?))
    }

    /// Fetch a PV's status report
    ///
    /// With `print_out`, the report is written to the output sink and
    /// `Ok(None)` is returned; otherwise the report is returned and nothing
    /// is written. Exactly one of the two happens. `Ok(None)` with a
    /// diagnostic line means the PV could not be connected.
    pub async fn info(&self, name: &str, print_out: bool) -> Result<Option<String>> {
        let Some(pv) = self.resolve(name).await? else {
            return Ok(None);
        };
        pv.get().await?;
        pv.get_ctrlvars().await?;
        if print_out {
            self.sink.write_line(&pv.info());
            Ok(None)
        } else {
            Ok(Some(pv.info()))
        }
    }

    /// Monitor a PV, formatting each change onto the session's output sink
    pub async fn monitor(&self, name: &str) -> Result<Option<()>> {
        self.monitor_with(name, NotificationSink::writer(self.sink.clone()))
            .await
    }

    /// Monitor a PV with an explicit notification sink
    ///
    /// Resolves the name (creating it if unseen), issues one priming value
    /// fetch, and attaches the sink's callback to the handle. Re-monitoring
    /// an already-monitored name replaces its callback registration.
    /// Notifications fire only when the embedding application pumps the
    /// provider's event loop.
    pub async fn monitor_with(&self, name: &str, sink: NotificationSink) -> Result<Option<()>> {
        let Some(pv) = self.resolve(name).await? else {
            return Ok(None);
        };
        pv.get().await?;

        let replaced = {
            let mut monitors = self.monitors.write().await;
            monitors.insert(name.to_string(), pv.clone()).is_some()
        };
        if replaced {
            pv.clear_callbacks();
        }
        pv.add_callback(sink.into_callback());

        tracing::info!(pv = %name, replaced, "Monitor registered");
        Ok(Some(()))
    }

    /// Clear a monitor on a PV
    ///
    /// Detaches all callbacks from the monitored handle. Silent no-op for
    /// names that were never monitored.
    pub async fn monitor_clear(&self, name: &str) {
        if let Some(pv) = self.monitors.read().await.get(name) {
            pv.clear_callbacks();
            tracing::info!(pv = %name, "Monitor cleared");
        }
    }

    /// Names currently present in the monitor registry
    pub async fn monitored_names(&self) -> Vec<String> {
        let monitors = self.monitors.read().await;
        monitors.keys().cloned().collect()
    }

    /// Names currently present in the PV cache
    pub async fn cached_names(&self) -> Vec<String> {
        let pvs = self.pvs.read().await;
        pvs.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.put_timeout, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_millis(1));
        assert_eq!(config.event_yield, Duration::from_millis(1));
    }
}
