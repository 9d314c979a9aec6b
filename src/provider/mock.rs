//! Mock channel-access provider — simulated PVs for testing and offline use
//!
//! Backs a session with in-process PVs instead of a live channel-access
//! client. PVs are registered up front with an initial value and metadata;
//! value changes are queued and delivered to monitor callbacks when the
//! embedding code calls `poll()`, mirroring the real event-pump contract.

use crate::error::{CaError, Result};
use crate::provider::{ChannelProvider, MonitorCallback, ProcessVariable, PvRef};
use crate::types::{ControlInfo, Notification, PutResult, PvValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Behavior of one registered mock PV
#[derive(Debug, Clone)]
struct PvSpec {
    value: PvValue,
    ctrlvars: ControlInfo,
    reachable: bool,
    /// Delay between `connect()` and `connected()` reporting true
    connect_after: Duration,
    /// Simulated device-side processing time for waited puts
    process_time: Duration,
}

impl Default for PvSpec {
    fn default() -> Self {
        Self {
            value: PvValue::Double(0.0),
            ctrlvars: ControlInfo::default(),
            reachable: true,
            connect_after: Duration::ZERO,
            process_time: Duration::ZERO,
        }
    }
}

/// A simulated process variable
///
/// Counts connect attempts and metadata fetches so tests can assert the
/// session's caching and fetch-ordering guarantees.
pub struct MockPv {
    name: String,
    spec: PvSpec,
    connect_requested: Mutex<Option<Instant>>,
    connect_calls: AtomicUsize,
    ctrlvar_fetches: AtomicUsize,
    value: Mutex<PvValue>,
    callbacks: Mutex<Vec<MonitorCallback>>,
    pending: Mutex<Vec<Notification>>,
    puts: Mutex<Vec<(PvValue, bool)>>,
}

impl MockPv {
    fn new(name: &str, spec: PvSpec) -> Self {
        Self {
            name: name.to_string(),
            value: Mutex::new(spec.value.clone()),
            spec,
            connect_requested: Mutex::new(None),
            connect_calls: AtomicUsize::new(0),
            ctrlvar_fetches: AtomicUsize::new(0),
            callbacks: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
            puts: Mutex::new(Vec::new()),
        }
    }

    /// Number of `connect()` calls issued against this handle
    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_ctrlvars()` fetches issued against this handle
    pub fn ctrlvar_fetches(&self) -> usize {
        self.ctrlvar_fetches.load(Ordering::SeqCst)
    }

    /// Number of callbacks currently attached
    pub fn callback_count(&self) -> usize {
        self.callbacks.lock().unwrap().len()
    }

    /// Values written through `put`, paired with their `wait` flag
    pub fn puts(&self) -> Vec<(PvValue, bool)> {
        self.puts.lock().unwrap().clone()
    }

    /// Update the value and queue a change notification
    ///
    /// The notification is delivered on the next provider `poll()`.
    pub fn set_value(&self, value: PvValue) {
        let formatted = self.spec.ctrlvars.render(&value);
        *self.value.lock().unwrap() = value.clone();
        self.pending.lock().unwrap().push(Notification::new(
            &self.name,
            value,
            Some(formatted),
        ));
    }

    /// Deliver queued notifications to the attached callbacks
    fn dispatch(&self) {
        let pending: Vec<Notification> = self.pending.lock().unwrap().drain(..).collect();
        if pending.is_empty() {
            return;
        }
        let callbacks: Vec<MonitorCallback> = self.callbacks.lock().unwrap().clone();
        for notification in pending {
            tracing::debug!(
                pv = %self.name,
                callbacks = callbacks.len(),
                "Dispatching change notification"
            );
            for callback in &callbacks {
                callback(notification.clone());
            }
        }
    }
}

#[async_trait]
impl ProcessVariable for MockPv {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let mut requested = self.connect_requested.lock().unwrap();
        if requested.is_none() {
            *requested = Some(Instant::now());
        }
        Ok(())
    }

    fn connected(&self) -> bool {
        if !self.spec.reachable {
            return false;
        }
        match *self.connect_requested.lock().unwrap() {
            Some(at) => at.elapsed() >= self.spec.connect_after,
            None => false,
        }
    }

    async fn get(&self) -> Result<PvValue> {
        if !self.connected() {
            return Err(CaError::Get {
                pv: self.name.clone(),
                reason: "channel not connected".to_string(),
            });
        }
        Ok(self.value.lock().unwrap().clone())
    }

    async fn get_as_string(&self) -> Result<String> {
        let value = self.get().await?;
        Ok(self.spec.ctrlvars.render(&value))
    }

    async fn get_ctrlvars(&self) -> Result<ControlInfo> {
        if !self.connected() {
            return Err(CaError::Metadata {
                pv: self.name.clone(),
                reason: "channel not connected".to_string(),
            });
        }
        self.ctrlvar_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.spec.ctrlvars.clone())
    }

    async fn put(&self, value: PvValue, wait: bool, timeout: Duration) -> Result<PutResult> {
        if !self.connected() {
            return Err(CaError::Put {
                pv: self.name.clone(),
                reason: "channel not connected".to_string(),
            });
        }
        if wait && self.spec.process_time > timeout {
            return Err(CaError::PutTimeout {
                pv: self.name.clone(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        self.puts.lock().unwrap().push((value.clone(), wait));
        self.set_value(value);
        Ok(if wait {
            PutResult::Completed
        } else {
            PutResult::Initiated
        })
    }

    fn add_callback(&self, callback: MonitorCallback) {
        self.callbacks.lock().unwrap().push(callback);
    }

    fn clear_callbacks(&self) {
        self.callbacks.lock().unwrap().clear();
    }

    fn info(&self) -> String {
        let value = self.value.lock().unwrap().clone();
        let mut lines = vec![
            format!("== {} ==", self.name),
            format!("   value      = {}", self.spec.ctrlvars.render(&value)),
            format!("   connected  = {}", self.connected()),
        ];
        if let Some(units) = &self.spec.ctrlvars.units {
            lines.push(format!("   units      = {}", units));
        }
        if let Some(precision) = self.spec.ctrlvars.precision {
            lines.push(format!("   precision  = {}", precision));
        }
        if !self.spec.ctrlvars.enum_strings.is_empty() {
            lines.push(format!(
                "   enum strs  = {}",
                self.spec.ctrlvars.enum_strings.join(", ")
            ));
        }
        lines.join("\n")
    }
}

#[derive(Default)]
struct MockState {
    specs: Mutex<HashMap<String, PvSpec>>,
    pvs: Mutex<HashMap<String, Arc<MockPv>>>,
}

/// In-process channel-access provider
///
/// Clones share state, so tests can keep one handle for registration and
/// introspection while the session owns another.
#[derive(Clone, Default)]
pub struct MockProvider {
    state: Arc<MockState>,
}

impl MockProvider {
    /// Register a reachable PV with an initial value
    pub fn register(&self, name: &str, value: PvValue) {
        self.register_spec(name, PvSpec {
            value,
            ..Default::default()
        });
    }

    /// Register a reachable PV with an initial value and control metadata
    pub fn register_with(&self, name: &str, value: PvValue, ctrlvars: ControlInfo) {
        self.register_spec(name, PvSpec {
            value,
            ctrlvars,
            ..Default::default()
        });
    }

    /// Register a PV whose connection handshake never completes
    pub fn register_unreachable(&self, name: &str) {
        self.register_spec(name, PvSpec {
            reachable: false,
            ..Default::default()
        });
    }

    /// Register a reachable PV that connects only after `connect_after`
    pub fn register_slow(&self, name: &str, value: PvValue, connect_after: Duration) {
        self.register_spec(name, PvSpec {
            value,
            connect_after,
            ..Default::default()
        });
    }

    /// Register a PV whose waited puts take `process_time` to complete
    pub fn register_sluggish(&self, name: &str, value: PvValue, process_time: Duration) {
        self.register_spec(name, PvSpec {
            value,
            process_time,
            ..Default::default()
        });
    }

    fn register_spec(&self, name: &str, spec: PvSpec) {
        self.state.specs.lock().unwrap().insert(name.to_string(), spec);
    }

    /// The most recently created handle for `name`, if any
    pub fn pv(&self, name: &str) -> Option<Arc<MockPv>> {
        self.state.pvs.lock().unwrap().get(name).cloned()
    }

    /// Update a PV's value and queue a change notification
    ///
    /// No-op if no handle has been created for `name` yet.
    pub fn set_value(&self, name: &str, value: PvValue) {
        if let Some(pv) = self.pv(name) {
            pv.set_value(value);
        }
    }
}

#[async_trait]
impl ChannelProvider for MockProvider {
    fn create_pv(&self, name: &str) -> PvRef {
        let spec = self
            .state
            .specs
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default();
        let pv = Arc::new(MockPv::new(name, spec));
        self.state
            .pvs
            .lock()
            .unwrap()
            .insert(name.to_string(), pv.clone());
        pv
    }

    async fn poll(&self) {
        let pvs: Vec<Arc<MockPv>> = self.state.pvs.lock().unwrap().values().cloned().collect();
        for pv in pvs {
            pv.dispatch();
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_latency() {
        tokio_test::block_on(async {
            let provider = MockProvider::default();
            provider.register_slow("SLOW:PV", PvValue::Int(1), Duration::from_millis(20));

            let pv = provider.create_pv("SLOW:PV");
            pv.connect().await.unwrap();
            assert!(!pv.connected());

            tokio::time::sleep(Duration::from_millis(30)).await;
            assert!(pv.connected());
        });
    }

    #[test]
    fn test_unreachable_never_connects() {
        tokio_test::block_on(async {
            let provider = MockProvider::default();
            provider.register_unreachable("DEAD:PV");

            let pv = provider.create_pv("DEAD:PV");
            pv.connect().await.unwrap();
            assert!(!pv.connected());
            assert!(pv.get().await.is_err());
        });
    }

    #[test]
    fn test_get_as_string_uses_ctrlvars() {
        tokio_test::block_on(async {
            let provider = MockProvider::default();
            provider.register_with(
                "XPP:SHUTTER",
                PvValue::Enum(1),
                ControlInfo {
                    enum_strings: vec!["CLOSED".into(), "OPEN".into()],
                    ..Default::default()
                },
            );

            let pv = provider.create_pv("XPP:SHUTTER");
            pv.connect().await.unwrap();
            assert_eq!(pv.get_as_string().await.unwrap(), "OPEN");
        });
    }

    #[test]
    fn test_waited_put_timeout() {
        tokio_test::block_on(async {
            let provider = MockProvider::default();
            provider.register_sluggish(
                "SLUG:PV",
                PvValue::Double(0.0),
                Duration::from_secs(2),
            );

            let pv = provider.create_pv("SLUG:PV");
            pv.connect().await.unwrap();

            let err = pv
                .put(PvValue::Double(1.0), true, Duration::from_millis(10))
                .await
                .unwrap_err();
            assert!(matches!(err, CaError::PutTimeout { .. }));

            // Unwaited put is not bounded by processing time
            let result = pv
                .put(PvValue::Double(1.0), false, Duration::from_millis(10))
                .await
                .unwrap();
            assert_eq!(result, PutResult::Initiated);
        });
    }

    #[test]
    fn test_poll_delivers_queued_notifications() {
        tokio_test::block_on(async {
            let provider = MockProvider::default();
            provider.register("CNT:PV", PvValue::Int(0));

            let pv = provider.pv("CNT:PV");
            assert!(pv.is_none(), "no handle before create_pv");

            let pv = provider.create_pv("CNT:PV");
            pv.connect().await.unwrap();

            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = seen.clone();
            pv.add_callback(Arc::new(move |n: Notification| {
                sink.lock().unwrap().push(n.value);
            }));

            provider.set_value("CNT:PV", PvValue::Int(7));
            assert!(seen.lock().unwrap().is_empty(), "nothing fires before poll");

            provider.poll().await;
            assert_eq!(seen.lock().unwrap().as_slice(), &[PvValue::Int(7)]);

            // Queue drained — a second poll delivers nothing new
            provider.poll().await;
            assert_eq!(seen.lock().unwrap().len(), 1);
        });
    }

    #[test]
    fn test_info_report() {
        tokio_test::block_on(async {
            let provider = MockProvider::default();
            provider.register_with(
                "XPP:GON:X.VAL",
                PvValue::Double(1.25),
                ControlInfo {
                    units: Some("mm".into()),
                    precision: Some(3),
                    ..Default::default()
                },
            );

            let pv = provider.create_pv("XPP:GON:X.VAL");
            pv.connect().await.unwrap();

            let info = pv.info();
            assert!(info.contains("XPP:GON:X.VAL"));
            assert!(info.contains("1.250"));
            assert!(info.contains("mm"));
        });
    }
}
