//! Connection Registry (component B): the process-local map of station
//! identity to live transport, plus the correlation table for outbound
//! CALLs awaiting a CALLRESULT/CALLERROR.
//!
//! Grounded on `original_source/app/ocpp/registry.py`: a single lock
//! guarding `_ACTIVE_WS`, `_CP_MSG_COUNTER`, and `_PENDING_CALLS`. The
//! waiter primitive itself (`tokio::sync::oneshot`) and the
//! install/complete/cancel shape are adapted from the teacher's
//! `application/commands::CommandSender`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::support::errors::CommandError;

/// Request ids the registry mints for outbound CALLs are seeded well above
/// any id a station is likely to generate for its own CALLs.
const REQUEST_ID_SEED: u64 = 900_000_000;

/// Outbound CALLs time out after this long if no CALLRESULT/CALLERROR
/// arrives on the matching request id.
pub const OUTBOUND_CALL_TIMEOUT: Duration = Duration::from_secs(12);

/// Anything the Transport Gateway can hand the Registry a CALL frame
/// through. Implemented by the per-connection writer-task sender; a test
/// double can implement it too without spinning up a real socket.
pub trait Transport: Send + Sync {
    fn send_text(&self, text: String) -> Result<(), String>;
}

impl Transport for tokio::sync::mpsc::UnboundedSender<String> {
    fn send_text(&self, text: String) -> Result<(), String> {
        self.send(text).map_err(|e| e.to_string())
    }
}

/// Outcome delivered to a waiter: either a successful CALLRESULT payload,
/// or a CALLERROR's `(errorCode, errorDescription, errorDetails)`.
pub type CallOutcome = Result<serde_json::Value, (String, String, serde_json::Value)>;

struct RegistryInner {
    transports: HashMap<String, Arc<dyn Transport>>,
    counters: HashMap<String, u64>,
    pending: HashMap<(String, String), oneshot::Sender<CallOutcome>>,
}

/// Two maps and a counter, guarded by one process-wide lock. The lock is
/// only ever held across map operations, never across I/O — `send_text`
/// and `.await` both happen outside the critical section.
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                transports: HashMap::new(),
                counters: HashMap::new(),
                pending: HashMap::new(),
            }),
        }
    }

    /// Overwrites any prior entry for `identity` — a reconnecting station
    /// replaces its stale handle with no callback to the prior holder.
    pub fn register(&self, identity: &str, transport: Arc<dyn Transport>) {
        let mut inner = self.inner.lock().unwrap();
        inner.transports.insert(identity.to_string(), transport);
    }

    /// Removes the entry only if it still equals `transport` — prevents a
    /// late teardown from evicting a fresh reconnection. All waiters for
    /// this station are cancelled in the same pass.
    pub fn unregister_if_same(&self, identity: &str, transport: &Arc<dyn Transport>) {
        let mut inner = self.inner.lock().unwrap();
        let same = inner
            .transports
            .get(identity)
            .map(|t| Arc::ptr_eq(t, transport))
            .unwrap_or(false);
        if same {
            inner.transports.remove(identity);
            let keys: Vec<(String, String)> = inner
                .pending
                .keys()
                .filter(|(id, _)| id == identity)
                .cloned()
                .collect();
            for key in keys {
                if let Some(sender) = inner.pending.remove(&key) {
                    drop(sender); // dropping cancels: awaiting receiver sees RecvError
                }
            }
        }
    }

    pub fn get(&self, identity: &str) -> Option<Arc<dyn Transport>> {
        self.inner.lock().unwrap().transports.get(identity).cloned()
    }

    fn allocate_request_id(&self, identity: &str) -> String {
        let mut inner = self.inner.lock().unwrap();
        let counter = inner
            .counters
            .entry(identity.to_string())
            .or_insert(REQUEST_ID_SEED);
        *counter += 1;
        counter.to_string()
    }

    fn install_waiter(&self, identity: &str, request_id: &str) -> oneshot::Receiver<CallOutcome> {
        let (tx, rx) = oneshot::channel();
        let mut inner = self.inner.lock().unwrap();
        inner
            .pending
            .insert((identity.to_string(), request_id.to_string()), tx);
        rx
    }

    fn remove_waiter(&self, identity: &str, request_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .pending
            .remove(&(identity.to_string(), request_id.to_string()));
    }

    /// Delivers a CALLRESULT payload to the waiter for `(identity,
    /// request_id)`, if one is still installed. Unknown correlations are
    /// silently dropped (spec §4.A step 2).
    pub fn complete(&self, identity: &str, request_id: &str, payload: serde_json::Value) {
        let sender = self
            .inner
            .lock()
            .unwrap()
            .pending
            .remove(&(identity.to_string(), request_id.to_string()));
        match sender {
            Some(sender) => {
                let _ = sender.send(Ok(payload));
            }
            None => debug!(identity, request_id, "CALLRESULT for unknown correlation"),
        }
    }

    /// Delivers a CALLERROR to the waiter for `(identity, request_id)`.
    pub fn complete_error(
        &self,
        identity: &str,
        request_id: &str,
        error_code: String,
        error_description: String,
        error_details: serde_json::Value,
    ) {
        let sender = self
            .inner
            .lock()
            .unwrap()
            .pending
            .remove(&(identity.to_string(), request_id.to_string()));
        match sender {
            Some(sender) => {
                let _ = sender.send(Err((error_code, error_description, error_details)));
            }
            None => debug!(identity, request_id, "CALLERROR for unknown correlation"),
        }
    }

    /// Full outbound remote-CALL protocol (spec §4.E): look up transport,
    /// allocate a request id, install a waiter, send, await with a 12s
    /// timeout. The waiter is removed from the correlation table on every
    /// exit path.
    pub async fn call(
        &self,
        identity: &str,
        action: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, CommandError> {
        let transport = self
            .get(identity)
            .ok_or_else(|| CommandError::NotConnected(identity.to_string()))?;

        let request_id = self.allocate_request_id(identity);
        let rx = self.install_waiter(identity, &request_id);

        let frame =
            crate::support::ocpp_frame::OcppFrame::Call {
                unique_id: request_id.clone(),
                action: action.to_string(),
                payload,
            };

        if let Err(e) = transport.send_text(frame.serialize()) {
            self.remove_waiter(identity, &request_id);
            return Err(CommandError::SendFailed(identity.to_string(), e));
        }

        let result = timeout(OUTBOUND_CALL_TIMEOUT, rx).await;
        self.remove_waiter(identity, &request_id);

        match result {
            Ok(Ok(Ok(payload))) => Ok(payload),
            Ok(Ok(Err((code, description, _details)))) => {
                warn!(identity, action, code, description, "station CALLERROR");
                Err(CommandError::CallError { code, description })
            }
            Ok(Err(_recv_error)) => Err(CommandError::Cancelled),
            Err(_elapsed) => Err(CommandError::Timeout),
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedConnectionRegistry = Arc<ConnectionRegistry>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingTransport {
        sent: Mutex<Vec<String>>,
    }

    impl Transport for RecordingTransport {
        fn send_text(&self, text: String) -> Result<(), String> {
            self.sent.lock().unwrap().push(text);
            Ok(())
        }
    }

    #[test]
    fn allocate_request_id_seeds_above_900_million_and_is_monotonic() {
        let registry = ConnectionRegistry::new();
        let first = registry.allocate_request_id("CP1");
        let second = registry.allocate_request_id("CP1");
        assert_eq!(first, "900000001");
        assert_eq!(second, "900000002");

        // A different station's counter is independent.
        let other = registry.allocate_request_id("CP2");
        assert_eq!(other, "900000001");
    }

    #[test]
    fn register_overwrites_prior_entry_without_unregistering_it() {
        let registry = ConnectionRegistry::new();
        let t1: Arc<dyn Transport> = Arc::new(RecordingTransport {
            sent: Mutex::new(vec![]),
        });
        let t2: Arc<dyn Transport> = Arc::new(RecordingTransport {
            sent: Mutex::new(vec![]),
        });

        registry.register("CP1", t1.clone());
        registry.register("CP1", t2.clone());

        assert!(Arc::ptr_eq(&registry.get("CP1").unwrap(), &t2));

        // A stale unregister against the old handle must not evict the new one.
        registry.unregister_if_same("CP1", &t1);
        assert!(registry.get("CP1").is_some());

        registry.unregister_if_same("CP1", &t2);
        assert!(registry.get("CP1").is_none());
    }

    #[tokio::test]
    async fn call_completes_from_complete() {
        let registry = Arc::new(ConnectionRegistry::new());
        let transport: Arc<dyn Transport> = Arc::new(RecordingTransport {
            sent: Mutex::new(vec![]),
        });
        registry.register("CP1", transport);

        let registry2 = registry.clone();
        let call_task = tokio::spawn(async move {
            registry2
                .call("CP1", "RemoteStartTransaction", serde_json::json!({}))
                .await
        });

        // Give the call a moment to install its waiter, then resolve it
        // as if a CALLRESULT had arrived.
        tokio::time::sleep(Duration::from_millis(10)).await;
        registry.complete("CP1", "900000001", serde_json::json!({"status": "Accepted"}));

        let result = call_task.await.unwrap().unwrap();
        assert_eq!(result["status"], "Accepted");
    }

    #[tokio::test]
    async fn call_without_transport_fails_fast() {
        let registry = ConnectionRegistry::new();
        let err = registry
            .call("GHOST", "RemoteStartTransaction", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotConnected(_)));
    }

    #[tokio::test]
    async fn unregister_cancels_outstanding_waiters() {
        let registry = Arc::new(ConnectionRegistry::new());
        let transport: Arc<dyn Transport> = Arc::new(RecordingTransport {
            sent: Mutex::new(vec![]),
        });
        registry.register("CP1", transport.clone());

        let registry2 = registry.clone();
        let call_task = tokio::spawn(async move {
            registry2
                .call("CP1", "RemoteStopTransaction", serde_json::json!({}))
                .await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        registry.unregister_if_same("CP1", &transport);

        let err = call_task.await.unwrap().unwrap_err();
        assert!(matches!(err, CommandError::Cancelled));
    }

    #[test]
    fn complete_for_unknown_correlation_is_a_no_op() {
        let registry = ConnectionRegistry::new();
        // Must not panic.
        registry.complete("CP1", "900000001", serde_json::json!({}));
        let counter = AtomicUsize::new(0);
        counter.fetch_add(1, Ordering::SeqCst);
    }
}
