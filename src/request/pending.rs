//! Pending-request table: single-flight coordination.

use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Outcome fanned out to every waiter of one in-flight request.
pub(crate) type Settlement = Result<Value>;

struct PendingEntry {
    tx: broadcast::Sender<Settlement>,
    waiters: usize,
    cancel: CancellationToken,
}

/// What `join` handed back: either this caller started the flight and must
/// spawn the transport, or it joined an existing one.
pub(crate) enum JoinOutcome {
    Leader {
        rx: broadcast::Receiver<Settlement>,
        cancel: CancellationToken,
    },
    Follower {
        rx: broadcast::Receiver<Settlement>,
    },
}

/// In-flight requests keyed by fingerprint.
///
/// `join` is an atomic check-and-register under one mutex, which is what
/// makes the at-most-one-transport-per-fingerprint guarantee structural:
/// there is no interleaving between observing an absent entry and
/// publishing the new one.
#[derive(Default)]
pub(crate) struct PendingTable {
    inner: Mutex<HashMap<String, PendingEntry>>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the flight for `key`, registering it if absent.
    pub fn join(&self, key: &str) -> JoinOutcome {
        let mut map = self.inner.lock().unwrap();
        if let Some(entry) = map.get_mut(key) {
            entry.waiters += 1;
            return JoinOutcome::Follower {
                rx: entry.tx.subscribe(),
            };
        }

        let (tx, rx) = broadcast::channel(1);
        let cancel = CancellationToken::new();
        map.insert(
            key.to_string(),
            PendingEntry {
                tx,
                waiters: 1,
                cancel: cancel.clone(),
            },
        );
        JoinOutcome::Leader { rx, cancel }
    }

    /// Settle the flight: every waiter receives the same outcome and the
    /// entry is removed so a later identical request starts fresh.
    pub fn settle(&self, key: &str, outcome: Settlement) {
        let entry = self.inner.lock().unwrap().remove(key);
        if let Some(entry) = entry {
            // Waiters may all have left already; a dead channel is fine.
            let _ = entry.tx.send(outcome);
        }
    }

    /// A waiter canceled its own join. Returns true when it was the last
    /// one, in which case the shared transport is also canceled and the
    /// entry removed (reference-counted cancellation).
    pub fn leave(&self, key: &str) -> bool {
        let mut map = self.inner.lock().unwrap();
        if let Some(entry) = map.get_mut(key) {
            entry.waiters = entry.waiters.saturating_sub(1);
            if entry.waiters == 0 {
                entry.cancel.cancel();
                map.remove(key);
                debug!(key, "last waiter left, canceling shared transport");
                return true;
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    #[test]
    fn test_first_join_leads_subsequent_follow() {
        let table = PendingTable::new();
        assert!(matches!(table.join("fp"), JoinOutcome::Leader { .. }));
        assert!(matches!(table.join("fp"), JoinOutcome::Follower { .. }));
        assert!(matches!(table.join("other"), JoinOutcome::Leader { .. }));
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_settle_reaches_all_waiters_and_clears_entry() {
        let table = PendingTable::new();
        let JoinOutcome::Leader { mut rx, .. } = table.join("fp") else {
            panic!("expected leader");
        };
        let JoinOutcome::Follower { rx: mut rx2 } = table.join("fp") else {
            panic!("expected follower");
        };

        table.settle("fp", Ok(json!("done")));
        assert_eq!(rx.recv().await.unwrap().unwrap(), json!("done"));
        assert_eq!(rx2.recv().await.unwrap().unwrap(), json!("done"));
        assert_eq!(table.len(), 0);

        // The fingerprint is reusable after settlement.
        assert!(matches!(table.join("fp"), JoinOutcome::Leader { .. }));
    }

    #[test]
    fn test_errors_fan_out_identically() {
        let table = PendingTable::new();
        let JoinOutcome::Leader { mut rx, .. } = table.join("fp") else {
            panic!("expected leader");
        };
        table.settle(
            "fp",
            Err(Error::HttpServer {
                status: 500,
                message: "boom".into(),
            }),
        );
        let got = rx.try_recv().unwrap();
        assert!(matches!(got, Err(Error::HttpServer { status: 500, .. })));
    }

    #[test]
    fn test_leave_cancels_only_when_last() {
        let table = PendingTable::new();
        let JoinOutcome::Leader { cancel, .. } = table.join("fp") else {
            panic!("expected leader");
        };
        table.join("fp");

        assert!(!table.leave("fp"));
        assert!(!cancel.is_cancelled());
        assert_eq!(table.len(), 1);

        assert!(table.leave("fp"));
        assert!(cancel.is_cancelled());
        assert_eq!(table.len(), 0);
    }
}
