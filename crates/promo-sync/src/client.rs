//! # Promotion Client
//!
//! One per storefront viewer. Keeps the last-known active promotion and
//! prices carts against it.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  spawn() ──► Loading ──fetch ok──────► Resolved(Some(promo))            │
//! │                 ▲    ──fetch err/timeout──► Resolved(None)  (fail open) │
//! │                 │                             │                         │
//! │                 └──────── ChangeEvent ◄───────┘                         │
//! │                                                                         │
//! │  close() / drop ──► Closed (worker stopped, subscription released)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A change event that arrives while a fetch is in flight cancels that fetch
//! and starts a new one. Only the newest fetch ever reaches the snapshot.

use promo_core::{compute_pricing, CartLine, CoreResult, PricingResult, Promotion};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::notifier::{ChangeNotifier, Subscription};
use crate::store::PromotionStore;

// =============================================================================
// Configuration
// =============================================================================

/// Client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound for one fetch of the active promotion.
    pub fetch_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            fetch_timeout: Duration::from_secs(5),
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    /// A fetch is in flight. The last-known promotion is still served.
    Loading,
    /// The newest fetch finished (or failed open).
    Resolved,
    /// The client was closed.
    Closed,
}

/// What a viewer currently knows.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSnapshot {
    pub status: ClientStatus,
    pub promotion: Option<Promotion>,
    /// Number of the fetch this snapshot belongs to. Starts at 1.
    pub generation: u64,
}

impl ClientSnapshot {
    fn initial() -> Self {
        ClientSnapshot {
            status: ClientStatus::Loading,
            promotion: None,
            generation: 1,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == ClientStatus::Resolved
    }
}

// =============================================================================
// Client
// =============================================================================

/// Viewer-side cache of the active promotion.
///
/// ## Example
/// ```rust,ignore
/// let client = PromotionClient::spawn(store, &notifier, ClientConfig::default());
/// client.wait_until_resolved().await?;
/// let totals = client.price(&cart_lines)?;
/// ```
#[derive(Debug)]
pub struct PromotionClient {
    state_rx: watch::Receiver<ClientSnapshot>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PromotionClient {
    /// Subscribes to `notifier` and starts the background worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(store: Arc<dyn PromotionStore>, notifier: &ChangeNotifier, config: ClientConfig) -> Self {
        let subscription = notifier.subscribe();
        let (state_tx, state_rx) = watch::channel(ClientSnapshot::initial());
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let worker = ClientWorker {
            store,
            subscription,
            state_tx,
            fetch_timeout: config.fetch_timeout,
        };
        let task = tokio::spawn(worker.run(shutdown_rx));

        debug!("Promotion client started");

        PromotionClient {
            state_rx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// The last-known active promotion.
    pub fn get_active_promotion(&self) -> Option<Promotion> {
        self.state_rx.borrow().promotion.clone()
    }

    pub fn has_active_promotion(&self) -> bool {
        self.state_rx
            .borrow()
            .promotion
            .as_ref()
            .map_or(false, |p| p.is_active)
    }

    pub fn snapshot(&self) -> ClientSnapshot {
        self.state_rx.borrow().clone()
    }

    pub fn status(&self) -> ClientStatus {
        self.state_rx.borrow().status
    }

    /// Prices `lines` against the last-known promotion.
    pub fn price(&self, lines: &[CartLine]) -> CoreResult<PricingResult> {
        let promotion = self.get_active_promotion();
        compute_pricing(lines, promotion.as_ref())
    }

    /// Waits until the newest fetch has finished.
    ///
    /// ## Returns
    /// * `Err(SyncError::ClientClosed)` - The client was closed first
    pub async fn wait_until_resolved(&self) -> SyncResult<ClientSnapshot> {
        let mut rx = self.state_rx.clone();
        let snapshot = rx
            .wait_for(|s| s.status != ClientStatus::Loading)
            .await
            .map_err(|_| SyncError::ClientClosed)?
            .clone();

        match snapshot.status {
            ClientStatus::Closed => Err(SyncError::ClientClosed),
            _ => Ok(snapshot),
        }
    }

    /// Watch channel for UI consumers that re-render on every change.
    pub fn subscribe(&self) -> watch::Receiver<ClientSnapshot> {
        self.state_rx.clone()
    }

    /// Stops the worker and releases the change subscription.
    ///
    /// Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Promotion client worker ended abnormally");
            }
            info!("Promotion client closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for PromotionClient {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// =============================================================================
// Worker
// =============================================================================

type FetchFuture = Pin<Box<dyn Future<Output = SyncResult<Option<Promotion>>> + Send>>;

struct ClientWorker {
    store: Arc<dyn PromotionStore>,
    subscription: Subscription,
    state_tx: watch::Sender<ClientSnapshot>,
    fetch_timeout: Duration,
}

impl ClientWorker {
    fn fetch(&self) -> FetchFuture {
        let store = self.store.clone();
        let timeout = self.fetch_timeout;

        Box::pin(async move {
            match tokio::time::timeout(timeout, store.fetch_active()).await {
                Ok(result) => result,
                Err(_) => Err(SyncError::Timeout(timeout.as_millis() as u64)),
            }
        })
    }

    async fn run(mut self, mut shutdown_rx: mpsc::Receiver<()>) {
        let mut generation: u64 = 1;
        let mut in_flight = self.fetch();
        let mut fetch_pending = true;
        let mut events_open = true;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("Promotion client worker received shutdown");
                    break;
                }

                result = &mut in_flight, if fetch_pending => {
                    fetch_pending = false;
                    self.apply(generation, result);
                }

                event = self.subscription.recv(), if events_open => {
                    match event {
                        Some(event) => {
                            generation += 1;
                            debug!(
                                sequence = event.sequence,
                                missed = event.missed,
                                generation,
                                superseded = fetch_pending,
                                "Promotion change received, refetching"
                            );
                            self.state_tx.send_modify(|s| {
                                s.status = ClientStatus::Loading;
                                s.generation = generation;
                            });
                            in_flight = self.fetch();
                            fetch_pending = true;
                        }
                        None => {
                            debug!("Promotion change feed closed");
                            events_open = false;
                        }
                    }
                }
            }
        }

        self.subscription.close();
        self.state_tx.send_replace(ClientSnapshot {
            status: ClientStatus::Closed,
            promotion: None,
            generation,
        });
    }

    fn apply(&self, generation: u64, result: SyncResult<Option<Promotion>>) {
        let promotion = match result {
            Ok(promotion) => {
                debug!(
                    generation,
                    promotion_id = promotion.as_ref().map(|p| p.id.as_str()).unwrap_or("-"),
                    "Active promotion resolved"
                );
                promotion
            }
            Err(e) => {
                warn!(generation, error = %e, "Active promotion fetch failed, pricing without promotion");
                None
            }
        };

        self.state_tx.send_replace(ClientSnapshot {
            status: ClientStatus::Resolved,
            promotion,
            generation,
        });
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
