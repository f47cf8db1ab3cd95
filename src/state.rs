use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::DispatchConfig;
use crate::models::event::DispatchEvent;
use crate::observability::metrics::Metrics;
use crate::services::chat::{ChatService, InMemoryChat};
use crate::services::settings::{SettingsStore, MAX_ORDERS_PER_TRIP};
use crate::store::locks::LockTable;
use crate::store::Store;

pub struct AppState {
    pub store: Store,
    pub settings: SettingsStore,
    pub chat: Arc<dyn ChatService>,
    pub locks: LockTable,
    pub events_tx: broadcast::Sender<DispatchEvent>,
    pub metrics: Metrics,
    pub dispatch: DispatchConfig,
}

impl AppState {
    pub fn new(dispatch: DispatchConfig, event_buffer_size: usize) -> Self {
        Self::with_chat(dispatch, event_buffer_size, Arc::new(InMemoryChat::new()))
    }

    pub fn with_chat(
        dispatch: DispatchConfig,
        event_buffer_size: usize,
        chat: Arc<dyn ChatService>,
    ) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        let settings = SettingsStore::new();
        settings.set(MAX_ORDERS_PER_TRIP, dispatch.max_orders_per_trip.to_string());

        Self {
            store: Store::new(),
            settings,
            chat,
            locks: LockTable::new(),
            events_tx,
            metrics: Metrics::new(),
            dispatch,
        }
    }

    /// Nobody listening is not an error.
    pub fn publish(&self, event: DispatchEvent) {
        let _ = self.events_tx.send(event);
    }
}
