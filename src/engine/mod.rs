pub mod capacity;
pub mod eligibility;
pub mod expiry;
pub mod lifecycle;
pub mod listing;
pub mod negotiation;
pub mod resolve;
pub mod stats;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::models::event::DispatchEvent;
use crate::models::order::OrderStatus;
use crate::services::chat::ChatError;
use crate::state::AppState;

/// Chat membership follows a committed state change and never undoes it.
pub(crate) fn chat_best_effort(
    state: &AppState,
    order_id: Uuid,
    operation: &'static str,
    result: Result<(), ChatError>,
) {
    if let Err(err) = result {
        state.metrics.chat_failures_total.inc();
        warn!(order_id = %order_id, operation, error = %err, "chat membership update failed");
    }
}

pub(crate) fn record_transition(state: &AppState, order_id: Uuid, status: OrderStatus) {
    state
        .metrics
        .order_transitions_total
        .with_label_values(&[status.as_str()])
        .inc();
    state.publish(DispatchEvent::OrderStatusChanged {
        order_id,
        status,
        at: Utc::now(),
    });
}

#[cfg(test)]
pub(crate) mod testing;
