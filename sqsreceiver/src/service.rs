//! On-demand receive used by the HTTP handler

use sqsreceiver_core::Message;
use sqsreceiver_queue::QueueError;
use tracing::{info, warn};

use crate::state::AppState;

/// Receive one batch, buffer and acknowledge each message, then return the buffer.
///
/// Every message received here is stamped with `priority_filter` as its priority.
/// Messages are deleted from the queue right after they are buffered; a failed delete
/// aborts the call with the message already buffered.
pub async fn receive_and_list(
    state: &AppState,
    priority_filter: Option<&str>,
) -> Result<Vec<Message>, QueueError> {
    let received = state.queue.receive_messages(state.batch_size).await?;

    for message in received {
        info!(
            body = ?message.body,
            priority = ?priority_filter,
            "Received message"
        );
        state
            .buffer
            .append(Message::new(message.body, priority_filter.map(str::to_string)));

        match message.receipt_handle.as_deref() {
            Some(handle) => state.queue.delete_message(handle).await?,
            None => warn!(message_id = ?message.message_id, "Missing receipt handle, not deleting"),
        }
    }

    Ok(state.buffer.snapshot(priority_filter))
}
