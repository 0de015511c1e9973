//! The async key-event source feeding the editor loop (§4.6 step 2): a
//! background Tokio task reads `crossterm::EventStream` and forwards
//! translated key presses as `edge_events::LoopEvent::Key` over an mpsc
//! channel, so the single-threaded main loop can `select!` on it
//! alongside the WorkQueue wake-up and any watched buffer fd.

mod async_service;
mod key_token;

pub use async_service::AsyncInputShutdown;

use async_service::spawn_async_event_task;
use edge_events::LoopEvent;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

/// Spawn the async input service backed by `crossterm::EventStream`.
///
/// Returns the `JoinHandle` for the background task alongside a shutdown
/// handle that can be used to request immediate termination.
pub fn spawn_async_input(sender: Sender<LoopEvent>) -> (JoinHandle<()>, AsyncInputShutdown) {
    spawn_async_event_task(sender)
}
