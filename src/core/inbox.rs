//! Per-user message queues in front of the dialogue router.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use crate::core::router::DialogueRouter;

type Queues = HashMap<i64, UnboundedSender<String>>;

/// Open queues keyed by user id
///
/// A queue exists while its drain task runs. Sends and the final emptiness
/// check both happen under `queues`, so a message is never left in a queue
/// whose task has stopped.
#[derive(Clone, Default)]
pub struct Inbox {
    queues: Arc<Mutex<Queues>>,
}

impl Inbox {
    pub fn submit(&self, router: &DialogueRouter, user_id: i64, text: String) {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);

        let text = match queues.get(&user_id) {
            Some(sender) => match sender.send(text) {
                Ok(()) => return,
                // Drain task died; start over with a fresh queue
                Err(rejected) => rejected.0,
            },
            None => text,
        };

        let (sender, receiver) = unbounded_channel();
        if sender.send(text).is_err() {
            return;
        }
        queues.insert(user_id, sender);
        drop(queues);

        tracing::debug!("Opened message queue for user {}", user_id);
        tokio::spawn(drain(self.clone(), router.clone(), user_id, receiver));
    }

    /// Number of users with queued or in-progress messages
    pub fn open_queues(&self) -> usize {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn next(&self, user_id: i64, receiver: &mut UnboundedReceiver<String>) -> Option<String> {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        match receiver.try_recv() {
            Ok(text) => Some(text),
            Err(_) => {
                queues.remove(&user_id);
                None
            }
        }
    }
}

async fn drain(
    inbox: Inbox,
    router: DialogueRouter,
    user_id: i64,
    mut receiver: UnboundedReceiver<String>,
) {
    while let Some(text) = inbox.next(user_id, &mut receiver) {
        router.handle(user_id, &text).await;
    }
    tracing::debug!("Closed message queue for user {}", user_id);
}
