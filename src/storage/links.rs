//! Reply-link map
//!
//! Remembers which client each forwarded group message came from, so a
//! group member can address a reply by replying to the forwarded message
//! itself. The map is in-memory and capacity-bounded; losing a link only
//! degrades a reply to the ambiguous case, it never misroutes.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::Mutex;

/// Oldest links are evicted beyond this many entries.
const CAPACITY: usize = 4096;

/// Map of (group id, message id) to the originating client id.
#[derive(Debug, Clone, Default)]
pub struct ReplyLinks {
    inner: Arc<Mutex<Links>>,
}

#[derive(Debug, Default)]
struct Links {
    map: HashMap<(i64, i64), i64>,
    order: VecDeque<(i64, i64)>,
}

impl ReplyLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember that `message_id` delivered in `group_id` carries content
    /// from `client_id`.
    pub async fn record(&self, group_id: i64, message_id: i64, client_id: i64) {
        let mut inner = self.inner.lock().await;
        if inner.map.insert((group_id, message_id), client_id).is_none() {
            inner.order.push_back((group_id, message_id));
            if inner.order.len() > CAPACITY {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.map.remove(&oldest);
                }
            }
        }
    }

    /// Client the forwarded message `message_id` in `group_id` came from.
    pub async fn lookup(&self, group_id: i64, message_id: i64) -> Option<i64> {
        self.inner.lock().await.map.get(&(group_id, message_id)).copied()
    }
}
