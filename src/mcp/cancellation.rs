//! Cancellation of in-flight tool calls
//!
//! Every `tools/call` with an id gets a token; `notifications/cancelled`
//! fires it. Long-running tools (the deploy wait) select on the token.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::mcp::protocol::JsonRpcId;

/// Token handed to one registered request
#[derive(Debug, Clone)]
pub struct Registration {
    pub token: CancellationToken,
    generation: u64,
}

/// Cancellation tokens of active requests, indexed by request id
///
/// A client may reuse an id while an earlier request with it is still
/// running; the newest registration owns the id.
#[derive(Debug, Default)]
pub struct CancellationManager {
    tokens: DashMap<JsonRpcId, (u64, CancellationToken)>,
    next_generation: AtomicU64,
}

impl CancellationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cancellable request
    pub fn register(&self, request_id: JsonRpcId) -> Registration {
        let token = CancellationToken::new();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.tokens.insert(request_id.clone(), (generation, token.clone()));

        debug!(request_id = ?request_id, "Registered cancellable request");

        Registration { token, generation }
    }

    /// Cancel a request; returns `false` when it is unknown or already done
    pub fn cancel(&self, request_id: &JsonRpcId) -> bool {
        match self.tokens.get(request_id) {
            Some(entry) => {
                entry.value().1.cancel();
                debug!(request_id = ?request_id, "Cancelled request");
                true
            }
            None => {
                debug!(request_id = ?request_id, "Request not found for cancellation");
                false
            }
        }
    }

    /// Forget a finished request, unless its id was registered again since
    pub fn complete(&self, request_id: &JsonRpcId, registration: &Registration) {
        self.tokens.remove_if(request_id, |_, (generation, _)| {
            *generation == registration.generation
        });
    }

    /// Fire every outstanding token
    pub fn cancel_all(&self) {
        for entry in self.tokens.iter() {
            entry.value().1.cancel();
        }
    }

    pub fn active_count(&self) -> usize {
        self.tokens.len()
    }
}
