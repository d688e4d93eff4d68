//! Search request lifecycle: `Idle → Loading → Success | Failed`.
//!
//! Each request runs on its own worker thread and reports back over a channel,
//! tagged with the generation it was issued under. Only a completion for the
//! current generation may change the state; anything older is dropped.

use crate::api::Transport;
use crate::error::SearchError;
use crate::models::ResultPayload;
use crate::query::{self, QueryDescriptor};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

/// Current status of the (single) authoritative search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Idle,
    Loading {
        query: QueryDescriptor,
    },
    Success {
        query: QueryDescriptor,
        payload: ResultPayload,
    },
    Failed {
        query: QueryDescriptor,
        message: String,
    },
}

impl SearchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SearchState::Loading { .. })
    }

    pub fn query(&self) -> Option<&QueryDescriptor> {
        match self {
            SearchState::Idle => None,
            SearchState::Loading { query }
            | SearchState::Success { query, .. }
            | SearchState::Failed { query, .. } => Some(query),
        }
    }

    pub fn payload(&self) -> Option<&ResultPayload> {
        match self {
            SearchState::Success { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SearchState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Handle for one issued request. Generations increase monotonically per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct Completion {
    ticket: Ticket,
    result: Result<ResultPayload, SearchError>,
}

/// Owns the search state and the transport used to fill it.
pub struct SearchClient<T: Transport> {
    transport: Arc<T>,
    state: SearchState,
    generation: u64,
    stale_discarded: u64,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
}

impl<T: Transport> SearchClient<T> {
    pub fn new(transport: T) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            transport: Arc::new(transport),
            state: SearchState::Idle,
            generation: 0,
            stale_discarded: 0,
            sender,
            receiver,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Number of completions dropped because a newer search had been started.
    pub fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    /// Validate raw form input, then search.
    ///
    /// A blank topic returns `SearchError::Validation` and leaves the state untouched.
    pub fn search_raw(
        &mut self,
        topic: &str,
        max_results: Option<&str>,
        min_upvotes: Option<&str>,
    ) -> Result<Ticket, SearchError> {
        let descriptor = query::build(topic, max_results, min_upvotes)?;
        Ok(self.search(descriptor))
    }

    /// Enter `Loading` for `descriptor` and fetch it on a worker thread.
    pub fn search(&mut self, descriptor: QueryDescriptor) -> Ticket {
        let ticket = self.begin(descriptor.clone());
        let transport = Arc::clone(&self.transport);
        let sender = self.sender.clone();
        thread::spawn(move || {
            let result = transport.fetch(&descriptor);
            // The receiver only disappears with the client itself.
            let _ = sender.send(Completion { ticket, result });
        });
        ticket
    }

    /// State transition half of [`search`](Self::search), without any I/O.
    ///
    /// Any earlier ticket becomes stale.
    pub fn begin(&mut self, descriptor: QueryDescriptor) -> Ticket {
        self.generation += 1;
        let ticket = Ticket(self.generation);
        log::info!(
            "search #{} topic={:?} n={} upvotes_min={}",
            ticket.0,
            descriptor.topic(),
            descriptor.max_results(),
            descriptor.min_upvotes()
        );
        self.state = SearchState::Loading { query: descriptor };
        ticket
    }

    /// Apply the outcome of the request issued under `ticket`.
    ///
    /// Returns `false` (and changes nothing) when `ticket` is no longer current.
    pub fn resolve(&mut self, ticket: Ticket, result: Result<ResultPayload, SearchError>) -> bool {
        if ticket.0 != self.generation || !self.state.is_loading() {
            self.stale_discarded += 1;
            log::debug!(
                "discarding completion #{} (current #{})",
                ticket.0,
                self.generation
            );
            return false;
        }
        let query = match std::mem::replace(&mut self.state, SearchState::Idle) {
            SearchState::Loading { query } => query,
            // is_loading() was checked above
            other => {
                self.state = other;
                return false;
            }
        };
        self.state = match result {
            Ok(payload) => {
                log::info!(
                    "search #{} returned {} posts",
                    ticket.0,
                    payload.posts.len()
                );
                SearchState::Success { query, payload }
            }
            Err(err) => {
                log::info!("search #{} failed: {err}", ticket.0);
                SearchState::Failed {
                    query,
                    message: format!("Failed to load recommendations: {err}"),
                }
            }
        };
        true
    }

    /// Apply every completion that has already arrived. Never blocks.
    ///
    /// Returns `true` when the visible state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.receiver.try_recv() {
                Ok(c) => changed |= self.resolve(c.ticket, c.result),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        changed
    }

    /// Block until the current search resolves. Returns immediately when not loading.
    pub fn wait(&mut self) -> &SearchState {
        while self.state.is_loading() {
            match self.receiver.recv() {
                Ok(c) => {
                    self.resolve(c.ticket, c.result);
                }
                Err(_) => break,
            }
        }
        &self.state
    }

    /// Back to `Idle`; anything still in flight becomes stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = SearchState::Idle;
    }
}
