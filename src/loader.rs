use std::collections::HashMap;

use crate::pack::GamePack;

/// Observable state of an in-flight asset load. The single tick loop polls
/// these instead of awaiting; there is no parallelism to guard against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready,
    Failed(String),
}

/// Handle to an asset load started with [`ModelLoader::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    name: String,
}

impl LoadTicket {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Asynchronous model import, the `importModel` seam of the host engine.
/// Implementations decide when a ticket resolves; the state machine only
/// ever polls.
pub trait ModelLoader {
    fn begin(&mut self, name: &str) -> LoadTicket;
    fn poll(&mut self, ticket: &LoadTicket) -> LoadState;
}

/// Loader backed by a [`GamePack`]: every bundled blob is already resident
/// in memory, so tickets resolve on the first poll. Unknown names fail the
/// load rather than stalling it.
#[derive(Debug)]
pub struct PackLoader {
    pack: GamePack,
}

impl PackLoader {
    pub fn new(pack: GamePack) -> Self {
        Self { pack }
    }

    pub fn pack(&self) -> &GamePack {
        &self.pack
    }
}

impl ModelLoader for PackLoader {
    fn begin(&mut self, name: &str) -> LoadTicket {
        LoadTicket {
            name: name.to_string(),
        }
    }

    fn poll(&mut self, ticket: &LoadTicket) -> LoadState {
        if self.pack.file(ticket.name()).is_some() {
            LoadState::Ready
        } else {
            LoadState::Failed(format!("pack has no entry named {}", ticket.name()))
        }
    }
}

/// Loader whose tickets stay pending until the caller resolves them by
/// hand. Lets tests hold a transition in flight or force a failure.
#[derive(Debug, Default)]
pub struct StagedLoader {
    states: HashMap<String, LoadState>,
}

impl StagedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an asset ready; pending tickets for it resolve on next poll.
    pub fn complete(&mut self, name: &str) {
        self.states.insert(name.to_string(), LoadState::Ready);
    }

    /// Marks an asset failed with the given reason.
    pub fn fail(&mut self, name: &str, reason: &str) {
        self.states
            .insert(name.to_string(), LoadState::Failed(reason.to_string()));
    }
}

impl ModelLoader for StagedLoader {
    fn begin(&mut self, name: &str) -> LoadTicket {
        self.states
            .entry(name.to_string())
            .or_insert(LoadState::Pending);
        LoadTicket {
            name: name.to_string(),
        }
    }

    fn poll(&mut self, ticket: &LoadTicket) -> LoadState {
        self.states
            .get(ticket.name())
            .cloned()
            .unwrap_or(LoadState::Pending)
    }
}
