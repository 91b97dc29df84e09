//! Per-section ordering of persistence continuations.
//!
//! Every optimistic mutation takes a [`Ticket`] at call time, naming the
//! sections it touches. A ticket becomes ready once every earlier ticket
//! on any of those sections has been dropped, so continuations for one
//! section persist and roll back strictly in call order. Tickets are handed
//! out while the queue lock is held, which keeps the wait graph acyclic.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use taskboard_proto::SectionId;

/// How persistence continuations on the same section relate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOrdering {
    /// One continuation per section at a time, in call order.
    #[default]
    Serialized,
    /// Continuations race; a rollback refetch may clobber a later
    /// optimistic mutation on the same section.
    Unordered,
}

impl std::str::FromStr for MutationOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serialized" => Ok(Self::Serialized),
            "unordered" => Ok(Self::Unordered),
            other => Err(format!("unknown mutation ordering: {other}")),
        }
    }
}

/// Hands out per-section tickets.
#[derive(Debug, Default)]
pub struct SectionQueue {
    ordering: MutationOrdering,
    /// Completion signal of the most recent ticket per section.
    tails: Mutex<HashMap<SectionId, oneshot::Receiver<()>>>,
}

impl SectionQueue {
    #[must_use]
    pub fn new(ordering: MutationOrdering) -> Self {
        Self {
            ordering,
            tails: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn ordering(&self) -> MutationOrdering {
        self.ordering
    }

    /// Takes a place in line on every listed section.
    ///
    /// Under [`MutationOrdering::Unordered`] the ticket is ready at once.
    pub fn enqueue(&self, sections: &[SectionId]) -> Ticket {
        let mut ticket = Ticket::default();
        if self.ordering == MutationOrdering::Unordered {
            return ticket;
        }

        let mut tails = self.tails.lock();
        // Sections whose last ticket is gone have nothing to wait for.
        tails.retain(|_, tail| !matches!(tail.try_recv(), Err(TryRecvError::Closed)));
        for (i, section) in sections.iter().enumerate() {
            if sections[..i].contains(section) {
                continue;
            }
            let (done, next) = oneshot::channel();
            if let Some(previous) = tails.insert(section.clone(), next) {
                ticket.waits.push(previous);
            }
            ticket.done.push(done);
        }
        ticket
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.tails.lock().len()
    }
}

/// A place in line on one or more sections. Dropping it lets the next
/// ticket on those sections proceed.
#[derive(Debug, Default)]
pub struct Ticket {
    waits: Vec<oneshot::Receiver<()>>,
    done: Vec<oneshot::Sender<()>>,
}

impl Ticket {
    /// Waits for every earlier ticket on the same sections to be dropped.
    pub async fn ready(&mut self) {
        // Pop only after completion so a cancelled wait can be resumed.
        while let Some(wait) = self.waits.last_mut() {
            // Nothing is ever sent: the sender being dropped is the signal.
            let _ = wait.await;
            self.waits.pop();
        }
    }

    /// True when there is nothing left to wait for.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.waits.is_empty()
    }
}
