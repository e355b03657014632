//! Pause/resume broadcast channel.
//!
//! The [`EventBus`] resource records which entities want to hear about each
//! [`SignalKind`]. Subscribing returns a [`Subscription`] handle; cancelling
//! the handle consumes it, so each registration is released at most once.
//!
//! The bus only keeps the registry. Broadcasting is done by triggering a
//! [`GlobalSignalEvent`](crate::events::globalsignal::GlobalSignalEvent), whose
//! observer looks up the subscribers here and hands the signal to each one.
//! Delivery order between subscribers is unspecified.

use bevy_ecs::prelude::{Entity, Resource};
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Kinds of global signal carried by the bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    Pause,
    Resume,
}

/// Opaque identifier of one registration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Cancellable handle returned by [`EventBus::subscribe`].
///
/// Not `Clone`: whoever holds it is the only one able to cancel it.
#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
    id: SubscriptionId,
    kind: SignalKind,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    /// Remove the registration from `bus`.
    ///
    /// Returns `false` if the bus no longer knew about it.
    pub fn cancel(self, bus: &mut EventBus) -> bool {
        bus.unsubscribe(self.id, self.kind)
    }
}

/// Registry of signal subscribers, keyed by signal kind.
#[derive(Resource, Debug, Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: FxHashMap<SignalKind, Vec<(SubscriptionId, Entity)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber` for `kind`.
    pub fn subscribe(&mut self, kind: SignalKind, subscriber: Entity) -> Subscription {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers
            .entry(kind)
            .or_default()
            .push((id, subscriber));
        debug!("{:?} subscribed to {:?} as {:?}", subscriber, kind, id);
        Subscription { id, kind }
    }

    fn unsubscribe(&mut self, id: SubscriptionId, kind: SignalKind) -> bool {
        let Some(list) = self.subscribers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sid, _)| *sid != id);
        let removed = list.len() != before;
        if removed {
            debug!("Cancelled {:?} subscription {:?}", kind, id);
        }
        removed
    }

    /// Snapshot of the entities currently subscribed to `kind`.
    pub fn subscribers(&self, kind: SignalKind) -> SmallVec<[Entity; 8]> {
        self.subscribers
            .get(&kind)
            .map(|list| list.iter().map(|(_, e)| *e).collect())
            .unwrap_or_default()
    }

    pub fn subscription_count(&self, kind: SignalKind) -> usize {
        self.subscribers.get(&kind).map_or(0, Vec::len)
    }

    pub fn is_subscribed(&self, kind: SignalKind, entity: Entity) -> bool {
        self.subscribers
            .get(&kind)
            .is_some_and(|list| list.iter().any(|(_, e)| *e == entity))
    }
}
