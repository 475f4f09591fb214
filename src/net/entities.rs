//! Entities the router drives: remote actors, props and the local player

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use tracing::{debug, info, info_span, warn, Span};

use crate::action::{Action, ActionQueue, ContinuousState, DiscreteState};
use crate::protocol::{ActorSnapshot, Prop};
use crate::util::time::default_expiration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Actor { asset_id: i32 },
    Prop { asset_id: i32 },
}

#[derive(Debug)]
pub struct Entity {
    pub id: i32,
    pub kind: EntityKind,
    pub queue: ActionQueue,
}

/// Id-keyed store of every entity except the local player
#[derive(Debug)]
pub struct EntityManager {
    entities: BTreeMap<i32, Entity>,
    span: Span,
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityManager {
    pub fn new() -> Self {
        Self::with_span(info_span!("entities"))
    }

    pub fn with_span(span: Span) -> Self {
        Self {
            entities: BTreeMap::new(),
            span,
        }
    }

    fn insert(&mut self, id: i32, kind: EntityKind, initial: DiscreteState, now: DateTime<Utc>) {
        let span = info_span!(parent: &self.span, "action_queue", entity = id);
        let mut queue = ActionQueue::with_span(span);
        queue.add_action(Action::init(initial, default_expiration(now)));
        if self.entities.insert(id, Entity { id, kind, queue }).is_some() {
            debug!(parent: &self.span, entity_id = id, "Replaced existing entity");
        }
    }

    /// Register an actor and place it with an Init action
    pub fn spawn_actor(&mut self, actor: &ActorSnapshot, now: DateTime<Utc>) {
        self.insert(
            actor.actor_id,
            EntityKind::Actor {
                asset_id: actor.asset_id,
            },
            DiscreteState::at(actor.location, actor.rotation_degrees),
            now,
        );
    }

    pub fn spawn_prop(&mut self, prop: &Prop, now: DateTime<Utc>) {
        let initial = DiscreteState {
            border_radius: prop.border_radius,
            border_color: prop.border_color,
            border_color_follower_pov: prop.border_color_follower_pov.unwrap_or(prop.border_color),
            ..DiscreteState::at(prop.location, prop.rotation_degrees)
        };
        self.insert(
            prop.id,
            EntityKind::Prop {
                asset_id: prop.asset_id,
            },
            initial,
            now,
        );
    }

    /// Queue a Death. The entity is removed once it has played out.
    pub fn despawn(&mut self, id: i32, now: DateTime<Utc>) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.queue.add_action(Action::death(default_expiration(now)));
                true
            }
            None => {
                warn!(parent: &self.span, entity_id = id, "Despawn for unknown entity");
                false
            }
        }
    }

    /// Destroy every actor, keeping props
    pub fn clear_actors(&mut self) {
        self.entities
            .retain(|_, e| !matches!(e.kind, EntityKind::Actor { .. }));
    }

    /// Replace the full prop set
    pub fn reset_props(&mut self, props: &[Prop], now: DateTime<Utc>) {
        self.entities
            .retain(|_, e| !matches!(e.kind, EntityKind::Prop { .. }));
        for prop in props {
            self.spawn_prop(prop, now);
        }
    }

    pub fn add_action(&mut self, id: i32, action: Action) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.queue.add_action(action);
                true
            }
            None => {
                warn!(parent: &self.span, entity_id = id, action = action.name(), "Action for unknown entity dropped");
                false
            }
        }
    }

    /// Advance every queue and drop entities whose death has played out
    pub fn tick(&mut self, now: DateTime<Utc>) {
        for entity in self.entities.values_mut() {
            entity.queue.tick(now);
        }
        let span = &self.span;
        self.entities.retain(|id, e| {
            let dead = e.queue.state().end_of_life && !e.queue.is_busy();
            if dead {
                info!(parent: span, entity_id = *id, "Entity removed");
            }
            !dead
        });
    }

    pub fn get(&self, id: i32) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: i32) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// No entity has an action left to play
    pub fn is_idle(&self) -> bool {
        self.entities.values().all(|e| !e.queue.is_busy())
    }

    pub fn ids(&self) -> Vec<i32> {
        self.entities.keys().copied().collect()
    }

    /// What to draw this frame, ordered by id
    pub fn snapshot(&self) -> Vec<(i32, ContinuousState)> {
        self.entities
            .iter()
            .map(|(id, e)| (*id, e.queue.continuous_state()))
            .collect()
    }
}

/// Outcome of checking a server-echoed action against local predictions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Matched the oldest prediction
    Confirmed,
    /// Nothing was predicted, the action was applied as-is
    Applied,
    /// Prediction and server disagree, local state can't be trusted
    Diverged,
}

/// Whether a server echo describes the same move as a prediction
fn same_intent(predicted: &Action, confirmed: &Action) -> bool {
    match (predicted, confirmed) {
        (
            Action::Translate {
                displacement: a, ..
            },
            Action::Translate {
                displacement: b, ..
            },
        ) => a == b,
        (Action::Rotate { rotation: a, .. }, Action::Rotate { rotation: b, .. }) => {
            (a - b).abs() < 1e-3
        }
        (
            Action::Instant {
                displacement: da,
                rotation: ra,
                ..
            },
            Action::Instant {
                displacement: db,
                rotation: rb,
                ..
            },
        ) => da == db && (ra - rb).abs() < 1e-3,
        (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
    }
}

/// The locally controlled entity
#[derive(Debug)]
pub struct Player {
    id: Option<i32>,
    queue: ActionQueue,
    unconfirmed: VecDeque<Action>,
    span: Span,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self::with_span(info_span!("player"))
    }

    pub fn with_span(span: Span) -> Self {
        let queue = ActionQueue::with_span(info_span!(parent: &span, "action_queue", entity = "player"));
        Self {
            id: None,
            queue,
            unconfirmed: VecDeque::new(),
            span,
        }
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn set_id(&mut self, id: Option<i32>) {
        if self.id != id {
            info!(parent: &self.span, player_id = ?id, "Player id assigned");
        }
        self.id = id;
    }

    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    pub fn unconfirmed_len(&self) -> usize {
        self.unconfirmed.len()
    }

    /// Play an action locally ahead of server confirmation
    pub fn predict(&mut self, action: Action) {
        self.queue.add_action(action.clone());
        self.unconfirmed.push_back(action);
    }

    /// Check an action the server says this player made
    pub fn validate_from_network(&mut self, action: Action) -> Validation {
        match self.unconfirmed.pop_front() {
            None => {
                self.queue.add_action(action);
                Validation::Applied
            }
            Some(predicted) if same_intent(&predicted, &action) => Validation::Confirmed,
            Some(predicted) => {
                warn!(
                    parent: &self.span,
                    predicted = predicted.name(),
                    confirmed = action.name(),
                    "Server disagrees with predicted action"
                );
                self.queue.flush();
                self.unconfirmed.clear();
                Validation::Diverged
            }
        }
    }

    /// Hard reset to an authoritative state, dropping all predictions
    pub fn teleport(&mut self, state: DiscreteState, now: DateTime<Utc>) {
        self.queue.flush();
        self.unconfirmed.clear();
        self.queue.add_action(Action::init(state, default_expiration(now)));
    }

    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.queue.tick(now);
    }
}
