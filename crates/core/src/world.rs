//! Truth store - the authoritative entity list, player weapon and tick counter.
//!
//! Also owns the pending action queue and the current tick's event log, since
//! both are part of what a snapshot or a save observes.

use axiom_types::{Action, Entity, Event, Weapon};

use crate::content::ContentSet;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Default)]
pub struct World {
    pub(crate) tick: u64,
    pub(crate) content_id: u32,
    pub(crate) entities: Vec<Entity>,
    pub(crate) weapon: Option<Weapon>,
    /// Pending actions in submission order.
    pub(crate) queue: Vec<Action>,
    /// Events produced by the most recent tick.
    pub(crate) events: Vec<Event>,
    /// Actions dropped because their tick had already passed.
    pub(crate) evicted_actions: u64,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a freshly loaded content set.
    pub(crate) fn populate(&mut self, set: ContentSet) {
        let player_id = set.player_id().unwrap_or_default();
        let weapon = set.starting_weapon(player_id);

        self.tick = 0;
        self.content_id = set.content_id;
        self.entities = set.entities;
        self.weapon = Some(weapon);
        self.queue.clear();
        self.events.clear();
        self.evicted_actions = 0;
    }

    /// Drop all truth state (content unload).
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// Append validated actions. Reserves first so a failed allocation leaves
    /// the queue unchanged.
    pub(crate) fn enqueue(&mut self, actions: Vec<Action>) -> CoreResult<()> {
        self.queue.try_reserve(actions.len()).map_err(|e| {
            CoreError::Internal(format!(
                "cannot grow action queue by {}: {e}",
                actions.len()
            ))
        })?;
        self.queue.extend(actions);
        Ok(())
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn content_id(&self) -> u32 {
        self.content_id
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: u32) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn player(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.is_player())
    }

    pub(crate) fn player_mut(&mut self) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.is_player())
    }

    pub fn weapon(&self) -> Option<&Weapon> {
        self.weapon.as_ref()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn queued_actions(&self) -> &[Action] {
        &self.queue
    }

    pub fn evicted_actions(&self) -> u64 {
        self.evicted_actions
    }

    /// Targets in storage order (the order saves and fire resolution use).
    pub fn targets(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.is_target())
    }
}
