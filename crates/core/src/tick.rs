//! Tick processor - the per-tick rule engine.
//!
//! One tick runs in four phases:
//!
//! 1. bump the tick counter
//! 2. clear the event log
//! 3. apply every queued action targeting the new tick, in enqueue order
//! 4. advance the reload countdown
//!
//! Actions targeting a tick that has already passed can never match again and
//! are evicted during phase 3 with a warning.

use axiom_types::{Action, ActionKind, EntityFlags, Event, FireBlockedReason, WALK_SPEED_PER_TICK};

use crate::world::World;

impl World {
    /// Run exactly one tick.
    pub(crate) fn advance_tick(&mut self) {
        self.tick += 1;
        self.events.clear();

        let now = self.tick;
        let mut queue = std::mem::take(&mut self.queue);
        let mut evicted = 0u64;
        queue.retain(|action| {
            if action.tick == now {
                self.apply_action(action);
                false
            } else if action.tick < now {
                log::warn!(
                    target: "axiom_core",
                    "evicting stale {} action for tick {} from actor {} (now {now})",
                    action.kind.as_str(),
                    action.tick,
                    action.actor_id
                );
                evicted += 1;
                false
            } else {
                true
            }
        });
        self.queue = queue;
        self.evicted_actions += evicted;

        self.advance_reload_timer();
    }

    fn apply_action(&mut self, action: &Action) {
        match action.kind {
            ActionKind::MoveIntent { x, y } => self.apply_move(x, y),
            ActionKind::LookIntent { yaw, .. } => self.apply_look(yaw),
            ActionKind::FireOnce { weapon_slot } => self.apply_fire(action.actor_id, weapon_slot),
            ActionKind::Reload { weapon_slot } => self.apply_reload(action.actor_id, weapon_slot),
            // Accepted for forward compatibility; no simulated effect yet.
            ActionKind::SprintHeld { .. } | ActionKind::CrouchToggle { .. } => {}
        }
    }

    fn apply_move(&mut self, x: f32, y: f32) {
        let Some(player) = self.player_mut() else {
            return;
        };

        let (x, y) = clamp_to_unit(x, y);

        player.position[0] += x * WALK_SPEED_PER_TICK;
        player.position[2] += y * WALK_SPEED_PER_TICK;
        // flat ground
        player.position[1] = 0.0;
    }

    /// Placeholder look: yaw goes straight into the quaternion's y component,
    /// pitch is ignored and nothing is renormalized. Replays depend on this
    /// exact arithmetic.
    fn apply_look(&mut self, yaw: f32) {
        if let Some(player) = self.player_mut() {
            player.orientation[1] += yaw;
        }
    }

    fn apply_fire(&mut self, actor: u32, weapon_slot: u32) {
        let Some(weapon) = self.weapon.as_mut() else {
            return;
        };

        let blocked = if weapon.reloading() {
            Some(FireBlockedReason::Reloading)
        } else if weapon.ammo_in_mag <= 0 {
            Some(FireBlockedReason::EmptyMag)
        } else {
            None
        };
        if let Some(reason) = blocked {
            self.events.push(Event::FireBlocked {
                actor,
                weapon_slot,
                reason,
            });
            return;
        }

        weapon.ammo_in_mag -= 1;
        let damage = weapon.damage;

        let Some(target) = self.entities.iter_mut().find(|e| e.is_living_target()) else {
            return;
        };
        target.hp = target.hp.saturating_sub(damage);
        let target_id = target.id;
        self.events.push(Event::DamageDealt {
            actor,
            target: target_id,
            amount: damage,
        });

        if target.hp <= 0 {
            target.flags.insert(EntityFlags::DEAD);
            self.events.push(Event::TargetDestroy {
                actor,
                target: target_id,
            });
        }
    }

    fn apply_reload(&mut self, actor: u32, weapon_slot: u32) {
        let Some(weapon) = self.weapon.as_mut() else {
            return;
        };
        if weapon.reloading()
            || weapon.ammo_in_mag >= weapon.magazine_capacity
            || weapon.ammo_reserve <= 0
        {
            return;
        }

        weapon.reload_ticks_remaining = weapon.reload_ticks;
        self.events.push(Event::ReloadStarted { actor, weapon_slot });
    }

    fn advance_reload_timer(&mut self) {
        let Some(weapon) = self.weapon.as_mut() else {
            return;
        };
        if !weapon.reloading() {
            return;
        }

        weapon.reload_ticks_remaining -= 1;
        if weapon.reload_ticks_remaining > 0 {
            return;
        }

        let to_load = (weapon.magazine_capacity - weapon.ammo_in_mag).min(weapon.ammo_reserve);
        weapon.ammo_in_mag += to_load;
        weapon.ammo_reserve -= to_load;
        self.events.push(Event::ReloadDone {
            player: weapon.player_id,
            weapon_slot: weapon.weapon_slot,
            loaded: to_load,
        });
    }
}

/// Scale `(x, y)` down to length 1 when longer; shorter vectors pass through.
fn clamp_to_unit(x: f32, y: f32) -> (f32, f32) {
    let len = x.hypot(y);
    if len.is_infinite() {
        // both finite but the length is not representable; halve and retry
        let (x, y) = (x * 0.5, y * 0.5);
        let len = x.hypot(y);
        (x / len, y / len)
    } else if len > 1.0 {
        (x / len, y / len)
    } else {
        (x, y)
    }
}
