//! Shared types module - truth-state records, actions, events and rule constants
//!
//! This crate defines the fundamental types exchanged between the simulation
//! core and its host shells. Everything here is plain data with no external
//! dependencies, so hosts (headless harness, viewer, tools) can depend on it
//! without pulling in the rule engine.
//!
//! # Rule Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `MAGAZINE_CAPACITY` | 12 | Rounds held by the primary weapon magazine |
//! | `STARTING_AMMO_IN_MAG` | 12 | Magazine contents after content load |
//! | `STARTING_AMMO_RESERVE` | 48 | Reserve ammo after content load |
//! | `RELOAD_TICKS` | 30 | Reload countdown length |
//! | `FIRE_DAMAGE` | 10 | Damage applied by one successful shot |
//! | `WALK_SPEED_PER_TICK` | 0.1 | Planar distance covered by a unit move intent |
//!
//! # Wire Codes
//!
//! Actions and events are Rust enums inside the core. Their numeric codes only
//! exist at the boundary (the [`RawAction`] intake record and the snapshot
//! event records), see [`ActionKind::code`] and [`Event::code`].
//!
//! # Examples
//!
//! ```
//! use axiom_types::{Action, ActionKind, EntityFlags, RawAction};
//!
//! let fire = Action { tick: 3, actor_id: 1, kind: ActionKind::FireOnce { weapon_slot: 0 } };
//! let raw = RawAction::from(fire);
//! assert_eq!(raw.kind, 3);
//!
//! let mut flags = EntityFlags::TARGET;
//! flags.insert(EntityFlags::DEAD);
//! assert!(flags.contains(EntityFlags::DEAD));
//! ```

/// Boundary ABI major version. A host built against another major is rejected.
pub const ABI_MAJOR: u16 = 1;

/// Boundary ABI minor version. Minor bumps are additive.
pub const ABI_MINOR: u16 = 0;

/// Slot index of the single player weapon.
pub const PRIMARY_WEAPON_SLOT: u32 = 0;

/// Magazine capacity of the primary weapon (12 rounds)
pub const MAGAZINE_CAPACITY: i32 = 12;

/// Magazine contents right after content load
pub const STARTING_AMMO_IN_MAG: i32 = 12;

/// Reserve ammo right after content load
pub const STARTING_AMMO_RESERVE: i32 = 48;

/// Reload countdown in ticks (30)
pub const RELOAD_TICKS: u32 = 30;

/// Damage dealt by one successful FIRE_ONCE (10)
pub const FIRE_DAMAGE: i32 = 10;

/// Planar distance moved by a unit-length MOVE_INTENT
pub const WALK_SPEED_PER_TICK: f32 = 0.1;

/// Sentinel hp for entities where health does not apply (the player).
pub const HP_NOT_APPLICABLE: i32 = -1;

/// Entity state bitset.
///
/// - **PLAYER**: the single controllable entity
/// - **TARGET**: damageable by FIRE_ONCE
/// - **DEAD**: set once the rule engine observed hp ≤ 0 (sticky)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EntityFlags(u32);

impl EntityFlags {
    pub const NONE: Self = Self(0);
    pub const PLAYER: Self = Self(1 << 0);
    pub const TARGET: Self = Self(1 << 1);
    pub const DEAD: Self = Self(1 << 2);

    const ALL: u32 = Self::PLAYER.0 | Self::TARGET.0 | Self::DEAD.0;

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits, dropping bits that carry no meaning.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: Self, on: bool) {
        if on {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl std::ops::BitOr for EntityFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One authoritative entity record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub id: u32,
    /// Content archetype (0 = no content record).
    pub archetype_id: u32,
    pub position: [f32; 3],
    /// Quaternion components in x, y, z, w order.
    pub orientation: [f32; 4],
    pub hp: i32,
    pub flags: EntityFlags,
}

impl Entity {
    pub fn is_player(&self) -> bool {
        self.flags.contains(EntityFlags::PLAYER)
    }

    pub fn is_target(&self) -> bool {
        self.flags.contains(EntityFlags::TARGET)
    }

    pub fn is_dead(&self) -> bool {
        self.flags.contains(EntityFlags::DEAD)
    }

    /// A TARGET that has not been destroyed yet.
    pub fn is_living_target(&self) -> bool {
        self.is_target() && !self.is_dead()
    }
}

/// Player weapon truth (slot 0) plus the static parameters it was loaded with.
///
/// `reloading` is derived from the countdown so the two can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weapon {
    pub player_id: u32,
    pub weapon_slot: u32,
    pub weapon_def_id: u32,
    pub ammo_in_mag: i32,
    pub ammo_reserve: i32,
    pub reload_ticks_remaining: u32,
    pub magazine_capacity: i32,
    pub reload_ticks: u32,
    pub damage: i32,
}

impl Weapon {
    pub fn reloading(&self) -> bool {
        self.reload_ticks_remaining > 0
    }
}

/// Why a FIRE_ONCE was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FireBlockedReason {
    Reloading,
    EmptyMag,
}

impl FireBlockedReason {
    pub const fn code(self) -> i32 {
        match self {
            FireBlockedReason::Reloading => 1,
            FireBlockedReason::EmptyMag => 2,
        }
    }

    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(FireBlockedReason::Reloading),
            2 => Some(FireBlockedReason::EmptyMag),
            _ => None,
        }
    }
}

/// Action payload, one variant per action type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionKind {
    /// Planar move intent, (x, y) in [-1, 1] (clamped to unit length)
    MoveIntent { x: f32, y: f32 },
    /// Look delta in radians
    LookIntent { yaw: f32, pitch: f32 },
    FireOnce { weapon_slot: u32 },
    Reload { weapon_slot: u32 },
    SprintHeld { held: u32 },
    CrouchToggle { toggle: u32 },
}

pub const ACTION_MOVE_INTENT: u32 = 1;
pub const ACTION_LOOK_INTENT: u32 = 2;
pub const ACTION_FIRE_ONCE: u32 = 3;
pub const ACTION_RELOAD: u32 = 4;
pub const ACTION_SPRINT_HELD: u32 = 5;
pub const ACTION_CROUCH_TOGGLE: u32 = 6;

impl ActionKind {
    /// Wire type code
    pub const fn code(&self) -> u32 {
        match self {
            ActionKind::MoveIntent { .. } => ACTION_MOVE_INTENT,
            ActionKind::LookIntent { .. } => ACTION_LOOK_INTENT,
            ActionKind::FireOnce { .. } => ACTION_FIRE_ONCE,
            ActionKind::Reload { .. } => ACTION_RELOAD,
            ActionKind::SprintHeld { .. } => ACTION_SPRINT_HELD,
            ActionKind::CrouchToggle { .. } => ACTION_CROUCH_TOGGLE,
        }
    }

    /// Lowercase name used by host scripts and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::MoveIntent { .. } => "move",
            ActionKind::LookIntent { .. } => "look",
            ActionKind::FireOnce { .. } => "fire",
            ActionKind::Reload { .. } => "reload",
            ActionKind::SprintHeld { .. } => "sprint",
            ActionKind::CrouchToggle { .. } => "crouch",
        }
    }
}

/// An input targeted at an absolute tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action {
    pub tick: u64,
    pub actor_id: u32,
    pub kind: ActionKind,
}

/// Fixed-shape action record as submitted across the boundary.
///
/// `payload` carries the two 32-bit payload words; float payloads are stored
/// as IEEE-754 bit patterns. Decoding (and rejecting unknown codes or
/// non-finite floats) happens in the core's intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawAction {
    pub tick: u64,
    pub actor_id: u32,
    pub kind: u32,
    pub payload: [u32; 2],
}

impl RawAction {
    pub fn move_intent(tick: u64, actor_id: u32, x: f32, y: f32) -> Self {
        Self::from(Action {
            tick,
            actor_id,
            kind: ActionKind::MoveIntent { x, y },
        })
    }

    pub fn look_intent(tick: u64, actor_id: u32, yaw: f32, pitch: f32) -> Self {
        Self::from(Action {
            tick,
            actor_id,
            kind: ActionKind::LookIntent { yaw, pitch },
        })
    }

    pub fn fire_once(tick: u64, actor_id: u32, weapon_slot: u32) -> Self {
        Self::from(Action {
            tick,
            actor_id,
            kind: ActionKind::FireOnce { weapon_slot },
        })
    }

    pub fn reload(tick: u64, actor_id: u32, weapon_slot: u32) -> Self {
        Self::from(Action {
            tick,
            actor_id,
            kind: ActionKind::Reload { weapon_slot },
        })
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        let payload = match action.kind {
            ActionKind::MoveIntent { x, y } => [x.to_bits(), y.to_bits()],
            ActionKind::LookIntent { yaw, pitch } => [yaw.to_bits(), pitch.to_bits()],
            ActionKind::FireOnce { weapon_slot } | ActionKind::Reload { weapon_slot } => {
                [weapon_slot, 0]
            }
            ActionKind::SprintHeld { held } => [held, 0],
            ActionKind::CrouchToggle { toggle } => [toggle, 0],
        };
        Self {
            tick: action.tick,
            actor_id: action.actor_id,
            kind: action.kind.code(),
            payload,
        }
    }
}

/// Per-tick rule engine output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    DamageDealt { actor: u32, target: u32, amount: i32 },
    ReloadStarted { actor: u32, weapon_slot: u32 },
    ReloadDone { player: u32, weapon_slot: u32, loaded: i32 },
    TargetDestroy { actor: u32, target: u32 },
    FireBlocked { actor: u32, weapon_slot: u32, reason: FireBlockedReason },
}

pub const EVENT_DAMAGE_DEALT: u16 = 1;
pub const EVENT_RELOAD_STARTED: u16 = 2;
pub const EVENT_RELOAD_DONE: u16 = 3;
pub const EVENT_TARGET_DESTROY: u16 = 4;
pub const EVENT_FIRE_BLOCKED: u16 = 5;

impl Event {
    /// Wire type code
    pub const fn code(&self) -> u16 {
        match self {
            Event::DamageDealt { .. } => EVENT_DAMAGE_DEALT,
            Event::ReloadStarted { .. } => EVENT_RELOAD_STARTED,
            Event::ReloadDone { .. } => EVENT_RELOAD_DONE,
            Event::TargetDestroy { .. } => EVENT_TARGET_DESTROY,
            Event::FireBlocked { .. } => EVENT_FIRE_BLOCKED,
        }
    }

    /// Flatten into the `(a, b, value)` triple of the snapshot event record.
    pub const fn to_wire(&self) -> (u32, u32, i32) {
        match *self {
            Event::DamageDealt {
                actor,
                target,
                amount,
            } => (actor, target, amount),
            Event::ReloadStarted { actor, weapon_slot } => (actor, weapon_slot, 0),
            Event::ReloadDone {
                player,
                weapon_slot,
                loaded,
            } => (player, weapon_slot, loaded),
            Event::TargetDestroy { actor, target } => (actor, target, 0),
            Event::FireBlocked {
                actor,
                weapon_slot,
                reason,
            } => (actor, weapon_slot, reason.code()),
        }
    }

    /// Rebuild from a snapshot event record. Unknown codes yield `None`.
    pub fn from_wire(code: u16, a: u32, b: u32, value: i32) -> Option<Self> {
        let event = match code {
            EVENT_DAMAGE_DEALT => Event::DamageDealt {
                actor: a,
                target: b,
                amount: value,
            },
            EVENT_RELOAD_STARTED => Event::ReloadStarted {
                actor: a,
                weapon_slot: b,
            },
            EVENT_RELOAD_DONE => Event::ReloadDone {
                player: a,
                weapon_slot: b,
                loaded: value,
            },
            EVENT_TARGET_DESTROY => Event::TargetDestroy {
                actor: a,
                target: b,
            },
            EVENT_FIRE_BLOCKED => Event::FireBlocked {
                actor: a,
                weapon_slot: b,
                reason: FireBlockedReason::from_code(value)?,
            },
            _ => return None,
        };
        Some(event)
    }
}
