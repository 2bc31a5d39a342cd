//! Content seam - the capability the core calls to populate its truth store.
//!
//! Parsing manifests and weapon/target definitions belongs to the content
//! loader, not the core. The core only asks a [`ContentSource`] for a
//! [`ContentSet`] and checks that what comes back is a usable world: exactly
//! one player, unique entity ids, and sane weapon parameters.
//!
//! [`PlaceholderContent`] is the built-in source. It ignores the root path and
//! seeds the fixed combat test range: player `1` plus targets `100`, `101` and
//! `102` with 50 hp each, and a 12/48 sidearm with a 30-tick reload.

use std::collections::HashSet;
use std::path::Path;

use axiom_types::{
    Entity, EntityFlags, Weapon, FIRE_DAMAGE, HP_NOT_APPLICABLE, MAGAZINE_CAPACITY,
    PRIMARY_WEAPON_SLOT, RELOAD_TICKS, STARTING_AMMO_IN_MAG, STARTING_AMMO_RESERVE,
};

use crate::error::{CoreError, CoreResult};

/// Current `ContentLoadParams` struct version.
pub const CONTENT_LOAD_PARAMS_VERSION: u16 = 1;

/// Size of the v1 content-load header (version, reserved, size, root path).
pub const CONTENT_LOAD_PARAMS_SIZE_V1: u32 = 16;

/// Versioned content-load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentLoadParams<'a> {
    pub version: u16,
    pub size_bytes: u32,
    pub root_path: Option<&'a Path>,
}

impl<'a> ContentLoadParams<'a> {
    pub fn v1(root_path: &'a Path) -> Self {
        Self {
            version: CONTENT_LOAD_PARAMS_VERSION,
            size_bytes: CONTENT_LOAD_PARAMS_SIZE_V1,
            root_path: Some(root_path),
        }
    }
}

/// Static weapon definition handed over by the content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponParams {
    pub weapon_def_id: u32,
    pub magazine_capacity: i32,
    pub starting_ammo_in_mag: i32,
    pub starting_ammo_reserve: i32,
    pub reload_ticks: u32,
    pub damage: i32,
}

impl Default for WeaponParams {
    fn default() -> Self {
        Self {
            weapon_def_id: PLACEHOLDER_WEAPON_DEF_ID,
            magazine_capacity: MAGAZINE_CAPACITY,
            starting_ammo_in_mag: STARTING_AMMO_IN_MAG,
            starting_ammo_reserve: STARTING_AMMO_RESERVE,
            reload_ticks: RELOAD_TICKS,
            damage: FIRE_DAMAGE,
        }
    }
}

/// Everything a successful content load puts into the truth store.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentSet {
    /// Identity of the loaded content, recorded in save blobs.
    pub content_id: u32,
    pub entities: Vec<Entity>,
    pub weapon: WeaponParams,
}

impl ContentSet {
    /// Id of the single PLAYER entity.
    pub fn player_id(&self) -> Option<u32> {
        self.entities.iter().find(|e| e.is_player()).map(|e| e.id)
    }

    /// Check the invariants the rule engine relies on.
    pub fn validate(&self) -> CoreResult<()> {
        let players = self.entities.iter().filter(|e| e.is_player()).count();
        if players != 1 {
            return Err(CoreError::ParseFailed(format!(
                "content must define exactly one player entity, found {players}"
            )));
        }

        let mut seen = HashSet::with_capacity(self.entities.len());
        for e in &self.entities {
            if !seen.insert(e.id) {
                return Err(CoreError::ParseFailed(format!(
                    "duplicate entity id {}",
                    e.id
                )));
            }
        }

        let w = &self.weapon;
        if w.magazine_capacity <= 0
            || w.starting_ammo_in_mag < 0
            || w.starting_ammo_in_mag > w.magazine_capacity
            || w.starting_ammo_reserve < 0
            || w.reload_ticks == 0
        {
            return Err(CoreError::ParseFailed(format!(
                "weapon {} has invalid ammo/reload parameters",
                w.weapon_def_id
            )));
        }
        Ok(())
    }

    /// Fresh weapon truth for the player.
    pub fn starting_weapon(&self, player_id: u32) -> Weapon {
        Weapon {
            player_id,
            weapon_slot: PRIMARY_WEAPON_SLOT,
            weapon_def_id: self.weapon.weapon_def_id,
            ammo_in_mag: self.weapon.starting_ammo_in_mag,
            ammo_reserve: self.weapon.starting_ammo_reserve,
            reload_ticks_remaining: 0,
            magazine_capacity: self.weapon.magazine_capacity,
            reload_ticks: self.weapon.reload_ticks,
            damage: self.weapon.damage,
        }
    }
}

/// Loader capability the core calls into on `load_content`.
pub trait ContentSource: Send {
    fn load(&self, root: &Path) -> CoreResult<ContentSet>;
}

pub const PLACEHOLDER_PLAYER_ID: u32 = 1;
pub const PLACEHOLDER_TARGET_IDS: [u32; 3] = [100, 101, 102];
pub const PLACEHOLDER_TARGET_HP: i32 = 50;
pub const PLACEHOLDER_TARGET_ARCHETYPE: u32 = 2000;
pub const PLACEHOLDER_WEAPON_DEF_ID: u32 = 1000;
pub const PLACEHOLDER_CONTENT_ID: u32 = fnv1a_32(b"axiom/placeholder-range/v1");

const IDENTITY: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Hardcoded test range used until the real loader lands.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderContent;

impl ContentSource for PlaceholderContent {
    fn load(&self, root: &Path) -> CoreResult<ContentSet> {
        log::debug!(
            target: "axiom_core",
            "placeholder content: ignoring root {}",
            root.display()
        );

        let mut entities = Vec::with_capacity(1 + PLACEHOLDER_TARGET_IDS.len());
        entities.push(Entity {
            id: PLACEHOLDER_PLAYER_ID,
            archetype_id: 0,
            position: [0.0, 0.0, 0.0],
            orientation: IDENTITY,
            hp: HP_NOT_APPLICABLE,
            flags: EntityFlags::PLAYER,
        });
        for (i, &id) in PLACEHOLDER_TARGET_IDS.iter().enumerate() {
            entities.push(Entity {
                id,
                archetype_id: PLACEHOLDER_TARGET_ARCHETYPE,
                position: [5.0, 0.0, 2.0 * i as f32],
                orientation: IDENTITY,
                hp: PLACEHOLDER_TARGET_HP,
                flags: EntityFlags::TARGET,
            });
        }

        Ok(ContentSet {
            content_id: PLACEHOLDER_CONTENT_ID,
            entities,
            weapon: WeaponParams::default(),
        })
    }
}

/// 32-bit FNV-1a, stable across platforms and toolchains.
pub const fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut h: u32 = 0x811c_9dc5;
    let mut i = 0;
    while i < bytes.len() {
        h ^= bytes[i] as u32;
        h = h.wrapping_mul(0x0100_0193);
        i += 1;
    }
    h
}
