//! Save/load codec - restorable blobs with an additive checksum.
//!
//! ```text
//! SaveHeader   24 B  magic 'AXSV', major u16, minor u16, total_size,
//!                    world_offset, world_size, checksum32
//! WorldChunk   68 B  tick u64, content_id, weapon_def_id, player_id,
//!                    player pos 3×f32, player rot 4×f32, ammo_in_mag,
//!                    ammo_reserve, reload_ticks_remaining, target_count,
//!                    target_offset
//! TargetChunk  40 B  entity_id, pos 3×f32, rot 4×f32, hp, flags u8, 3 pad
//! ```
//!
//! `checksum32` is the wrapping sum of every byte in the blob with the
//! checksum field read as zero.
//!
//! Loading is two-phase: [`SaveView::parse`] checks the blob on its own, then
//! [`World::apply_save`] checks it against the live world. Only when both
//! pass is anything overwritten.

use axiom_types::{EntityFlags, Weapon};

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{CoreError, CoreResult};
use crate::snapshot::len_u32;
use crate::world::World;

pub const SAVE_MAGIC: u32 = u32::from_le_bytes(*b"AXSV");
pub const SAVE_VERSION_MAJOR: u16 = 1;
pub const SAVE_VERSION_MINOR: u16 = 0;

pub const SAVE_HEADER_SIZE: usize = 24;
pub const WORLD_CHUNK_SIZE: usize = 68;
pub const TARGET_CHUNK_SIZE: usize = 40;

/// Byte offset of `checksum32` inside the header.
pub const CHECKSUM_OFFSET: usize = 20;

/// Target flag byte: entity is dead.
pub const TARGET_FLAG_DEAD: u8 = 1 << 0;

/// Additive checksum over `blob`, skipping the checksum field.
pub fn checksum32(blob: &[u8]) -> u32 {
    blob.iter()
        .enumerate()
        .filter(|(i, _)| !(CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4).contains(i))
        .fold(0u32, |sum, (_, &b)| sum.wrapping_add(u32::from(b)))
}

/// Size of the save blob `world` would produce right now.
pub fn required_size(world: &World) -> usize {
    SAVE_HEADER_SIZE + WORLD_CHUNK_SIZE + world.targets().count() * TARGET_CHUNK_SIZE
}

/// Write a save blob into `out`, returning the number of bytes written.
pub fn encode(world: &World, out: &mut [u8]) -> CoreResult<usize> {
    let required = required_size(world);
    if out.len() < required {
        return Err(CoreError::BufferTooSmall {
            required,
            capacity: out.len(),
        });
    }
    let (player, weapon) = match (world.player(), world.weapon()) {
        (Some(p), Some(w)) => (p, w),
        _ => {
            return Err(CoreError::Internal(
                "world has no player weapon to save".into(),
            ))
        }
    };

    let target_count = world.targets().count();
    let target_offset = SAVE_HEADER_SIZE + WORLD_CHUNK_SIZE;

    let mut w = ByteWriter::new(&mut out[..required]);
    w.put_u32(SAVE_MAGIC)?;
    w.put_u16(SAVE_VERSION_MAJOR)?;
    w.put_u16(SAVE_VERSION_MINOR)?;
    w.put_u32(len_u32(required)?)?;
    w.put_u32(len_u32(SAVE_HEADER_SIZE)?)?;
    w.put_u32(len_u32(WORLD_CHUNK_SIZE)?)?;
    w.put_u32(0)?;

    w.put_u64(world.tick())?;
    w.put_u32(world.content_id())?;
    w.put_u32(weapon.weapon_def_id)?;
    w.put_u32(player.id)?;
    w.put_f32s(&player.position)?;
    w.put_f32s(&player.orientation)?;
    w.put_i32(weapon.ammo_in_mag)?;
    w.put_i32(weapon.ammo_reserve)?;
    w.put_u32(weapon.reload_ticks_remaining)?;
    w.put_u32(len_u32(target_count)?)?;
    w.put_u32(len_u32(target_offset)?)?;

    for t in world.targets() {
        w.put_u32(t.id)?;
        w.put_f32s(&t.position)?;
        w.put_f32s(&t.orientation)?;
        w.put_i32(t.hp)?;
        w.put_u8(if t.is_dead() { TARGET_FLAG_DEAD } else { 0 })?;
        w.put_zeros(3)?;
    }

    let sum = checksum32(w.written());
    w.patch_u32(CHECKSUM_OFFSET, sum)?;
    Ok(required)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveHeader {
    pub magic: u32,
    pub version_major: u16,
    pub version_minor: u16,
    pub total_size: u32,
    pub world_offset: u32,
    pub world_size: u32,
    pub checksum: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldChunk {
    pub tick: u64,
    pub content_id: u32,
    pub weapon_def_id: u32,
    pub player_id: u32,
    pub player_position: [f32; 3],
    pub player_orientation: [f32; 4],
    pub ammo_in_mag: i32,
    pub ammo_reserve: i32,
    pub reload_ticks_remaining: u32,
    pub target_count: u32,
    pub target_offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRecord {
    pub id: u32,
    pub position: [f32; 3],
    pub orientation: [f32; 4],
    pub hp: i32,
    pub dead: bool,
}

/// A save blob that passed every self-contained check.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveView {
    pub header: SaveHeader,
    pub world: WorldChunk,
    pub targets: Vec<TargetRecord>,
}

impl SaveView {
    pub fn parse(buf: &[u8]) -> CoreResult<Self> {
        if buf.len() < SAVE_HEADER_SIZE {
            return Err(CoreError::invalid_arg(format!(
                "save blob is {} bytes, header alone needs {SAVE_HEADER_SIZE}",
                buf.len()
            )));
        }

        let mut r = ByteReader::new(buf);
        let header = SaveHeader {
            magic: r.u32()?,
            version_major: r.u16()?,
            version_minor: r.u16()?,
            total_size: r.u32()?,
            world_offset: r.u32()?,
            world_size: r.u32()?,
            checksum: r.u32()?,
        };

        if header.magic != SAVE_MAGIC {
            return Err(CoreError::invalid_arg(format!(
                "bad save magic {:#010x}",
                header.magic
            )));
        }
        if header.version_major != SAVE_VERSION_MAJOR {
            return Err(CoreError::unsupported(format!(
                "save major version {} (expected {SAVE_VERSION_MAJOR})",
                header.version_major
            )));
        }
        if header.total_size as usize != buf.len() {
            return Err(CoreError::invalid_arg(format!(
                "save declares {} bytes but {} were provided",
                header.total_size,
                buf.len()
            )));
        }
        let actual = checksum32(buf);
        if actual != header.checksum {
            return Err(CoreError::invalid_arg(format!(
                "save checksum mismatch: stored {:#010x}, computed {actual:#010x}",
                header.checksum
            )));
        }

        let world_offset = header.world_offset as usize;
        let world_size = header.world_size as usize;
        if !fits(world_offset, world_size, buf.len()) {
            return Err(CoreError::invalid_arg(format!(
                "world chunk {world_offset}+{world_size} outside {}-byte save",
                buf.len()
            )));
        }
        if world_size < WORLD_CHUNK_SIZE {
            return Err(CoreError::invalid_arg(format!(
                "world chunk is {world_size} bytes, need {WORLD_CHUNK_SIZE}"
            )));
        }

        r.seek(world_offset)?;
        let world = WorldChunk {
            tick: r.u64()?,
            content_id: r.u32()?,
            weapon_def_id: r.u32()?,
            player_id: r.u32()?,
            player_position: r.f32_array()?,
            player_orientation: r.f32_array()?,
            ammo_in_mag: r.i32()?,
            ammo_reserve: r.i32()?,
            reload_ticks_remaining: r.u32()?,
            target_count: r.u32()?,
            target_offset: r.u32()?,
        };

        let target_offset = world.target_offset as usize;
        let targets_len = (world.target_count as usize)
            .checked_mul(TARGET_CHUNK_SIZE)
            .filter(|&len| fits(target_offset, len, buf.len()))
            .ok_or_else(|| {
                CoreError::invalid_arg(format!(
                    "{} targets at offset {target_offset} overrun {}-byte save",
                    world.target_count,
                    buf.len()
                ))
            })?;

        r.seek(target_offset)?;
        let mut targets = Vec::with_capacity(targets_len / TARGET_CHUNK_SIZE);
        for _ in 0..world.target_count {
            let id = r.u32()?;
            let position = r.f32_array()?;
            let orientation = r.f32_array()?;
            let hp = r.i32()?;
            let flags = r.u8()?;
            r.skip(3)?;
            targets.push(TargetRecord {
                id,
                position,
                orientation,
                hp,
                dead: flags & TARGET_FLAG_DEAD != 0,
            });
        }

        Ok(Self {
            header,
            world,
            targets,
        })
    }
}

fn fits(offset: usize, len: usize, total: usize) -> bool {
    offset.checked_add(len).is_some_and(|end| end <= total)
}

impl World {
    /// Restore truth state from a parsed save. Every check runs before the
    /// first write, so an error leaves the world as it was.
    pub(crate) fn apply_save(&mut self, save: &SaveView) -> CoreResult<()> {
        let chunk = &save.world;

        let player_id = self
            .player()
            .map(|p| p.id)
            .ok_or_else(|| CoreError::invalid_arg("world has no player to restore into"))?;
        if chunk.player_id != player_id {
            return Err(CoreError::invalid_arg(format!(
                "save is for player {}, world player is {player_id}",
                chunk.player_id
            )));
        }
        let weapon = self
            .weapon
            .as_ref()
            .ok_or_else(|| CoreError::invalid_arg("world has no weapon to restore into"))?;
        check_weapon_state(weapon, chunk)?;

        for t in &save.targets {
            if !self.entity(t.id).is_some_and(|e| e.is_target()) {
                return Err(CoreError::invalid_arg(format!(
                    "saved target {} does not exist in the loaded content",
                    t.id
                )));
            }
            if t.dead != (t.hp <= 0) {
                return Err(CoreError::invalid_arg(format!(
                    "saved target {} has hp {} but dead flag {}",
                    t.id, t.hp, t.dead
                )));
            }
        }

        if chunk.content_id != self.content_id {
            log::warn!(
                target: "axiom_core",
                "save content id {:#010x} differs from loaded content {:#010x}",
                chunk.content_id,
                self.content_id
            );
        }
        if chunk.weapon_def_id != weapon.weapon_def_id {
            log::warn!(
                target: "axiom_core",
                "save weapon def {} differs from loaded weapon {}",
                chunk.weapon_def_id,
                weapon.weapon_def_id
            );
        }

        // validated; mutate from here on
        self.tick = chunk.tick;

        if let Some(player) = self.player_mut() {
            player.position = chunk.player_position;
            player.orientation = chunk.player_orientation;
        }
        if let Some(weapon) = self.weapon.as_mut() {
            weapon.ammo_in_mag = chunk.ammo_in_mag;
            weapon.ammo_reserve = chunk.ammo_reserve;
            weapon.reload_ticks_remaining = chunk.reload_ticks_remaining;
        }

        for t in &save.targets {
            if let Some(e) = self.entities.iter_mut().find(|e| e.id == t.id) {
                e.position = t.position;
                e.orientation = t.orientation;
                e.hp = t.hp;
                e.flags.set(EntityFlags::DEAD, t.dead);
            }
        }

        self.queue.clear();
        self.events.clear();
        Ok(())
    }
}

fn check_weapon_state(weapon: &Weapon, chunk: &WorldChunk) -> CoreResult<()> {
    if chunk.ammo_in_mag < 0 || chunk.ammo_in_mag > weapon.magazine_capacity {
        return Err(CoreError::invalid_arg(format!(
            "saved ammo_in_mag {} outside 0..={}",
            chunk.ammo_in_mag, weapon.magazine_capacity
        )));
    }
    if chunk.ammo_reserve < 0 {
        return Err(CoreError::invalid_arg(format!(
            "saved ammo_reserve {} is negative",
            chunk.ammo_reserve
        )));
    }
    if chunk.reload_ticks_remaining > weapon.reload_ticks {
        return Err(CoreError::invalid_arg(format!(
            "saved reload countdown {} exceeds reload length {}",
            chunk.reload_ticks_remaining, weapon.reload_ticks
        )));
    }
    Ok(())
}
