//! Snapshot encoder - point-in-time copy of the truth store and event log.
//!
//! Layout (little-endian):
//!
//! ```text
//! header   40 B  version u16, reserved u16, size_bytes u32, tick u64,
//!                entity_count u32, entity_stride u32, event_count u32,
//!                event_stride u32, flags u32, weapon_present u32
//! entity   44 B  id, archetype_id, px, py, pz, rx, ry, rz, rw, hp, flags
//! weapon   24 B  player_id, weapon_slot, ammo_in_mag, ammo_reserve,
//!                reload_ticks_remaining, flags (bit0 RELOADING)   [optional]
//! event    16 B  type u16, reserved u16, a u32, b u32, value i32
//! ```
//!
//! A snapshot carries no history; events are only those of the latest tick.

use axiom_types::{Entity, EntityFlags, Event, Weapon};

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{CoreError, CoreResult};
use crate::world::World;

pub const SNAPSHOT_VERSION: u16 = 1;
pub const SNAPSHOT_HEADER_SIZE: usize = 40;
pub const SNAPSHOT_ENTITY_STRIDE: usize = 44;
pub const SNAPSHOT_WEAPON_SIZE: usize = 24;
pub const SNAPSHOT_EVENT_STRIDE: usize = 16;

/// Weapon record flag: reload countdown running.
pub const WEAPON_FLAG_RELOADING: u32 = 1 << 0;

/// Exact byte size of the snapshot `world` would produce right now.
pub fn encoded_len(world: &World) -> usize {
    SNAPSHOT_HEADER_SIZE
        + world.entities().len() * SNAPSHOT_ENTITY_STRIDE
        + if world.weapon().is_some() {
            SNAPSHOT_WEAPON_SIZE
        } else {
            0
        }
        + world.events().len() * SNAPSHOT_EVENT_STRIDE
}

/// Write the snapshot into `out`, returning the number of bytes written.
///
/// Nothing is written when `out` is too small.
pub fn encode(world: &World, out: &mut [u8]) -> CoreResult<usize> {
    let required = encoded_len(world);
    if out.len() < required {
        return Err(CoreError::BufferTooSmall {
            required,
            capacity: out.len(),
        });
    }

    let mut w = ByteWriter::new(&mut out[..required]);
    w.put_u16(SNAPSHOT_VERSION)?;
    w.put_u16(0)?;
    w.put_u32(len_u32(required)?)?;
    w.put_u64(world.tick())?;
    w.put_u32(len_u32(world.entities().len())?)?;
    w.put_u32(SNAPSHOT_ENTITY_STRIDE as u32)?;
    w.put_u32(len_u32(world.events().len())?)?;
    w.put_u32(SNAPSHOT_EVENT_STRIDE as u32)?;
    w.put_u32(0)?;
    w.put_u32(u32::from(world.weapon().is_some()))?;

    for e in world.entities() {
        w.put_u32(e.id)?;
        w.put_u32(e.archetype_id)?;
        w.put_f32s(&e.position)?;
        w.put_f32s(&e.orientation)?;
        w.put_i32(e.hp)?;
        w.put_u32(e.flags.bits())?;
    }

    if let Some(weapon) = world.weapon() {
        let record = WeaponRecord::from(weapon);
        w.put_u32(record.player_id)?;
        w.put_u32(record.weapon_slot)?;
        w.put_i32(record.ammo_in_mag)?;
        w.put_i32(record.ammo_reserve)?;
        w.put_u32(record.reload_ticks_remaining)?;
        w.put_u32(record.flags)?;
    }

    for ev in world.events() {
        let (a, b, value) = ev.to_wire();
        w.put_u16(ev.code())?;
        w.put_u16(0)?;
        w.put_u32(a)?;
        w.put_u32(b)?;
        w.put_i32(value)?;
    }

    debug_assert_eq!(w.position(), required);
    Ok(required)
}

pub(crate) fn len_u32(n: usize) -> CoreResult<u32> {
    u32::try_from(n).map_err(|_| CoreError::Internal(format!("blob field {n} exceeds u32")))
}

/// Weapon block as it appears in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponRecord {
    pub player_id: u32,
    pub weapon_slot: u32,
    pub ammo_in_mag: i32,
    pub ammo_reserve: i32,
    pub reload_ticks_remaining: u32,
    pub flags: u32,
}

impl WeaponRecord {
    pub fn reloading(&self) -> bool {
        self.flags & WEAPON_FLAG_RELOADING != 0
    }
}

impl From<&Weapon> for WeaponRecord {
    fn from(w: &Weapon) -> Self {
        Self {
            player_id: w.player_id,
            weapon_slot: w.weapon_slot,
            ammo_in_mag: w.ammo_in_mag,
            ammo_reserve: w.ammo_reserve,
            reload_ticks_remaining: w.reload_ticks_remaining,
            flags: if w.reloading() {
                WEAPON_FLAG_RELOADING
            } else {
                0
            },
        }
    }
}

/// Decoded snapshot blob.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotView {
    pub version: u16,
    pub size_bytes: u32,
    pub tick: u64,
    pub flags: u32,
    pub entities: Vec<Entity>,
    pub weapon: Option<WeaponRecord>,
    pub events: Vec<Event>,
}

impl SnapshotView {
    /// Decode a snapshot. Strides larger than the ones this build writes are
    /// accepted and the trailing bytes of each record skipped.
    pub fn parse(buf: &[u8]) -> CoreResult<Self> {
        let mut r = ByteReader::new(buf);
        let version = r.u16()?;
        if version != SNAPSHOT_VERSION {
            return Err(CoreError::unsupported(format!(
                "snapshot version {version} (expected {SNAPSHOT_VERSION})"
            )));
        }
        r.skip(2)?;
        let size_bytes = r.u32()?;
        let tick = r.u64()?;
        let entity_count = r.u32()? as usize;
        let entity_stride = r.u32()? as usize;
        let event_count = r.u32()? as usize;
        let event_stride = r.u32()? as usize;
        let flags = r.u32()?;
        let weapon_present = r.u32()?;

        if (size_bytes as usize) < SNAPSHOT_HEADER_SIZE || size_bytes as usize > buf.len() {
            return Err(CoreError::invalid_arg(format!(
                "snapshot declares {size_bytes} bytes, buffer holds {}",
                buf.len()
            )));
        }
        if entity_stride < SNAPSHOT_ENTITY_STRIDE || event_stride < SNAPSHOT_EVENT_STRIDE {
            return Err(CoreError::invalid_arg(format!(
                "snapshot strides {entity_stride}/{event_stride} below {SNAPSHOT_ENTITY_STRIDE}/{SNAPSHOT_EVENT_STRIDE}"
            )));
        }
        if weapon_present > 1 {
            return Err(CoreError::invalid_arg(format!(
                "snapshot weapon_present is {weapon_present}"
            )));
        }

        let mut r = ByteReader::new(&buf[..size_bytes as usize]);
        r.seek(SNAPSHOT_HEADER_SIZE)?;

        let mut entities = Vec::with_capacity(entity_count.min(r.remaining() / entity_stride));
        for _ in 0..entity_count {
            let start = r.position();
            entities.push(Entity {
                id: r.u32()?,
                archetype_id: r.u32()?,
                position: r.f32_array()?,
                orientation: r.f32_array()?,
                hp: r.i32()?,
                flags: EntityFlags::from_bits_truncate(r.u32()?),
            });
            r.seek(start + entity_stride)?;
        }

        let weapon = if weapon_present == 1 {
            Some(WeaponRecord {
                player_id: r.u32()?,
                weapon_slot: r.u32()?,
                ammo_in_mag: r.i32()?,
                ammo_reserve: r.i32()?,
                reload_ticks_remaining: r.u32()?,
                flags: r.u32()?,
            })
        } else {
            None
        };

        let mut events = Vec::with_capacity(event_count.min(r.remaining() / event_stride));
        for i in 0..event_count {
            let start = r.position();
            let code = r.u16()?;
            r.skip(2)?;
            let (a, b, value) = (r.u32()?, r.u32()?, r.i32()?);
            let ev = Event::from_wire(code, a, b, value).ok_or_else(|| {
                CoreError::invalid_arg(format!(
                    "snapshot event {i} has unknown type {code} (value {value})"
                ))
            })?;
            events.push(ev);
            r.seek(start + event_stride)?;
        }

        Ok(Self {
            version,
            size_bytes,
            tick,
            flags,
            entities,
            weapon,
            events,
        })
    }

    pub fn entity(&self, id: u32) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use axiom_types::{Action, ActionKind, FireBlockedReason};

    use super::*;
    use crate::content::{ContentSource, PlaceholderContent};

    fn loaded() -> World {
        let mut world = World::new();
        world.populate(PlaceholderContent.load(Path::new("")).unwrap());
        world
    }

    #[test]
    fn fresh_world_size() {
        let world = loaded();
        assert_eq!(encoded_len(&world), 40 + 4 * 44 + 24);
    }

    #[test]
    fn header_fields() {
        let world = loaded();
        let mut buf = vec![0u8; encoded_len(&world)];
        let n = encode(&world, &mut buf).unwrap();
        assert_eq!(n, buf.len());
        assert_eq!(u16::from_le_bytes([buf[0], buf[1]]), 1);
        assert_eq!(u32::from_le_bytes(buf[4..8].try_into().unwrap()) as usize, n);
        assert_eq!(u32::from_le_bytes(buf[16..20].try_into().unwrap()), 4);
        assert_eq!(u32::from_le_bytes(buf[20..24].try_into().unwrap()), 44);
        assert_eq!(u32::from_le_bytes(buf[28..32].try_into().unwrap()), 16);
        assert_eq!(u32::from_le_bytes(buf[36..40].try_into().unwrap()), 1);
    }

    #[test]
    fn too_small_reports_required_and_writes_nothing() {
        let world = loaded();
        let required = encoded_len(&world);
        let mut buf = vec![0xEEu8; required - 1];
        assert_eq!(
            encode(&world, &mut buf),
            Err(CoreError::BufferTooSmall {
                required,
                capacity: required - 1
            })
        );
        assert!(buf.iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn larger_buffer_only_fills_prefix() {
        let world = loaded();
        let required = encoded_len(&world);
        let mut buf = vec![0xEEu8; required + 8];
        assert_eq!(encode(&world, &mut buf).unwrap(), required);
        assert!(buf[required..].iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn parse_reads_back_world_and_events() {
        let mut world = loaded();
        world.weapon.as_mut().unwrap().ammo_in_mag = 0;
        world
            .enqueue(vec![Action {
                tick: 1,
                actor_id: 1,
                kind: ActionKind::FireOnce { weapon_slot: 0 },
            }])
            .unwrap();
        world.advance_tick();

        let mut buf = vec![0u8; encoded_len(&world)];
        encode(&world, &mut buf).unwrap();
        let view = SnapshotView::parse(&buf).unwrap();

        assert_eq!(view.tick, 1);
        assert_eq!(view.entities, world.entities());
        assert_eq!(view.weapon.unwrap().ammo_in_mag, 0);
        assert!(!view.weapon.unwrap().reloading());
        assert_eq!(
            view.events,
            vec![Event::FireBlocked {
                actor: 1,
                weapon_slot: 0,
                reason: FireBlockedReason::EmptyMag
            }]
        );
    }

    #[test]
    fn parse_rejects_future_version() {
        let world = loaded();
        let mut buf = vec![0u8; encoded_len(&world)];
        encode(&world, &mut buf).unwrap();
        buf[0] = 2;
        assert!(matches!(
            SnapshotView::parse(&buf),
            Err(CoreError::Unsupported(_))
        ));
    }

    #[test]
    fn parse_rejects_truncation() {
        let world = loaded();
        let mut buf = vec![0u8; encoded_len(&world)];
        encode(&world, &mut buf).unwrap();
        assert!(SnapshotView::parse(&buf[..buf.len() - 4]).is_err());
        assert!(SnapshotView::parse(&buf[..10]).is_err());
    }
}
