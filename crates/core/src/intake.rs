//! Action intake - batch header checks and per-action decoding.
//!
//! A batch is validated completely before anything is queued: one bad action
//! rejects the whole batch and the queue is left as it was. Submission does
//! not look at the current tick; actions that can no longer fire are evicted
//! by the tick processor instead.

use axiom_types::{
    Action, ActionKind, RawAction, ACTION_CROUCH_TOGGLE, ACTION_FIRE_ONCE, ACTION_LOOK_INTENT,
    ACTION_MOVE_INTENT, ACTION_RELOAD, ACTION_SPRINT_HELD,
};

use crate::error::{CoreError, CoreResult};

/// Current `ActionBatch` struct version.
pub const ACTION_BATCH_VERSION: u16 = 1;

/// Size of the v1 batch header (version, reserved, size, count, stride, list).
pub const ACTION_BATCH_SIZE_V1: u32 = 24;

/// Versioned batch of actions submitted by a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionBatch<'a> {
    pub version: u16,
    pub size_bytes: u32,
    pub count: u32,
    pub actions: Option<&'a [RawAction]>,
}

impl<'a> ActionBatch<'a> {
    pub fn v1(actions: &'a [RawAction]) -> Self {
        Self {
            version: ACTION_BATCH_VERSION,
            size_bytes: ACTION_BATCH_SIZE_V1,
            count: actions.len() as u32,
            actions: Some(actions),
        }
    }
}

/// Check the batch header and decode every action it carries.
pub fn decode_batch(batch: &ActionBatch<'_>) -> CoreResult<Vec<Action>> {
    if batch.version != ACTION_BATCH_VERSION {
        return Err(CoreError::unsupported(format!(
            "action batch version {} (expected {ACTION_BATCH_VERSION})",
            batch.version
        )));
    }
    if batch.size_bytes < ACTION_BATCH_SIZE_V1 {
        return Err(CoreError::invalid_arg(format!(
            "action batch header is {} bytes, need at least {ACTION_BATCH_SIZE_V1}",
            batch.size_bytes
        )));
    }
    if batch.count == 0 {
        return Ok(Vec::new());
    }

    let list = batch.actions.ok_or_else(|| {
        CoreError::invalid_arg(format!(
            "action batch declares {} actions but carries no action list",
            batch.count
        ))
    })?;
    let count = batch.count as usize;
    if list.len() < count {
        return Err(CoreError::invalid_arg(format!(
            "action batch declares {count} actions but the list holds {}",
            list.len()
        )));
    }

    list[..count]
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            decode_action(raw).map_err(|e| match e {
                CoreError::InvalidArg(msg) => CoreError::InvalidArg(format!("action {i}: {msg}")),
                other => other,
            })
        })
        .collect()
}

/// Decode one wire action into its typed form.
pub fn decode_action(raw: &RawAction) -> CoreResult<Action> {
    let [p0, p1] = raw.payload;
    let kind = match raw.kind {
        ACTION_MOVE_INTENT => ActionKind::MoveIntent {
            x: finite("move x", p0)?,
            y: finite("move y", p1)?,
        },
        ACTION_LOOK_INTENT => ActionKind::LookIntent {
            yaw: finite("look yaw", p0)?,
            pitch: finite("look pitch", p1)?,
        },
        ACTION_FIRE_ONCE => ActionKind::FireOnce { weapon_slot: p0 },
        ACTION_RELOAD => ActionKind::Reload { weapon_slot: p0 },
        ACTION_SPRINT_HELD => ActionKind::SprintHeld { held: p0 },
        ACTION_CROUCH_TOGGLE => ActionKind::CrouchToggle { toggle: p0 },
        other => {
            return Err(CoreError::invalid_arg(format!(
                "unknown action type {other}"
            )))
        }
    };
    Ok(Action {
        tick: raw.tick,
        actor_id: raw.actor_id,
        kind,
    })
}

fn finite(field: &str, bits: u32) -> CoreResult<f32> {
    let v = f32::from_bits(bits);
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::invalid_arg(format!("{field} is not finite ({v})")))
    }
}
