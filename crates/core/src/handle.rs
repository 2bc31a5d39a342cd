//! The `Core` handle: one simulation instance and its boundary operations.
//!
//! Every fallible operation records its outcome in the instance's last-error
//! string (cleared on success) and returns the error as a `Result`. Nothing is
//! mutated before an operation has passed all of its checks.

use std::fmt;
use std::path::{Path, PathBuf};

use axiom_types::{ABI_MAJOR, ABI_MINOR};
use log::Level;

use crate::content::{
    ContentLoadParams, ContentSource, PlaceholderContent, CONTENT_LOAD_PARAMS_SIZE_V1,
    CONTENT_LOAD_PARAMS_VERSION,
};
use crate::diagnostics::Diagnostics;
use crate::error::{CoreError, CoreResult};
use crate::intake::{self, ActionBatch};
use crate::lifecycle::Lifecycle;
use crate::save::{self, SaveView};
use crate::snapshot;
use crate::world::World;

/// Host log callback. Receives every line the instance logs, in addition to
/// the `log` facade.
pub type LogSink = Box<dyn Fn(Level, &str) + Send>;

pub const CREATE_PARAMS_VERSION: u16 = 1;

/// Size of the v1 create header (version, size, abi, log fn, log user).
pub const CREATE_PARAMS_SIZE_V1: u32 = 32;

pub struct CreateParams {
    pub version: u16,
    pub size_bytes: u32,
    pub abi_major: u16,
    pub abi_minor: u16,
    pub log: Option<LogSink>,
}

impl CreateParams {
    pub fn v1() -> Self {
        Self {
            version: CREATE_PARAMS_VERSION,
            size_bytes: CREATE_PARAMS_SIZE_V1,
            abi_major: ABI_MAJOR,
            abi_minor: ABI_MINOR,
            log: None,
        }
    }

    pub fn with_log_sink(mut self, sink: impl Fn(Level, &str) + Send + 'static) -> Self {
        self.log = Some(Box::new(sink));
        self
    }
}

impl Default for CreateParams {
    fn default() -> Self {
        Self::v1()
    }
}

impl fmt::Debug for CreateParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateParams")
            .field("version", &self.version)
            .field("size_bytes", &self.size_bytes)
            .field("abi_major", &self.abi_major)
            .field("abi_minor", &self.abi_minor)
            .field("log", &self.log.is_some())
            .finish()
    }
}

pub struct Core {
    lifecycle: Lifecycle,
    world: World,
    content: Box<dyn ContentSource>,
    content_root: Option<PathBuf>,
    log_sink: Option<LogSink>,
    last_error: String,
}

impl Core {
    /// Create an instance backed by the placeholder content source.
    pub fn create(params: CreateParams) -> CoreResult<Self> {
        Self::create_with_content(params, Box::new(PlaceholderContent))
    }

    pub fn create_with_content(
        params: CreateParams,
        content: Box<dyn ContentSource>,
    ) -> CoreResult<Self> {
        if params.version != CREATE_PARAMS_VERSION {
            return Err(CoreError::unsupported(format!(
                "create params version {} (expected {CREATE_PARAMS_VERSION})",
                params.version
            )));
        }
        if params.size_bytes < CREATE_PARAMS_SIZE_V1 {
            return Err(CoreError::invalid_arg(format!(
                "create params are {} bytes, need at least {CREATE_PARAMS_SIZE_V1}",
                params.size_bytes
            )));
        }
        if params.abi_major != ABI_MAJOR {
            return Err(CoreError::unsupported(format!(
                "host abi {}.{} is incompatible with core abi {ABI_MAJOR}.x",
                params.abi_major, params.abi_minor
            )));
        }

        let core = Self {
            lifecycle: Lifecycle::Created,
            world: World::new(),
            content,
            content_root: None,
            log_sink: params.log,
            last_error: String::new(),
        };
        core.emit(
            Level::Info,
            &format!(
                "core created (host abi {}.{})",
                params.abi_major, params.abi_minor
            ),
        );
        Ok(core)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Description of the most recent failure on this instance, empty if the
    /// last operation succeeded.
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::collect(self.world.tick())
    }

    pub fn tick(&self) -> u64 {
        self.world.tick()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn content_root(&self) -> Option<&Path> {
        self.content_root.as_deref()
    }

    /// Actions dropped because their target tick had already passed.
    pub fn evicted_action_count(&self) -> u64 {
        self.world.evicted_actions()
    }

    pub fn load_content(&mut self, params: &ContentLoadParams<'_>) -> CoreResult<()> {
        let result = self.try_load_content(params);
        self.record("load_content", result)
    }

    fn try_load_content(&mut self, params: &ContentLoadParams<'_>) -> CoreResult<()> {
        self.lifecycle
            .require_exactly("load_content", Lifecycle::Created)?;
        if params.version != CONTENT_LOAD_PARAMS_VERSION {
            return Err(CoreError::unsupported(format!(
                "content load params version {} (expected {CONTENT_LOAD_PARAMS_VERSION})",
                params.version
            )));
        }
        if params.size_bytes < CONTENT_LOAD_PARAMS_SIZE_V1 {
            return Err(CoreError::invalid_arg(format!(
                "content load params are {} bytes, need at least {CONTENT_LOAD_PARAMS_SIZE_V1}",
                params.size_bytes
            )));
        }
        let root = params
            .root_path
            .ok_or_else(|| CoreError::invalid_arg("content load params carry no root path"))?;

        let set = self.content.load(root)?;
        set.validate()?;
        let summary = format!(
            "content loaded from {} ({} entities, content id {:#010x})",
            root.display(),
            set.entities.len(),
            set.content_id
        );

        self.world.populate(set);
        self.content_root = Some(root.to_path_buf());
        self.lifecycle = Lifecycle::ContentLoaded;
        self.emit(Level::Info, &summary);
        Ok(())
    }

    /// Drop all truth state and return to `Created`. Idempotent.
    pub fn unload(&mut self) {
        if self.lifecycle != Lifecycle::Created {
            self.emit(
                Level::Info,
                &format!("content unloaded at tick {}", self.world.tick()),
            );
        }
        self.world.clear();
        self.content_root = None;
        self.lifecycle = Lifecycle::Created;
        self.last_error.clear();
    }

    /// Validate a batch and queue all of its actions, or none of them.
    pub fn submit(&mut self, batch: &ActionBatch<'_>) -> CoreResult<()> {
        let result = self.try_submit(batch);
        self.record("submit", result)
    }

    fn try_submit(&mut self, batch: &ActionBatch<'_>) -> CoreResult<()> {
        self.lifecycle
            .require_at_least("submit", Lifecycle::ContentLoaded)?;
        let actions = intake::decode_batch(batch)?;
        if actions.is_empty() {
            return Ok(());
        }
        let count = actions.len();
        self.world.enqueue(actions)?;
        log::debug!(
            target: "axiom_core",
            "queued {count} actions ({} pending)",
            self.world.queued_actions().len()
        );
        Ok(())
    }

    /// Advance exactly `n` ticks.
    pub fn step(&mut self, n: u32) -> CoreResult<()> {
        let result = self.try_step(n);
        self.record("step", result)
    }

    fn try_step(&mut self, n: u32) -> CoreResult<()> {
        self.lifecycle
            .require_at_least("step", Lifecycle::ContentLoaded)?;
        if n == 0 {
            return Ok(());
        }
        if self.world.tick().checked_add(u64::from(n)).is_none() {
            return Err(CoreError::invalid_arg(format!(
                "stepping {n} ticks from tick {} overflows the tick counter",
                self.world.tick()
            )));
        }

        let evicted_before = self.world.evicted_actions();
        for _ in 0..n {
            self.world.advance_tick();
        }
        self.lifecycle = self.lifecycle.after_step();

        let evicted = self.world.evicted_actions() - evicted_before;
        if evicted > 0 {
            self.emit(
                Level::Warn,
                &format!(
                    "{evicted} stale actions evicted while stepping to tick {}",
                    self.world.tick()
                ),
            );
        }
        Ok(())
    }

    /// Size query (`None`) or copy-out of the current snapshot.
    pub fn snapshot(&mut self, out: Option<&mut [u8]>) -> CoreResult<usize> {
        let result = self.try_snapshot(out);
        self.record("snapshot", result)
    }

    fn try_snapshot(&self, out: Option<&mut [u8]>) -> CoreResult<usize> {
        self.lifecycle
            .require_at_least("snapshot", Lifecycle::ContentLoaded)?;
        match out {
            None => Ok(snapshot::encoded_len(&self.world)),
            Some(buf) => snapshot::encode(&self.world, buf),
        }
    }

    /// Snapshot into a freshly allocated buffer.
    pub fn snapshot_bytes(&mut self) -> CoreResult<Vec<u8>> {
        let size = self.snapshot(None)?;
        let mut buf = vec![0u8; size];
        let written = self.snapshot(Some(&mut buf[..]))?;
        buf.truncate(written);
        Ok(buf)
    }

    /// Size query (`None`) or copy-out of a save blob.
    pub fn save(&mut self, out: Option<&mut [u8]>) -> CoreResult<usize> {
        let result = self.try_save(out);
        self.record("save", result)
    }

    fn try_save(&self, out: Option<&mut [u8]>) -> CoreResult<usize> {
        self.lifecycle
            .require_at_least("save", Lifecycle::ContentLoaded)?;
        match out {
            None => Ok(save::required_size(&self.world)),
            Some(buf) => {
                let n = save::encode(&self.world, buf)?;
                log::debug!(target: "axiom_core", "saved {n} bytes at tick {}", self.world.tick());
                Ok(n)
            }
        }
    }

    pub fn save_bytes(&mut self) -> CoreResult<Vec<u8>> {
        let size = self.save(None)?;
        let mut buf = vec![0u8; size];
        let written = self.save(Some(&mut buf[..]))?;
        buf.truncate(written);
        Ok(buf)
    }

    /// Restore a save blob into this content-loaded instance. The lifecycle
    /// state is left as it is.
    pub fn load_save(&mut self, buf: &[u8]) -> CoreResult<()> {
        let result = self.try_load_save(buf);
        self.record("load_save", result)
    }

    fn try_load_save(&mut self, buf: &[u8]) -> CoreResult<()> {
        self.lifecycle
            .require_at_least("load_save", Lifecycle::ContentLoaded)?;
        let view = SaveView::parse(buf)?;
        self.world.apply_save(&view)?;
        self.emit(
            Level::Info,
            &format!(
                "save restored: tick {}, {} targets",
                view.world.tick,
                view.targets.len()
            ),
        );
        Ok(())
    }

    fn record<T>(&mut self, op: &str, result: CoreResult<T>) -> CoreResult<T> {
        match &result {
            Ok(_) => self.last_error.clear(),
            Err(err) => {
                self.last_error = err.to_string();
                let level = match err {
                    CoreError::Internal(_) => Level::Error,
                    _ => Level::Debug,
                };
                self.emit(level, &format!("{op} failed: {err}"));
            }
        }
        result
    }

    fn emit(&self, level: Level, msg: &str) {
        log::log!(target: "axiom_core", level, "{msg}");
        if let Some(sink) = &self.log_sink {
            sink(level, msg);
        }
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("lifecycle", &self.lifecycle)
            .field("tick", &self.world.tick())
            .field("content_root", &self.content_root)
            .field("queued_actions", &self.world.queued_actions().len())
            .field("last_error", &self.last_error)
            .finish()
    }
}
