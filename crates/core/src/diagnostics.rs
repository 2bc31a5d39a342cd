//! Versioned diagnostics record.

use arrayvec::ArrayString;
use axiom_types::{ABI_MAJOR, ABI_MINOR};

pub const DIAGNOSTICS_VERSION: u16 = 1;

/// Flattened v1 size: header, abi, tick, flags, 32-byte hash, 64-byte string.
pub const DIAGNOSTICS_SIZE_V1: u32 = 120;

pub const FEATURE_SNAPSHOT: u32 = 1 << 0;
pub const FEATURE_SAVE_LOAD: u32 = 1 << 1;
pub const FEATURE_ATOMIC_BATCHES: u32 = 1 << 2;
pub const FEATURE_STALE_ACTION_EVICTION: u32 = 1 << 3;

pub const FEATURE_FLAGS: u32 =
    FEATURE_SNAPSHOT | FEATURE_SAVE_LOAD | FEATURE_ATOMIC_BATCHES | FEATURE_STALE_ACTION_EVICTION;

const BUILD_HASH: &str = match option_env!("AXIOM_BUILD_HASH") {
    Some(hash) => hash,
    None => "dev",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbiVersion {
    pub major: u16,
    pub minor: u16,
}

pub fn abi_version() -> AbiVersion {
    AbiVersion {
        major: ABI_MAJOR,
        minor: ABI_MINOR,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    pub version: u16,
    pub size_bytes: u32,
    pub abi_major: u16,
    pub abi_minor: u16,
    pub current_tick: u64,
    pub feature_flags: u32,
    pub build_hash: ArrayString<32>,
    pub version_string: ArrayString<64>,
}

impl Diagnostics {
    pub(crate) fn collect(current_tick: u64) -> Self {
        let version = format!(
            "axiom-core {} (abi {ABI_MAJOR}.{ABI_MINOR})",
            env!("CARGO_PKG_VERSION")
        );
        Self {
            version: DIAGNOSTICS_VERSION,
            size_bytes: DIAGNOSTICS_SIZE_V1,
            abi_major: ABI_MAJOR,
            abi_minor: ABI_MINOR,
            current_tick,
            feature_flags: FEATURE_FLAGS,
            build_hash: truncated(BUILD_HASH),
            version_string: truncated(&version),
        }
    }

    pub fn has_feature(&self, flag: u32) -> bool {
        self.feature_flags & flag == flag
    }

    /// Build hash as its fixed wire field, zero padded.
    pub fn build_hash_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[..self.build_hash.len()].copy_from_slice(self.build_hash.as_bytes());
        out
    }
}

/// Copy as many whole chars of `s` as fit.
fn truncated<const N: usize>(s: &str) -> ArrayString<N> {
    let mut out = ArrayString::new();
    for c in s.chars() {
        if out.try_push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_abi_and_tick() {
        let d = Diagnostics::collect(42);
        assert_eq!(d.version, 1);
        assert_eq!(d.size_bytes, DIAGNOSTICS_SIZE_V1);
        assert_eq!((d.abi_major, d.abi_minor), (1, 0));
        assert_eq!(d.current_tick, 42);
        assert!(d.has_feature(FEATURE_SNAPSHOT | FEATURE_SAVE_LOAD));
        assert!(d.has_feature(FEATURE_STALE_ACTION_EVICTION));
    }

    #[test]
    fn version_string_names_crate_and_abi() {
        let d = Diagnostics::collect(0);
        assert!(d.version_string.starts_with("axiom-core "));
        assert!(d.version_string.ends_with("(abi 1.0)"));
    }

    #[test]
    fn build_hash_is_zero_padded() {
        let d = Diagnostics::collect(0);
        assert!(!d.build_hash.is_empty());
        let bytes = d.build_hash_bytes();
        assert_eq!(&bytes[..d.build_hash.len()], d.build_hash.as_bytes());
        assert!(bytes[d.build_hash.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn truncation_keeps_whole_chars() {
        let s: ArrayString<4> = truncated("abé€x");
        assert_eq!(s.as_str(), "abé");
        let s: ArrayString<8> = truncated("short");
        assert_eq!(s.as_str(), "short");
    }

    #[test]
    fn abi_version_matches_constants() {
        assert_eq!(abi_version(), AbiVersion { major: 1, minor: 0 });
    }
}
