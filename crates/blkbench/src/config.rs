//! Benchmark parameters and their validation.
//!
//! A [`BenchmarkConfig`] can only be obtained from
//! [`BenchmarkConfigBuilder::build`], which rejects every size combination
//! that would not tile the region exactly. Nothing is opened until a config
//! exists.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use blkbench_io::OpenFlags;
use serde::{Deserialize, Serialize};

use crate::ArgumentError;

/// Bytes per kibibyte; block sizes are given in KiB on the command line.
pub const KIB: u64 = 1024;

/// Addressable region at the start of the target (1 GiB).
pub const PART_SIZE: u64 = 1024 * 1024 * 1024;

/// Total volume transferred per run (64 MiB).
pub const ACCESS_SIZE: u64 = 64 * 1024 * 1024;

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

impl FromStr for Operation {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(Self::Read),
            "w" => Ok(Self::Write),
            _ => Err(ArgumentError::InvalidToken {
                what: "r/w",
                expected: "'r' or 'w'",
                value: s.to_string(),
            }),
        }
    }
}

/// Order in which blocks of the region are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    Sequential,
    Random,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Random => f.write_str("random"),
        }
    }
}

impl FromStr for Pattern {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seq" => Ok(Self::Sequential),
            "rand" => Ok(Self::Random),
            _ => Err(ArgumentError::InvalidToken {
                what: "access pattern",
                expected: "'seq' or 'rand'",
                value: s.to_string(),
            }),
        }
    }
}

/// Whether the kernel's page cache assists the transfers.
///
/// `On` is ordinary cached I/O; `Off` opens the target with `O_DIRECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoAssist {
    On,
    Off,
}

impl IoAssist {
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::On)
    }
}

impl FromStr for IoAssist {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            _ => Err(ArgumentError::InvalidToken {
                what: "kernel's help",
                expected: "'on' or 'off'",
                value: s.to_string(),
            }),
        }
    }
}

/// Size of the addressable region and of the per-run transfer volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    region_size: u64,
    access_size: u64,
}

impl Geometry {
    /// Creates a geometry; `access_size` must be non-zero and fit in the region.
    pub fn new(region_size: u64, access_size: u64) -> Result<Self, ArgumentError> {
        if access_size == 0 || access_size > region_size {
            return Err(ArgumentError::InvalidGeometry {
                region_size,
                access_size,
            });
        }
        Ok(Self {
            region_size,
            access_size,
        })
    }

    pub fn region_size(&self) -> u64 {
        self.region_size
    }

    pub fn access_size(&self) -> u64 {
        self.access_size
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            region_size: PART_SIZE,
            access_size: ACCESS_SIZE,
        }
    }
}

/// Validated, immutable parameters of one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkConfig {
    target: PathBuf,
    io_assist_enabled: bool,
    operation: Operation,
    pattern: Pattern,
    block_size: u64,
    geometry: Geometry,
}

impl BenchmarkConfig {
    /// Starts building a config for `target`.
    pub fn builder(target: impl Into<PathBuf>) -> BenchmarkConfigBuilder {
        BenchmarkConfigBuilder::new(target)
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn io_assist_enabled(&self) -> bool {
        self.io_assist_enabled
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    /// Size of each transfer in bytes.
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Number of block slots in the addressable region.
    pub fn region_block_count(&self) -> u64 {
        self.geometry.region_size / self.block_size
    }

    /// Number of transfers one run issues.
    pub fn transfer_count(&self) -> u64 {
        self.geometry.access_size / self.block_size
    }

    /// Total bytes one run moves.
    pub fn access_size(&self) -> u64 {
        self.geometry.access_size
    }

    /// Flags the target is opened with: always read-write and exclusive,
    /// direct when the kernel assist is off.
    pub fn open_flags(&self) -> OpenFlags {
        if self.io_assist_enabled {
            OpenFlags::buffered()
        } else {
            OpenFlags::direct()
        }
    }
}

/// Builder for [`BenchmarkConfig`].
#[derive(Debug, Clone)]
pub struct BenchmarkConfigBuilder {
    target: PathBuf,
    io_assist_enabled: bool,
    operation: Operation,
    pattern: Pattern,
    block_size: Result<u64, ArgumentError>,
    geometry: Geometry,
}

impl BenchmarkConfigBuilder {
    fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            io_assist_enabled: true,
            operation: Operation::Read,
            pattern: Pattern::Sequential,
            block_size: Ok(0),
            geometry: Geometry::default(),
        }
    }

    pub fn io_assist(mut self, assist: IoAssist) -> Self {
        self.io_assist_enabled = assist.is_enabled();
        self
    }

    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn block_size_bytes(mut self, bytes: u64) -> Self {
        self.block_size = Ok(bytes);
        self
    }

    pub fn block_size_kb(mut self, kb: u64) -> Self {
        self.block_size = kb
            .checked_mul(KIB)
            .ok_or(ArgumentError::BlockSizeOverflow { kb });
        self
    }

    pub fn geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Validates the parameters.
    ///
    /// The block size must be non-zero and divide both the access volume and
    /// the region, so that block-indexed offsets tile the region exactly.
    pub fn build(self) -> Result<BenchmarkConfig, ArgumentError> {
        let block_size = self.block_size?;
        if block_size == 0 {
            return Err(ArgumentError::ZeroBlockSize);
        }

        let Geometry {
            region_size,
            access_size,
        } = self.geometry;
        if access_size % block_size != 0 {
            return Err(ArgumentError::AccessNotMultiple {
                access_size,
                block_size,
            });
        }
        if region_size % block_size != 0 {
            return Err(ArgumentError::RegionNotMultiple {
                region_size,
                block_size,
            });
        }

        Ok(BenchmarkConfig {
            target: self.target,
            io_assist_enabled: self.io_assist_enabled,
            operation: self.operation,
            pattern: self.pattern,
            block_size,
            geometry: self.geometry,
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_case::test_case;

    use super::*;

    #[test]
    fn default_geometry_is_one_gib_region_and_64_mib_access() {
        let geometry = Geometry::default();
        assert_eq!(geometry.region_size(), 1 << 30);
        assert_eq!(geometry.access_size(), 64 << 20);
    }

    #[test]
    fn sixty_four_kib_blocks() {
        let config = BenchmarkConfig::builder("/tmp/testfile")
            .io_assist(IoAssist::Off)
            .operation(Operation::Write)
            .block_size_kb(64)
            .build()
            .unwrap();

        assert_eq!(config.block_size(), 65536);
        assert_eq!(config.transfer_count(), 1024);
        assert_eq!(config.region_block_count(), 16384);
        assert!(!config.io_assist_enabled());
        assert!(config.open_flags().direct);
        assert!(config.open_flags().exclusive);
    }

    #[test]
    fn four_kib_blocks() {
        let config = BenchmarkConfig::builder("/tmp/testfile")
            .io_assist(IoAssist::On)
            .pattern(Pattern::Random)
            .block_size_kb(4)
            .build()
            .unwrap();

        assert_eq!(config.block_size(), 4096);
        assert_eq!(config.transfer_count(), 16384);
        assert_eq!(config.region_block_count(), 262_144);
        assert!(!config.open_flags().direct);
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let err = BenchmarkConfig::builder("/tmp/testfile")
            .block_size_kb(0)
            .build()
            .unwrap_err();
        assert_eq!(err, ArgumentError::ZeroBlockSize);
    }

    #[test]
    fn block_size_overflow_is_rejected() {
        let err = BenchmarkConfig::builder("/tmp/testfile")
            .block_size_kb(u64::MAX)
            .build()
            .unwrap_err();
        assert_eq!(err, ArgumentError::BlockSizeOverflow { kb: u64::MAX });
    }

    #[test_case(3; "three")]
    #[test_case(1000; "thousand")]
    #[test_case(131_072; "larger than access")]
    fn non_dividing_block_size_is_rejected(kb: u64) {
        let err = BenchmarkConfig::builder("/tmp/testfile")
            .block_size_kb(kb)
            .build()
            .unwrap_err();
        assert!(matches!(err, ArgumentError::AccessNotMultiple { .. }));
    }

    #[test]
    fn region_must_be_a_multiple_of_block_size() {
        let geometry = Geometry::new(3 * 8192, 8192).unwrap();
        let err = BenchmarkConfig::builder("/tmp/testfile")
            .geometry(geometry)
            .block_size_bytes(8192 * 2)
            .build()
            .unwrap_err();
        assert!(matches!(err, ArgumentError::AccessNotMultiple { .. }));

        let geometry = Geometry::new(3 * 4096, 2 * 4096).unwrap();
        let err = BenchmarkConfig::builder("/tmp/testfile")
            .geometry(geometry)
            .block_size_bytes(8192)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ArgumentError::RegionNotMultiple {
                region_size: 12288,
                block_size: 8192
            }
        );
    }

    #[test_case(0, 0; "empty")]
    #[test_case(4096, 0; "zero access")]
    #[test_case(4096, 8192; "access larger than region")]
    fn invalid_geometry_is_rejected(region: u64, access: u64) {
        assert!(matches!(
            Geometry::new(region, access),
            Err(ArgumentError::InvalidGeometry { .. })
        ));
    }

    #[test_case("r", Operation::Read)]
    #[test_case("w", Operation::Write)]
    fn operation_tokens(token: &str, expected: Operation) {
        assert_eq!(token.parse::<Operation>().unwrap(), expected);
    }

    #[test_case("seq", Pattern::Sequential)]
    #[test_case("rand", Pattern::Random)]
    fn pattern_tokens(token: &str, expected: Pattern) {
        assert_eq!(token.parse::<Pattern>().unwrap(), expected);
    }

    #[test]
    fn invalid_tokens_name_the_argument() {
        let err = "x".parse::<Operation>().unwrap_err();
        assert_eq!(err.to_string(), "r/w should be 'r' or 'w': x");

        let err = "sec".parse::<Pattern>().unwrap_err();
        assert_eq!(err.to_string(), "access pattern should be 'seq' or 'rand': sec");

        let err = "yes".parse::<IoAssist>().unwrap_err();
        assert_eq!(err.to_string(), "kernel's help should be 'on' or 'off': yes");
    }

    proptest! {
        /// Any accepted block size tiles both the access volume and the region.
        #[test]
        fn prop_accepted_block_sizes_tile_exactly(kb in 0u64..=70_000) {
            let result = BenchmarkConfig::builder("/dev/null").block_size_kb(kb).build();
            let bytes = kb * KIB;
            let divides = bytes > 0 && ACCESS_SIZE % bytes == 0 && PART_SIZE % bytes == 0;

            prop_assert_eq!(result.is_ok(), divides);
            if let Ok(config) = result {
                prop_assert_eq!(config.transfer_count() * config.block_size(), ACCESS_SIZE);
                prop_assert_eq!(config.region_block_count() * config.block_size(), PART_SIZE);
            }
        }
    }
}
