//! Split archive support.
//!
//! A split archive is one logical ZIP stream cut into fixed-size volumes.
//! Offsets in the central directory are relative to the volume named by the
//! entry's disk number.
//!
//! # Volume Naming Convention
//!
//! - `archive.z01` - First volume, starting with the split marker `PK\x07\x08`
//! - `archive.z02` - Second volume
//! - `archive.zip` - Last volume, holding the central directory
//!
//! # Reading Split Archives
//!
//! ```rust,no_run
//! use zipkit::Archive;
//!
//! # fn main() -> zipkit::Result<()> {
//! // Sibling .z01, .z02, ... volumes are discovered automatically
//! let archive = Archive::open_path("archive.zip")?;
//! for entry in archive.entries() {
//!     println!("{}", entry.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Writing Split Archives
//!
//! ```rust,no_run
//! use zipkit::volume::VolumeConfig;
//! use zipkit::{ArchivePath, WriteOptions, Writer};
//!
//! # fn main() -> zipkit::Result<()> {
//! let config = VolumeConfig::new("archive.zip", 100 * 1024 * 1024)?;
//! let mut writer = Writer::create_split(config)?.options(WriteOptions::new());
//! writer.add_bytes(ArchivePath::new("data.bin")?, &vec![0u8; 1024])?;
//! let result = writer.finish()?;
//! println!("{} volumes", result.volume_sizes.len());
//! # Ok(())
//! # }
//! ```
//!
//! Local headers and data descriptors never straddle a volume boundary, and
//! the central directory together with the end records is kept in the last
//! volume. Entry data may continue from one volume into the next.

mod config;
mod reader;
mod sink;
mod unified;
mod writer;

pub use config::{MIN_SPLIT_SIZE, VolumeConfig};
pub use reader::{MultiVolumeReader, VolumeReader};
pub use sink::{ArchiveSink, StreamSink};
pub use unified::UnifiedReader;
pub use writer::MultiVolumeWriter;
