//! Layout:
//! header, 9 bytes for v4 ([RawHeaderV4]) or 12 bytes for v5 ([RawHeaderV5])
//! Then `resource_count + 1` [Entry] records, the last one is the sentinel marking the end of the last resource
//! Then `alias_count` [Alias] records (v5 only)
//! Then resource blobs, written continuously in entry order

use core::mem::size_of;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, LittleEndian, Unaligned, U16, U32};

mod archive;
mod error;
mod table;

pub use archive::PakArchive;
pub use error::{PakError, PakResult};
pub use table::{read_aliases, read_entries, write_aliases, write_entries, Alias, Entry};

#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawHeaderV4 {
    version: U32<LittleEndian>,
    resource_count: U32<LittleEndian>,
    encoding: u8,
}

#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawHeaderV5 {
    version: U32<LittleEndian>,
    encoding: u8,
    _padding: [u8; 3],
    resource_count: U16<LittleEndian>,
    alias_count: U16<LittleEndian>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    V4 { resource_count: u32 },
    V5 { resource_count: u16, alias_count: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Text encoding tag of string resources, passed through untouched.
    pub encoding: u8,
    pub layout: Layout,
}

impl Header {
    pub const V4: u32 = 4;
    pub const V5: u32 = 5;

    const SIZE_V4: usize = size_of::<RawHeaderV4>();
    const SIZE_V5: usize = size_of::<RawHeaderV5>();
    const MIN_SIZE: usize = if Self::SIZE_V4 < Self::SIZE_V5 {
        Self::SIZE_V4
    } else {
        Self::SIZE_V5
    };

    pub fn new(
        version: u32,
        encoding: u8,
        resource_count: usize,
        alias_count: usize,
    ) -> PakResult<Self> {
        let too_many = |what, count| PakError::TooManyResources {
            what,
            version,
            count,
        };

        let layout = match version {
            Self::V4 => {
                if alias_count != 0 {
                    return Err(too_many("aliases", alias_count));
                }
                Layout::V4 {
                    resource_count: resource_count
                        .try_into()
                        .map_err(|_| too_many("resources", resource_count))?,
                }
            }
            Self::V5 => Layout::V5 {
                resource_count: resource_count
                    .try_into()
                    .map_err(|_| too_many("resources", resource_count))?,
                alias_count: alias_count
                    .try_into()
                    .map_err(|_| too_many("aliases", alias_count))?,
            },
            other => return Err(PakError::UnsupportedVersion(other)),
        };

        Ok(Self { encoding, layout })
    }

    pub fn version(&self) -> u32 {
        match self.layout {
            Layout::V4 { .. } => Self::V4,
            Layout::V5 { .. } => Self::V5,
        }
    }

    pub fn resource_count(&self) -> usize {
        match self.layout {
            Layout::V4 { resource_count } => resource_count as usize,
            Layout::V5 { resource_count, .. } => resource_count as usize,
        }
    }

    /// Always 0 for v4.
    pub fn alias_count(&self) -> usize {
        match self.layout {
            Layout::V4 { .. } => 0,
            Layout::V5 { alias_count, .. } => alias_count as usize,
        }
    }

    /// Byte length of the header itself, which is where the entry table starts.
    pub fn size(&self) -> usize {
        match self.layout {
            Layout::V4 { .. } => Self::SIZE_V4,
            Layout::V5 { .. } => Self::SIZE_V5,
        }
    }

    /// Includes the sentinel.
    pub fn entry_table_size(&self) -> usize {
        (self.resource_count() + 1) * Entry::SIZE
    }

    pub fn alias_table_size(&self) -> usize {
        self.alias_count() * Alias::SIZE
    }

    pub fn entry_table_end(&self) -> usize {
        self.size() + self.entry_table_size()
    }

    /// Offset of the first resource blob.
    pub fn data_start(&self) -> usize {
        self.entry_table_end() + self.alias_table_size()
    }

    pub fn parse(buffer: &[u8]) -> PakResult<Self> {
        let truncated = |needed| PakError::TruncatedHeader {
            needed,
            available: buffer.len(),
        };

        let (version, _) = U32::<LittleEndian>::read_from_prefix(buffer)
            .map_err(|_| truncated(Self::MIN_SIZE))?;

        match version.get() {
            Self::V4 => {
                let (raw, _) = RawHeaderV4::read_from_prefix(buffer)
                    .map_err(|_| truncated(Self::SIZE_V4))?;
                Ok(Self {
                    encoding: raw.encoding,
                    layout: Layout::V4 {
                        resource_count: raw.resource_count.get(),
                    },
                })
            }
            Self::V5 => {
                let (raw, _) = RawHeaderV5::read_from_prefix(buffer)
                    .map_err(|_| truncated(Self::SIZE_V5))?;
                Ok(Self {
                    encoding: raw.encoding,
                    layout: Layout::V5 {
                        resource_count: raw.resource_count.get(),
                        alias_count: raw.alias_count.get(),
                    },
                })
            }
            other => Err(PakError::UnsupportedVersion(other)),
        }
    }

    /// Returns the number of bytes written, which equals [Header::size].
    pub fn write(&self, buffer: &mut [u8]) -> PakResult<usize> {
        match self.layout {
            Layout::V4 { resource_count } => write_prefix(
                RawHeaderV4 {
                    version: Self::V4.into(),
                    resource_count: resource_count.into(),
                    encoding: self.encoding,
                }
                .as_bytes(),
                buffer,
            ),
            Layout::V5 {
                resource_count,
                alias_count,
            } => write_prefix(
                RawHeaderV5 {
                    version: Self::V5.into(),
                    encoding: self.encoding,
                    _padding: [0; 3],
                    resource_count: resource_count.into(),
                    alias_count: alias_count.into(),
                }
                .as_bytes(),
                buffer,
            ),
        }
    }
}

fn write_prefix(bytes: &[u8], buffer: &mut [u8]) -> PakResult<usize> {
    let available = buffer.len();
    buffer
        .get_mut(..bytes.len())
        .ok_or(PakError::BufferTooSmall {
            needed: bytes.len(),
            available,
        })?
        .copy_from_slice(bytes);

    Ok(bytes.len())
}
