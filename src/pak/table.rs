use core::{fmt::Debug, mem::size_of};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, LittleEndian, Unaligned, U16, U32};

use super::{write_prefix, Header, Layout, PakError, PakResult};

#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct Entry {
    pub resource_id: U16<LittleEndian>,
    pub offset: U32<LittleEndian>,
}

impl Entry {
    pub const SIZE: usize = size_of::<Self>();

    pub fn new(resource_id: u16, offset: u32) -> Self {
        Self {
            resource_id: resource_id.into(),
            offset: offset.into(),
        }
    }

    pub fn id(&self) -> u16 {
        self.resource_id.get()
    }

    pub fn offset(&self) -> usize {
        self.offset.get() as usize
    }
}

impl Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("resource_id", &self.id())
            .field("offset", &self.offset())
            .finish()
    }
}

/// Additional id sharing the blob of the entry at `entry_index`.
#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct Alias {
    pub resource_id: U16<LittleEndian>,
    pub entry_index: U16<LittleEndian>,
}

impl Alias {
    pub const SIZE: usize = size_of::<Self>();

    pub fn new(resource_id: u16, entry_index: u16) -> Self {
        Self {
            resource_id: resource_id.into(),
            entry_index: entry_index.into(),
        }
    }

    pub fn id(&self) -> u16 {
        self.resource_id.get()
    }

    pub fn entry_index(&self) -> usize {
        self.entry_index.get() as usize
    }
}

impl Debug for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alias")
            .field("resource_id", &self.id())
            .field("entry_index", &self.entry_index())
            .finish()
    }
}

/// Entry table including the sentinel, borrowed straight from `buffer`.
pub fn read_entries<'a>(buffer: &'a [u8], header: &Header) -> PakResult<&'a [Entry]> {
    let offset = header.size();
    let needed = header.entry_table_size();

    let bytes = buffer
        .get(offset..)
        .and_then(|rest| rest.get(..needed))
        .ok_or(PakError::TruncatedEntryTable {
            offset,
            needed,
            available: buffer.len().saturating_sub(offset),
        })?;

    <[Entry]>::ref_from_bytes(bytes).map_err(|_| PakError::malformed("unreadable entry table"))
}

/// Empty for v4, which has no alias table.
pub fn read_aliases<'a>(
    buffer: &'a [u8],
    header: &Header,
    entry_table_end: usize,
) -> PakResult<&'a [Alias]> {
    let Layout::V5 { alias_count, .. } = header.layout else {
        return Ok(&[]);
    };
    let needed = alias_count as usize * Alias::SIZE;

    let bytes = buffer
        .get(entry_table_end..)
        .and_then(|rest| rest.get(..needed))
        .ok_or(PakError::TruncatedAliasTable {
            offset: entry_table_end,
            needed,
            available: buffer.len().saturating_sub(entry_table_end),
        })?;

    <[Alias]>::ref_from_bytes(bytes).map_err(|_| PakError::malformed("unreadable alias table"))
}

/// Writes `entries` verbatim; the caller puts the sentinel last.
pub fn write_entries(entries: &[Entry], buffer: &mut [u8]) -> PakResult<usize> {
    write_prefix(entries.as_bytes(), buffer)
}

pub fn write_aliases(header: &Header, aliases: &[Alias], buffer: &mut [u8]) -> PakResult<usize> {
    match header.layout {
        Layout::V4 { .. } => Ok(0),
        Layout::V5 { .. } => write_prefix(aliases.as_bytes(), buffer),
    }
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, BytesMut};

    use super::*;

    fn v5_with_tables(resource_count: u16, alias_count: u16, tail: usize) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_u32_le(5);
        buf.put_u8(1);
        buf.put_bytes(0, 3);
        buf.put_u16_le(resource_count);
        buf.put_u16_le(alias_count);
        buf.put_bytes(0, tail);
        buf
    }

    #[test]
    fn record_sizes() {
        assert_eq!(Entry::SIZE, 6);
        assert_eq!(Alias::SIZE, 4);
    }

    #[test]
    fn entries_are_little_endian() {
        let entries = [Entry::new(0x0102, 0x0A0B0C0D), Entry::new(0, 0x20)];
        let mut buf = [0u8; 12];

        assert_eq!(write_entries(&entries, &mut buf).unwrap(), 12);
        assert_eq!(buf, [2, 1, 0x0D, 0x0C, 0x0B, 0x0A, 0, 0, 0x20, 0, 0, 0]);
    }

    #[test]
    fn read_entries_includes_sentinel() {
        let mut buf = v5_with_tables(2, 0, 0);
        buf.put_u16_le(7);
        buf.put_u32_le(30);
        buf.put_u16_le(8);
        buf.put_u32_le(31);
        buf.put_u16_le(0);
        buf.put_u32_le(32);

        let header = Header::parse(&buf).unwrap();
        let entries = read_entries(&buf, &header).unwrap();

        assert_eq!(
            entries,
            &[Entry::new(7, 30), Entry::new(8, 31), Entry::new(0, 32)]
        );
    }

    #[test]
    fn truncated_entry_table() {
        // 3 resources need 4 entries (24 bytes), only 20 follow the header
        let buf = v5_with_tables(3, 0, 20);
        let header = Header::parse(&buf).unwrap();

        assert!(matches!(
            read_entries(&buf, &header),
            Err(PakError::TruncatedEntryTable {
                offset: 12,
                needed: 24,
                available: 20
            })
        ));
    }

    #[test]
    fn aliases_follow_entry_table() {
        let mut buf = v5_with_tables(1, 2, 12);
        buf.put_u16_le(40);
        buf.put_u16_le(0);
        buf.put_u16_le(41);
        buf.put_u16_le(0);

        let header = Header::parse(&buf).unwrap();
        let aliases = read_aliases(&buf, &header, header.entry_table_end()).unwrap();

        assert_eq!(aliases, &[Alias::new(40, 0), Alias::new(41, 0)]);
    }

    #[test]
    fn truncated_alias_table() {
        let mut buf = v5_with_tables(1, 2, 12);
        buf.put_u16_le(40);

        let header = Header::parse(&buf).unwrap();
        assert!(matches!(
            read_aliases(&buf, &header, header.entry_table_end()),
            Err(PakError::TruncatedAliasTable { needed: 8, .. })
        ));
    }

    #[test]
    fn v4_has_no_alias_table() {
        let header = Header::new(4, 1, 0, 0).unwrap();
        let buf = [0xFFu8; 64];

        assert!(read_aliases(&buf, &header, 15).unwrap().is_empty());
        assert_eq!(
            write_aliases(&header, &[Alias::new(1, 0)], &mut [0u8; 0]).unwrap(),
            0
        );
    }
}
