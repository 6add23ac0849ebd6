#![allow(dead_code)]

use super::{read_aliases, read_entries, Alias, Entry, Header, PakError, PakResult};

/// Read-only view over a fully loaded pak.
///
/// Entry and alias tables are borrowed from the buffer, nothing is copied.
/// Every blob range is checked against the buffer before slicing, so a
/// corrupted table yields [PakError::MalformedArchive] instead of a panic,
/// whether or not [PakArchive::check_format] was run first.
#[derive(Debug, Clone, Copy)]
pub struct PakArchive<'a> {
    data: &'a [u8],
    header: Header,
    entries: &'a [Entry],
    aliases: &'a [Alias],
}

impl<'a> PakArchive<'a> {
    pub fn parse(data: &'a [u8]) -> PakResult<Self> {
        let header = Header::parse(data)?;
        let entries = read_entries(data, &header)?;
        let aliases = read_aliases(data, &header, header.entry_table_end())?;

        Ok(Self {
            data,
            header,
            entries,
            aliases,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Primary entries, without the sentinel.
    pub fn entries(&self) -> &'a [Entry] {
        &self.entries[..self.header.resource_count()]
    }

    pub fn sentinel(&self) -> &'a Entry {
        &self.entries[self.header.resource_count()]
    }

    pub fn aliases(&self) -> &'a [Alias] {
        self.aliases
    }

    /// Structural sanity check over the whole pak.
    ///
    /// The sentinel must end exactly at the end of the buffer, blobs must not
    /// overlap the tables, offsets must never decrease and every alias must
    /// point at a real entry without reusing a primary id.
    pub fn check_format(&self) -> PakResult<()> {
        let size = self.data.len();

        let sentinel = self.sentinel().offset();
        if sentinel != size {
            return Err(PakError::malformed(format!(
                "sentinel offset {sentinel} does not match pak size {size}"
            )));
        }

        let data_start = self.header.data_start();
        if let Some(first) = self.entries.first() {
            if first.offset() < data_start {
                return Err(PakError::malformed(format!(
                    "resource {} starts at {}, inside the index tables ending at {data_start}",
                    first.id(),
                    first.offset()
                )));
            }
        }

        if let Some(pos) = self
            .entries
            .windows(2)
            .position(|w| w[0].offset() > w[1].offset())
        {
            return Err(PakError::malformed(format!(
                "offset of entry {} goes backwards ({} > {})",
                pos + 1,
                self.entries[pos].offset(),
                self.entries[pos + 1].offset()
            )));
        }

        self.aliases.iter().try_for_each(|alias| {
            self.resolve_alias(alias)?;
            if self.entries().iter().any(|entry| entry.id() == alias.id()) {
                return Err(PakError::malformed(format!(
                    "alias {} shadows the resource with the same id",
                    alias.id()
                )));
            }
            Ok(())
        })
    }

    /// Byte range of the entry at `index`, ending where the next one starts.
    fn blob(&self, index: usize) -> PakResult<&'a [u8]> {
        let (Some(start), Some(end)) = (self.entries.get(index), self.entries.get(index + 1))
        else {
            return Err(PakError::malformed(format!("no entry at index {index}")));
        };

        self.data
            .get(start.offset()..end.offset())
            .ok_or_else(|| {
                PakError::malformed(format!(
                    "resource {} spans {}..{}, outside of the {} byte pak",
                    start.id(),
                    start.offset(),
                    end.offset(),
                    self.data.len()
                ))
            })
    }

    fn resolve_alias(&self, alias: &Alias) -> PakResult<usize> {
        let resource_count = self.header.resource_count();
        if alias.entry_index() < resource_count {
            Ok(alias.entry_index())
        } else {
            Err(PakError::InvalidAlias {
                id: alias.id(),
                entry_index: alias.entry_index.get(),
                resource_count,
            })
        }
    }

    /// Aliases win over primary entries, both are scanned linearly.
    pub fn get_resource(&self, id: u16) -> PakResult<&'a [u8]> {
        if let Some(alias) = self.aliases.iter().find(|alias| alias.id() == id) {
            return self.blob(self.resolve_alias(alias)?);
        }

        let index = self
            .entries()
            .iter()
            .position(|entry| entry.id() == id)
            .ok_or(PakError::NotFound(id))?;

        self.blob(index)
    }

    /// Physical resources in table order. Aliases are not repeated here.
    pub fn resources(&self) -> impl Iterator<Item = PakResult<(u16, &'a [u8])>> + '_ {
        self.entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| self.blob(index).map(|blob| (entry.id(), blob)))
    }

    pub fn get_all_resources(&self) -> PakResult<Vec<(u16, &'a [u8])>> {
        self.resources().collect()
    }

    /// `(alias id, id of the resource it points at)` pairs.
    pub fn alias_targets(&self) -> impl Iterator<Item = PakResult<(u16, u16)>> + '_ {
        self.aliases.iter().map(|alias| {
            self.resolve_alias(alias)
                .map(|index| (alias.id(), self.entries[index].id()))
        })
    }
}
