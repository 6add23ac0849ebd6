use std::path::Path;

use tap::Pipe;
use tracing::{debug, info, warn};

use crate::{
    index::PakIndex,
    pak::{write_aliases, write_entries, Alias, Entry, Header, PakError, PakResult},
};

/// One physical resource to be packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: u16,
    pub data: Vec<u8>,
}

/// Builds a complete pak in one exactly sized buffer.
///
/// Resources are laid out in the given order. `aliases` index into
/// `resources` and are only stored for v5; for v4 they are dropped.
pub fn pack(
    version: u32,
    encoding: u8,
    resources: &[Resource],
    aliases: &[Alias],
) -> PakResult<Vec<u8>> {
    let aliases: &[Alias] = if version == Header::V4 && !aliases.is_empty() {
        warn!(
            "Pak version {version} has no alias table, dropping {} aliases",
            aliases.len()
        );
        &[]
    } else {
        aliases
    };

    let header = Header::new(version, encoding, resources.len(), aliases.len())?;

    if let Some(alias) = aliases.iter().find(|a| a.entry_index() >= resources.len()) {
        return Err(PakError::InvalidAlias {
            id: alias.id(),
            entry_index: alias.entry_index.get(),
            resource_count: resources.len(),
        });
    }

    if let Some(alias) = aliases
        .iter()
        .find(|a| resources.iter().any(|r| r.id == a.id()))
    {
        return Err(PakError::AliasShadowsResource(alias.id()));
    }

    let data_start = header.data_start();
    let total = resources
        .iter()
        .fold(data_start as u64, |acc, r| acc + r.data.len() as u64);
    // the sentinel offset has to fit as well
    if total > u32::MAX as u64 {
        return Err(PakError::ArchiveTooLarge { size: total });
    }
    let total = total as usize;

    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(total)
        .map_err(|_| PakError::OutOfMemory { bytes: total })?;
    buffer.resize(total, 0);

    let mut entries = Vec::new();
    entries
        .try_reserve_exact(resources.len() + 1)
        .map_err(|_| PakError::OutOfMemory {
            bytes: (resources.len() + 1) * Entry::SIZE,
        })?;

    let mut offset = data_start;
    for resource in resources {
        let end = offset + resource.data.len();
        buffer[offset..end].copy_from_slice(&resource.data);
        entries.push(Entry::new(resource.id, offset as u32));
        debug!(
            "Packed resource {} at {offset} ({} bytes)",
            resource.id,
            resource.data.len()
        );
        offset = end;
    }
    entries.push(Entry::new(0, offset as u32));

    let written = header.write(&mut buffer)?;
    let written = written + write_entries(&entries, &mut buffer[written..])?;
    write_aliases(&header, aliases, &mut buffer[written..])?;

    info!(
        "Packed {} resources and {} aliases (version {}, encoding {}), {} bytes",
        header.resource_count(),
        header.alias_count(),
        header.version(),
        header.encoding,
        buffer.len()
    );

    Ok(buffer)
}

/// Packs the resources described by the index file at `index_path`.
/// Resource paths are resolved against the directory of the index.
pub fn pack_index(index_path: impl AsRef<Path>) -> PakResult<Vec<u8>> {
    let index_path = index_path.as_ref();
    let index = std::fs::read_to_string(index_path)
        .map_err(PakError::io(index_path))?
        .pipe_deref(PakIndex::parse)?;

    let base = index_path.parent().unwrap_or(Path::new(""));
    let resources = index
        .resources
        .iter()
        .map(|(id, file)| {
            let path = base.join(file);
            std::fs::read(&path)
                .map(|data| Resource { id: *id, data })
                .map_err(PakError::io(path))
        })
        .collect::<PakResult<Vec<_>>>()?;

    pack(index.version, index.encoding, &resources, &index.alias_table()?)
}
