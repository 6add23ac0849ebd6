use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{
    index::{PakIndex, INDEX_FILE_NAME},
    pak::{PakArchive, PakError, PakResult},
    sniff::sniff_extension,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackReport {
    pub resource_count: usize,
    pub alias_count: usize,
    pub index_path: PathBuf,
}

/// Extracts every physical resource of the pak in `data` into `output` as
/// `<id><sniffed extension>` and writes a [INDEX_FILE_NAME] next to them.
///
/// The format is checked before anything is written. Extraction itself is
/// not transactional: on a write error the files written so far stay behind.
pub fn unpack(data: &[u8], output: impl AsRef<Path>) -> PakResult<UnpackReport> {
    let output = output.as_ref();
    let archive = PakArchive::parse(data)?;
    archive.check_format()?;

    std::fs::create_dir_all(output).map_err(PakError::io(output))?;

    let header = archive.header();
    let mut index = PakIndex {
        version: header.version(),
        encoding: header.encoding,
        resources: Vec::with_capacity(header.resource_count()),
        aliases: Vec::with_capacity(header.alias_count()),
    };

    for resource in archive.resources() {
        let (id, blob) = resource?;
        let file_name = format!("{id}{}", sniff_extension(blob));
        let path = output.join(&file_name);

        std::fs::write(&path, blob).map_err(PakError::io(&path))?;
        debug!("Extracted resource {id} to {} ({} bytes)", path.display(), blob.len());

        index.resources.push((id, file_name));
    }

    index.aliases = archive.alias_targets().collect::<PakResult<_>>()?;

    let index_path = output.join(INDEX_FILE_NAME);
    std::fs::write(&index_path, index.to_string()).map_err(PakError::io(&index_path))?;

    info!(
        "Unpacked {} resources and {} aliases (version {}, encoding {}) to {}",
        index.resources.len(),
        index.aliases.len(),
        index.version,
        index.encoding,
        output.display()
    );

    Ok(UnpackReport {
        resource_count: index.resources.len(),
        alias_count: index.aliases.len(),
        index_path,
    })
}

pub fn unpack_file(pak_path: impl AsRef<Path>, output: impl AsRef<Path>) -> PakResult<UnpackReport> {
    let pak_path = pak_path.as_ref();
    let data = std::fs::read(pak_path).map_err(PakError::io(pak_path))?;

    unpack(&data, output)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        index::PakIndex,
        pack::{pack, pack_index, Resource},
        pak::Alias,
    };

    const HTML: &[u8] = b"<!doctype html>\n<html></html>";

    fn png() -> Vec<u8> {
        let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
        data.extend_from_slice(&[0; 10]);
        data
    }

    #[test]
    fn sniffed_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let resources = [
            Resource { id: 1, data: HTML.to_vec() },
            Resource { id: 2, data: png() },
        ];
        let buffer = pack(5, 1, &resources, &[]).unwrap();

        let report = unpack(&buffer, dir.path()).unwrap();

        assert_eq!(report.resource_count, 2);
        assert_eq!(report.alias_count, 0);
        assert_eq!(std::fs::read(dir.path().join("1.html")).unwrap(), HTML);
        assert_eq!(std::fs::read(dir.path().join("2.png")).unwrap(), png());
    }

    #[test]
    fn alias_is_indexed_not_extracted() {
        let dir = tempfile::tempdir().unwrap();
        let resources = [Resource { id: 10, data: b"shared bytes".to_vec() }];
        let buffer = pack(5, 1, &resources, &[Alias::new(99, 0)]).unwrap();

        let archive = PakArchive::parse(&buffer).unwrap();
        assert_eq!(archive.get_resource(10).unwrap(), b"shared bytes");
        assert_eq!(archive.get_resource(99).unwrap(), b"shared bytes");

        let report = unpack(&buffer, dir.path()).unwrap();
        assert_eq!(report.resource_count, 1);
        assert_eq!(report.alias_count, 1);

        let mut files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        files.sort();
        assert_eq!(files, vec!["10", INDEX_FILE_NAME]);

        let index = std::fs::read_to_string(&report.index_path).unwrap();
        assert_eq!(
            PakIndex::parse(&index).unwrap(),
            PakIndex {
                version: 5,
                encoding: 1,
                resources: vec![(10, "10".into())],
                aliases: vec![(99, 10)],
            }
        );
    }

    #[test]
    fn empty_pak_extracts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("out");
        let buffer = pack(4, 1, &[], &[]).unwrap();

        let report = unpack(&buffer, &output).unwrap();

        assert_eq!(report.resource_count, 0);
        assert_eq!(std::fs::read_dir(&output).unwrap().count(), 1);
        assert!(report.index_path.exists());
    }

    #[test]
    fn malformed_pak_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let mut buffer = pack(5, 1, &[Resource { id: 1, data: HTML.to_vec() }], &[]).unwrap();
        buffer.pop();

        assert!(matches!(
            unpack(&buffer, &output),
            Err(PakError::MalformedArchive(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn repack_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let resources = [
            Resource { id: 40, data: b"/* css */".to_vec() },
            Resource { id: 3, data: png() },
            Resource { id: 17, data: b"no magic here".to_vec() },
            Resource { id: 18, data: Vec::new() },
        ];

        for (version, aliases) in [(4, vec![]), (5, vec![Alias::new(500, 2), Alias::new(501, 0)])] {
            let output = dir.path().join(format!("v{version}"));
            let original = pack(version, 2, &resources, &aliases).unwrap();

            let report = unpack(&original, &output).unwrap();
            let repacked = pack_index(&report.index_path).unwrap();

            assert_eq!(repacked, original);
        }
    }

    #[test]
    fn unpack_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let pak_path = dir.path().join("resources.pak");
        std::fs::write(&pak_path, pack(5, 1, &[Resource { id: 5, data: png() }], &[]).unwrap())
            .unwrap();

        let report = unpack_file(&pak_path, dir.path().join("out")).unwrap();
        assert_eq!(report.resource_count, 1);
        assert!(dir.path().join("out").join("5.png").exists());

        assert!(matches!(
            unpack_file(dir.path().join("missing.pak"), dir.path()),
            Err(PakError::Io { .. })
        ));
    }
}
