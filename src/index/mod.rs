//! `pak_index.ini`, the editable description of an unpacked pak:
//!
//! ```ini
//! [Global]
//! version=5
//! encoding=1
//!
//! [Resources]
//! 1=1.html
//! 2=2.png
//!
//! [Alias]
//! 99=1
//! ```
//!
//! Resources are listed in archive order with paths relative to the index
//! file. Aliases map an alias id onto the id of a listed resource.
//!
//! Older pak tools wrote the same `[Alias]` section with entry indices as
//! values (`99=1` meaning "the second listed resource"). Such an index parses
//! here but resolves to different blobs unless entry index and id happen to
//! agree. Convert the values to resource ids before re-packing one.

use core::fmt::{self, Display};
use std::collections::HashSet;

use tracing::warn;

use crate::pak::{Alias, Header, PakError, PakResult};

pub const INDEX_FILE_NAME: &str = "pak_index.ini";

const GLOBAL_TAG: &str = "Global";
const RESOURCES_TAG: &str = "Resources";
const ALIAS_TAG: &str = "Alias";

/// Encoding tag used when the index does not name one.
const DEFAULT_ENCODING: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PakIndex {
    pub version: u32,
    pub encoding: u8,
    /// `(id, relative path)` in archive order.
    pub resources: Vec<(u16, String)>,
    /// `(alias id, target resource id)`.
    pub aliases: Vec<(u16, u16)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Global,
    Resources,
    Alias,
}

fn bad(line: usize, reason: impl Into<String>) -> PakError {
    PakError::BadIndex {
        line,
        reason: reason.into(),
    }
}

fn parse_number<T: core::str::FromStr>(line: usize, what: &str, value: &str) -> PakResult<T> {
    value
        .parse()
        .map_err(|_| bad(line, format!("{what} {value:?} is not a valid number")))
}

impl PakIndex {
    pub fn parse(text: &str) -> PakResult<Self> {
        let mut section = Section::None;
        let mut version = None;
        let mut encoding = DEFAULT_ENCODING;
        let mut resources = Vec::new();
        let mut aliases = Vec::new();
        let mut resource_ids = HashSet::new();
        let mut alias_ids = HashSet::new();
        let mut last_line = 0;

        for (number, line) in text.lines().enumerate() {
            let number = number + 1;
            last_line = number;
            let line = line.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = match name.trim() {
                    GLOBAL_TAG => Section::Global,
                    RESOURCES_TAG => Section::Resources,
                    ALIAS_TAG => Section::Alias,
                    other => return Err(bad(number, format!("unknown section [{other}]"))),
                };
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(bad(number, format!("expected key=value, got {line:?}")));
            };
            let (key, value) = (key.trim(), value.trim());

            match section {
                Section::None => return Err(bad(number, "entry outside of any section")),
                Section::Global => match key {
                    "version" => {
                        let parsed: u32 = parse_number(number, "version", value)?;
                        if parsed != Header::V4 && parsed != Header::V5 {
                            return Err(bad(number, format!("unsupported pak version {parsed}")));
                        }
                        version = Some(parsed);
                    }
                    "encoding" => encoding = parse_number(number, "encoding", value)?,
                    _ => warn!("Ignoring unknown key {key:?} in [{GLOBAL_TAG}] at line {number}"),
                },
                Section::Resources => {
                    let id: u16 = parse_number(number, "resource id", key)?;
                    if value.is_empty() {
                        return Err(bad(number, format!("resource {id} has no file")));
                    }
                    if !resource_ids.insert(id) {
                        return Err(bad(number, format!("duplicate resource id {id}")));
                    }
                    resources.push((id, value.to_owned()));
                }
                Section::Alias => {
                    let id: u16 = parse_number(number, "alias id", key)?;
                    let target: u16 = parse_number(number, "alias target", value)?;
                    if !alias_ids.insert(id) {
                        return Err(bad(number, format!("duplicate alias id {id}")));
                    }
                    aliases.push((number, id, target));
                }
            }
        }

        let version = version.ok_or_else(|| bad(last_line, "missing version in [Global]"))?;

        for &(number, id, target) in &aliases {
            if resource_ids.contains(&id) {
                return Err(bad(number, format!("alias id {id} is also a resource id")));
            }
            if !resource_ids.contains(&target) {
                return Err(bad(
                    number,
                    format!("alias {id} points at unknown resource {target}"),
                ));
            }
        }

        Ok(Self {
            version,
            encoding,
            resources,
            aliases: aliases.into_iter().map(|(_, id, target)| (id, target)).collect(),
        })
    }

    /// Alias table records, with targets resolved to entry indices.
    pub fn alias_table(&self) -> PakResult<Vec<Alias>> {
        self.aliases
            .iter()
            .map(|&(id, target)| {
                self.resources
                    .iter()
                    .position(|&(resource, _)| resource == target)
                    .and_then(|index| u16::try_from(index).ok())
                    .map(|index| Alias::new(id, index))
                    .ok_or_else(|| bad(0, format!("alias {id} points at unknown resource {target}")))
            })
            .collect()
    }
}

impl Display for PakIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{GLOBAL_TAG}]\r\n")?;
        write!(f, "version={}\r\n", self.version)?;
        write!(f, "encoding={}\r\n", self.encoding)?;

        write!(f, "\r\n[{RESOURCES_TAG}]\r\n")?;
        for (id, file) in &self.resources {
            write!(f, "{id}={file}\r\n")?;
        }

        if !self.aliases.is_empty() {
            write!(f, "\r\n[{ALIAS_TAG}]\r\n")?;
            for (id, target) in &self.aliases {
                write!(f, "{id}={target}\r\n")?;
            }
        }

        Ok(())
    }
}
