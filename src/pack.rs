use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

/// Pack entry name the stage manifest must be stored under.
pub const STAGE_ENTRY: &str = "stage.xml";

const MAGIC: &[u8; 4] = b"LGP1";
const HEADER_LEN: usize = 16;

/// File entry from the pack table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackFileEntry {
    pub name: String,
    pub offset: u64,
    pub size: u64,
}

/// In-memory representation of a `.lgpack` game pack: a 16-byte header
/// (magic, version, TOC offset), raw blobs, then a little-endian TOC. The
/// stage manifest travels as an ordinary entry named [`STAGE_ENTRY`].
#[derive(Debug, Clone)]
pub struct GamePack {
    data: Vec<u8>,
    version: u32,
    files: Vec<PackFileEntry>,
    stage_xml: String,
}

impl GamePack {
    /// Opens a pack from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file =
            File::open(path).with_context(|| format!("unable to open {}", path.display()))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .context("unable to read pack into memory")?;
        Self::from_bytes(data)
    }

    /// Creates a pack from bytes already resident in memory, the path the
    /// wasm build takes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let (version, files) = parse_metadata(&data)?;
        let stage_entry = files
            .iter()
            .find(|entry| entry.name == STAGE_ENTRY)
            .ok_or_else(|| anyhow!("pack has no {STAGE_ENTRY} entry"))?
            .clone();
        let stage_bytes = slice_entry(&data, &stage_entry)?;
        let stage_xml = String::from_utf8(stage_bytes.to_vec())
            .map_err(|err| anyhow!("stage manifest is not valid UTF-8: {err}"))?;
        Ok(Self {
            data,
            version,
            files,
            stage_xml,
        })
    }

    /// Returns the format version stored in the pack header.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns the raw stage manifest XML.
    pub fn stage_xml(&self) -> &str {
        &self.stage_xml
    }

    /// Returns the list of bundled files.
    pub fn files(&self) -> &[PackFileEntry] {
        &self.files
    }

    /// Looks up a file entry by name.
    pub fn file(&self, name: &str) -> Option<&PackFileEntry> {
        self.files.iter().find(|entry| entry.name == name)
    }

    /// Extracts the raw bytes for the provided entry name.
    pub fn extract_file(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .file(name)
            .ok_or_else(|| anyhow!("file not found in pack: {name}"))?;
        Ok(slice_entry(&self.data, entry)?.to_vec())
    }
}

fn slice_entry<'a>(data: &'a [u8], entry: &PackFileEntry) -> Result<&'a [u8]> {
    let start = entry.offset as usize;
    let end = start
        .checked_add(entry.size as usize)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| {
            anyhow!(
                "entry {} extends past pack bounds (offset={}, size={}, len={})",
                entry.name,
                entry.offset,
                entry.size,
                data.len()
            )
        })?;
    Ok(&data[start..end])
}

fn parse_metadata(data: &[u8]) -> Result<(u32, Vec<PackFileEntry>)> {
    if data.len() < HEADER_LEN {
        return Err(anyhow!(
            "pack too small to contain header (len={})",
            data.len()
        ));
    }
    if &data[..4] != MAGIC {
        return Err(anyhow!(
            "invalid pack magic: expected LGP1, found {:?}",
            &data[..4]
        ));
    }

    let version = u32::from_le_bytes(data[4..8].try_into().expect("slice length verified"));
    let toc_offset = u64::from_le_bytes(data[8..16].try_into().expect("slice length verified"));
    let toc_start = usize::try_from(toc_offset)
        .ok()
        .filter(|start| (HEADER_LEN..data.len()).contains(start))
        .ok_or_else(|| anyhow!("pack TOC offset {toc_offset} is outside file bounds"))?;

    let mut cursor = toc_start;
    let count = read_u32(data, &mut cursor)?;
    let mut files = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_len = read_u32(data, &mut cursor)? as usize;
        let name_end = cursor
            .checked_add(name_len)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| anyhow!("pack entry name extends past file bounds"))?;
        let name = String::from_utf8(data[cursor..name_end].to_vec())
            .map_err(|err| anyhow!("invalid UTF-8 in entry name: {err}"))?;
        cursor = name_end;

        let offset = read_u64(data, &mut cursor)?;
        let size = read_u64(data, &mut cursor)?;
        if offset
            .checked_add(size)
            .filter(|end| *end <= data.len() as u64)
            .is_none()
        {
            return Err(anyhow!(
                "entry {name} points outside pack bounds (offset={offset}, size={size})"
            ));
        }
        files.push(PackFileEntry { name, offset, size });
    }

    Ok((version, files))
}

fn read_u32(data: &[u8], cursor: &mut usize) -> Result<u32> {
    let end = cursor
        .checked_add(4)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| anyhow!("unexpected end of pack while reading 32-bit value"))?;
    let value = u32::from_le_bytes(data[*cursor..end].try_into().expect("length verified"));
    *cursor = end;
    Ok(value)
}

fn read_u64(data: &[u8], cursor: &mut usize) -> Result<u64> {
    let end = cursor
        .checked_add(8)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| anyhow!("unexpected end of pack while reading 64-bit value"))?;
    let value = u64::from_le_bytes(data[*cursor..end].try_into().expect("length verified"));
    *cursor = end;
    Ok(value)
}

/// Writer counterpart used by the authoring tools and the test fixtures.
#[derive(Debug, Default)]
pub struct PackBuilder {
    files: Vec<(String, Vec<u8>)>,
}

impl PackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage_xml(self, xml: &str) -> Self {
        self.file(STAGE_ENTRY, xml.as_bytes())
    }

    pub fn file(mut self, name: &str, bytes: &[u8]) -> Self {
        self.files.push((name.to_string(), bytes.to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(MAGIC);
        buffer.extend_from_slice(&1u32.to_le_bytes());
        buffer.extend_from_slice(&0u64.to_le_bytes()); // TOC offset placeholder

        let mut entries = Vec::with_capacity(self.files.len());
        for (name, bytes) in &self.files {
            entries.push((name.clone(), buffer.len() as u64, bytes.len() as u64));
            buffer.extend_from_slice(bytes);
        }

        let toc_offset = buffer.len() as u64;
        buffer.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        for (name, offset, size) in &entries {
            buffer.extend_from_slice(&(name.len() as u32).to_le_bytes());
            buffer.extend_from_slice(name.as_bytes());
            buffer.extend_from_slice(&offset.to_le_bytes());
            buffer.extend_from_slice(&size.to_le_bytes());
        }
        buffer[8..16].copy_from_slice(&toc_offset.to_le_bytes());
        buffer
    }
}
