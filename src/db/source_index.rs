use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::types::SourceId;

const MAGIC: &[u8; 4] = b"EGX1";
const VERSION_STR: &str = env!("CARGO_PKG_VERSION");

/// Byte offsets of the alignment records that mention each source ID.
///
/// Lets a caller jump straight back to the sim4 records of a cDNA that
/// contributed to some gene.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceIndex {
    offsets: BTreeMap<SourceId, Vec<u64>>,
}

impl SourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: SourceId, offset: u64) {
        self.offsets.entry(id).or_default().push(offset);
    }

    pub fn offsets(&self, id: SourceId) -> &[u64] {
        self.offsets.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct source IDs.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &[u64])> + '_ {
        self.offsets.iter().map(|(&id, v)| (id, v.as_slice()))
    }

    /// Write a tab-separated listing: `<id>\t<offset>,<offset>,...`.
    pub fn write_text<W: Write>(&self, mut out: W) -> Result<()> {
        for (id, offsets) in self.iter() {
            let joined: Vec<String> = offsets.iter().map(u64::to_string).collect();
            writeln!(out, "{}\t{}", id, joined.join(","))?;
        }
        Ok(())
    }

    /// Write the tab-separated listing to `path`.
    pub fn save_text(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut f = BufWriter::new(
            File::create(path).with_context(|| format!("create {}", path.display()))?,
        );
        self.write_text(&mut f)?;
        f.flush()?;
        Ok(())
    }

    /// Serialize with a small header (magic + crate version) and a bincode payload.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut f = BufWriter::new(
            File::create(path).with_context(|| format!("create {}", path.display()))?,
        );

        f.write_all(MAGIC)?;

        let v = VERSION_STR.as_bytes();
        let len = v.len() as u16;
        f.write_all(&len.to_le_bytes())?;
        f.write_all(v)?;

        let payload = bincode::serialize(self)?;
        f.write_all(&payload)?;
        f.flush()?;

        Ok(())
    }

    /// Load an index written by `save()`. Rejects wrong file types and version mismatches.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;

        let mut magic = [0u8; 4];
        f.read_exact(&mut magic)?;
        if &magic != MAGIC {
            bail!("Not a source index file (bad magic): {}", path.display());
        }

        let mut len_buf = [0u8; 2];
        f.read_exact(&mut len_buf)?;
        let len = u16::from_le_bytes(len_buf) as usize;

        let mut ver_buf = vec![0u8; len];
        f.read_exact(&mut ver_buf)?;
        let file_version = std::str::from_utf8(&ver_buf)?;

        if file_version != VERSION_STR {
            bail!(
                "Source index version mismatch: file={}, binary={}",
                file_version,
                VERSION_STR
            );
        }

        let mut payload = Vec::new();
        f.read_to_end(&mut payload)?;
        let idx: Self = bincode::deserialize(&payload)?;

        Ok(idx)
    }
}

impl fmt::Display for SourceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let records: usize = self.offsets.values().map(Vec::len).sum();
        write!(
            f,
            "SourceIndex: {} source ids, {} record offsets",
            self.offsets.len(),
            records
        )
    }
}
