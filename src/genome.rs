use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Random-access source of chromosome bases.
pub trait GenomeStore {
    /// Upper-cased bases of `[start, end)`. The read stops at the end of the
    /// chromosome, so a range running past it comes back short or empty.
    fn fetch(&mut self, start: u32, end: u32) -> Result<Vec<u8>>;
}

/// File name of a chromosome's flat sequence file (`Chr7.trie`, `ChrX.trie`, ...).
pub fn chromosome_file_name(chromosome: i32) -> String {
    match chromosome {
        23 => "ChrX.trie".to_string(),
        24 => "ChrY.trie".to_string(),
        n => format!("Chr{n}.trie"),
    }
}

/// A flat sequence file where byte offset == genome coordinate.
#[derive(Debug)]
pub struct RawGenomeFile {
    path: PathBuf,
    file: File,
    len: u64,
}

impl RawGenomeFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .with_context(|| format!("open genome sequence {}", path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("stat genome sequence {}", path.display()))?
            .len();
        Ok(Self { path, file, len })
    }

    /// Open `<dir>/Chr<N>.trie`.
    pub fn open_in_dir<P: AsRef<Path>>(dir: P, chromosome: i32) -> Result<Self> {
        Self::open(dir.as_ref().join(chromosome_file_name(chromosome)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GenomeStore for RawGenomeFile {
    fn fetch(&mut self, start: u32, end: u32) -> Result<Vec<u8>> {
        if end < start {
            bail!("inverted range {}-{} in {}", start, end, self.path.display());
        }
        let end = (end as u64).min(self.len);
        if start as u64 >= end {
            return Ok(Vec::new());
        }
        self.file
            .seek(SeekFrom::Start(start as u64))
            .with_context(|| format!("seek to {} in {}", start, self.path.display()))?;
        let mut buf = vec![0u8; (end - start as u64) as usize];
        self.file
            .read_exact(&mut buf)
            .with_context(|| format!("read {}-{} from {}", start, end, self.path.display()))?;
        buf.make_ascii_uppercase();
        Ok(buf)
    }
}

/// Whole chromosome held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGenome {
    bases: Vec<u8>,
}

impl InMemoryGenome {
    pub fn new(bases: impl Into<Vec<u8>>) -> Self {
        let mut bases = bases.into();
        bases.make_ascii_uppercase();
        Self { bases }
    }
}

impl GenomeStore for InMemoryGenome {
    fn fetch(&mut self, start: u32, end: u32) -> Result<Vec<u8>> {
        if end < start {
            bail!("inverted range {}-{}", start, end);
        }
        let end = (end as usize).min(self.bases.len());
        let start = (start as usize).min(end);
        Ok(self.bases[start..end].to_vec())
    }
}
