//! Nucleotide helpers: complementing, codon translation and stop-run pruning.
//!
//! Sequences are upper-case ASCII. Stop codons translate to `X`; codons that
//! contain anything other than `ACGT` produce no residue at all.

use std::sync::LazyLock;

/// Residue written for a stop codon.
pub const STOP: u8 = b'X';

static COMPLEMENT: LazyLock<[u8; 256]> = LazyLock::new(|| {
    let mut comp = [0u8; 256];
    comp.iter_mut().enumerate().for_each(|(v, a)| {
        *a = v as u8;
    });
    b"ACGT".iter().zip(b"TGCA".iter()).for_each(|(&a, &b)| {
        comp[a as usize] = b;
        comp[a as usize + 32] = b + 32;
    });
    comp
});

static BASE_INDEX: LazyLock<[u8; 256]> = LazyLock::new(|| {
    let mut map = [255u8; 256];
    map[b'A' as usize] = 0;
    map[b'C' as usize] = 1;
    map[b'G' as usize] = 2;
    map[b'T' as usize] = 3;
    map
});

// Indexed by (b1 << 4) | (b2 << 2) | b3 with A=0, C=1, G=2, T=3.
const CODON_TABLE: [u8; 64] = *b"KNKNTTTTRSRSIIMIQHQHPPPPRRRRLLLLEDEDAAAAGGGGVVVVXYXYSSSSXCWCLFLF";

#[inline]
pub fn complement(base: u8) -> u8 {
    COMPLEMENT[base as usize]
}

pub fn reverse_complement(dna: &[u8]) -> Vec<u8> {
    dna.iter().rev().map(|&b| complement(b)).collect()
}

/// Translate one codon; None if it holds a non-ACGT base or is not 3 long.
pub fn codon_to_amino_acid(codon: &[u8]) -> Option<u8> {
    if codon.len() != 3 {
        return None;
    }
    let i1 = BASE_INDEX[codon[0] as usize];
    let i2 = BASE_INDEX[codon[1] as usize];
    let i3 = BASE_INDEX[codon[2] as usize];
    if i1 < 4 && i2 < 4 && i3 < 4 {
        let idx = ((i1 as usize) << 4) | ((i2 as usize) << 2) | (i3 as usize);
        Some(CODON_TABLE[idx])
    } else {
        None
    }
}

/// Translate every complete codon from the start of `dna`.
pub fn translate(dna: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(dna.len() / 3);
    for codon in dna.chunks_exact(3) {
        if let Some(aa) = codon_to_amino_acid(codon) {
            out.push(aa);
        }
    }
    out
}

/// Drop short stretches between stop codons.
///
/// Walking from the first stop, each following stop that lies within
/// `min_orf_len` residues of the current one causes everything from the
/// current stop up to (not including) the next one to be cut. A longer gap
/// is a plausible open reading frame and is kept.
pub fn prune_stop_runs(sequence: &[u8], min_orf_len: usize) -> Vec<u8> {
    let mut seq = sequence.to_vec();
    let Some(mut current) = seq.iter().position(|&aa| aa == STOP) else {
        return seq;
    };
    while let Some(offset) = seq[current + 1..].iter().position(|&aa| aa == STOP) {
        let next = current + 1 + offset;
        if next > current + min_orf_len {
            current = next;
        } else {
            seq.drain(current..next);
        }
    }
    seq
}
