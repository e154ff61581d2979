// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Export of normalized samples as bit streams for external test suites.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use tracing::info;

use crate::error::{Error, Result};
use crate::registry::Algorithm;
use crate::rngs::Entropy;
use crate::sequence::{NormalizedSequence, SequenceRequest};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BitEncoding {
    /// One ASCII '0' or '1' per sample.
    AsciiBits,
    /// Eight samples per byte, most significant bit first, last byte zero padded.
    Packed,
}

/// A sample is a one bit iff it rounds up, 0.5 itself rounds to even.
fn bit(v: f64) -> bool {
    v > 0.5
}

/// Returns the number of bytes written.
pub fn write_ascii_bits(sample: &[f64], out: &mut impl Write) -> io::Result<usize> {
    let text: Vec<u8> = sample
        .iter()
        .map(|&v| if bit(v) { b'1' } else { b'0' })
        .collect();
    out.write_all(&text)?;
    Ok(text.len())
}

/// Returns the number of bytes written.
pub fn write_packed_bits(sample: &[f64], out: &mut impl Write) -> io::Result<usize> {
    let bytes: Vec<u8> = sample
        .chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .filter(|&(_, &v)| bit(v))
                .fold(0u8, |byte, (i, _)| byte | (0x80 >> i))
        })
        .collect();
    out.write_all(&bytes)?;
    Ok(bytes.len())
}

pub fn write_bits(
    sample: &[f64],
    encoding: BitEncoding,
    out: &mut impl Write,
) -> io::Result<usize> {
    match encoding {
        BitEncoding::AsciiBits => write_ascii_bits(sample, out),
        BitEncoding::Packed => write_packed_bits(sample, out),
    }
}

pub fn export_to_file(
    sample: &NormalizedSequence,
    encoding: BitEncoding,
    path: &Path,
) -> io::Result<usize> {
    let mut out = BufWriter::new(File::create(path)?);
    let written = write_bits(sample.as_slice(), encoding, &mut out)?;
    out.flush()?;
    Ok(written)
}

/// Generate one sample with a seeded generator and export it to `path`.
pub fn export_generated(
    algorithm: Algorithm,
    request: &SequenceRequest,
    seed: u64,
    encoding: BitEncoding,
    path: &Path,
) -> Result<usize> {
    let sample = algorithm
        .instantiate(seed, Entropy::seeded(seed))
        .generate(request)?
        .normalize();
    let written = export_to_file(&sample, encoding, path).map_err(|source| Error::Persist {
        generator: algorithm.name().to_owned(),
        m: request.m(),
        source,
    })?;
    info!(
        generator = %algorithm,
        m = request.m(),
        bytes = written,
        path = %path.display(),
        "exported sample"
    );
    Ok(written)
}
