//! Splitting of signing requests into device-sized chunks.
//!
//! A signing request does not fit a single APDU, so it is sent as a sequence
//! of chunks. The first chunk always carries the encoded derivation path on
//! its own; the following chunks carry
//! `[len(context)][context][transaction]` split into pieces of at most the
//! configured chunk size.
//!
//! ```text
//! | Init: path | Add: data[0..n] | Add: data[n..2n] | Last: data[2n..] |
//! ```

use crate::error::{Error, Result};

/// Largest context that fits the single-byte length prefix.
pub const MAX_CONTEXT_LEN: usize = u8::MAX as usize;

/// Position of a chunk within a signing request.
///
/// The discriminant is the `P1` value sent with the chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChunkKind {
    /// First chunk of the request.
    Init = 0,

    /// Any chunk between the first and the last.
    Add = 1,

    /// Final chunk; the device answers it with the signature.
    Last = 2,
}

impl ChunkKind {
    /// Returns the `P1` byte for this chunk kind.
    #[must_use]
    pub const fn p1(self) -> u8 {
        self as u8
    }

    /// Returns the kind of the chunk at `index` in a sequence of `count`.
    ///
    /// The first position wins over the last, so a lone chunk is `Init`.
    #[must_use]
    pub const fn at(index: usize, count: usize) -> Self {
        if index == 0 {
            Self::Init
        } else if index + 1 == count {
            Self::Last
        } else {
            Self::Add
        }
    }
}

/// A tagged piece of a signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    kind: ChunkKind,
    data: Vec<u8>,
}

impl Chunk {
    /// Returns the chunk's position tag.
    #[must_use]
    pub const fn kind(&self) -> ChunkKind {
        self.kind
    }

    /// Returns the chunk payload.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the payload length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the chunk carries no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Splits a signing request into tagged chunks.
///
/// # Errors
///
/// - [`Error::PayloadTooLarge`] if `context` is longer than 255 bytes
/// - [`Error::InvalidConfig`] if `max_chunk_size` is zero or above 255
pub fn prepare_chunks(
    path_bytes: &[u8],
    context: &[u8],
    payload: &[u8],
    max_chunk_size: usize,
) -> Result<Vec<Chunk>> {
    let context_len = u8::try_from(context.len()).map_err(|_| Error::PayloadTooLarge {
        len: context.len(),
        max: MAX_CONTEXT_LEN,
    })?;
    if max_chunk_size == 0 || max_chunk_size > usize::from(u8::MAX) {
        return Err(Error::InvalidConfig(format!(
            "chunk size must be between 1 and 255, got {max_chunk_size}"
        )));
    }

    let mut body = Vec::with_capacity(1 + context.len() + payload.len());
    body.push(context_len);
    body.extend_from_slice(context);
    body.extend_from_slice(payload);

    let mut pieces: Vec<&[u8]> = Vec::with_capacity(1 + body.len().div_ceil(max_chunk_size));
    pieces.push(path_bytes);
    pieces.extend(body.chunks(max_chunk_size));

    let count = pieces.len();
    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(i, data)| Chunk {
            kind: ChunkKind::at(i, count),
            data: data.to_vec(),
        })
        .collect())
}
