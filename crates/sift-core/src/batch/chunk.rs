//! Word-list loading, resume-point calculation and chunk planning.

use std::path::Path;

use super::types::WordChunk;
use crate::error::BatchError;

/// Read a newline-delimited word list, trimming lines and dropping blanks.
pub fn load_words(path: &Path) -> Result<Vec<String>, BatchError> {
    let content = std::fs::read_to_string(path).map_err(|source| BatchError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Offset to resume from given the offsets already on disk.
///
/// Zero when nothing has been written; otherwise one chunk past the
/// highest existing offset. Gaps below that point are not revisited.
pub fn resume_offset(existing: &[usize], chunk_size: usize) -> usize {
    existing
        .iter()
        .max()
        .map(|&max| max + chunk_size)
        .unwrap_or(0)
}

/// Chunk boundaries below `resume` that have no file on disk.
pub fn missing_offsets(existing: &[usize], chunk_size: usize, resume: usize) -> Vec<usize> {
    if chunk_size == 0 {
        return Vec::new();
    }
    (0..resume)
        .step_by(chunk_size)
        .filter(|offset| !existing.contains(offset))
        .collect()
}

/// Split `words[start..]` into contiguous chunks of at most `chunk_size`.
pub fn plan_chunks(words: &[String], chunk_size: usize, start: usize) -> Vec<WordChunk> {
    if chunk_size == 0 || start >= words.len() {
        return Vec::new();
    }

    words[start..]
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, slice)| WordChunk {
            offset: start + i * chunk_size,
            words: slice.to_vec(),
        })
        .collect()
}
