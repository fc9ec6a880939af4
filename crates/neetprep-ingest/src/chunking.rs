//! Fixed-window text chunking.

/// Characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 800;
/// Characters shared by consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Split `text` into windows of `size` characters, each starting
/// `size - overlap` characters after the previous one. The last window may
/// be shorter. Empty text yields no chunks.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let size = size.max(1);
    let step = size.saturating_sub(overlap).max(1);

    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let end = (i + size).min(chars.len());
        out.push(chars[i..end].iter().collect());
        i += step;
    }
    out
}
