//! Fixed-width Latin-1 text fields
//!
//! Names and the header comment are stored as single-byte Latin-1 text
//! padded to a fixed width. Each byte maps to the Unicode scalar of the
//! same value, so decoding never fails and encoding is exact for any string
//! whose characters are all below U+0100.

/// Decode a padded field, stripping trailing padding and NUL bytes
pub fn decode_padded(raw: &[u8], padding: u8) -> String {
    let end = raw
        .iter()
        .rposition(|&b| b != padding && b != 0)
        .map_or(0, |pos| pos + 1);
    raw[..end].iter().map(|&b| char::from(b)).collect()
}

/// Encode a string into a padded field
///
/// Characters outside Latin-1 become `?` and excess characters are dropped.
/// Callers validate with [`fits`] first when loss is not acceptable.
pub fn encode_padded<const N: usize>(text: &str, padding: u8) -> [u8; N] {
    let mut out = [padding; N];
    for (slot, c) in out.iter_mut().zip(text.chars()) {
        *slot = u8::try_from(u32::from(c)).unwrap_or(b'?');
    }
    out
}

/// Check that a string encodes losslessly into `width` bytes
pub fn fits(text: &str, width: usize) -> bool {
    text.chars().count() <= width && text.chars().all(|c| u32::from(c) <= 0xFF)
}
