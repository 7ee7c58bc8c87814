/// Viewer identifier -> layout seed.
///
/// Rolling `hash * 31 + unit` over UTF-16 code units with 32-bit signed
/// wraparound, then the absolute value. Collisions are harmless: the seed only
/// picks which jitter a viewer sees.
pub fn hash_identifier(id: &str) -> u32 {
    let hash = id
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32));
    hash.unsigned_abs()
}

/// Seed for a viewer; anonymous viewers share `fallback`.
pub fn viewer_seed(viewer: Option<&str>, fallback: u32) -> u32 {
    match viewer {
        Some(id) if !id.is_empty() => hash_identifier(id),
        _ => fallback,
    }
}
