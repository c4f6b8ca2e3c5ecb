/// Palette cycled through by the timeline; an application keeps its color for
/// as long as its name is stable.
const SEGMENT_PALETTE: [&str; 8] = [
    "#4a6fff", "#ff5e5e", "#50C878", "#FFD700", "#9370DB", "#FF8C00", "#20B2AA", "#FF69B4",
];

/// Deterministic name-to-color mapping. Same name, same color; the hash
/// itself is an implementation detail.
pub fn application_color(application_name: &str) -> &'static str {
    let mut hash: i32 = 0;
    for unit in application_name.encode_utf16() {
        hash = (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    SEGMENT_PALETTE[hash.unsigned_abs() as usize % SEGMENT_PALETTE.len()]
}
