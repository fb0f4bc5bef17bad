//! Depth colors for graph nodes

/// Fixed node palette, already quoted for use as a DOT attribute value.
pub const PALETTE: [&str; 7] = [
    "\"red\"",
    "\"blue\"",
    "\"green\"",
    "\"yellow\"",
    "\"orange\"",
    "\"purple\"",
    "\"brown\"",
];

/// Quoted color for `index`, wrapping around the palette.
pub fn color_for(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}
