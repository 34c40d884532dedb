//! Distinct-color allocation for joining players.
//!
//! `examples/original_source/src/color.h` declares `color_distinct(index)`
//! and `color_equal`, but its body is in `src/color.c`, which was not part
//! of the retrieved pack. This module is a from-scratch but behaviorally
//! equivalent stand-in: a fixed palette, indexed by "lowest index not
//! currently held," cycling once every entry is taken (Open Question
//! resolution, see DESIGN.md).

/// A small palette of perceptually distinct colors. 16 entries comfortably
/// covers realistic player counts; past that the allocator cycles.
const PALETTE: [(u8, u8, u8); 16] = [
    (230, 25, 75),
    (60, 180, 75),
    (255, 225, 25),
    (0, 130, 200),
    (245, 130, 48),
    (145, 30, 180),
    (70, 240, 240),
    (240, 50, 230),
    (210, 245, 60),
    (250, 190, 212),
    (0, 128, 128),
    (220, 190, 255),
    (170, 110, 40),
    (255, 250, 200),
    (128, 0, 0),
    (170, 255, 195),
];

/// Returns the palette entry at `index`, cycling past the end.
pub fn color_distinct(index: usize) -> (u8, u8, u8) {
    PALETTE[index % PALETTE.len()]
}

/// Returns the lowest-index palette color not present in `held`.
pub fn next_unused_color(held: impl Iterator<Item = (u8, u8, u8)>) -> (u8, u8, u8) {
    let held: Vec<(u8, u8, u8)> = held.collect();
    let mut i = 0;
    loop {
        let candidate = color_distinct(i);
        if !held.contains(&candidate) {
            return candidate;
        }
        i += 1;
        if i > PALETTE.len() * 4 {
            // Palette is fully held many times over; cycle rather than loop
            // forever (the distilled spec explicitly permits this).
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_lowest_free_index() {
        let held = vec![color_distinct(0), color_distinct(1)];
        assert_eq!(next_unused_color(held.into_iter()), color_distinct(2));
    }

    #[test]
    fn cycles_once_palette_is_exhausted() {
        let held: Vec<(u8, u8, u8)> = (0..PALETTE.len()).map(color_distinct).collect();
        // every color taken; allocator must still return some palette entry
        let allocated = next_unused_color(held.into_iter());
        assert!(PALETTE.contains(&allocated));
    }
}
