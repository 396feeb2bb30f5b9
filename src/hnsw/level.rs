//! Level assignment.
//!
//! Draws a node's top layer with a geometric distribution: `level` starts
//! at 0 and is incremented for as long as a fresh uniform draw lands below
//! `level_multiplier`, capped at `max_layers - 1`. This is the reference
//! engine's actual behavior, reproduced here for compatibility with its
//! worked examples; the more common textbook formula is
//! `floor(-ln(u) * m_l)`, which an implementer preferring the canonical
//! level distribution could substitute without changing any other
//! component's contract.

use rand::Rng;

/// Draws a new node's top layer using `rng`.
pub fn assign_level<R: Rng + ?Sized>(rng: &mut R, level_multiplier: f32, max_layers: u32) -> u32 {
    let cap = max_layers.saturating_sub(1);
    let mut level = 0u32;
    while level < cap {
        let u: f32 = rng.gen();
        if u < level_multiplier {
            level += 1;
        } else {
            break;
        }
    }
    level
}
