//! Star rating for a solved level.

/// Stars awarded for solving a level with `moves` top-level instructions.
///
/// Three at or under the optimal count, then one star less for each extra
/// move, down to zero beyond `optimal + 2`.
pub fn stars(moves: usize, optimal: u32) -> u8 {
    let optimal = optimal as usize;
    if moves <= optimal {
        3
    } else if moves <= optimal + 1 {
        2
    } else if moves <= optimal + 2 {
        1
    } else {
        0
    }
}
