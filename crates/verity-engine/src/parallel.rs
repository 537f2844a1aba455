//! Per-item fan-out for intra-iteration updates.
//!
//! Every item reads only the previous snapshot and produces its own slot of
//! the next one, so the result is identical with or without rayon: `collect`
//! keeps input order, and each closure sums in a fixed order.

use rayon::prelude::*;

pub(crate) fn map_range<T, F>(len: usize, parallel: bool, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if parallel {
        (0..len).into_par_iter().map(f).collect()
    } else {
        (0..len).map(f).collect()
    }
}
