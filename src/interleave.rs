//! Positional placement of dateless items among sorted dated ones.
//!
//! The dated sequence is walked in windows of `window` items. Before each
//! window, one item is taken from each dateless supply that still has one
//! (round-robin, in supply order). The walk ends with the last dated window;
//! whatever remains in the supplies is not emitted. An empty dated sequence
//! counts as a single empty window, so a feed made only of dateless sources
//! still shows one item from each.

use std::collections::VecDeque;

/// Interleave `dateless` supplies into `dated` every `window` items.
///
/// A `window` of zero is treated as one.
pub fn interleave<T>(dated: Vec<T>, dateless: Vec<Vec<T>>, window: usize) -> Vec<T> {
    let window = window.max(1);
    let mut supplies: Vec<VecDeque<T>> = dateless.into_iter().map(VecDeque::from).collect();
    let rounds = dated.len().div_ceil(window).max(1);
    let mut out = Vec::with_capacity(dated.len() + rounds * supplies.len());
    let mut dated = dated.into_iter();

    for _ in 0..rounds {
        out.extend(supplies.iter_mut().filter_map(VecDeque::pop_front));
        out.extend(dated.by_ref().take(window));
    }
    out
}
