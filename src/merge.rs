//! Newest-first ordering of dated items.
//!
//! A top-down merge sort: split at the midpoint, sort both halves, merge by
//! repeatedly taking the front item with the larger sort key. Slices of zero
//! or one item are returned as they are, without any comparison.
//!
//! The merge is stable: on equal keys the left (earlier) item goes first, so
//! ties keep the order in which batches arrived.

use crate::models::DatedItem;

/// Sort dated items by `sort_key`, descending, keeping input order on ties.
pub fn merge_sort(items: Vec<DatedItem>) -> Vec<DatedItem> {
    if items.len() <= 1 {
        return items;
    }
    let mut left = items;
    let right = left.split_off(left.len() / 2);
    merge(merge_sort(left), merge_sort(right))
}

/// Merge two newest-first sequences into one.
fn merge(left: Vec<DatedItem>, right: Vec<DatedItem>) -> Vec<DatedItem> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => r.sort_key > l.sort_key,
            _ => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        out.extend(next);
    }

    out.extend(left);
    out.extend(right);
    out
}
