//! Dense 1-based ordering shared by modules, items and organization nodes.
//!
//! Every list kept here satisfies `entries[i].position() == i + 1`. Inserts
//! shift later entries up, removals close the gap, and a move is a removal
//! followed by an insert.

use crate::domain::Positioned;

/// Target position for an insert into a list of `len` entries.
///
/// `None` appends; explicit requests are clamped into `[1, len + 1]`.
pub fn clamp(requested: Option<usize>, len: usize) -> usize {
    match requested {
        None => len + 1,
        Some(p) => p.clamp(1, len + 1),
    }
}

/// Rewrite positions to match vector order
pub fn renumber<T: Positioned>(entries: &mut [T]) {
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.set_position(i + 1);
    }
}

/// Insert `entry`, shifting entries at or after the target. Returns the
/// position it landed on.
pub fn insert_at<T: Positioned>(
    entries: &mut Vec<T>,
    mut entry: T,
    requested: Option<usize>,
) -> usize {
    let target = clamp(requested, entries.len());
    entry.set_position(target);
    entries.insert(target - 1, entry);
    renumber(entries);
    target
}

/// Remove the first entry matching `pred` and close the gap
pub fn remove_where<T, F>(entries: &mut Vec<T>, pred: F) -> Option<T>
where
    T: Positioned,
    F: FnMut(&T) -> bool,
{
    let index = entries.iter().position(pred)?;
    let removed = entries.remove(index);
    renumber(entries);
    Some(removed)
}

/// Move the entry matching `pred` to a new position. Returns
/// `(old, new)` positions.
pub fn move_where<T, F>(entries: &mut Vec<T>, pred: F, requested: usize) -> Option<(usize, usize)>
where
    T: Positioned,
    F: FnMut(&T) -> bool,
{
    let index = entries.iter().position(pred)?;
    let old = index + 1;
    let entry = entries.remove(index);
    renumber(entries);
    let new = insert_at(entries, entry, Some(requested));
    Some((old, new))
}
