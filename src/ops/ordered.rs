//! Value-semantics primitives over ordered sequences.
//!
//! Every function returns a fresh `Vec` and leaves its input untouched, so a
//! caller can build the complete next state before committing any of it.
//! Out-of-range indices are rejected, never clamped.

/// Error type for ordered-sequence primitives
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("index {index} out of range for sequence of length {len}")]
    OutOfRange { index: usize, len: usize },
}

fn check_index(index: usize, len: usize) -> Result<(), OrderError> {
    if index < len {
        Ok(())
    } else {
        Err(OrderError::OutOfRange { index, len })
    }
}

/// Remove the element at `from` and reinsert it at `to`.
///
/// A pure permutation: length and element set are unchanged. `from == to`
/// still yields a new sequence.
pub fn move_item<T: Clone>(items: &[T], from: usize, to: usize) -> Result<Vec<T>, OrderError> {
    check_index(from, items.len())?;
    check_index(to, items.len())?;
    let mut out = items.to_vec();
    let item = out.remove(from);
    out.insert(to, item);
    Ok(out)
}

/// Insert `item` so that it ends up at `index` (`index == len` appends).
pub fn insert_at<T: Clone>(items: &[T], index: usize, item: T) -> Result<Vec<T>, OrderError> {
    if index > items.len() {
        return Err(OrderError::OutOfRange {
            index,
            len: items.len(),
        });
    }
    let mut out = Vec::with_capacity(items.len() + 1);
    out.extend_from_slice(&items[..index]);
    out.push(item);
    out.extend_from_slice(&items[index..]);
    Ok(out)
}

/// Remove the element at `index`, returning the remaining sequence and the element.
pub fn remove_at<T: Clone>(items: &[T], index: usize) -> Result<(Vec<T>, T), OrderError> {
    check_index(index, items.len())?;
    let mut out = items.to_vec();
    let removed = out.remove(index);
    Ok((out, removed))
}

/// Append `item` at the tail.
pub fn append<T: Clone>(items: &[T], item: T) -> Vec<T> {
    let mut out = items.to_vec();
    out.push(item);
    out
}
