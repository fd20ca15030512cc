//! Single-splice difference between two sequences.

/// The replaced run between two sequences: `removed` at `index` in the old
/// sequence became `inserted` in the new one.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Splice<T> {
    pub index: usize,
    pub removed: Vec<T>,
    pub inserted: Vec<T>,
}

impl<T: PartialEq + Clone> Splice<T> {
    /// Trims the common prefix and suffix. Returns None for equal sequences.
    pub(crate) fn between(old: &[T], new: &[T]) -> Option<Self> {
        if old == new {
            return None;
        }
        let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
        let max_suffix = old.len().min(new.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(new.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();
        Some(Self {
            index: prefix,
            removed: old[prefix..old.len() - suffix].to_vec(),
            inserted: new[prefix..new.len() - suffix].to_vec(),
        })
    }

    /// True when the splice overwrites values without changing the length.
    pub(crate) fn is_in_place(&self) -> bool {
        self.removed.len() == self.inserted.len()
    }
}
