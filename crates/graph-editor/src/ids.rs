//! Human-readable node id generation

use std::collections::HashSet;

/// Generates `"<operator> <n>"` ids
///
/// `n` is one past the largest numeric suffix already in use for the same
/// operator, so an id freed by a deletion is never handed out while a
/// higher-numbered sibling is still alive. When the largest possible suffix
/// is already taken, the lowest unused one is handed out.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdAllocator;

impl IdAllocator {
    /// Allocate an id for `operator` that does not clash with `existing`
    pub fn allocate<'a, I>(operator: &str, existing: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let prefix = format!("{} ", operator);
        let used: HashSet<u64> = existing
            .into_iter()
            .filter_map(|id| id.strip_prefix(&prefix))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .collect();
        let next = match used.iter().max() {
            None => 0,
            // nothing follows u64::MAX, so take the lowest free suffix
            Some(&max) => max
                .checked_add(1)
                .unwrap_or_else(|| (0..).find(|n| !used.contains(n)).unwrap_or(0)),
        };
        format!("{}{}", prefix, next)
    }
}
