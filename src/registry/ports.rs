use crate::error::{AppError, AppResult};
use std::collections::HashSet;

/// Lowest port at or above `base` that no live instance holds.
///
/// Linear scan, first gap wins. Fine for the handful of bots one host runs.
pub fn next_free_port(used: impl IntoIterator<Item = u16>, base: u16) -> AppResult<u16> {
    let used: HashSet<u16> = used.into_iter().collect();
    (base..=u16::MAX)
        .find(|port| !used.contains(port))
        .ok_or_else(|| AppError::internal(format!("no free port at or above {base}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_uses_base() {
        assert_eq!(next_free_port(std::iter::empty(), 3001).unwrap(), 3001);
    }

    #[test]
    fn test_first_gap_wins() {
        assert_eq!(next_free_port([3001, 3002, 3004], 3001).unwrap(), 3003);
    }

    #[test]
    fn test_contiguous_appends() {
        assert_eq!(next_free_port([3002, 3001, 3003], 3001).unwrap(), 3004);
    }

    #[test]
    fn test_ports_below_base_ignored() {
        assert_eq!(next_free_port([80, 443], 3001).unwrap(), 3001);
    }

    #[test]
    fn test_exhausted_range() {
        let used = [u16::MAX - 1, u16::MAX];
        assert!(next_free_port(used, u16::MAX - 1).is_err());
    }
}
