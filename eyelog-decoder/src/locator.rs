//! Pattern locator
//!
//! Finds anchor lines inside a trial. The scan is linear from the first line
//! and the first match wins.

use crate::types::Trial;

/// Index of the first line of `trial` containing `pattern`, or `None`
pub fn locate(trial: &Trial<'_>, pattern: &str) -> Option<usize> {
    trial
        .lines
        .iter()
        .position(|line| line.contains_pattern(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::trial;

    #[test]
    fn test_first_match_wins() {
        let t = trial(&["MSG 1 a", "END 2 x", "END 3 y"]);
        assert_eq!(locate(&t, "END"), Some(1));
    }

    #[test]
    fn test_match_at_first_line_is_found() {
        let t = trial(&["MSG 1 DRAW_LIST", "MSG 2 other"]);
        assert_eq!(locate(&t, "DRAW_LIST"), Some(0));
    }

    #[test]
    fn test_not_found_is_none() {
        let t = trial(&["MSG 1 a", "MSG 2 b"]);
        assert_eq!(locate(&t, "END"), None);
        assert_eq!(locate(&trial(&[]), "END"), None);
    }

    #[test]
    fn test_multi_word_pattern_must_be_contiguous() {
        let t = trial(&[
            "MSG 1 ERROR MESSAGES",
            "MSG 2 LOST ERROR MESSAGES",
            "MSG 3 ERROR\tMESSAGES    LOST 4",
        ]);
        assert_eq!(locate(&t, "ERROR MESSAGES LOST"), Some(2));
    }
}
