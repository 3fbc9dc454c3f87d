//! Canonical Nondh Ordering
//!
//! Total order over amendment slots:
//! 1. primary reference kind (survey, then block, then re-survey, then none)
//! 2. leading integer of the number (non-numeric leads sort last)
//! 3. remaining `-`/`/` segments, compared segment by segment
//! 4. raw number text, then id
//!
//! Ids are unique, so no two distinct nondhs compare equal.

use crate::domain::entities::Nondh;
use std::cmp::Ordering;
use tracing::debug;

/// Sort key for one segment of a nondh number.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Segment {
    Numeric(u64),
    Text(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<u64>() {
            Ok(value) => Segment::Numeric(value),
            Err(_) => Segment::Text(trimmed.to_owned()),
        }
    }
}

fn number_segments(number: &str) -> Vec<Segment> {
    number.split(['-', '/']).map(Segment::parse).collect()
}

/// Leading integer of a number like `10-35`, if it has one.
pub fn leading_number(number: &str) -> Option<u64> {
    let digits: String = number
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn kind_rank(nondh: &Nondh) -> u8 {
    nondh.primary_kind().map(|k| k.priority()).unwrap_or(u8::MAX)
}

/// Compare two nondhs in canonical legal order.
pub fn compare_nondhs(a: &Nondh, b: &Nondh) -> Ordering {
    kind_rank(a)
        .cmp(&kind_rank(b))
        .then_with(|| {
            let lead_a = leading_number(&a.number).unwrap_or(u64::MAX);
            let lead_b = leading_number(&b.number).unwrap_or(u64::MAX);
            lead_a.cmp(&lead_b)
        })
        .then_with(|| number_segments(&a.number).cmp(&number_segments(&b.number)))
        .then_with(|| a.number.cmp(&b.number))
        .then_with(|| a.id.cmp(&b.id))
}

/// Compute the canonical total order. Recompute after any number or reference edit.
pub fn canonical_order(nondhs: &[Nondh]) -> Vec<Nondh> {
    let mut order = nondhs.to_vec();
    order.sort_by(compare_nondhs);

    debug!(nondh_count = order.len(), "Computed canonical nondh order");
    order
}

/// Position of `nondh_id` in `order`.
pub fn position_of(order: &[Nondh], nondh_id: &str) -> Option<usize> {
    order.iter().position(|n| n.id == nondh_id)
}

/// Position of the nondh whose display number is `number`.
///
/// When several nondhs share the number (say survey "3" and block "3"),
/// the first in canonical order wins.
pub fn position_of_number(order: &[Nondh], number: &str) -> Option<usize> {
    let wanted = number.trim();
    order.iter().position(|n| n.number.trim() == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::SurveyRef;

    fn ids(order: &[Nondh]) -> Vec<&str> {
        order.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_kind_before_number() {
        let nondhs = vec![
            Nondh::new("r1", "1").with_ref(SurveyRef::resurvey("9")),
            Nondh::new("b1", "2").with_ref(SurveyRef::block("9")),
            Nondh::new("s1", "30").with_ref(SurveyRef::survey("9")),
        ];

        assert_eq!(ids(&canonical_order(&nondhs)), vec!["s1", "b1", "r1"]);
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        let nondhs = vec![
            Nondh::new("a", "10").with_ref(SurveyRef::survey("1")),
            Nondh::new("b", "9").with_ref(SurveyRef::survey("1")),
            Nondh::new("c", "100").with_ref(SurveyRef::survey("1")),
        ];

        assert_eq!(ids(&canonical_order(&nondhs)), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_priority_rule_classifies_mixed_refs_as_survey() {
        let nondhs = vec![
            Nondh::new("block_only", "1").with_ref(SurveyRef::block("3")),
            Nondh::new("mixed", "5")
                .with_ref(SurveyRef::block("3"))
                .with_ref(SurveyRef::block("4"))
                .with_ref(SurveyRef::survey("3")),
        ];

        assert_eq!(ids(&canonical_order(&nondhs)), vec!["mixed", "block_only"]);
    }

    #[test]
    fn test_sub_numbers_tie_break() {
        let nondhs = vec![
            Nondh::new("c", "10-35-40").with_ref(SurveyRef::survey("1")),
            Nondh::new("a", "10").with_ref(SurveyRef::survey("1")),
            Nondh::new("d", "10/36").with_ref(SurveyRef::survey("1")),
            Nondh::new("b", "10-35").with_ref(SurveyRef::survey("1")),
            Nondh::new("e", "11").with_ref(SurveyRef::survey("1")),
        ];

        assert_eq!(ids(&canonical_order(&nondhs)), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_duplicate_numbers_fall_back_to_id() {
        let nondhs = vec![
            Nondh::new("z", "4").with_ref(SurveyRef::survey("1")),
            Nondh::new("y", "4").with_ref(SurveyRef::survey("1")),
        ];

        assert_eq!(ids(&canonical_order(&nondhs)), vec!["y", "z"]);
    }

    #[test]
    fn test_unreferenced_and_non_numeric_sort_last() {
        let nondhs = vec![
            Nondh::new("none", "1"),
            Nondh::new("text", "abc").with_ref(SurveyRef::survey("1")),
            Nondh::new("num", "99").with_ref(SurveyRef::survey("1")),
        ];

        assert_eq!(ids(&canonical_order(&nondhs)), vec!["num", "text", "none"]);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("10-35"), Some(10));
        assert_eq!(leading_number(" 7/2"), Some(7));
        assert_eq!(leading_number("x7"), None);
    }

    #[test]
    fn test_position_lookups() {
        let order = canonical_order(&[
            Nondh::new("a", "1").with_ref(SurveyRef::survey("1")),
            Nondh::new("b", "2").with_ref(SurveyRef::survey("1")),
        ]);

        assert_eq!(position_of(&order, "b"), Some(1));
        assert_eq!(position_of_number(&order, " 1 "), Some(0));
        assert_eq!(position_of_number(&order, "3"), None);
    }

    #[test]
    fn test_shared_number_resolves_to_first_in_order() {
        let order = canonical_order(&[
            Nondh::new("blk", "3").with_ref(SurveyRef::block("8")),
            Nondh::new("srv", "3").with_ref(SurveyRef::survey("8")),
        ]);

        let pos = position_of_number(&order, " 3 ").unwrap();

        assert_eq!(order[pos].id, "srv");
    }
}
