//! HintCollection: prefix-indexed lookup of hints by typed input.

use std::collections::HashMap;

use crate::hint::Hint;

/// Labels never exceed this length (see `hint::MAX_LABEL_LEN`); prefixes
/// longer than this always have zero matches.
const MAX_PREFIX_LEN: usize = 2;

/// Ordered hints plus exact/prefix1/prefix2 lookup maps built once at
/// construction. All labels are assumed uppercase, uniform-length, and
/// prefix-free (the HintGenerator's invariants).
pub struct HintCollection<H: Clone> {
    hints: Vec<Hint<H>>,
    by_label: HashMap<String, usize>,
    by_prefix1: HashMap<char, Vec<usize>>,
    by_prefix2: HashMap<String, Vec<usize>>,
}

impl<H: Clone> HintCollection<H> {
    pub fn new(hints: Vec<Hint<H>>) -> Self {
        let mut by_label = HashMap::new();
        let mut by_prefix1: HashMap<char, Vec<usize>> = HashMap::new();
        let mut by_prefix2: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, hint) in hints.iter().enumerate() {
            by_label.insert(hint.label.clone(), idx);

            if let Some(c1) = hint.label.chars().next() {
                by_prefix1.entry(c1).or_default().push(idx);
            }
            if hint.label.chars().count() >= 2 {
                let p2: String = hint.label.chars().take(2).collect();
                by_prefix2.entry(p2).or_default().push(idx);
            }
        }

        Self {
            hints,
            by_label,
            by_prefix1,
            by_prefix2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    /// Exact case-insensitive lookup.
    pub fn find_by_label(&self, s: &str) -> Option<&Hint<H>> {
        let upper = s.to_ascii_uppercase();
        self.by_label.get(&upper).map(|&idx| &self.hints[idx])
    }

    /// Hints whose label starts with `prefix` (uppercased). Prefixes of
    /// length >= 3 always return empty, since labels are capped at 3 chars
    /// and only the length-1 / length-2 buckets are materialized.
    pub fn filter_by_prefix(&self, prefix: &str) -> Vec<&Hint<H>> {
        let upper = prefix.to_ascii_uppercase();
        let chars: Vec<char> = upper.chars().collect();

        match chars.len() {
            0 => self.hints.iter().collect(),
            1 => self
                .by_prefix1
                .get(&chars[0])
                .map(|idxs| idxs.iter().map(|&i| &self.hints[i]).collect())
                .unwrap_or_default(),
            2 => self
                .by_prefix2
                .get(&upper)
                .map(|idxs| idxs.iter().map(|&i| &self.hints[i]).collect())
                .unwrap_or_default(),
            n if n > MAX_PREFIX_LEN => Vec::new(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn hint(label: &str) -> Hint<usize> {
        Hint {
            label: label.to_string(),
            element: 0,
            center: Point::new(0.0, 0.0),
            size: Point::new(10.0, 10.0),
        }
    }

    #[test]
    fn exact_lookup_is_case_insensitive() {
        let c = HintCollection::new(vec![hint("AB"), hint("AC")]);
        assert!(c.find_by_label("ab").is_some());
        assert!(c.find_by_label("AB").is_some());
        assert!(c.find_by_label("zz").is_none());
    }

    #[test]
    fn prefix1_filters_to_matching_bucket() {
        let c = HintCollection::new(vec![hint("AA"), hint("AB"), hint("BA")]);
        let matches = c.filter_by_prefix("A");
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn prefix2_falls_back_to_exact() {
        let c = HintCollection::new(vec![hint("AA"), hint("AB")]);
        assert_eq!(c.filter_by_prefix("AB").len(), 1);
        assert_eq!(c.filter_by_prefix("ZZ").len(), 0);
    }

    #[test]
    fn prefix_of_length_three_or_more_is_empty() {
        let c = HintCollection::new(vec![hint("AAA")]);
        assert!(c.filter_by_prefix("AAA").is_empty());
    }

    #[test]
    fn router_monotonicity_over_a_valid_label() {
        let c = HintCollection::new(vec![hint("AA"), hint("AB"), hint("BA")]);
        let label = "AB";
        let mut acc = String::new();
        for (i, ch) in label.chars().enumerate() {
            acc.push(ch);
            let matches = c.filter_by_prefix(&acc);
            assert!(!matches.is_empty(), "matched set emptied before final char");
            if i == label.len() - 1 {
                assert_eq!(matches.len(), 1);
                assert_eq!(matches[0].label, label);
            }
        }
    }
}
