//! HintGenerator: uniform-length, prefix-free labels over an alphabet.

use crate::geometry::{Point, Rect};

/// An opaque platform element handle. The generator never inspects it beyond
/// carrying it alongside the computed label/center.
pub trait ElementHandle: Clone {}
impl<T: Clone> ElementHandle for T {}

/// An ordered element as seen by the generator: position/size plus the
/// platform handle it will be returned with.
#[derive(Debug, Clone)]
pub struct ScoredElement<H> {
    pub handle: H,
    pub position: Point,
    pub size: Point,
}

/// A label/position pair overlaid on a clickable element.
#[derive(Debug, Clone)]
pub struct Hint<H> {
    pub label: String,
    pub element: H,
    pub center: Point,
    pub size: Point,
}

/// Cap on label length; the UI assumes labels never exceed 3 characters.
const MAX_LABEL_LEN: usize = 3;

/// Result of a generation pass: the hints produced, and whether the input was
/// truncated to fit `alphabet.len()^3`.
#[derive(Debug)]
pub struct GenerationResult<H> {
    pub hints: Vec<Hint<H>>,
    pub truncated_from: Option<usize>,
}

/// Produces uniform-length, prefix-free labels for an ordered sequence of elements.
pub struct HintGenerator {
    alphabet: Vec<char>,
}

impl HintGenerator {
    /// Home-row default alphabet (9 characters), matching the usual hint-mode default.
    pub const DEFAULT_ALPHABET: &'static str = "asdfghjkl";

    pub fn new(alphabet: impl AsRef<str>) -> Self {
        let chars: Vec<char> = alphabet
            .as_ref()
            .chars()
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let alphabet = if chars.is_empty() {
            Self::DEFAULT_ALPHABET.chars().map(|c| c.to_ascii_uppercase()).collect()
        } else {
            chars
        };
        Self { alphabet }
    }

    fn max_capacity(&self) -> usize {
        self.alphabet.len().pow(MAX_LABEL_LEN as u32)
    }

    /// Smallest `k` such that `|alphabet|^k >= n`. `n == 0` yields `0`.
    fn label_len_for(&self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        let base = self.alphabet.len().max(1);
        let mut len = 1;
        let mut capacity = base;
        while capacity < n {
            len += 1;
            capacity *= base;
        }
        len
    }

    /// The `index`-th string (0-based) of length `len` in alphabet order.
    fn nth_label(&self, index: usize, len: usize) -> String {
        let base = self.alphabet.len();
        let mut digits = vec![0usize; len];
        let mut remaining = index;
        for slot in digits.iter_mut().rev() {
            *slot = remaining % base;
            remaining /= base;
        }
        digits.into_iter().map(|d| self.alphabet[d]).collect()
    }

    /// Sort elements top-to-bottom then left-to-right (stable), generate labels,
    /// and pair each with its element. Truncates to `|alphabet|^3` elements if
    /// there are more; `truncated_from` then carries the original count.
    pub fn generate<H: ElementHandle>(
        &self,
        elements: Vec<ScoredElement<H>>,
    ) -> GenerationResult<H> {
        let mut sorted = elements;
        sorted.sort_by(|a, b| {
            a.position
                .y
                .partial_cmp(&b.position.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.x.partial_cmp(&b.position.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        let original_count = sorted.len();
        let cap = self.max_capacity();
        let truncated_from = if original_count > cap {
            sorted.truncate(cap);
            Some(original_count)
        } else {
            None
        };

        let label_len = self.label_len_for(sorted.len()).min(MAX_LABEL_LEN).max(if sorted.is_empty() { 0 } else { 1 });

        let hints = sorted
            .into_iter()
            .enumerate()
            .map(|(i, el)| Hint {
                label: self.nth_label(i, label_len),
                center: el.position.translated(el.size.x / 2.0, el.size.y / 2.0),
                size: el.size,
                element: el.handle,
            })
            .collect();

        GenerationResult {
            hints,
            truncated_from,
        }
    }
}

impl Default for HintGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ALPHABET)
    }
}

pub fn element_rect<H>(hint: &Hint<H>) -> Rect {
    Rect::new(
        Point::new(hint.center.x - hint.size.x / 2.0, hint.center.y - hint.size.y / 2.0),
        hint.size.x,
        hint.size.y,
    )
}
