//! HintRouter / GridRouter: pure input translators. Each consumes one
//! key and an accumulator, returning a `RouterOutcome`. Neither router owns
//! time or I/O; the KeyPipeline drives them.

use crate::geometry::Point;
use crate::grid::{Cell, Grid, Subgrid};
use crate::hint::Hint;
use crate::hint_collection::HintCollection;

pub const BACKSPACE: &str = "\u{7f}";
pub const ESCAPE: &str = "\u{1b}";

#[derive(Debug, Clone, PartialEq)]
pub enum RouterOutcome<T> {
    /// More than one candidate remains; overlay should re-render with the
    /// highlighted prefix.
    Partial,
    /// Exactly one candidate matches the accumulator.
    Exact(T),
    /// Escape was pressed.
    Exit,
    /// The key didn't extend any candidate; swallowed, accumulator unchanged.
    NoMatch,
}

/// Drives a `HintCollection` through successive key presses.
pub struct HintRouter<H: Clone> {
    accumulator: String,
}

impl<H: Clone> HintRouter<H> {
    pub fn new() -> Self {
        Self {
            accumulator: String::new(),
        }
    }

    pub fn accumulator(&self) -> &str {
        &self.accumulator
    }

    pub fn reset(&mut self) {
        self.accumulator.clear();
    }

    /// Feed one translated key (a single character, or `BACKSPACE`/`ESCAPE`)
    /// against `collection`.
    pub fn handle_key(&mut self, key: &str, collection: &HintCollection<H>) -> RouterOutcome<Hint<H>> {
        if key == ESCAPE {
            self.reset();
            return RouterOutcome::Exit;
        }
        if key == BACKSPACE {
            self.accumulator.pop();
            return if self.accumulator.is_empty() {
                RouterOutcome::NoMatch
            } else {
                RouterOutcome::Partial
            };
        }

        let Some(ch) = key.chars().next() else {
            return RouterOutcome::NoMatch;
        };
        self.accumulator.push(ch.to_ascii_uppercase());

        let matches = collection.filter_by_prefix(&self.accumulator);
        match matches.len() {
            0 => {
                self.accumulator.pop();
                RouterOutcome::NoMatch
            }
            1 if matches[0].label == self.accumulator => {
                let hint = matches[0].clone();
                self.reset();
                RouterOutcome::Exact(hint)
            }
            _ => RouterOutcome::Partial,
        }
    }
}

impl<H: Clone> Default for HintRouter<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Final outcome of a grid/subgrid resolution: a single point, in local
/// (window) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    pub center: Point,
}

enum GridStage {
    Cell,
    Subgrid { parent: Cell },
}

/// Drives a `Grid`, opening a `Subgrid` once the main grid reaches `Exact`,
/// per the resolved design-note semantics: the subgrid always opens on the
/// first `Exact`; a second `Exact` finalizes the move.
pub struct GridRouter {
    accumulator: String,
    stage: GridStage,
    sublayer_keys: String,
}

impl GridRouter {
    pub fn new(sublayer_keys: impl Into<String>) -> Self {
        Self {
            accumulator: String::new(),
            stage: GridStage::Cell,
            sublayer_keys: sublayer_keys.into(),
        }
    }

    pub fn accumulator(&self) -> &str {
        &self.accumulator
    }

    pub fn is_in_subgrid(&self) -> bool {
        matches!(self.stage, GridStage::Subgrid { .. })
    }

    fn reset_to_cell(&mut self) {
        self.accumulator.clear();
        self.stage = GridStage::Cell;
    }

    pub fn handle_key(&mut self, key: &str, grid: &Grid) -> RouterOutcome<GridPoint> {
        if key == ESCAPE {
            self.reset_to_cell();
            return RouterOutcome::Exit;
        }
        if key == BACKSPACE {
            self.accumulator.pop();
            return if self.accumulator.is_empty() {
                RouterOutcome::NoMatch
            } else {
                RouterOutcome::Partial
            };
        }

        let Some(ch) = key.chars().next() else {
            return RouterOutcome::NoMatch;
        };
        self.accumulator.push(ch.to_ascii_uppercase());

        let is_cell_stage = matches!(self.stage, GridStage::Cell);

        if is_cell_stage {
            let matches = grid.labels_with_prefix(&self.accumulator);
            match matches.len() {
                0 => {
                    self.accumulator.pop();
                    RouterOutcome::NoMatch
                }
                1 if matches[0].label == self.accumulator => {
                    let cell = matches[0].clone();
                    self.accumulator.clear();
                    self.stage = GridStage::Subgrid { parent: cell };
                    RouterOutcome::Partial
                }
                _ => RouterOutcome::Partial,
            }
        } else {
            let parent_rect = match &self.stage {
                GridStage::Subgrid { parent } => parent.rect,
                GridStage::Cell => unreachable!(),
            };
            let subgrid = Subgrid::new(parent_rect, &self.sublayer_keys);
            let matches: Vec<&Cell> = subgrid
                .cells
                .iter()
                .filter(|c| c.label.starts_with(&self.accumulator))
                .collect();
            match matches.len() {
                0 => {
                    self.accumulator.pop();
                    RouterOutcome::NoMatch
                }
                1 if matches[0].label == self.accumulator => {
                    let point = GridPoint {
                        center: matches[0].center,
                    };
                    self.reset_to_cell();
                    RouterOutcome::Exact(point)
                }
                _ => RouterOutcome::Partial,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::hint::Hint;

    fn hint(label: &str) -> Hint<usize> {
        Hint {
            label: label.to_string(),
            element: 0,
            center: Point::new(0.0, 0.0),
            size: Point::new(10.0, 10.0),
        }
    }

    #[test]
    fn hint_router_exact_on_full_label() {
        let collection = HintCollection::new(vec![hint("AA"), hint("AB"), hint("BA")]);
        let mut router: HintRouter<usize> = HintRouter::new();
        assert_eq!(router.handle_key("a", &collection), RouterOutcome::Partial);
        match router.handle_key("b", &collection) {
            RouterOutcome::Exact(h) => assert_eq!(h.label, "AB"),
            other => panic!("expected Exact, got {:?}", other),
        }
    }

    #[test]
    fn hint_router_no_match_rewinds_accumulator() {
        let collection = HintCollection::new(vec![hint("AA")]);
        let mut router: HintRouter<usize> = HintRouter::new();
        router.handle_key("a", &collection);
        assert_eq!(router.handle_key("z", &collection), RouterOutcome::NoMatch);
        assert_eq!(router.accumulator(), "A");
    }

    #[test]
    fn hint_router_escape_exits_and_resets() {
        let collection = HintCollection::new(vec![hint("AA")]);
        let mut router: HintRouter<usize> = HintRouter::new();
        router.handle_key("a", &collection);
        assert_eq!(router.handle_key(ESCAPE, &collection), RouterOutcome::Exit);
        assert_eq!(router.accumulator(), "");
    }

    #[test]
    fn grid_router_opens_subgrid_on_first_exact_then_finalizes() {
        let bounds = Rect::new(Point::new(0.0, 0.0), 300.0, 300.0);
        let grid = Grid::new(bounds, "asd");
        let mut router = GridRouter::new("asdfghjkl");

        router.handle_key("a", &grid);
        let outcome = router.handle_key("s", &grid);
        assert_eq!(outcome, RouterOutcome::Partial);
        assert!(router.is_in_subgrid());

        match router.handle_key("a", &grid) {
            RouterOutcome::Exact(p) => {
                assert_eq!(p.center, Point::new(116.66666666666667, 16.666666666666668));
            }
            other => panic!("expected Exact, got {:?}", other),
        }
        assert!(!router.is_in_subgrid());
    }
}
