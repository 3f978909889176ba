//! ScrollController: Vim-style multi-key scroll sequence parsing.

pub const CTRL_D: &str = "\u{04}";
pub const CTRL_U: &str = "\u{15}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOp {
    Down,
    Up,
    Left,
    Right,
    HalfDown,
    HalfUp,
    Top,
    Bottom,
}

/// `(key, last_key) -> (operation, new_last_key, recognised)`. Pure function,
/// no I/O — the KeyPipeline owns `last_key` persistence (`AppState::scroll_last_key`).
pub fn parse_scroll_key(key: &str, last_key: &str) -> (Option<ScrollOp>, String, bool) {
    match key {
        "j" => (Some(ScrollOp::Down), String::new(), true),
        "k" => (Some(ScrollOp::Up), String::new(), true),
        "h" => (Some(ScrollOp::Left), String::new(), true),
        "l" => (Some(ScrollOp::Right), String::new(), true),
        "g" if last_key == "g" => (Some(ScrollOp::Top), String::new(), true),
        "g" => (None, "g".to_string(), true),
        "G" => (Some(ScrollOp::Bottom), String::new(), true),
        CTRL_D => (Some(ScrollOp::HalfDown), String::new(), true),
        CTRL_U => (Some(ScrollOp::HalfUp), String::new(), true),
        _ => (None, String::new(), false),
    }
}

/// Distances configured for the scroll primitives (see `config::ScrollConfig`).
#[derive(Debug, Clone, Copy)]
pub struct ScrollDistances {
    pub step: f64,
    pub half_page: f64,
    pub full_page: f64,
}

/// Platform-facing scroll primitives, parameterized by configured distances.
/// `ScrollController` never touches the event tap or the mode machine; it is
/// invoked once a `ScrollOp` has been resolved by `parse_scroll_key`.
pub struct ScrollController {
    distances: ScrollDistances,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollCommand {
    pub dx: f64,
    pub dy: f64,
}

impl ScrollController {
    pub fn new(distances: ScrollDistances) -> Self {
        Self { distances }
    }

    /// Translate a resolved operation into a signed scroll delta. Positive
    /// `dy` scrolls down, positive `dx` scrolls right; `Top`/`Bottom` use a
    /// sentinel magnitude the platform scroll primitive interprets as
    /// "all the way".
    pub fn command_for(&self, op: ScrollOp) -> ScrollCommand {
        match op {
            ScrollOp::Down => ScrollCommand { dx: 0.0, dy: self.distances.step },
            ScrollOp::Up => ScrollCommand { dx: 0.0, dy: -self.distances.step },
            ScrollOp::Left => ScrollCommand { dx: -self.distances.step, dy: 0.0 },
            ScrollOp::Right => ScrollCommand { dx: self.distances.step, dy: 0.0 },
            ScrollOp::HalfDown => ScrollCommand { dx: 0.0, dy: self.distances.half_page },
            ScrollOp::HalfUp => ScrollCommand { dx: 0.0, dy: -self.distances.half_page },
            ScrollOp::Bottom => ScrollCommand { dx: 0.0, dy: self.distances.full_page },
            ScrollOp::Top => ScrollCommand { dx: 0.0, dy: -self.distances.full_page },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_gg_sequence_issues_single_top() {
        let (op, last, recognised) = parse_scroll_key("g", "");
        assert_eq!(op, None);
        assert_eq!(last, "g");
        assert!(recognised);

        let (op, last, recognised) = parse_scroll_key("g", "g");
        assert_eq!(op, Some(ScrollOp::Top));
        assert_eq!(last, "");
        assert!(recognised);
    }

    #[test]
    fn s3_intervening_key_breaks_gg_sequence() {
        let (_, last, _) = parse_scroll_key("g", "");
        assert_eq!(last, "g");

        let (op, last, _) = parse_scroll_key("k", &last);
        assert_eq!(op, Some(ScrollOp::Up));
        assert_eq!(last, "");

        let (op, last, _) = parse_scroll_key("g", &last);
        assert_eq!(op, None);
        assert_eq!(last, "g");
    }

    #[test]
    fn unrecognised_key_clears_last_key() {
        let (op, last, recognised) = parse_scroll_key("q", "g");
        assert_eq!(op, None);
        assert_eq!(last, "");
        assert!(!recognised);
    }

    #[test]
    fn ctrl_d_and_ctrl_u_map_to_half_page() {
        assert_eq!(parse_scroll_key(CTRL_D, "").0, Some(ScrollOp::HalfDown));
        assert_eq!(parse_scroll_key(CTRL_U, "").0, Some(ScrollOp::HalfUp));
    }

    #[test]
    fn command_directions_have_expected_signs() {
        let ctrl = ScrollController::new(ScrollDistances { step: 10.0, half_page: 50.0, full_page: 1000.0 });
        assert_eq!(ctrl.command_for(ScrollOp::Down).dy, 10.0);
        assert_eq!(ctrl.command_for(ScrollOp::Up).dy, -10.0);
        assert_eq!(ctrl.command_for(ScrollOp::Top).dy, -1000.0);
        assert_eq!(ctrl.command_for(ScrollOp::Bottom).dy, 1000.0);
    }
}
