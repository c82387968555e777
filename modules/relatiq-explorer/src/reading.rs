//! Reading mode: a cursor stepping through the selected articles.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadingState {
    #[default]
    Off,
    Active {
        cursor: usize,
    },
}

/// Transition functions take the current selection length and refuse any
/// move that would leave `[0, len)`. Every method returns the new cursor when
/// the document under it changed, `None` otherwise.
#[derive(Debug, Default)]
pub struct ReadingTraversal {
    state: ReadingState,
}

impl ReadingTraversal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReadingState {
        self.state
    }

    pub fn cursor(&self) -> Option<usize> {
        match self.state {
            ReadingState::Off => None,
            ReadingState::Active { cursor } => Some(cursor),
        }
    }

    pub fn is_active(&self) -> bool {
        self.cursor().is_some()
    }

    /// Start at the first article. Refused on an empty selection.
    pub fn enter(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        self.state = ReadingState::Active { cursor: 0 };
        Some(0)
    }

    pub fn next(&mut self, len: usize) -> Option<usize> {
        let cursor = self.cursor()?;
        if cursor + 1 >= len {
            return None;
        }
        self.state = ReadingState::Active { cursor: cursor + 1 };
        Some(cursor + 1)
    }

    pub fn prev(&mut self, len: usize) -> Option<usize> {
        let cursor = self.cursor()?;
        if cursor == 0 || cursor > len {
            return None;
        }
        self.state = ReadingState::Active { cursor: cursor - 1 };
        Some(cursor - 1)
    }

    /// Leave reading mode. Returns whether it was active.
    pub fn exit(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = ReadingState::Off;
        was_active
    }

    /// Keep the cursor valid after the selection changed underneath it:
    /// clamp to the new last index, or turn off when nothing is left.
    pub fn on_selection_changed(&mut self, len: usize) -> Option<usize> {
        let cursor = self.cursor()?;
        if len == 0 {
            self.state = ReadingState::Off;
            return None;
        }
        let clamped = cursor.min(len - 1);
        self.state = ReadingState::Active { cursor: clamped };
        Some(clamped)
    }

    pub fn can_next(&self, len: usize) -> bool {
        self.cursor().is_some_and(|c| c + 1 < len)
    }

    pub fn can_prev(&self) -> bool {
        self.cursor().is_some_and(|c| c > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cannot_enter_on_empty_selection() {
        let mut reading = ReadingTraversal::new();
        assert_eq!(reading.enter(0), None);
        assert_eq!(reading.state(), ReadingState::Off);
    }

    #[test]
    fn steps_stop_at_both_ends() {
        let mut reading = ReadingTraversal::new();
        assert_eq!(reading.enter(3), Some(0));
        assert!(!reading.can_prev());
        assert_eq!(reading.prev(3), None);
        assert_eq!(reading.next(3), Some(1));
        assert_eq!(reading.next(3), Some(2));
        assert!(!reading.can_next(3));
        assert_eq!(reading.next(3), None);
        assert_eq!(reading.cursor(), Some(2));
        assert_eq!(reading.prev(3), Some(1));
    }

    #[test]
    fn steps_while_off_are_ignored() {
        let mut reading = ReadingTraversal::new();
        assert_eq!(reading.next(5), None);
        assert_eq!(reading.prev(5), None);
        assert!(!reading.exit());
    }

    #[test]
    fn reentering_restarts_at_first_article() {
        let mut reading = ReadingTraversal::new();
        reading.enter(4);
        reading.next(4);
        reading.next(4);
        assert_eq!(reading.enter(4), Some(0));
    }

    #[test]
    fn selection_shrink_clamps_or_exits() {
        let mut reading = ReadingTraversal::new();
        reading.enter(3);
        reading.next(3);
        reading.next(3);
        assert_eq!(reading.on_selection_changed(2), Some(1));
        assert_eq!(reading.on_selection_changed(0), None);
        assert!(!reading.is_active());
    }

    #[test]
    fn cursor_never_leaves_range_under_any_step_sequence() {
        // Every sequence of 6 steps over selections of length 1..=4.
        for len in 1..=4usize {
            for pattern in 0..(1u32 << 6) {
                let mut reading = ReadingTraversal::new();
                reading.enter(len);
                for bit in 0..6 {
                    if pattern & (1 << bit) == 0 {
                        reading.next(len);
                    } else {
                        reading.prev(len);
                    }
                    let cursor = reading.cursor().expect("still active");
                    assert!(cursor < len, "cursor {cursor} out of range for len {len}");
                }
            }
        }
    }
}
