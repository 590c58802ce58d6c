//! Turning a noisy per-frame letter signal into typed text.
//!
//! A letter is only typed after it has been held steadily for longer than the hold duration. Once
//! typed, the held letter is forgotten, so holding the same sign keeps typing it only once per
//! hold period.
use std::time::{Duration, Instant};

use crate::stats::STATS;

/// Default time a letter has to be held before it is typed.
pub const DEFAULT_HOLD: Duration = Duration::from_millis(1500);

#[derive(Debug)]
pub struct LetterDebouncer {
    previous_letter: Option<char>,
    last_letter_time: Instant,
    hold: Duration,
}

impl LetterDebouncer {
    pub fn new(hold: Duration, now: Instant) -> Self {
        Self {
            previous_letter: None,
            last_letter_time: now,
            hold,
        }
    }

    /// Letter currently held, if any.
    pub fn previous_letter(&self) -> Option<char> {
        self.previous_letter
    }

    /// Feed the letter of the current frame and return a letter to type, if any.
    pub fn observe(&mut self, letter: Option<char>, now: Instant) -> Option<char> {
        let letter = letter?;

        if Some(letter) != self.previous_letter {
            // New candidate, start the hold timer
            self.previous_letter = Some(letter);
            self.last_letter_time = now;
            return None;
        }

        if now.saturating_duration_since(self.last_letter_time) > self.hold {
            self.previous_letter = None;
            self.last_letter_time = now;
            return Some(letter);
        }

        None
    }
}

/// Edit commands for the recognized text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditCommand {
    Clear,
    Space,
    Backspace,
}

impl EditCommand {
    /// Map the keys `c`, `s` and `b` to commands.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "c" => Some(Self::Clear),
            "s" => Some(Self::Space),
            "b" => Some(Self::Backspace),
            _ => None,
        }
    }

    pub fn apply(self, text: &mut String) {
        match self {
            Self::Clear => text.clear(),
            Self::Space => text.push(' '),
            Self::Backspace => {
                text.pop();
            }
        }
    }
}

/// Process-wide session state: the debouncer and the text typed so far.
#[derive(Debug)]
pub struct Session {
    debouncer: LetterDebouncer,
    recognized_text: String,
}

impl Session {
    pub fn new(hold: Duration) -> Self {
        Self {
            debouncer: LetterDebouncer::new(hold, Instant::now()),
            recognized_text: String::new(),
        }
    }

    /// Feed the letter detected on a frame, appending it to the text once it is confirmed.
    pub fn observe(&mut self, letter: Option<char>, now: Instant) -> Option<char> {
        let typed = self.debouncer.observe(letter, now);
        if let Some(typed) = typed {
            log::info!("Typed letter {}", typed);
            STATS.tick_typed();
            self.recognized_text.push(typed);
        }

        typed
    }

    pub fn apply(&mut self, command: EditCommand) {
        command.apply(&mut self.recognized_text);
    }

    pub fn previous_letter(&self) -> Option<char> {
        self.debouncer.previous_letter()
    }

    pub fn recognized_text(&self) -> &str {
        &self.recognized_text
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn at(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    #[test]
    fn test_held_letter_is_typed() {
        let start = Instant::now();
        let mut session = Session::default();

        assert_eq!(session.observe(Some('A'), at(start, 0)), None);
        assert_eq!(session.previous_letter(), Some('A'));

        assert_eq!(session.observe(Some('A'), at(start, 1600)), Some('A'));
        assert_eq!(session.recognized_text(), "A");
        assert_eq!(session.previous_letter(), None);
    }

    #[test]
    fn test_short_hold_is_not_typed() {
        let start = Instant::now();
        let mut session = Session::default();

        session.observe(Some('A'), at(start, 0));
        assert_eq!(session.observe(Some('A'), at(start, 1000)), None);
        assert_eq!(session.recognized_text(), "");
        assert_eq!(session.previous_letter(), Some('A'));
    }

    #[test]
    fn test_exact_hold_duration_is_not_enough() {
        let start = Instant::now();
        let mut debouncer = LetterDebouncer::new(DEFAULT_HOLD, start);

        debouncer.observe(Some('A'), at(start, 0));
        assert_eq!(debouncer.observe(Some('A'), at(start, 1500)), None);
        assert_eq!(debouncer.observe(Some('A'), at(start, 1501)), Some('A'));
    }

    #[test]
    fn test_new_letter_resets_timer() {
        let start = Instant::now();
        let mut session = Session::default();

        session.observe(Some('A'), at(start, 0));
        assert_eq!(session.observe(Some('B'), at(start, 1000)), None);
        assert_eq!(session.previous_letter(), Some('B'));

        // Measured from the switch to B, not from A
        assert_eq!(session.observe(Some('B'), at(start, 2000)), None);
        assert_eq!(session.observe(Some('B'), at(start, 2600)), Some('B'));
        assert_eq!(session.recognized_text(), "B");
    }

    #[test]
    fn test_no_letter_changes_nothing() {
        let start = Instant::now();
        let mut session = Session::default();

        session.observe(Some('A'), at(start, 0));
        assert_eq!(session.observe(None, at(start, 1000)), None);
        assert_eq!(session.previous_letter(), Some('A'));

        // The gap does not reset the hold timer
        assert_eq!(session.observe(Some('A'), at(start, 1600)), Some('A'));

        // Nothing held, nothing to type no matter how long
        assert_eq!(session.observe(None, at(start, 10_000)), None);
        assert_eq!(session.recognized_text(), "A");
    }

    #[test]
    fn test_continuous_hold_types_once_per_period() {
        let start = Instant::now();
        let mut session = Session::default();

        // One frame every 100ms for 5 seconds of the same sign
        let typed: Vec<char> = (0..=50)
            .filter_map(|i| session.observe(Some('L'), at(start, i * 100)))
            .collect();

        // Typed at 1.6s, re-armed at 1.7s, typed at 3.3s, re-armed at 3.4s, typed at 5.0s
        assert_eq!(typed, vec!['L', 'L', 'L']);
        assert_eq!(session.recognized_text(), "LLL");
    }

    #[test]
    fn test_edit_commands() {
        let mut text = String::from("HELLO");
        EditCommand::Clear.apply(&mut text);
        assert_eq!(text, "");

        let mut text = String::from("HI");
        EditCommand::Space.apply(&mut text);
        assert_eq!(text, "HI ");

        let mut text = String::from("HI");
        EditCommand::Backspace.apply(&mut text);
        assert_eq!(text, "H");

        let mut text = String::new();
        EditCommand::Backspace.apply(&mut text);
        assert_eq!(text, "");
    }

    #[test]
    fn test_edit_command_keys() {
        assert_eq!(EditCommand::from_key("c"), Some(EditCommand::Clear));
        assert_eq!(EditCommand::from_key("s"), Some(EditCommand::Space));
        assert_eq!(EditCommand::from_key("b"), Some(EditCommand::Backspace));
        assert_eq!(EditCommand::from_key("x"), None);
        assert_eq!(EditCommand::from_key("C"), None);
    }

    #[test]
    fn test_session_edit_after_typing() {
        let start = Instant::now();
        let mut session = Session::default();

        session.observe(Some('H'), at(start, 0));
        session.observe(Some('H'), at(start, 1600));
        session.apply(EditCommand::Space);
        session.apply(EditCommand::Backspace);
        session.apply(EditCommand::Backspace);
        assert_eq!(session.recognized_text(), "");
    }
}
