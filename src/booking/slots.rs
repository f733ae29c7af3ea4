use crate::timing::time_label::TimeLabel;

use super::{error::BookingError, window::Window};

/// Every half-hour mark from `window.start()` through `window.finish()` inclusive.
///
/// Always returns `finish - start + 1` labels in catalogue order. A zero-length window
/// yields its single label.
pub fn expand(window: &Window) -> Vec<TimeLabel> {
    let start = window.start().position();
    let finish = window.finish().position();
    TimeLabel::all().skip(start).take(finish + 1 - start).collect()
}

/// Expand a window given as raw labels, e.g. straight from a stored row.
///
/// A label outside the catalogue is an error, never a shorter or empty result.
pub fn expand_labels(start: &str, finish: &str) -> Result<Vec<TimeLabel>, BookingError> {
    let window = Window::from_labels(start, finish)?;
    Ok(expand(&window))
}

/// Check that a user's choice is one of the slots they were offered.
pub fn confirm_choice(slots: &[TimeLabel], choice: &str) -> Result<TimeLabel, BookingError> {
    slots
        .iter()
        .copied()
        .find(|slot| slot.as_str() == choice)
        .ok_or_else(|| BookingError::ChoiceOutsideWindow(choice.to_string()))
}
