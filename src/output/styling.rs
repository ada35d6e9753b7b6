use std::fmt::Display;

use console::{style, StyledObject};

/// Work in flight.
pub fn pending(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn done(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

/// Messages shown to the requester when a run fails.
pub fn failure(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn muted(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn title(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}
