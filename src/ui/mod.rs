//! Terminal feedback for the translate and config commands.

mod spinner;
mod theme;

pub use spinner::Spinner;
pub use theme::Style;
