mod draft;
mod screen;
mod synchronizer;
mod validation;

pub use draft::DraftEdit;
pub use screen::{ConfigScreen, ConfigScreenEvent, ConfigScreenHandle};
pub use synchronizer::{ConfigMode, ConfigSnapshot};
