mod screen;
mod synchronizer;

pub use screen::{ReadingsScreen, ReadingsScreenEvent, ReadingsScreenHandle};
pub use synchronizer::{ReadingsSnapshot, ReadingsView};
