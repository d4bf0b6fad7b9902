mod generation;
mod resolver;

pub use generation::{Generation, GenerationGuard};
pub use resolver::{Lookup, ResolutionState, Resolver};
