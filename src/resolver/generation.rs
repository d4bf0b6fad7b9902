use std::fmt::{Display, Formatter};

/// Token carried by an issued request and handed back with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Generation(u64);

impl Display for Generation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Decides whether a request result may still touch visible state.
///
/// Only the most recently armed generation is accepted, and nothing is accepted
/// once the owner has been torn down.
#[derive(Debug)]
pub struct GenerationGuard {
    latest: u64,
    live: bool,
}

impl GenerationGuard {
    pub fn new() -> Self {
        GenerationGuard { latest: 0, live: true }
    }

    pub fn arm(&mut self) -> Generation {
        self.latest += 1;
        Generation(self.latest)
    }

    /// Invalidates whatever is in flight without issuing anything new.
    pub fn supersede(&mut self) {
        self.latest += 1;
    }

    pub fn accepts(&self, generation: Generation) -> bool {
        self.live && generation.0 == self.latest
    }

    pub fn tear_down(&mut self) {
        self.live = false;
    }

    pub fn is_live(&self) -> bool {
        self.live
    }
}

impl Default for GenerationGuard {
    fn default() -> Self {
        Self::new()
    }
}
