use crate::api::ApiError;
use crate::domain::{DeviceId, FilterMode, Reading};
use crate::resolver::{Generation, Lookup, ResolutionState, Resolver};

/// Everything that decides which listing is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingsQuery {
    pub device_id: DeviceId,
    pub filter: FilterMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadingsView {
    NoDevice,
    Loading,
    /// Shown for an unknown device and for a device without matching readings alike.
    NotFound,
    Readings(Vec<Reading>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadingsSnapshot {
    pub device_id: Option<DeviceId>,
    pub filter: FilterMode,
    pub view: ReadingsView,
}

impl Default for ReadingsSnapshot {
    fn default() -> Self {
        ReadingsSnapshot {
            device_id: None,
            filter: FilterMode::default(),
            view: ReadingsView::NoDevice,
        }
    }
}

impl ReadingsSnapshot {
    pub fn readings(&self) -> &[Reading] {
        match &self.view {
            ReadingsView::Readings(readings) => readings,
            _ => &[],
        }
    }
}

/// Readings screen state machine. The identifier and the filter both feed the lookup key,
/// so changing either one re-fetches.
#[derive(Debug, Default)]
pub struct ReadingsSynchronizer {
    device_id: Option<DeviceId>,
    filter: FilterMode,
    resolver: Resolver<ReadingsQuery, Vec<Reading>>,
}

impl ReadingsSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_device(&mut self, device_id: Option<DeviceId>) -> Option<Lookup<ReadingsQuery>> {
        if !self.resolver.is_live() {
            return None;
        }
        self.device_id = device_id;
        self.resolve()
    }

    pub fn set_filter(&mut self, filter: FilterMode) -> Option<Lookup<ReadingsQuery>> {
        if !self.resolver.is_live() {
            return None;
        }
        self.filter = filter;
        self.resolve()
    }

    pub fn toggle_filter(&mut self) -> Option<Lookup<ReadingsQuery>> {
        self.set_filter(self.filter.toggle())
    }

    fn resolve(&mut self) -> Option<Lookup<ReadingsQuery>> {
        let query = self.device_id.clone().map(|device_id| ReadingsQuery {
            device_id,
            filter: self.filter,
        });
        self.resolver.commit(query)
    }

    /// Fetches the current listing again without touching the identifier or the filter.
    pub fn refresh(&mut self) -> Option<Lookup<ReadingsQuery>> {
        self.resolver.reissue()
    }

    /// Applies a fetch result. An empty list and an unknown device both end up as
    /// [`ReadingsView::NotFound`]. Returns `false` if the result was stale.
    pub fn complete(&mut self, generation: Generation, result: Result<Vec<Reading>, ApiError>) -> bool {
        let outcome = match result {
            Ok(readings) if readings.is_empty() => Ok(None),
            Ok(readings) => Ok(Some(readings)),
            Err(error) if error.is_not_found() => Ok(None),
            Err(error) => Err(error),
        };
        self.resolver.complete(generation, outcome)
    }

    pub fn resolution(&self) -> &ResolutionState<ReadingsQuery, Vec<Reading>> {
        self.resolver.state()
    }

    pub fn view(&self) -> ReadingsView {
        match self.resolver.state() {
            ResolutionState::Idle => ReadingsView::NoDevice,
            ResolutionState::Pending(_) => ReadingsView::Loading,
            ResolutionState::Found(_, readings) => ReadingsView::Readings(readings.clone()),
            ResolutionState::NotFound(_) | ResolutionState::Failed(..) => ReadingsView::NotFound,
        }
    }

    pub fn snapshot(&self) -> ReadingsSnapshot {
        ReadingsSnapshot {
            device_id: self.device_id.clone(),
            filter: self.filter,
            view: self.view(),
        }
    }

    pub fn tear_down(&mut self) {
        self.resolver.tear_down();
    }
}
