use crate::api::ApiError;
use crate::config_sync::draft::{DraftEdit, DraftForm};
use crate::config_sync::validation::ValidationError;
use crate::domain::{ConfigRequest, DeviceConfig, DeviceId};
use crate::resolver::{Generation, GenerationGuard, Lookup, ResolutionState, Resolver};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    NoDevice,
    Checking,
    EditingExisting,
    CreatingNew,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Reset,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationRequest {
    Create(ConfigRequest),
    Update(ConfigRequest),
    Reset(DeviceId),
    Delete(DeviceId),
}

impl MutationRequest {
    pub fn kind(&self) -> MutationKind {
        match self {
            MutationRequest::Create(_) => MutationKind::Create,
            MutationRequest::Update(_) => MutationKind::Update,
            MutationRequest::Reset(_) => MutationKind::Reset,
            MutationRequest::Delete(_) => MutationKind::Delete,
        }
    }
}

/// A mutation the owner has to send; its response comes back through
/// [`ConfigSynchronizer::complete_mutation`].
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub generation: Generation,
    pub request: MutationRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationResponse {
    Saved(DeviceConfig),
    Deleted,
}

#[derive(Debug)]
pub enum MutationOutcome {
    Applied(MutationKind),
    Failed(MutationKind, ApiError),
    Discarded,
}

/// What the configuration screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    pub device_id: Option<DeviceId>,
    pub mode: ConfigMode,
    pub draft: DraftForm,
    pub record: Option<DeviceConfig>,
    pub saving: bool,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        ConfigSnapshot {
            device_id: None,
            mode: ConfigMode::NoDevice,
            draft: DraftForm::default(),
            record: None,
            saving: false,
        }
    }
}

/// Configuration screen state machine: resolves the committed device, keeps the draft
/// form in step with the lookup and turns operator actions into guarded mutations.
#[derive(Debug, Default)]
pub struct ConfigSynchronizer {
    resolver: Resolver<DeviceId, DeviceConfig>,
    draft: DraftForm,
    mutations: GenerationGuard,
    in_flight: Option<(Generation, MutationKind)>,
}

impl ConfigSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ConfigMode {
        match self.resolver.state() {
            ResolutionState::Idle | ResolutionState::Failed(..) => ConfigMode::NoDevice,
            ResolutionState::Pending(_) => ConfigMode::Checking,
            ResolutionState::Found(..) => ConfigMode::EditingExisting,
            ResolutionState::NotFound(_) => ConfigMode::CreatingNew,
        }
    }

    pub fn resolution(&self) -> &ResolutionState<DeviceId, DeviceConfig> {
        self.resolver.state()
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        let record = match self.resolver.state() {
            ResolutionState::Found(_, config) => Some(config.clone()),
            _ => None,
        };

        ConfigSnapshot {
            device_id: self.resolver.committed().cloned(),
            mode: self.mode(),
            draft: self.draft.clone(),
            record,
            saving: self.in_flight.is_some(),
        }
    }

    /// Commits the debounced identifier. A different device drops any mutation still in
    /// flight; no device clears the form.
    pub fn commit(&mut self, device_id: Option<DeviceId>) -> Option<Lookup<DeviceId>> {
        if !self.resolver.is_live() || !self.resolver.accepts_commit(device_id.as_ref()) {
            return None;
        }

        self.mutations.supersede();
        self.in_flight = None;

        let lookup = self.resolver.commit(device_id);
        if matches!(self.resolver.state(), ResolutionState::Idle) {
            self.draft = DraftForm::default();
        }
        lookup
    }

    /// Applies a lookup result. Returns `false` if it was stale.
    pub fn complete_lookup(&mut self, generation: Generation, result: Result<Option<DeviceConfig>, ApiError>) -> bool {
        if !self.resolver.complete(generation, result) {
            return false;
        }

        self.draft = match self.resolver.state() {
            ResolutionState::Found(_, config) => DraftForm::from_config(config),
            _ => DraftForm::default(),
        };
        true
    }

    pub fn edit(&mut self, edit: DraftEdit) {
        self.draft.apply(edit);
    }

    /// Validates the draft and prepares a create (for a new device) or an update. A
    /// validation failure leaves every piece of state untouched. Nothing is sent while the
    /// device is still being checked, since the lookup decides both the verb and the draft.
    pub fn submit(&mut self) -> Result<Mutation, ValidationError> {
        let request = self.draft.to_request(self.resolver.committed())?;
        if self.mode() == ConfigMode::Checking {
            return Err(ValidationError::DeviceNotChecked);
        }
        let request = match self.mode() {
            ConfigMode::CreatingNew => MutationRequest::Create(request),
            _ => MutationRequest::Update(request),
        };

        Ok(self.arm(request))
    }

    /// Only offered while editing an existing configuration.
    pub fn reset(&mut self) -> Option<Mutation> {
        let device_id = self.existing_device()?;
        Some(self.arm(MutationRequest::Reset(device_id)))
    }

    /// Only offered while editing an existing configuration.
    pub fn delete(&mut self) -> Option<Mutation> {
        let device_id = self.existing_device()?;
        Some(self.arm(MutationRequest::Delete(device_id)))
    }

    fn existing_device(&self) -> Option<DeviceId> {
        if !self.resolver.is_live() || self.mode() != ConfigMode::EditingExisting {
            return None;
        }
        self.resolver.committed().cloned()
    }

    fn arm(&mut self, request: MutationRequest) -> Mutation {
        let generation = self.mutations.arm();
        self.in_flight = Some((generation, request.kind()));
        Mutation { generation, request }
    }

    pub fn complete_mutation(&mut self, generation: Generation, result: Result<MutationResponse, ApiError>) -> MutationOutcome {
        let kind = match self.in_flight {
            Some((in_flight, kind)) if in_flight == generation && self.mutations.accepts(generation) => kind,
            _ => {
                debug!(%generation, "Discarding stale mutation result");
                return MutationOutcome::Discarded;
            }
        };
        self.in_flight = None;

        match result {
            Err(error) => MutationOutcome::Failed(kind, error),
            Ok(MutationResponse::Saved(config)) => {
                if kind == MutationKind::Reset {
                    self.draft = DraftForm::from_config(&config);
                }
                self.resolver.settle(Some(config));
                MutationOutcome::Applied(kind)
            }
            Ok(MutationResponse::Deleted) => {
                self.draft = DraftForm::default();
                self.resolver.settle(None);
                MutationOutcome::Applied(kind)
            }
        }
    }

    pub fn tear_down(&mut self) {
        self.resolver.tear_down();
        self.mutations.tear_down();
    }
}
