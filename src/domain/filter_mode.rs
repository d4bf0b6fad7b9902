/// Which readings of a device are listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    #[default]
    All,
    CriticalOnly,
}

impl FilterMode {
    pub fn toggle(self) -> Self {
        match self {
            FilterMode::All => FilterMode::CriticalOnly,
            FilterMode::CriticalOnly => FilterMode::All,
        }
    }
}
