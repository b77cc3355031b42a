use api_types::FlexEvent;

/// Which table currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Feeders,
    Events,
    Ders,
}

impl View {
    pub fn next(self) -> Self {
        match self {
            Self::Feeders => Self::Events,
            Self::Events => Self::Ders,
            Self::Ders => Self::Feeders,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Feeders => "Feeders",
            Self::Events => "Flexibility events",
            Self::Ders => "Available DERs",
        }
    }
}

#[derive(Debug, Clone)]
pub enum AppState {
    Normal,
    FeederDetail,
    EventDetail(FlexEvent),
}

#[derive(Debug, Clone)]
pub enum RefreshEvent {
    Tick,
}
