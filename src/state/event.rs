use super::model::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    OpenPreview,
    ClosePreview,
    OpenEditor,
    CloseEditor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: Option<AppState>,
    pub event: AppEvent,
    pub to: AppState,
}

impl StateTransition {
    pub const fn new(from: Option<AppState>, event: AppEvent, to: AppState) -> Self {
        Self { from, event, to }
    }
}
