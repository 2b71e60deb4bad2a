use super::error::{StateError, StateResult};
use super::{event::StateTransition, AppEvent, AppState};

/// Page navigation between the photo grid, the preview overlay and the editor.
#[derive(Debug)]
pub struct StateMachine {
    state: AppState,
    transition_history: Vec<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: AppState::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn can_transition(&self, event: AppEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: AppEvent) -> Option<AppState> {
        use AppEvent::*;
        match (self.state, event) {
            (AppState::Gallery, OpenPreview) => Some(AppState::Preview),
            (AppState::Preview, OpenPreview) => Some(AppState::Preview),
            (AppState::Preview, ClosePreview) => Some(AppState::Gallery),
            (AppState::Gallery, OpenEditor) => Some(AppState::Editor),
            (AppState::Preview, OpenEditor) => Some(AppState::Editor),
            (AppState::Editor, CloseEditor) => Some(AppState::Gallery),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: AppEvent) -> StateResult<AppState> {
        tracing::debug!(from = ?self.state, event = ?event, "request state transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid state transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let record = StateTransition::new(Some(self.state), event, next);
        self.state = next;
        self.transition_history.push(record);

        Ok(self.state)
    }
}

#[cfg(test)]
impl StateMachine {
    fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
