//! The photo page: gallery grid, preview overlay and the editor, driven by the
//! page state machine and keyboard shortcuts.

use crate::editor::tools::ToolStyle;
use crate::gallery::GalleryBrowser;
use crate::geometry::DisplaySize;
use crate::input::{
    resolve_shortcut, InputContext, PointerTarget, ShortcutAction, ShortcutKey, ShortcutModifiers,
};
use crate::session::EditorSession;
use crate::source::ImageSource;
use crate::state::{AppEvent, AppState, StateMachine, StateResult};

/// What became of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Applied(ShortcutAction),
    /// Needs a collaborator the page does not own (export, teardown, photo
    /// loading); the host completes it.
    Deferred(ShortcutAction),
}

#[derive(Debug)]
pub struct PhotoPage {
    state: StateMachine,
    gallery: GalleryBrowser,
    editor: Option<EditorSession>,
    style: ToolStyle,
    device_pixel_ratio: f64,
}

impl PhotoPage {
    pub fn new(gallery: GalleryBrowser, style: ToolStyle, device_pixel_ratio: f64) -> Self {
        Self {
            state: StateMachine::new(),
            gallery,
            editor: None,
            style,
            device_pixel_ratio,
        }
    }

    pub fn state(&self) -> AppState {
        self.state.state()
    }

    pub fn gallery(&self) -> &GalleryBrowser {
        &self.gallery
    }

    pub fn editor(&self) -> Option<&EditorSession> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut EditorSession> {
        self.editor.as_mut()
    }

    pub fn style(&self) -> &ToolStyle {
        &self.style
    }

    /// Updates the selected style for this and every later editor session.
    pub fn set_style(&mut self, style: ToolStyle) {
        self.style = style;
        if let Some(editor) = self.editor.as_mut() {
            editor.set_style(style);
        }
    }

    pub fn open_preview(&mut self, photo: &str) -> StateResult<()> {
        self.state.transition(AppEvent::OpenPreview)?;
        self.gallery.open_preview(photo);
        Ok(())
    }

    pub fn close_preview(&mut self) -> StateResult<()> {
        self.state.transition(AppEvent::ClosePreview)?;
        self.gallery.close_preview();
        Ok(())
    }

    pub fn next_photo(&mut self) -> Option<&str> {
        if self.state() != AppState::Preview {
            return None;
        }
        self.gallery.next_photo()
    }

    pub fn prev_photo(&mut self) -> Option<&str> {
        if self.state() != AppState::Preview {
            return None;
        }
        self.gallery.prev_photo()
    }

    /// Opens `photo` in a fresh editor session. The preview overlay closes.
    pub fn open_editor(
        &mut self,
        photo: &str,
        source: &dyn ImageSource,
        available: DisplaySize,
    ) -> StateResult<&mut EditorSession> {
        self.state.transition(AppEvent::OpenEditor)?;
        self.gallery.close_preview();
        let session = EditorSession::open(
            photo,
            source,
            available,
            self.device_pixel_ratio,
            self.style,
        );
        Ok(self.editor.insert(session))
    }

    /// Discards the editor session and everything drawn in it.
    pub fn close_editor(&mut self, target: &mut dyn PointerTarget) -> StateResult<()> {
        self.state.transition(AppEvent::CloseEditor)?;
        if let Some(session) = self.editor.take() {
            session.close(target);
        }
        Ok(())
    }

    pub fn input_context(&self) -> InputContext {
        InputContext {
            stroke_in_progress: self.editor.as_ref().is_some_and(EditorSession::is_drawing),
            in_editor: self.state() == AppState::Editor,
            in_preview: self.state() == AppState::Preview,
        }
    }

    pub fn handle_key(&mut self, key: ShortcutKey, modifiers: ShortcutModifiers) -> KeyOutcome {
        let Some(action) = resolve_shortcut(key, modifiers, self.input_context()) else {
            return KeyOutcome::Ignored;
        };
        tracing::debug!(?action, "shortcut resolved");
        self.apply_shortcut(action)
    }

    fn apply_shortcut(&mut self, action: ShortcutAction) -> KeyOutcome {
        match action {
            ShortcutAction::EditorUndo => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.undo();
                }
            }
            ShortcutAction::EditorRedo => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.redo();
                }
            }
            ShortcutAction::EditorClearAll => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.clear_all();
                }
            }
            ShortcutAction::EditorSelectTool(tool) => {
                let mut style = self.style;
                style.select_tool(tool);
                self.set_style(style);
            }
            ShortcutAction::PreviewNext => {
                self.next_photo();
            }
            ShortcutAction::PreviewPrevious => {
                self.prev_photo();
            }
            ShortcutAction::PreviewClose => {
                if let Err(err) = self.close_preview() {
                    tracing::warn!(%err, "preview close shortcut rejected");
                    return KeyOutcome::Ignored;
                }
            }
            ShortcutAction::EditorSave
            | ShortcutAction::EditorCloseRequested
            | ShortcutAction::PreviewEdit => return KeyOutcome::Deferred(action),
        }
        KeyOutcome::Applied(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::tools::ToolKind;
    use crate::input::{NullPointerTarget, PointerEvent};
    use crate::source::{SourceError, SourceResult};
    use image::{Rgba, RgbaImage};

    struct SolidSource;

    impl ImageSource for SolidSource {
        fn load(&self, url: &str) -> SourceResult<RgbaImage> {
            if url.ends_with(".png") {
                Ok(RgbaImage::from_pixel(40, 20, Rgba([255, 255, 255, 255])))
            } else {
                Err(SourceError::EmptyPath {
                    url: url.to_string(),
                })
            }
        }
    }

    fn page() -> PhotoPage {
        let gallery = GalleryBrowser::new(vec![
            "http://host/uploads/a.png".to_string(),
            "http://host/uploads/b.png".to_string(),
        ]);
        PhotoPage::new(gallery, ToolStyle::default(), 1.0)
    }

    fn ctrl() -> ShortcutModifiers {
        ShortcutModifiers::new(true, false)
    }

    #[test]
    fn preview_navigation_follows_page_state() {
        let mut page = page();
        assert_eq!(page.next_photo(), None);

        page.open_preview("http://host/uploads/a.png").unwrap();
        assert_eq!(page.state(), AppState::Preview);
        assert_eq!(
            page.handle_key(ShortcutKey::ArrowRight, ShortcutModifiers::default()),
            KeyOutcome::Applied(ShortcutAction::PreviewNext)
        );
        assert_eq!(page.gallery().current_index(), Some(1));

        assert_eq!(
            page.handle_key(ShortcutKey::Escape, ShortcutModifiers::default()),
            KeyOutcome::Applied(ShortcutAction::PreviewClose)
        );
        assert_eq!(page.state(), AppState::Gallery);
        assert_eq!(page.gallery().preview(), None);
    }

    #[test]
    fn editor_lifecycle_runs_through_state_machine() {
        let mut page = page();
        page.open_preview("http://host/uploads/b.png").unwrap();
        assert_eq!(
            page.handle_key(ShortcutKey::Character('e'), ShortcutModifiers::default()),
            KeyOutcome::Deferred(ShortcutAction::PreviewEdit)
        );

        let editor = page
            .open_editor("http://host/uploads/b.png", &SolidSource, DisplaySize::new(40, 40))
            .unwrap();
        assert_eq!(editor.geometry().display(), DisplaySize::new(40, 20));
        assert_eq!(page.state(), AppState::Editor);
        assert_eq!(page.gallery().preview(), None);
        assert!(page.close_preview().is_err());

        page.close_editor(&mut NullPointerTarget).unwrap();
        assert_eq!(page.state(), AppState::Gallery);
        assert!(page.editor().is_none());
        assert!(page.close_editor(&mut NullPointerTarget).is_err());
    }

    #[test]
    fn editor_shortcuts_drive_the_session() {
        let mut page = page();
        page.open_editor("a.png", &SolidSource, DisplaySize::new(40, 20))
            .unwrap();
        let mut target = NullPointerTarget;
        {
            let editor = page.editor_mut().unwrap();
            editor.handle_pointer(&PointerEvent::down(5.0, 5.0), &mut target);
            editor.handle_pointer(&PointerEvent::up(30.0, 10.0), &mut target);
        }

        page.handle_key(ShortcutKey::Character('z'), ctrl());
        assert!(page.editor().unwrap().history().committed().is_empty());
        page.handle_key(ShortcutKey::Character('y'), ctrl());
        assert_eq!(page.editor().unwrap().history().committed().len(), 1);

        assert_eq!(
            page.handle_key(ShortcutKey::Character('b'), ShortcutModifiers::default()),
            KeyOutcome::Applied(ShortcutAction::EditorSelectTool(ToolKind::Brush))
        );
        assert_eq!(page.style().tool, ToolKind::Brush);
        assert_eq!(page.editor().unwrap().style().tool, ToolKind::Brush);

        assert_eq!(
            page.handle_key(ShortcutKey::Character('s'), ctrl()),
            KeyOutcome::Deferred(ShortcutAction::EditorSave)
        );

        page.handle_key(ShortcutKey::Delete, ctrl());
        assert!(page.editor().unwrap().history().is_empty());
    }

    #[test]
    fn keys_are_ignored_mid_stroke() {
        let mut page = page();
        page.open_editor("a.png", &SolidSource, DisplaySize::new(40, 20))
            .unwrap()
            .handle_pointer(&PointerEvent::down(5.0, 5.0), &mut NullPointerTarget);
        assert!(page.input_context().stroke_in_progress);
        assert_eq!(
            page.handle_key(ShortcutKey::Character('z'), ctrl()),
            KeyOutcome::Ignored
        );
    }

    #[test]
    fn style_persists_into_next_editor_session() {
        let mut page = page();
        page.handle_key(ShortcutKey::Character('m'), ShortcutModifiers::default());
        assert_eq!(page.style().tool, ToolKind::Pen);

        page.open_editor("a.png", &SolidSource, DisplaySize::new(40, 20))
            .unwrap();
        page.handle_key(ShortcutKey::Character('m'), ShortcutModifiers::default());
        page.close_editor(&mut NullPointerTarget).unwrap();

        let editor = page
            .open_editor("b.png", &SolidSource, DisplaySize::new(40, 20))
            .unwrap();
        assert_eq!(editor.style().tool, ToolKind::Marker);
    }
}
