//! JSON gesture scripts replayed against an open editor.
//!
//! ```json
//! {
//!   "available": { "width": 800, "height": 600 },
//!   "device_pixel_ratio": 2.0,
//!   "actions": [
//!     { "action": "style", "tool": "marker", "color": "#ffcc00", "size": 12 },
//!     { "action": "pointer", "kind": "down", "x": 10, "y": 10 },
//!     { "action": "pointer", "kind": "move", "x": 200, "y": 120, "pressure": 0.6 },
//!     { "action": "pointer", "kind": "up", "x": 220, "y": 130 },
//!     { "action": "key", "key": "z", "ctrl": true },
//!     { "action": "resize", "width": 400, "height": 300 }
//!   ]
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::editor::tools::{Color, ToolKind};
use crate::geometry::DisplaySize;
use crate::input::{PointerEvent, PointerTarget, ShortcutKey, ShortcutModifiers};
use crate::page::{KeyOutcome, PhotoPage};
use crate::session::EditorSession;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid gesture script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown key {0:?} at action {1}")]
    UnknownKey(String, usize),
    #[error("no editor is open to replay into")]
    NoEditor,
}

pub type ScriptResult<T> = std::result::Result<T, ScriptError>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GestureScript {
    pub available: DisplaySize,
    #[serde(default)]
    pub device_pixel_ratio: Option<f64>,
    #[serde(default)]
    pub actions: Vec<ScriptAction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptAction {
    Style {
        #[serde(default)]
        tool: Option<ToolKind>,
        #[serde(default)]
        color: Option<Color>,
        #[serde(default)]
        size: Option<f64>,
        #[serde(default)]
        opacity: Option<f64>,
    },
    Pointer(PointerEvent),
    Undo,
    Redo,
    Clear,
    Resize {
        width: u32,
        height: u32,
    },
    DevicePixelRatio {
        ratio: f64,
    },
    Key {
        key: String,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        shift: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaySummary {
    pub actions: usize,
    pub pointer_events: usize,
    pub ignored_keys: usize,
}

pub fn load_script(path: &Path) -> ScriptResult<GestureScript> {
    let contents = fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&contents)
}

pub fn parse_script(contents: &str) -> ScriptResult<GestureScript> {
    Ok(serde_json::from_str(contents)?)
}

/// `escape`, `delete`, `arrowleft`, `arrowright` or a single character.
pub fn parse_shortcut_key(name: &str) -> Option<ShortcutKey> {
    let lowered = name.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "escape" | "esc" => Some(ShortcutKey::Escape),
        "delete" | "del" => Some(ShortcutKey::Delete),
        "arrowleft" | "left" => Some(ShortcutKey::ArrowLeft),
        "arrowright" | "right" => Some(ShortcutKey::ArrowRight),
        _ => {
            let mut chars = lowered.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Some(ShortcutKey::Character(ch)),
                _ => None,
            }
        }
    }
}

impl GestureScript {
    /// Plays every action in order against the page's open editor.
    pub fn replay(
        &self,
        page: &mut PhotoPage,
        target: &mut dyn PointerTarget,
    ) -> ScriptResult<ReplaySummary> {
        let mut summary = ReplaySummary::default();
        for (index, action) in self.actions.iter().enumerate() {
            apply_action(index, action, page, target, &mut summary)?;
            summary.actions += 1;
        }
        tracing::debug!(
            actions = summary.actions,
            pointer_events = summary.pointer_events,
            "script replayed"
        );
        Ok(summary)
    }
}

fn apply_action(
    index: usize,
    action: &ScriptAction,
    page: &mut PhotoPage,
    target: &mut dyn PointerTarget,
    summary: &mut ReplaySummary,
) -> ScriptResult<()> {
    match action {
        ScriptAction::Style {
            tool,
            color,
            size,
            opacity,
        } => {
            let mut style = *page.style();
            if let Some(tool) = tool {
                style.select_tool(*tool);
            }
            if let Some(color) = color {
                style.set_color(*color);
            }
            if let Some(size) = size {
                style.set_size(*size);
            }
            if let Some(opacity) = opacity {
                style.set_opacity(*opacity);
            }
            page.set_style(style);
        }
        ScriptAction::Pointer(event) => {
            editor(page)?.handle_pointer(event, target);
            summary.pointer_events += 1;
        }
        ScriptAction::Undo => {
            editor(page)?.undo();
        }
        ScriptAction::Redo => {
            editor(page)?.redo();
        }
        ScriptAction::Clear => editor(page)?.clear_all(),
        ScriptAction::Resize { width, height } => {
            editor(page)?.resize(DisplaySize::new(*width, *height));
        }
        ScriptAction::DevicePixelRatio { ratio } => {
            editor(page)?.set_device_pixel_ratio(*ratio);
        }
        ScriptAction::Key { key, ctrl, shift } => {
            let parsed = parse_shortcut_key(key)
                .ok_or_else(|| ScriptError::UnknownKey(key.clone(), index))?;
            match page.handle_key(parsed, ShortcutModifiers::new(*ctrl, *shift)) {
                KeyOutcome::Applied(_) => {}
                outcome => {
                    tracing::debug!(index, ?outcome, "key not applied during replay");
                    summary.ignored_keys += 1;
                }
            }
        }
    }
    Ok(())
}

fn editor(page: &mut PhotoPage) -> ScriptResult<&mut EditorSession> {
    page.editor_mut().ok_or(ScriptError::NoEditor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::tools::ToolStyle;
    use crate::gallery::GalleryBrowser;
    use crate::input::{NullPointerTarget, PointerEventKind};
    use crate::source::{ImageSource, SourceResult};
    use image::{Rgba, RgbaImage};

    struct WhiteSource;

    impl ImageSource for WhiteSource {
        fn load(&self, _url: &str) -> SourceResult<RgbaImage> {
            Ok(RgbaImage::from_pixel(400, 200, Rgba([255, 255, 255, 255])))
        }
    }

    const SCRIPT: &str = r##"{
        "available": { "width": 200, "height": 200 },
        "actions": [
            { "action": "style", "tool": "marker", "color": "#00ff00", "size": 8 },
            { "action": "pointer", "kind": "down", "x": 10, "y": 10 },
            { "action": "pointer", "kind": "move", "x": 50, "y": 40, "pressure": 0.5 },
            { "action": "pointer", "kind": "up", "x": 90, "y": 60 },
            { "action": "pointer", "kind": "down", "x": 5, "y": 95 },
            { "action": "pointer", "kind": "leave", "x": 150, "y": 95 },
            { "action": "key", "key": "z", "ctrl": true },
            { "action": "key", "key": "s", "ctrl": true },
            { "action": "resize", "width": 400, "height": 400 },
            { "action": "device_pixel_ratio", "ratio": 2.0 }
        ]
    }"##;

    fn open_page() -> PhotoPage {
        let mut page = PhotoPage::new(GalleryBrowser::default(), ToolStyle::default(), 1.0);
        page.open_editor("photo.png", &WhiteSource, DisplaySize::new(200, 200))
            .unwrap();
        page
    }

    #[test]
    fn parse_script_reads_every_action_kind() {
        let script = parse_script(SCRIPT).unwrap();
        assert_eq!(script.available, DisplaySize::new(200, 200));
        assert_eq!(script.device_pixel_ratio, None);
        assert_eq!(script.actions.len(), 10);
        assert!(matches!(
            script.actions[2],
            ScriptAction::Pointer(PointerEvent {
                kind: PointerEventKind::Move,
                pressure: Some(_),
                ..
            })
        ));
        assert_eq!(
            script.actions[9],
            ScriptAction::DevicePixelRatio { ratio: 2.0 }
        );
    }

    #[test]
    fn parse_script_rejects_unknown_actions_and_bad_colors() {
        assert!(matches!(
            parse_script(r#"{"available":{"width":1,"height":1},"actions":[{"action":"rotate"}]}"#),
            Err(ScriptError::Parse(_))
        ));
        assert!(matches!(
            parse_script(
                r#"{"available":{"width":1,"height":1},"actions":[{"action":"style","color":"blue"}]}"#
            ),
            Err(ScriptError::Parse(_))
        ));
    }

    #[test]
    fn replay_drives_the_open_editor() {
        let script = parse_script(SCRIPT).unwrap();
        let mut page = open_page();
        let summary = script.replay(&mut page, &mut NullPointerTarget).unwrap();

        assert_eq!(summary.actions, 10);
        assert_eq!(summary.pointer_events, 5);
        assert_eq!(summary.ignored_keys, 1);

        let editor = page.editor().unwrap();
        assert_eq!(editor.geometry().display(), DisplaySize::new(400, 200));
        assert_eq!(editor.geometry().device_pixel_ratio(), 2.0);
        let history = editor.history();
        assert_eq!(history.committed().len(), 1);
        assert_eq!(history.redone().len(), 1);

        let stroke = &history.committed()[0];
        assert_eq!(stroke.tool, ToolKind::Marker);
        assert_eq!(stroke.color, Color::new(0, 255, 0));
        assert_eq!(stroke.size, 8.0);
        assert_eq!(stroke.points[1].x, 50.0 * 2.0);
        assert_eq!(stroke.points[1].pressure, 0.5);
    }

    #[test]
    fn replay_reports_unknown_keys_and_missing_editor() {
        let script = parse_script(
            r#"{"available":{"width":1,"height":1},"actions":[{"action":"key","key":"f13"}]}"#,
        )
        .unwrap();
        let mut page = open_page();
        assert!(matches!(
            script.replay(&mut page, &mut NullPointerTarget),
            Err(ScriptError::UnknownKey(key, 0)) if key == "f13"
        ));

        let script = parse_script(
            r#"{"available":{"width":1,"height":1},"actions":[{"action":"undo"}]}"#,
        )
        .unwrap();
        let mut closed = PhotoPage::new(GalleryBrowser::default(), ToolStyle::default(), 1.0);
        assert!(matches!(
            script.replay(&mut closed, &mut NullPointerTarget),
            Err(ScriptError::NoEditor)
        ));
    }

    #[test]
    fn parse_shortcut_key_accepts_names_and_characters() {
        assert_eq!(parse_shortcut_key("Escape"), Some(ShortcutKey::Escape));
        assert_eq!(parse_shortcut_key("ArrowRight"), Some(ShortcutKey::ArrowRight));
        assert_eq!(parse_shortcut_key("Z"), Some(ShortcutKey::Character('z')));
        assert_eq!(parse_shortcut_key("ctrl"), None);
    }

    #[test]
    fn load_script_reports_missing_file() {
        assert!(matches!(
            load_script(Path::new("/nonexistent/okol-script.json")),
            Err(ScriptError::Read { .. })
        ));
    }
}
