use crate::editor::tools::ToolKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKey {
    Character(char),
    Escape,
    Delete,
    ArrowLeft,
    ArrowRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortcutModifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl ShortcutModifiers {
    pub const fn new(ctrl: bool, shift: bool) -> Self {
        Self { ctrl, shift }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputContext {
    pub stroke_in_progress: bool,
    pub in_editor: bool,
    pub in_preview: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    EditorUndo,
    EditorRedo,
    EditorSave,
    EditorClearAll,
    EditorSelectTool(ToolKind),
    EditorCloseRequested,
    PreviewNext,
    PreviewPrevious,
    PreviewEdit,
    PreviewClose,
}

fn resolve_editor_tool_shortcut(key: ShortcutKey) -> Option<ShortcutAction> {
    let tool = match key {
        ShortcutKey::Character('p') => ToolKind::Pen,
        ShortcutKey::Character('m') => ToolKind::Marker,
        ShortcutKey::Character('b') => ToolKind::Brush,
        ShortcutKey::Character('s') => ToolKind::Shadow,
        ShortcutKey::Character('a') => ToolKind::Spray,
        _ => return None,
    };
    Some(ShortcutAction::EditorSelectTool(tool))
}

fn resolve_editor_shortcut(key: ShortcutKey, modifiers: ShortcutModifiers) -> Option<ShortcutAction> {
    match (key, modifiers.ctrl, modifiers.shift) {
        (ShortcutKey::Character('z'), true, false) => Some(ShortcutAction::EditorUndo),
        (ShortcutKey::Character('z'), true, true) | (ShortcutKey::Character('y'), true, false) => {
            Some(ShortcutAction::EditorRedo)
        }
        (ShortcutKey::Character('s'), true, _) => Some(ShortcutAction::EditorSave),
        (ShortcutKey::Delete, true, _) => Some(ShortcutAction::EditorClearAll),
        (ShortcutKey::Escape, _, _) => Some(ShortcutAction::EditorCloseRequested),
        (_, false, false) => resolve_editor_tool_shortcut(key),
        _ => None,
    }
}

fn resolve_preview_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
) -> Option<ShortcutAction> {
    match (key, modifiers.ctrl, modifiers.shift) {
        (ShortcutKey::ArrowRight, false, false) => Some(ShortcutAction::PreviewNext),
        (ShortcutKey::ArrowLeft, false, false) => Some(ShortcutAction::PreviewPrevious),
        (ShortcutKey::Character('e'), false, false) => Some(ShortcutAction::PreviewEdit),
        (ShortcutKey::Escape, false, false) => Some(ShortcutAction::PreviewClose),
        _ => None,
    }
}

/// Maps a key press to an action for the active view. Nothing resolves while a
/// stroke is being drawn; the gesture has to end first.
pub fn resolve_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
    context: InputContext,
) -> Option<ShortcutAction> {
    if context.stroke_in_progress {
        return None;
    }

    if context.in_editor {
        return resolve_editor_shortcut(key, modifiers);
    }

    if context.in_preview {
        return resolve_preview_shortcut(key, modifiers);
    }

    None
}
