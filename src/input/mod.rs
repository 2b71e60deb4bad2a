mod pointer;
mod shortcut;

pub use pointer::{
    NullPointerTarget, PointerEvent, PointerEventKind, PointerTarget, PointerTargetError,
};
pub use shortcut::{
    resolve_shortcut, InputContext, ShortcutAction, ShortcutKey, ShortcutModifiers,
};
