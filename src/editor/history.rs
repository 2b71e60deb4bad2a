use super::tools::Stroke;
use crate::geometry::DisplaySize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Undo,
    Redo,
}

impl HistoryAction {
    pub const fn applied_message(self) -> &'static str {
        match self {
            Self::Undo => "undo applied",
            Self::Redo => "redo applied",
        }
    }

    pub const fn empty_message(self) -> &'static str {
        match self {
            Self::Undo => "undo stack empty",
            Self::Redo => "redo stack empty",
        }
    }
}

/// Linear undo history over committed strokes.
///
/// `committed` is paint order; `redone` holds undone strokes with the most
/// recently undone one last. A stroke lives in at most one of the two.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    committed: Vec<Stroke>,
    redone: Vec<Stroke>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self) -> &[Stroke] {
        &self.committed
    }

    pub fn redone(&self) -> &[Stroke] {
        &self.redone
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.redone.is_empty()
    }

    /// Empty strokes are dropped; nothing with zero points ever reaches the stack.
    pub fn commit(&mut self, stroke: Stroke) -> bool {
        if stroke.is_empty() {
            tracing::debug!(tool = %stroke.tool, "dropping empty stroke");
            return false;
        }
        self.committed.push(stroke);
        true
    }

    /// A new edit invalidates everything that could have been redone.
    pub fn clear_redo(&mut self) {
        self.redone.clear();
    }

    pub fn undo(&mut self) -> bool {
        self.apply(HistoryAction::Undo)
    }

    pub fn redo(&mut self) -> bool {
        self.apply(HistoryAction::Redo)
    }

    /// Moves the top of the source stack onto the target stack. Returns `false` when
    /// the source is empty and nothing changed.
    pub fn apply(&mut self, action: HistoryAction) -> bool {
        let (source, target) = match action {
            HistoryAction::Undo => (&mut self.committed, &mut self.redone),
            HistoryAction::Redo => (&mut self.redone, &mut self.committed),
        };

        match source.pop() {
            Some(stroke) => {
                target.push(stroke);
                tracing::debug!(
                    committed = self.committed.len(),
                    redone = self.redone.len(),
                    "{}",
                    action.applied_message()
                );
                true
            }
            None => {
                tracing::debug!("{}", action.empty_message());
                false
            }
        }
    }

    pub fn clear(&mut self) {
        self.committed.clear();
        self.redone.clear();
    }

    /// Re-expresses every recorded point, in both stacks, relative to a new display size.
    pub fn rescale(&mut self, old_size: DisplaySize, new_size: DisplaySize) {
        let Some((scale_x, scale_y)) = rescale_factors(old_size, new_size) else {
            return;
        };
        rescale_strokes(&mut self.committed, scale_x, scale_y);
        rescale_strokes(&mut self.redone, scale_x, scale_y);
        tracing::debug!(
            from = ?old_size,
            to = ?new_size,
            strokes = self.committed.len() + self.redone.len(),
            "rescaled history"
        );
    }
}

/// Per-axis factors mapping `old_size` coordinates onto `new_size`, or `None` when
/// the two sizes agree. Zero dimensions are read as one pixel.
pub fn rescale_factors(old_size: DisplaySize, new_size: DisplaySize) -> Option<(f64, f64)> {
    let old_size = old_size.at_least_one();
    let new_size = new_size.at_least_one();
    if old_size == new_size {
        return None;
    }
    Some((
        f64::from(new_size.width) / f64::from(old_size.width),
        f64::from(new_size.height) / f64::from(old_size.height),
    ))
}

pub fn rescale_strokes(strokes: &mut [Stroke], scale_x: f64, scale_y: f64) {
    for stroke in strokes {
        stroke.scale_points(scale_x, scale_y);
    }
}
