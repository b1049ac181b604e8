// crates/clipline-core/src/history.rs
//
// Undo / redo as tagged, self-inverting commands.
//
// Each command carries the data needed to apply and revert it against a
// Timeline, so history can be inspected in tests and never captures closures.
// Clip snapshots are refreshed whenever a clip leaves the timeline, so a redo
// after undo restores the clip with whatever previews it had gained.

use std::collections::VecDeque;

use crate::clip::{Clip, ClipId};
use crate::error::TimelineError;
use crate::timeline::Timeline;

#[derive(Clone, Debug)]
pub enum EditCommand {
    AddClip    { clip: Clip, track: usize, offset: f64 },
    RemoveClip { clip: Clip, track: usize, offset: f64 },
    MoveClip   { id: ClipId, from: (usize, f64), to: (usize, f64) },
    Zoom       { from: f64, to: f64 },
}

/// What an undo/redo step did to the timeline.
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    Added(ClipId),
    /// The clip is gone from the timeline; its name is kept for status text.
    Removed { id: ClipId, name: String },
    Moved(ClipId),
    Zoomed(f64),
}

impl EditCommand {
    fn apply(&mut self, tl: &mut Timeline) -> Result<Change, TimelineError> {
        match self {
            EditCommand::AddClip { clip, track, offset } => {
                tl.place_at(clip.clone(), *track, *offset)?;
                Ok(Change::Added(clip.id()))
            }
            EditCommand::RemoveClip { clip, .. } => take_back(tl, clip),
            EditCommand::MoveClip { id, to, .. } => {
                tl.move_clip(*id, to.0, to.1)?;
                Ok(Change::Moved(*id))
            }
            EditCommand::Zoom { to, .. } => Ok(Change::Zoomed(tl.set_zoom(*to))),
        }
    }

    fn revert(&mut self, tl: &mut Timeline) -> Result<Change, TimelineError> {
        match self {
            EditCommand::AddClip { clip, .. } => take_back(tl, clip),
            EditCommand::RemoveClip { clip, track, offset } => {
                tl.place_at(clip.clone(), *track, *offset)?;
                Ok(Change::Added(clip.id()))
            }
            EditCommand::MoveClip { id, from, .. } => {
                tl.move_clip(*id, from.0, from.1)?;
                Ok(Change::Moved(*id))
            }
            EditCommand::Zoom { from, .. } => Ok(Change::Zoomed(tl.set_zoom(*from))),
        }
    }
}

/// Remove `snapshot`'s clip from the timeline and keep the live copy as the
/// new snapshot.
fn take_back(tl: &mut Timeline, snapshot: &mut Clip) -> Result<Change, TimelineError> {
    let id   = snapshot.id();
    let live = tl.remove_clip(id).ok_or(TimelineError::ClipNotFound(id))?;
    let name = live.display_name();
    *snapshot = live;
    Ok(Change::Removed { id, name })
}

#[derive(Debug)]
pub struct History {
    undo:  VecDeque<EditCommand>,
    redo:  Vec<EditCommand>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self { undo: VecDeque::new(), redo: Vec::new(), limit: limit.max(1) }
    }

    /// Record an edit that has already been applied. Clears the redo stack.
    pub fn record(&mut self, cmd: EditCommand) {
        self.redo.clear();
        self.undo.push_back(cmd);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Revert the newest command. `Ok(None)` when there is nothing to undo.
    /// On error the timeline is unchanged and the command stays on the stack.
    pub fn undo(&mut self, tl: &mut Timeline) -> Result<Option<Change>, TimelineError> {
        let Some(mut cmd) = self.undo.pop_back() else { return Ok(None) };
        match cmd.revert(tl) {
            Ok(change) => {
                self.redo.push(cmd);
                Ok(Some(change))
            }
            Err(e) => {
                self.undo.push_back(cmd);
                Err(e)
            }
        }
    }

    /// Re-apply the most recently undone command.
    pub fn redo(&mut self, tl: &mut Timeline) -> Result<Option<Change>, TimelineError> {
        let Some(mut cmd) = self.redo.pop() else { return Ok(None) };
        match cmd.apply(tl) {
            Ok(change) => {
                self.undo.push_back(cmd);
                Ok(Some(change))
            }
            Err(e) => {
                self.redo.push(cmd);
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
