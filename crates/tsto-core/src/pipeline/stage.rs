//! Linear stage machine shared by both pipelines.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    DependenciesChecked,
    Decompiled,
    UrlsRewritten,
    Recompiled,
    Signed,
    Done,
    Failed,
}

impl Stage {
    /// The only stage that may follow `self` on the success path.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Idle => Some(Stage::DependenciesChecked),
            Stage::DependenciesChecked => Some(Stage::Decompiled),
            Stage::Decompiled => Some(Stage::UrlsRewritten),
            Stage::UrlsRewritten => Some(Stage::Recompiled),
            Stage::Recompiled => Some(Stage::Signed),
            Stage::Signed => Some(Stage::Done),
            Stage::Done | Stage::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

/// Current stage plus every stage entered, in order.
#[derive(Debug, Clone)]
pub struct StageTracker {
    current: Stage,
    history: Vec<Stage>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self {
            current: Stage::Idle,
            history: vec![Stage::Idle],
        }
    }
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    /// Moves to `to` if it is the direct successor of the current stage.
    /// Anything else is a programming error: logged, asserted in debug builds,
    /// and ignored.
    pub fn advance(&mut self, to: Stage) {
        if self.current.next() != Some(to) {
            tracing::error!(from = ?self.current, to = ?to, "invalid stage transition");
            debug_assert!(false, "invalid stage transition {:?} -> {:?}", self.current, to);
            return;
        }
        tracing::debug!(stage = ?to, "stage entered");
        self.current = to;
        self.history.push(to);
    }

    /// Enters `Failed` unless already terminal.
    pub fn fail(&mut self) {
        if self.current.is_terminal() {
            return;
        }
        self.current = Stage::Failed;
        self.history.push(Stage::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_the_success_path() {
        let mut t = StageTracker::new();
        let mut s = Stage::Idle;
        while let Some(next) = s.next() {
            t.advance(next);
            s = next;
        }
        assert_eq!(t.current(), Stage::Done);
        assert_eq!(t.history().len(), 7);
    }

    #[test]
    fn fail_is_terminal_and_sticky() {
        let mut t = StageTracker::new();
        t.advance(Stage::DependenciesChecked);
        t.fail();
        t.fail();
        assert_eq!(t.current(), Stage::Failed);
        assert_eq!(
            t.history(),
            &[Stage::Idle, Stage::DependenciesChecked, Stage::Failed]
        );
        assert!(Stage::Failed.next().is_none());
    }

    #[test]
    #[should_panic(expected = "invalid stage transition")]
    #[cfg(debug_assertions)]
    fn skipping_a_stage_is_rejected() {
        let mut t = StageTracker::new();
        t.advance(Stage::Decompiled);
    }
}
