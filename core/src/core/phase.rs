// tapir/src/core/phase.rs

//! The five fixed lifecycle phases and the capability set a plugin declares.

use std::fmt;

/// Lifecycle phases, in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
  /// Fired once before all tasks. May transform the whole task set.
  Load,
  /// Fired once before all tasks. Builds the shared `StartData`.
  Start,
  /// Fired for each task.
  Run,
  /// Fired for each task after `Run`, whether it failed or not.
  Complete,
  /// Fired once after every task completed.
  End,
}

impl Phase {
  pub const ALL: [Phase; 5] = [Phase::Load, Phase::Start, Phase::Run, Phase::Complete, Phase::End];

  pub(crate) fn index(self) -> usize {
    match self {
      Phase::Load => 0,
      Phase::Start => 1,
      Phase::Run => 2,
      Phase::Complete => 3,
      Phase::End => 4,
    }
  }
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Phase::Load => "load",
      Phase::Start => "start",
      Phase::Run => "run",
      Phase::Complete => "complete",
      Phase::End => "end",
    };
    f.write_str(name)
  }
}

/// Set of phases a plugin has handlers for.
///
/// Read once when plugins are loaded to build the per-phase dispatch table.
/// Handlers of phases outside the set are never called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseSet(u8);

impl PhaseSet {
  pub const NONE: PhaseSet = PhaseSet(0);

  pub const fn with(self, phase: Phase) -> Self {
    let bit = match phase {
      Phase::Load => 1,
      Phase::Start => 1 << 1,
      Phase::Run => 1 << 2,
      Phase::Complete => 1 << 3,
      Phase::End => 1 << 4,
    };
    PhaseSet(self.0 | bit)
  }

  pub fn of(phases: &[Phase]) -> Self {
    phases.iter().fold(PhaseSet::NONE, |set, phase| set.with(*phase))
  }

  pub fn contains(&self, phase: Phase) -> bool {
    PhaseSet::NONE.with(phase).0 & self.0 != 0
  }

  pub fn is_empty(&self) -> bool {
    self.0 == 0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn phase_set_membership() {
    let set = PhaseSet::NONE.with(Phase::Start).with(Phase::End);
    assert!(set.contains(Phase::Start));
    assert!(set.contains(Phase::End));
    assert!(!set.contains(Phase::Run));
    assert_eq!(set, PhaseSet::of(&[Phase::End, Phase::Start]));
    assert!(PhaseSet::NONE.is_empty());
  }
}
