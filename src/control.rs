//! Raw mode decision and the debounced mode state machine.

use std::collections::VecDeque;

use crate::{
    gesture::GestureFlags,
    types::{ControlMode, GestureCategory},
};

/// What the rules see for the primary hand on one frame.
#[derive(Clone, Copy, Debug)]
pub struct RuleInput {
    pub category: Option<GestureCategory>,
    pub flags: GestureFlags,
}

pub struct ModeRule {
    pub name: &'static str,
    pub decide: fn(&RuleInput) -> Option<ControlMode>,
}

/// Evaluated top to bottom; the first rule that answers wins. External labels
/// come first because they beat geometric inference.
pub const MODE_RULES: &[ModeRule] = &[
    ModeRule {
        name: "label:closed_fist",
        decide: |input| {
            (input.category == Some(GestureCategory::ClosedFist)).then_some(ControlMode::Idle)
        },
    },
    ModeRule {
        name: "label:open_palm",
        decide: |input| {
            (input.category == Some(GestureCategory::OpenPalm)).then_some(ControlMode::Fireworks)
        },
    },
    ModeRule {
        name: "label:pointing_up",
        decide: |input| {
            (input.category == Some(GestureCategory::PointingUp)).then_some(ControlMode::Panning)
        },
    },
    ModeRule {
        name: "close_pinch",
        decide: |input| input.flags.close_pinch.then_some(ControlMode::ZoomOut),
    },
    ModeRule {
        name: "spread",
        decide: |input| input.flags.spread.then_some(ControlMode::ZoomIn),
    },
    ModeRule {
        name: "pointing_up",
        decide: |input| input.flags.pointing_up.then_some(ControlMode::Panning),
    },
    ModeRule {
        name: "open_palm",
        decide: |input| input.flags.open_palm.then_some(ControlMode::Fireworks),
    },
];

/// Mode suggested by this frame alone, before debouncing.
pub fn detect_raw_mode(input: &RuleInput) -> ControlMode {
    for rule in MODE_RULES {
        if let Some(mode) = (rule.decide)(input) {
            log::trace!("raw mode {mode} from rule {}", rule.name);
            return mode;
        }
    }
    ControlMode::Idle
}

/// Fixed-capacity window of the most recent raw decisions.
#[derive(Clone, Debug)]
pub struct Debouncer {
    window: usize,
    history: VecDeque<ControlMode>,
}

impl Debouncer {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            history: VecDeque::with_capacity(window),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Records `detected` and returns it once the whole window agrees.
    pub fn push(&mut self, detected: ControlMode) -> Option<ControlMode> {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(detected);

        let full = self.history.len() == self.window;
        (full && self.history.iter().all(|&mode| mode == detected)).then_some(detected)
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

/// Holds the committed mode; only a unanimous debounce window, or loss of
/// tracking, changes it.
#[derive(Clone, Debug)]
pub struct ModeStateMachine {
    current: ControlMode,
    debouncer: Debouncer,
}

impl ModeStateMachine {
    pub fn new(debounce_frames: usize) -> Self {
        Self {
            current: ControlMode::Idle,
            debouncer: Debouncer::new(debounce_frames),
        }
    }

    pub fn current(&self) -> ControlMode {
        self.current
    }

    /// Feeds one raw decision. Returns the new mode when a switch committed.
    pub fn observe(&mut self, raw: ControlMode) -> Option<ControlMode> {
        match self.debouncer.push(raw) {
            Some(stable) if stable != self.current => {
                log::info!("control mode {} -> {}", self.current, stable);
                self.current = stable;
                Some(stable)
            }
            _ => None,
        }
    }

    /// Tracking lost: commit IDLE immediately and forget the window.
    pub fn force_idle(&mut self) -> Option<ControlMode> {
        self.debouncer.clear();
        if self.current == ControlMode::Idle {
            return None;
        }
        log::info!("control mode {} -> IDLE (no hands)", self.current);
        self.current = ControlMode::Idle;
        Some(ControlMode::Idle)
    }

    pub fn reset(&mut self) {
        self.debouncer.clear();
        self.current = ControlMode::Idle;
    }
}
