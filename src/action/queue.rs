//! Per-entity FIFO of actions advanced by wall-clock time

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::{debug, info_span, trace, Span};

use crate::hex::HecsCoord;
use crate::util::time::seconds_between;

use super::model::Action;
use super::state::{AnimationType, ContinuousState, DiscreteState, Vec3};

/// Progress of the head action once started
#[derive(Debug, Clone, Copy)]
struct Running {
    started_at: DateTime<Utc>,
    progress: f32,
}

/// Actions waiting to play for one entity, plus where it rests.
///
/// Each `tick` starts the head action if idle, pops every head that ran
/// its duration or passed its expiration (folding its transfer into the
/// resting state), then refreshes the progress of whatever is left at
/// the head.
#[derive(Debug)]
pub struct ActionQueue {
    pending: VecDeque<Action>,
    running: Option<Running>,
    state: DiscreteState,
    span: Span,
}

impl ActionQueue {
    pub fn new(entity: &str) -> Self {
        Self::with_span(info_span!("action_queue", entity))
    }

    pub fn with_span(span: Span) -> Self {
        Self {
            pending: VecDeque::new(),
            running: None,
            state: DiscreteState::default(),
            span,
        }
    }

    pub fn add_action(&mut self, action: Action) {
        trace!(parent: &self.span, action = action.name(), queued = self.pending.len(), "Action queued");
        self.pending.push_back(action);
    }

    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self.pending.is_empty() {
            return;
        }

        if self.running.is_none() {
            self.running = Some(Running {
                started_at: now,
                progress: 0.0,
            });
        }

        while let Some(head) = self.pending.front() {
            if !self.head_done(head, now) {
                break;
            }
            if now > head.expiration() {
                debug!(parent: &self.span, action = head.name(), "Action expired, fast-forwarding");
            }
            self.state = head.transfer(&self.state);
            trace!(parent: &self.span, action = head.name(), coord = %self.state.coord, "Action complete");
            self.pending.pop_front();
            self.running = None;
        }

        if let (Some(head), Some(running)) = (self.pending.front(), self.running.as_mut()) {
            let duration = head.duration_s();
            running.progress = if duration > 0.0 {
                seconds_between(running.started_at, now) / duration
            } else {
                1.0
            };
        }
    }

    fn head_done(&self, head: &Action, now: DateTime<Utc>) -> bool {
        if now > head.expiration() {
            return true;
        }
        match self.running {
            Some(running) => seconds_between(running.started_at, now) >= head.duration_s(),
            None => false,
        }
    }

    /// Drop every pending action without applying it. The resting state
    /// is kept; progress of the in-flight action is lost.
    pub fn flush(&mut self) {
        if !self.pending.is_empty() {
            debug!(parent: &self.span, dropped = self.pending.len(), "Action queue flushed");
        }
        self.pending.clear();
        self.running = None;
    }

    pub fn is_busy(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Interpolated state of the running action, or the resting state
    pub fn continuous_state(&self) -> ContinuousState {
        match (self.pending.front(), self.running) {
            (Some(head), Some(running)) => head.interpolate(&self.state, running.progress),
            _ => self.state.project(),
        }
    }

    pub fn immediate_location(&self) -> Vec3 {
        self.continuous_state().position
    }

    pub fn immediate_heading(&self) -> f32 {
        self.continuous_state().heading_degrees
    }

    pub fn immediate_animation(&self) -> AnimationType {
        self.continuous_state().animation
    }

    /// Resting coordinate, ignoring any action still in flight
    pub fn target_location(&self) -> HecsCoord {
        self.state.coord
    }

    pub fn target_heading(&self) -> f32 {
        self.state.heading_degrees
    }

    /// Resting state as of the last completed action
    pub fn state(&self) -> &DiscreteState {
        &self.state
    }

    /// Resting state once every queued action has played out
    pub fn final_state(&self) -> DiscreteState {
        self.pending
            .iter()
            .fold(self.state, |state, action| action.transfer(&state))
    }
}
