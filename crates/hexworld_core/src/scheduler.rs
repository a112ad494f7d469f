//! Turn sequencing.
//!
//! The scheduler decides *which* unit steps *when*; it never touches the
//! grid itself. Each step is delegated to a caller-supplied primitive, and
//! suspension between steps is expressed as a poll-driven state machine:
//!
//! ```text
//! Idle -> Stepping(a) -> Waiting(a) -> Stepping(a) -> ... -> Stepping(b) -> ... -> Idle
//! ```
//!
//! [`TurnScheduler::poll`] runs steps until the primitive reports more steps
//! pending *and* the animation signal is playing, then returns
//! [`MovePoll::Pending`]. The caller polls again on its next frame. No
//! timers, threads or global flags are involved: the signal is passed in on
//! every poll.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, WorldError};
use crate::unit::{StepOutcome, UnitId, UnitMoved};

/// "Is an animation currently playing", owned by the view layer.
pub trait AnimationSignal {
    /// Whether the scheduler must keep waiting.
    fn is_playing(&self) -> bool;
}

impl AnimationSignal for bool {
    fn is_playing(&self) -> bool {
        *self
    }
}

impl AnimationSignal for Cell<bool> {
    fn is_playing(&self) -> bool {
        self.get()
    }
}

impl AnimationSignal for AtomicBool {
    fn is_playing(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<T: AnimationSignal + ?Sized> AnimationSignal for &T {
    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }
}

impl<T: AnimationSignal + ?Sized> AnimationSignal for Rc<T> {
    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }
}

/// Receives one notification per completed step.
pub trait MoveListener {
    /// Called exactly once for every step, in step order.
    fn on_unit_moved(&mut self, event: &UnitMoved);
}

impl MoveListener for Vec<UnitMoved> {
    fn on_unit_moved(&mut self, event: &UnitMoved) {
        self.push(*event);
    }
}

impl<T: MoveListener + ?Sized> MoveListener for Rc<RefCell<T>> {
    fn on_unit_moved(&mut self, event: &UnitMoved) {
        self.borrow_mut().on_unit_moved(event);
    }
}

/// A unit whose move sequence ended in an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRefusal {
    /// Refused unit.
    pub unit: UnitId,
    /// Why.
    pub reason: WorldError,
}

/// Everything that happened during one move sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveReport {
    /// Completed steps in order.
    pub steps: Vec<UnitMoved>,
    /// At most one refusal per unit.
    pub refusals: Vec<MoveRefusal>,
}

/// Result of [`TurnScheduler::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovePoll {
    /// No sequence is running.
    Idle,
    /// Suspended on the animation signal while this unit has steps left.
    Pending(UnitId),
    /// The sequence finished during this poll.
    Complete(MoveReport),
}

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// No sequence is running.
    Idle,
    /// The unit's next step will run on the next poll.
    Stepping(UnitId),
    /// The unit is waiting for the animation signal to clear.
    Waiting(UnitId),
}

#[derive(Debug)]
struct Sequence {
    queue: VecDeque<UnitId>,
    current: Option<UnitId>,
    waiting: bool,
    report: MoveReport,
}

impl Sequence {
    fn new(units: impl IntoIterator<Item = UnitId>) -> Self {
        Self {
            queue: units.into_iter().collect(),
            current: None,
            waiting: false,
            report: MoveReport::default(),
        }
    }

    fn current_or_next(&mut self) -> Option<UnitId> {
        if self.current.is_none() {
            self.current = self.queue.pop_front();
        }
        self.current
    }

    fn finish_unit(&mut self) {
        self.current = None;
        self.waiting = false;
    }
}

/// Registry of units taking part in turns, plus the active move sequence.
#[derive(Default)]
pub struct TurnScheduler {
    registry: BTreeSet<UnitId>,
    sequence: Option<Sequence>,
    listeners: Vec<Box<dyn MoveListener>>,
}

impl fmt::Debug for TurnScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnScheduler")
            .field("registry", &self.registry)
            .field("phase", &self.phase())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TurnScheduler {
    /// Empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit. Returns `false` if it was already registered.
    pub fn register(&mut self, unit: UnitId) -> bool {
        self.registry.insert(unit)
    }

    /// Remove a unit. An active sequence keeps its snapshot; the unit will
    /// be refused when its turn comes.
    pub fn unregister(&mut self, unit: UnitId) -> bool {
        self.registry.remove(&unit)
    }

    /// Whether a unit is registered.
    #[must_use]
    pub fn contains(&self, unit: UnitId) -> bool {
        self.registry.contains(&unit)
    }

    /// Registered units, ascending id.
    pub fn registered(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.registry.iter().copied()
    }

    /// Number of registered units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no unit is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Subscribe to step notifications.
    pub fn add_listener(&mut self, listener: Box<dyn MoveListener>) {
        self.listeners.push(listener);
    }

    /// Whether a move sequence is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.sequence.is_some()
    }

    /// Current state.
    #[must_use]
    pub fn phase(&self) -> SchedulerPhase {
        let Some(sequence) = &self.sequence else {
            return SchedulerPhase::Idle;
        };
        match sequence.current.or_else(|| sequence.queue.front().copied()) {
            Some(unit) if sequence.waiting => SchedulerPhase::Waiting(unit),
            Some(unit) => SchedulerPhase::Stepping(unit),
            None => SchedulerPhase::Idle,
        }
    }

    /// Apply `reset` to every registered unit.
    ///
    /// Failures are collected and returned; one bad unit never stops the
    /// others from being reset.
    ///
    /// # Errors
    ///
    /// [`WorldError::MovesInProgress`] while a sequence is running, so that
    /// every reset lands before the next turn's first step.
    pub fn end_turn<F>(&mut self, mut reset: F) -> Result<Vec<(UnitId, WorldError)>>
    where
        F: FnMut(UnitId) -> Result<()>,
    {
        if self.is_active() {
            return Err(WorldError::MovesInProgress);
        }
        let mut failures = Vec::new();
        for &unit in &self.registry {
            if let Err(e) = reset(unit) {
                tracing::warn!(unit = %unit, error = %e, "Failed to reset unit");
                failures.push((unit, e));
            }
        }
        Ok(failures)
    }

    /// Start moving every registered unit, one after the other, in
    /// ascending [`UnitId`] order.
    ///
    /// The order is snapshotted now; units registered later wait for the
    /// next sequence.
    pub fn begin_all(&mut self) -> Result<()> {
        if self.is_active() {
            return Err(WorldError::MovesInProgress);
        }
        tracing::info!(units = self.registry.len(), "Starting move sequence");
        self.sequence = Some(Sequence::new(self.registry.iter().copied()));
        Ok(())
    }

    /// Start moving a single unit.
    pub fn begin_unit(&mut self, unit: UnitId) -> Result<()> {
        if self.is_active() {
            return Err(WorldError::MovesInProgress);
        }
        if !self.contains(unit) {
            return Err(WorldError::UnknownUnit(unit));
        }
        tracing::debug!(unit = %unit, "Starting single unit move sequence");
        self.sequence = Some(Sequence::new([unit]));
        Ok(())
    }

    /// Advance the active sequence as far as the signal allows.
    ///
    /// `step` is the unit's single-step primitive. Every completed step is
    /// delivered to the listeners before the signal is checked, so a
    /// listener can start an animation that this very poll then waits on.
    pub fn poll<S, F>(&mut self, signal: &S, mut step: F) -> MovePoll
    where
        S: AnimationSignal + ?Sized,
        F: FnMut(UnitId) -> Result<StepOutcome>,
    {
        let Some(sequence) = self.sequence.as_mut() else {
            return MovePoll::Idle;
        };

        while let Some(unit) = sequence.current_or_next() {
            if sequence.waiting {
                if signal.is_playing() {
                    return MovePoll::Pending(unit);
                }
                sequence.waiting = false;
            }

            match step(unit) {
                Ok(outcome) => {
                    if let Some(moved) = outcome.moved {
                        for listener in &mut self.listeners {
                            listener.on_unit_moved(&moved);
                        }
                        sequence.report.steps.push(moved);
                    }
                    if outcome.more_steps {
                        sequence.waiting = true;
                    } else {
                        sequence.finish_unit();
                    }
                }
                Err(reason) => {
                    tracing::warn!(unit = %unit, error = %reason, "Move refused");
                    sequence.report.refusals.push(MoveRefusal { unit, reason });
                    sequence.finish_unit();
                }
            }
        }

        let report = self.sequence.take().map(|s| s.report).unwrap_or_default();
        tracing::info!(
            steps = report.steps.len(),
            refusals = report.refusals.len(),
            "Move sequence complete"
        );
        MovePoll::Complete(report)
    }

    /// Abort the active sequence, returning what it did so far.
    pub fn cancel(&mut self) -> Option<MoveReport> {
        let sequence = self.sequence.take()?;
        tracing::info!(steps = sequence.report.steps.len(), "Move sequence cancelled");
        Some(sequence.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::{HexCoord, HexId};
    use crate::math::Fixed;
    use std::collections::BTreeMap;

    /// Units that each need a fixed number of steps.
    struct FakeUnits {
        remaining: BTreeMap<UnitId, u32>,
    }

    impl FakeUnits {
        fn new(units: &[(u64, u32)]) -> Self {
            Self {
                remaining: units.iter().map(|&(id, n)| (UnitId(id), n)).collect(),
            }
        }

        fn step(&mut self, unit: UnitId) -> Result<StepOutcome> {
            let left = self
                .remaining
                .get_mut(&unit)
                .ok_or(WorldError::UnknownUnit(unit))?;
            if *left == 0 {
                return Ok(StepOutcome::default());
            }
            *left -= 1;
            Ok(StepOutcome {
                moved: Some(UnitMoved {
                    unit,
                    from: HexId(*left + 1),
                    to: HexId(*left),
                    to_coord: HexCoord::new(0, 0),
                    cost: Fixed::ONE,
                }),
                more_steps: *left > 0,
            })
        }
    }

    fn scheduler(ids: &[u64]) -> TurnScheduler {
        let mut s = TurnScheduler::new();
        for &id in ids {
            s.register(UnitId(id));
        }
        s
    }

    fn order(report: &MoveReport) -> Vec<u64> {
        report.steps.iter().map(|m| m.unit.0).collect()
    }

    #[test]
    fn test_idle_without_sequence() {
        let mut s = scheduler(&[1]);
        assert_eq!(s.poll(&false, |_| unreachable!()), MovePoll::Idle);
        assert_eq!(s.phase(), SchedulerPhase::Idle);
    }

    #[test]
    fn test_sequence_runs_in_id_order() {
        let mut s = scheduler(&[3, 1, 2]);
        let mut units = FakeUnits::new(&[(1, 2), (2, 2), (3, 2)]);
        s.begin_all().unwrap();
        let MovePoll::Complete(report) = s.poll(&false, |u| units.step(u)) else {
            panic!("expected completion");
        };
        assert_eq!(order(&report), vec![1, 1, 2, 2, 3, 3]);
        assert!(!s.is_active());
    }

    #[test]
    fn test_waits_while_playing() {
        let mut s = scheduler(&[1, 2]);
        let mut units = FakeUnits::new(&[(1, 2), (2, 1)]);
        s.begin_all().unwrap();
        assert_eq!(s.phase(), SchedulerPhase::Stepping(UnitId(1)));

        assert_eq!(s.poll(&true, |u| units.step(u)), MovePoll::Pending(UnitId(1)));
        assert_eq!(s.phase(), SchedulerPhase::Waiting(UnitId(1)));
        assert_eq!(s.poll(&true, |u| units.step(u)), MovePoll::Pending(UnitId(1)));

        // Unit 1's last step reports no more steps, so unit 2 starts at once
        let MovePoll::Complete(report) = s.poll(&false, |u| units.step(u)) else {
            panic!("expected completion");
        };
        assert_eq!(order(&report), vec![1, 1, 2]);
    }

    #[test]
    fn test_held_signal_never_completes() {
        let mut s = scheduler(&[1]);
        let mut units = FakeUnits::new(&[(1, 3)]);
        s.begin_all().unwrap();
        for _ in 0..100 {
            assert_eq!(s.poll(&true, |u| units.step(u)), MovePoll::Pending(UnitId(1)));
        }
        assert_eq!(units.remaining[&UnitId(1)], 2);
    }

    #[test]
    fn test_refusal_does_not_block_later_units() {
        let mut s = scheduler(&[1, 2, 3]);
        let mut units = FakeUnits::new(&[(1, 1), (3, 1)]);
        s.begin_all().unwrap();
        let MovePoll::Complete(report) = s.poll(&false, |u| units.step(u)) else {
            panic!("expected completion");
        };
        assert_eq!(order(&report), vec![1, 3]);
        assert_eq!(
            report.refusals,
            vec![MoveRefusal {
                unit: UnitId(2),
                reason: WorldError::UnknownUnit(UnitId(2))
            }]
        );
    }

    #[test]
    fn test_listeners_see_every_step_once() {
        let mut s = scheduler(&[1, 2]);
        let seen = Rc::new(RefCell::new(Vec::<UnitMoved>::new()));
        s.add_listener(Box::new(Rc::clone(&seen)));
        let mut units = FakeUnits::new(&[(1, 2), (2, 2)]);
        s.begin_all().unwrap();
        let MovePoll::Complete(report) = s.poll(&false, |u| units.step(u)) else {
            panic!("expected completion");
        };
        assert_eq!(*seen.borrow(), report.steps);
    }

    #[test]
    fn test_end_turn_refused_mid_sequence() {
        let mut s = scheduler(&[1]);
        let mut units = FakeUnits::new(&[(1, 2)]);
        s.begin_all().unwrap();
        assert_eq!(s.poll(&true, |u| units.step(u)), MovePoll::Pending(UnitId(1)));
        assert_eq!(s.end_turn(|_| Ok(())), Err(WorldError::MovesInProgress));
        assert_eq!(s.begin_all(), Err(WorldError::MovesInProgress));
    }

    #[test]
    fn test_end_turn_collects_failures() {
        let mut s = scheduler(&[1, 2, 3]);
        let mut reset = Vec::new();
        let failures = s
            .end_turn(|u| {
                if u == UnitId(2) {
                    return Err(WorldError::UnknownUnit(u));
                }
                reset.push(u);
                Ok(())
            })
            .unwrap();
        assert_eq!(reset, vec![UnitId(1), UnitId(3)]);
        assert_eq!(failures, vec![(UnitId(2), WorldError::UnknownUnit(UnitId(2)))]);
    }

    #[test]
    fn test_begin_unit() {
        let mut s = scheduler(&[1, 2]);
        assert_eq!(s.begin_unit(UnitId(9)), Err(WorldError::UnknownUnit(UnitId(9))));
        let mut units = FakeUnits::new(&[(1, 2), (2, 2)]);
        s.begin_unit(UnitId(2)).unwrap();
        let MovePoll::Complete(report) = s.poll(&false, |u| units.step(u)) else {
            panic!("expected completion");
        };
        assert_eq!(order(&report), vec![2, 2]);
    }

    #[test]
    fn test_cancel_returns_partial_report() {
        let mut s = scheduler(&[1, 2]);
        let mut units = FakeUnits::new(&[(1, 3), (2, 1)]);
        s.begin_all().unwrap();
        s.poll(&true, |u| units.step(u));
        let partial = s.cancel().unwrap();
        assert_eq!(order(&partial), vec![1]);
        assert_eq!(s.phase(), SchedulerPhase::Idle);
        assert!(s.cancel().is_none());
    }

    #[test]
    fn test_signal_impls() {
        let cell = Cell::new(true);
        assert!(cell.is_playing());
        cell.set(false);
        assert!(!(&cell).is_playing());
        let atomic = AtomicBool::new(true);
        assert!(atomic.is_playing());
        assert!(Rc::new(Cell::new(true)).is_playing());
    }
}
