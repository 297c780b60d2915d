//! Cosmetic progress simulation.
//!
//! The analysis service reports no progress of its own, so while a request is
//! pending the simulator walks through a fixed list of stages, interpolating the
//! percentage from one stage target to the next in small jittered steps. It holds
//! at the last target (never above [`HOLD_CEILING`]) until the owner calls
//! [`ProgressSimulator::complete`] with a real result in hand, or
//! [`ProgressSimulator::fail`].
//!
//! # Cancellation
//!
//! Each run is one tokio task tagged with a generation number. Every
//! `start`/`complete`/`fail`/`stop` bumps the generation and aborts the task.
//! Writes go through `watch::Sender::send_if_modified`, and the generation is
//! checked inside that closure, so a step from a superseded run can never land
//! after the owner's write.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Highest percentage the simulation alone may report.
pub const HOLD_CEILING: f64 = 90.0;

pub const COMPLETE_LABEL: &str = "Analysis complete";
pub const FAILED_LABEL: &str = "Analysis failed";

/// A named phase of the simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStage {
    pub label: String,
    pub target_percent: f64,
    pub duration: Duration,
}

impl ProgressStage {
    pub fn new(label: impl Into<String>, target_percent: f64, duration: Duration) -> Self {
        Self {
            label: label.into(),
            target_percent,
            duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("a progress plan needs at least one stage")]
    Empty,
    #[error("stage '{label}' targets {target}%, not above the previous stage")]
    NotIncreasing { label: String, target: f64 },
    #[error("stage '{label}' targets {target}%, outside 0..={HOLD_CEILING}")]
    OutOfRange { label: String, target: f64 },
    #[error("step interval must be non-zero")]
    ZeroStep,
}

/// Static stage configuration plus step timing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressPlan {
    stages: Vec<ProgressStage>,
    step: Duration,
    jitter: f64,
}

impl ProgressPlan {
    /// Builds a plan, rejecting empty, non-increasing, or over-ceiling stage lists.
    ///
    /// `jitter` is the maximum absolute percentage added to or taken from each
    /// step before clamping.
    pub fn new(stages: Vec<ProgressStage>, step: Duration, jitter: f64) -> Result<Self, PlanError> {
        if stages.is_empty() {
            return Err(PlanError::Empty);
        }
        if step.is_zero() {
            return Err(PlanError::ZeroStep);
        }
        let mut previous = 0.0;
        for (i, stage) in stages.iter().enumerate() {
            if !(0.0..=HOLD_CEILING).contains(&stage.target_percent) {
                return Err(PlanError::OutOfRange {
                    label: stage.label.clone(),
                    target: stage.target_percent,
                });
            }
            if i > 0 && stage.target_percent <= previous {
                return Err(PlanError::NotIncreasing {
                    label: stage.label.clone(),
                    target: stage.target_percent,
                });
            }
            previous = stage.target_percent;
        }
        Ok(Self {
            stages,
            step,
            jitter: jitter.abs(),
        })
    }

    /// The stages shown while waiting on the analysis service.
    pub fn standard() -> Self {
        let ms = Duration::from_millis;
        Self {
            stages: vec![
                ProgressStage::new("Connecting to analysis service", 10.0, ms(800)),
                ProgressStage::new("Reading code structure", 30.0, ms(1_500)),
                ProgressStage::new("Explaining functions and variables", 55.0, ms(2_500)),
                ProgressStage::new("Tracing logic flow", 75.0, ms(2_500)),
                ProgressStage::new("Checking for potential issues", 90.0, ms(3_000)),
            ],
            step: ms(120),
            jitter: 1.5,
        }
    }

    pub fn stages(&self) -> &[ProgressStage] {
        &self.stages
    }

    /// Percentage the simulation holds at once every stage has run.
    pub fn hold_percent(&self) -> f64 {
        self.stages.last().map_or(0.0, |s| s.target_percent)
    }

    fn steps_for(&self, stage: &ProgressStage) -> u32 {
        let steps = stage.duration.as_millis() / self.step.as_millis().max(1);
        steps.clamp(1, u32::MAX as u128) as u32
    }
}

impl Default for ProgressPlan {
    fn default() -> Self {
        Self::standard()
    }
}

/// Where the simulation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressPhase {
    #[default]
    Idle,
    Running,
    /// Every stage has run; waiting for `complete` or `fail`.
    Holding,
    Complete,
    Failed,
    /// Halted by `stop` with the last percentage left on display.
    Stopped,
}

/// The displayed progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Progress {
    pub percent: f64,
    pub label: String,
    pub phase: ProgressPhase,
}

/// Timer-driven progress state machine. One run at a time.
pub struct ProgressSimulator {
    plan: Arc<ProgressPlan>,
    state: Arc<watch::Sender<Progress>>,
    generation: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl ProgressSimulator {
    pub fn new(plan: ProgressPlan) -> Self {
        let (tx, _rx) = watch::channel(Progress::default());
        Self {
            plan: Arc::new(plan),
            state: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    /// Resets to 0 and begins walking the stages, stopping any previous run first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        self.halt();
        let first = self
            .plan
            .stages
            .first()
            .map(|s| s.label.clone())
            .unwrap_or_default();
        self.state.send_replace(Progress {
            percent: 0.0,
            label: first,
            phase: ProgressPhase::Running,
        });

        let generation = self.generation.load(Ordering::SeqCst);
        self.task = Some(tokio::spawn(run(
            Arc::clone(&self.plan),
            Arc::clone(&self.state),
            Arc::clone(&self.generation),
            generation,
        )));
    }

    /// Jumps to 100 with the completion label. Only call with a real result in hand.
    pub fn complete(&mut self) {
        self.halt();
        self.state.send_replace(Progress {
            percent: 100.0,
            label: COMPLETE_LABEL.to_owned(),
            phase: ProgressPhase::Complete,
        });
    }

    /// Resets to 0 with the failure label.
    pub fn fail(&mut self) {
        self.halt();
        self.state.send_replace(Progress {
            percent: 0.0,
            label: FAILED_LABEL.to_owned(),
            phase: ProgressPhase::Failed,
        });
    }

    /// Halts the run without touching the displayed percentage.
    pub fn stop(&mut self) {
        self.halt();
        self.state.send_if_modified(|p| {
            if matches!(p.phase, ProgressPhase::Running | ProgressPhase::Holding) {
                p.phase = ProgressPhase::Stopped;
                true
            } else {
                false
            }
        });
    }

    /// Current displayed progress.
    pub fn progress(&self) -> Progress {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published change.
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.state.subscribe()
    }

    /// True while a run is advancing or holding.
    pub fn is_running(&self) -> bool {
        matches!(
            self.state.borrow().phase,
            ProgressPhase::Running | ProgressPhase::Holding
        )
    }

    fn halt(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Publishes `update` unless the run has been superseded. Returns false when stale.
fn publish(
    state: &watch::Sender<Progress>,
    generation: &AtomicU64,
    mine: u64,
    update: impl FnOnce(&mut Progress),
) -> bool {
    let mut live = true;
    state.send_if_modified(|p| {
        if generation.load(Ordering::SeqCst) != mine {
            live = false;
            return false;
        }
        update(p);
        true
    });
    live
}

async fn run(
    plan: Arc<ProgressPlan>,
    state: Arc<watch::Sender<Progress>>,
    generation: Arc<AtomicU64>,
    mine: u64,
) {
    let mut rng = SmallRng::from_entropy();
    let mut current = 0.0_f64;

    for stage in plan.stages() {
        let from = current;
        let span = stage.target_percent - from;
        let steps = plan.steps_for(stage);

        let label = stage.label.clone();
        if !publish(&state, &generation, mine, |p| p.label = label) {
            return;
        }

        for k in 1..=steps {
            tokio::time::sleep(plan.step).await;

            let value = if k == steps {
                stage.target_percent
            } else {
                let base = from + span * f64::from(k) / f64::from(steps);
                let noise = if plan.jitter > 0.0 {
                    rng.gen_range(-plan.jitter..=plan.jitter)
                } else {
                    0.0
                };
                // Never backwards, never past this stage's target.
                (base + noise).max(current).min(stage.target_percent)
            };
            current = value.min(HOLD_CEILING);

            if !publish(&state, &generation, mine, |p| p.percent = current) {
                return;
            }
        }
    }

    publish(&state, &generation, mine, |p| p.phase = ProgressPhase::Holding);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_plan(jitter: f64) -> ProgressPlan {
        let ms = Duration::from_millis;
        ProgressPlan::new(
            vec![
                ProgressStage::new("one", 20.0, ms(200)),
                ProgressStage::new("two", 60.0, ms(400)),
                ProgressStage::new("three", 90.0, ms(300)),
            ],
            ms(50),
            jitter,
        )
        .unwrap()
    }

    #[test]
    fn plan_rejects_bad_stage_lists() {
        let ms = Duration::from_millis;
        assert_eq!(ProgressPlan::new(vec![], ms(10), 0.0), Err(PlanError::Empty));
        assert!(matches!(
            ProgressPlan::new(
                vec![ProgressStage::new("a", 50.0, ms(10)), ProgressStage::new("b", 50.0, ms(10))],
                ms(10),
                0.0
            ),
            Err(PlanError::NotIncreasing { .. })
        ));
        assert!(matches!(
            ProgressPlan::new(vec![ProgressStage::new("a", 95.0, ms(10))], ms(10), 0.0),
            Err(PlanError::OutOfRange { .. })
        ));
        assert_eq!(
            ProgressPlan::new(vec![ProgressStage::new("a", 5.0, ms(10))], Duration::ZERO, 0.0),
            Err(PlanError::ZeroStep)
        );
    }

    #[test]
    fn standard_plan_is_valid_and_holds_at_ninety() {
        let plan = ProgressPlan::standard();
        let rebuilt = ProgressPlan::new(plan.stages().to_vec(), plan.step, plan.jitter).unwrap();
        assert_eq!(rebuilt, plan);
        assert_eq!(plan.hold_percent(), HOLD_CEILING);
    }

    #[tokio::test(start_paused = true)]
    async fn walks_monotonically_and_holds_below_one_hundred() {
        let mut sim = ProgressSimulator::new(quick_plan(4.0));
        let mut rx = sim.subscribe();
        sim.start();

        let mut seen = vec![sim.progress().percent];
        while sim.progress().phase != ProgressPhase::Holding {
            if rx.changed().await.is_err() {
                break;
            }
            let p = rx.borrow_and_update().clone();
            seen.push(p.percent);
        }

        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
        assert!(seen.iter().all(|p| (0.0..=HOLD_CEILING).contains(p)), "{seen:?}");
        assert_eq!(sim.progress().percent, 90.0);
        assert_eq!(sim.progress().label, "three");

        // Holding is stable.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(sim.progress().percent, 90.0);
        assert!(sim.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stage_labels_follow_the_plan() {
        let mut sim = ProgressSimulator::new(quick_plan(0.0));
        sim.start();
        assert_eq!(sim.progress().label, "one");
        tokio::time::sleep(Duration::from_millis(225)).await;
        assert_eq!(sim.progress().label, "two");
        assert!(sim.progress().percent >= 20.0);
    }

    #[tokio::test(start_paused = true)]
    async fn complete_jumps_to_one_hundred_and_stays() {
        let mut sim = ProgressSimulator::new(quick_plan(2.0));
        sim.start();
        tokio::time::sleep(Duration::from_millis(130)).await;
        sim.complete();
        let done = sim.progress();
        assert_eq!(done.percent, 100.0);
        assert_eq!(done.label, COMPLETE_LABEL);
        assert_eq!(done.phase, ProgressPhase::Complete);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sim.progress(), done, "aborted run must not write again");
        assert!(!sim.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn fail_resets_to_zero() {
        let mut sim = ProgressSimulator::new(quick_plan(0.0));
        sim.start();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(sim.progress().percent > 0.0);
        sim.fail();
        tokio::time::sleep(Duration::from_secs(5)).await;
        let p = sim.progress();
        assert_eq!(p.percent, 0.0);
        assert_eq!(p.label, FAILED_LABEL);
        assert_eq!(p.phase, ProgressPhase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_the_displayed_percent() {
        let mut sim = ProgressSimulator::new(quick_plan(0.0));
        sim.start();
        tokio::time::sleep(Duration::from_millis(325)).await;
        let before = sim.progress().percent;
        assert!(before > 0.0 && before < 90.0);
        sim.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sim.progress().percent, before);
        assert_eq!(sim.progress().phase, ProgressPhase::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_and_the_old_run_goes_quiet() {
        let mut sim = ProgressSimulator::new(quick_plan(0.0));
        sim.start();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(sim.progress().percent > 20.0);

        sim.start();
        assert_eq!(sim.progress().percent, 0.0);
        assert_eq!(sim.progress().label, "one");

        // One step of the new run only: the old run would have been near 90.
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(sim.progress().percent <= 20.0);
    }
}
