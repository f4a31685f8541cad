// fn-switcher Engine
// Turns modifier snapshots into input source switches

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::config::EffectiveConfig;
use crate::layout::Layout;
use crate::modifier::{Edge, ModifierFlags, ModifierStateTracker};
use crate::source::InputSourceProvider;
use crate::switch::{SwitchMode, SwitchPolicyEngine};
use crate::timer::{PressTimer, LONG_PRESS_DURATION};
use crate::trigger::Trigger;

#[derive(Debug, Default)]
struct TriggerState {
    tracker: ModifierStateTracker,
    timer: Option<PressTimer>,
}

/// Press state of one enabled trigger
#[derive(Debug)]
struct TriggerSlot {
    trigger: Trigger,
    state: Mutex<TriggerState>,
}

/// The switcher core.
///
/// Owns the per-trigger press state and timers plus the switch policy.
/// The event source feeds every modifier snapshot to [`handle_snapshot`];
/// long-press timers call back into the policy from their own threads, so
/// the policy sits behind a mutex shared with them.
///
/// [`handle_snapshot`]: SwitcherEngine::handle_snapshot
pub struct SwitcherEngine<P: InputSourceProvider + 'static> {
    policy: Arc<Mutex<SwitchPolicyEngine<P>>>,
    slots: Vec<TriggerSlot>,
    mode: SwitchMode,
    long_press: Duration,
}

impl<P: InputSourceProvider + 'static> SwitcherEngine<P> {
    pub fn new(config: &EffectiveConfig, provider: P) -> Self {
        let policy = SwitchPolicyEngine::new(config.layouts.clone(), config.mode, provider);
        let slots = Trigger::ALL
            .iter()
            .filter(|trigger| config.is_enabled(**trigger))
            .map(|&trigger| TriggerSlot {
                trigger,
                state: Mutex::new(TriggerState::default()),
            })
            .collect();

        Self {
            policy: Arc::new(Mutex::new(policy)),
            slots,
            mode: config.mode,
            long_press: LONG_PRESS_DURATION,
        }
    }

    /// Override the long-press threshold
    pub fn with_long_press(mut self, long_press: Duration) -> Self {
        self.long_press = long_press;
        self
    }

    pub fn triggers(&self) -> impl Iterator<Item = Trigger> + '_ {
        self.slots.iter().map(|slot| slot.trigger)
    }

    pub fn previous_layout(&self) -> Option<Layout> {
        self.policy.lock().previous_layout().cloned()
    }

    /// Process one modifier snapshot from the event source.
    pub fn handle_snapshot(&self, flags: ModifierFlags) {
        for slot in &self.slots {
            self.handle_trigger(slot, flags);
        }
    }

    fn handle_trigger(&self, slot: &TriggerSlot, flags: ModifierFlags) {
        let trigger = slot.trigger;
        let switch_now = {
            let mut state = slot.state.lock();
            let edge = state.tracker.update(trigger.is_held(flags));
            match (self.mode, edge) {
                (_, Edge::Unchanged) => false,
                (SwitchMode::Cycle, Edge::Pressed) => true,
                (SwitchMode::Cycle, Edge::Released) => false,
                (SwitchMode::Mru, Edge::Pressed) => {
                    log::debug!("{} pressed ({})", trigger, flags);
                    state.timer = self.arm_long_press(trigger);
                    false
                }
                (SwitchMode::Mru, Edge::Released) => match state.timer.take() {
                    Some(timer) if timer.cancel() => {
                        log::debug!("{} short press", trigger);
                        true
                    }
                    Some(_) => {
                        log::debug!("{} released after long press", trigger);
                        false
                    }
                    None => false,
                },
            }
        };

        if switch_now {
            run_switch(&self.policy, trigger, false);
        }
    }

    fn arm_long_press(&self, trigger: Trigger) -> Option<PressTimer> {
        let policy = Arc::clone(&self.policy);
        let armed = PressTimer::arm(self.long_press, move || {
            log::debug!("{} long press", trigger);
            run_switch(&policy, trigger, true);
        });
        match armed {
            Ok(timer) => Some(timer),
            Err(e) => {
                log::error!("Could not start long-press timer: {}", e);
                None
            }
        }
    }
}

impl<P: InputSourceProvider + 'static> Drop for SwitcherEngine<P> {
    fn drop(&mut self) {
        for slot in &self.slots {
            if let Some(timer) = slot.state.lock().timer.take() {
                timer.cancel();
            }
        }
    }
}

/// Decide and commit one switch, reporting the result.
fn run_switch<P: InputSourceProvider>(
    policy: &Mutex<SwitchPolicyEngine<P>>,
    trigger: Trigger,
    long_press: bool,
) {
    match policy.lock().switch(long_press) {
        Ok(outcome) => log::info!("{}: {} -> {}", trigger, outcome.from, outcome.to),
        Err(e) => log::warn!("{}", e),
    }
}
