// fn-switcher Press Timer
// One-shot cancellable deferred action used to tell a long press from a short one

use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How long a trigger must be held to count as a long press
pub const LONG_PRESS_DURATION: Duration = Duration::from_millis(500);

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

struct TimerShared {
    /// PENDING until exactly one of fire / cancel wins the compare-and-swap
    state: AtomicU8,
    lock: Mutex<()>,
    wake: Condvar,
}

/// A deferred action that either fires once after its delay or is cancelled.
///
/// The two endings are mutually exclusive. [`PressTimer::cancel`] is the only
/// way to learn which one happened: it returns `true` only if the action has
/// not started and now never will.
pub struct PressTimer {
    shared: Arc<TimerShared>,
}

impl PressTimer {
    /// Arm a timer that runs `action` on its own thread after `delay`.
    pub fn arm<F>(delay: Duration, action: F) -> io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let shared = Arc::new(TimerShared {
            state: AtomicU8::new(PENDING),
            lock: Mutex::new(()),
            wake: Condvar::new(),
        });
        let worker = Arc::clone(&shared);
        let deadline = Instant::now() + delay;

        thread::Builder::new()
            .name("press-timer".to_string())
            .spawn(move || {
                {
                    let mut guard = worker.lock.lock();
                    while worker.state.load(Ordering::Acquire) == PENDING {
                        if worker.wake.wait_until(&mut guard, deadline).timed_out() {
                            break;
                        }
                    }
                }
                if worker
                    .state
                    .compare_exchange(PENDING, FIRED, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    action();
                }
            })?;

        Ok(Self { shared })
    }

    /// Try to stop the timer before it fires.
    ///
    /// Returns `true` if this call cancelled a pending timer. Returns `false`
    /// if the action already fired (or is firing), or if the timer was
    /// already cancelled.
    pub fn cancel(&self) -> bool {
        let won = self
            .shared
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            // Wake the worker so it exits now instead of at the deadline.
            let _guard = self.shared.lock.lock();
            self.shared.wake.notify_all();
        }
        won
    }
}

impl std::fmt::Debug for PressTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.shared.state.load(Ordering::Acquire) {
            PENDING => "pending",
            FIRED => "fired",
            _ => "cancelled",
        };
        f.debug_struct("PressTimer").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    #[test]
    fn test_timer_fires_after_delay() {
        let (tx, rx) = mpsc::channel();
        let started = Instant::now();
        let _timer = PressTimer::arm(Duration::from_millis(20), move || {
            tx.send(Instant::now()).unwrap();
        })
        .unwrap();

        let fired_at = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(fired_at.duration_since(started) >= Duration::from_millis(20));
    }

    #[test]
    fn test_cancel_before_fire() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let timer = PressTimer::arm(Duration::from_millis(200), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        assert!(timer.cancel());
        // A second cancel reports nothing left to cancel
        assert!(!timer.cancel());

        thread::sleep(Duration::from_millis(300));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_after_fire_fails() {
        let (tx, rx) = mpsc::channel();
        let timer = PressTimer::arm(Duration::from_millis(5), move || {
            tx.send(()).unwrap();
        })
        .unwrap();

        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(!timer.cancel());
    }

    #[test]
    fn test_fire_and_cancel_are_exclusive() {
        const PAIRS: usize = 64;
        let fired: Vec<Arc<AtomicUsize>> =
            (0..PAIRS).map(|_| Arc::new(AtomicUsize::new(0))).collect();

        let timers: Vec<PressTimer> = fired
            .iter()
            .enumerate()
            .map(|(i, counter)| {
                let counter = Arc::clone(counter);
                // Spread the deadlines so some fire before the cancel lands
                PressTimer::arm(Duration::from_micros((i as u64 % 8) * 250), move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap()
            })
            .collect();

        let cancelled: Vec<bool> = thread::scope(|scope| {
            let handles: Vec<_> = timers
                .iter()
                .map(|timer| scope.spawn(move || timer.cancel()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        thread::sleep(Duration::from_millis(50));
        for (i, counter) in fired.iter().enumerate() {
            let fires = counter.load(Ordering::SeqCst);
            let total = fires + usize::from(cancelled[i]);
            assert_eq!(total, 1, "timer {} fired {} times, cancelled={}", i, fires, cancelled[i]);
        }
    }
}
