//! # timers
//!
//! The delay and sound timers count down at 60Hz on their own threads, so the
//! interpreter never has to keep time for them.
//!
//! Each timer is a tiny state machine:
//!
//!  * idle   counter == 0, no thread
//!  * armed  counter > 0, exactly one decrement thread
//!
//! Writing a nonzero value to an idle timer arms it and spawns the thread.
//! Writing to an armed timer only replaces the count. The thread retires
//! itself when the count hits zero.
//!
//! The `active` flag is the single-owner token: whoever flips it false -> true
//! owns the (one) decrement thread. A retiring thread gives the token back,
//! then re-checks the counter in case a write slipped in meanwhile, and takes
//! the token again if nobody else has.
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::sound::Sound;

pub const TIMER_FREQUENCY_HZ: u32 = 60;

/// one timer tick; also how long the sound timer beeps per tick
pub fn tick_interval() -> Duration {
    Duration::from_secs(1) / TIMER_FREQUENCY_HZ
}

#[derive(Default)]
struct TimerState {
    counter: AtomicU8,
    active: AtomicBool,
    activations: AtomicUsize,
}

pub struct CountdownTimer {
    name: &'static str,
    state: Arc<TimerState>,
    interval: Duration,
    sound: Option<Arc<dyn Sound>>,
}

impl CountdownTimer {
    /// a silent timer, like the delay timer
    pub fn new(name: &'static str) -> Self {
        CountdownTimer {
            name,
            state: Arc::new(TimerState::default()),
            interval: tick_interval(),
            sound: None,
        }
    }

    /// a timer that beeps once per tick while counting, like the sound timer
    pub fn with_sound(name: &'static str, sound: Arc<dyn Sound>) -> Self {
        CountdownTimer {
            sound: Some(sound),
            ..Self::new(name)
        }
    }

    #[cfg(test)]
    fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn get(&self) -> u8 {
        self.state.counter.load(Ordering::SeqCst)
    }

    /// update the count; arms the timer if it was idle
    pub fn set(&self, value: u8) {
        self.state.counter.store(value, Ordering::SeqCst);
        if value == 0 {
            return;
        }
        if self
            .state
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.spawn();
        }
    }

    /// zero the count; a running thread notices on its next tick and retires
    pub fn disarm(&self) {
        self.state.counter.store(0, Ordering::SeqCst);
    }

    /// is there a decrement thread right now
    pub fn is_armed(&self) -> bool {
        self.state.active.load(Ordering::SeqCst)
    }

    /// how many decrement threads have been started over this timer's life
    pub fn activations(&self) -> usize {
        self.state.activations.load(Ordering::SeqCst)
    }

    fn spawn(&self) {
        let n = self.state.activations.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("{} timer armed at {} (activation {})", self.name, self.get(), n);

        let state = self.state.clone();
        let sound = self.sound.clone();
        let interval = self.interval;
        let name = self.name;
        let spawned = thread::Builder::new()
            .name(format!("{}-timer", name))
            .spawn(move || count_down(name, &state, interval, sound.as_deref()));

        if let Err(e) = spawned {
            log::error!("can't start the {} timer thread: {}", name, e);
            self.state.active.store(false, Ordering::SeqCst);
        }
    }
}

fn count_down(name: &str, state: &TimerState, interval: Duration, sound: Option<&dyn Sound>) {
    let mut deadline = Instant::now() + interval;
    loop {
        let now = Instant::now();
        if deadline > now {
            spin_sleep::sleep(deadline - now);
        }
        deadline += interval;

        // decrement unless something already zeroed it
        let ticked = state
            .counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| c.checked_sub(1))
            .is_ok();
        if ticked {
            if let Some(sound) = sound {
                if let Err(e) = sound.beep_for(interval) {
                    log::warn!("beep failed: {}", e);
                }
            }
        }

        if state.counter.load(Ordering::SeqCst) > 0 {
            continue;
        }
        state.active.store(false, Ordering::SeqCst);
        let rearmed = state.counter.load(Ordering::SeqCst) > 0
            && state
                .active
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok();
        if !rearmed {
            log::trace!("{} timer idle", name);
            return;
        }
        deadline = Instant::now() + interval;
    }
}

impl fmt::Debug for CountdownTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownTimer")
            .field("name", &self.name)
            .field("counter", &self.get())
            .field("armed", &self.is_armed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::Mute;

    // enough slack for a loaded CI box
    const SLACK: Duration = Duration::from_millis(60);

    fn wait_idle(timer: &CountdownTimer) {
        let give_up = Instant::now() + Duration::from_secs(2);
        while timer.is_armed() && Instant::now() < give_up {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_idle_by_default() {
        let t = CountdownTimer::new("delay");
        assert_eq!(t.get(), 0);
        assert!(!t.is_armed());
        assert_eq!(t.activations(), 0);
    }

    #[test]
    fn test_counts_down_to_zero() {
        let t = CountdownTimer::new("delay");
        t.set(3);
        assert!(t.is_armed());
        thread::sleep(tick_interval() * 3 + SLACK);
        assert_eq!(t.get(), 0);
        wait_idle(&t);
        assert!(!t.is_armed());
    }

    #[test]
    fn test_write_while_armed_keeps_one_thread() {
        let t = CountdownTimer::new("delay");
        t.set(10);
        t.set(5);
        assert_eq!(t.activations(), 1);
        thread::sleep(tick_interval() + tick_interval() / 2);
        // a second thread would have taken it down by two
        assert!(t.get() >= 3 && t.get() <= 5, "got {}", t.get());
        t.disarm();
        wait_idle(&t);
    }

    #[test]
    fn test_rearms_after_expiry() {
        let t = CountdownTimer::new("delay").with_interval(Duration::from_millis(2));
        t.set(1);
        wait_idle(&t);
        assert_eq!(t.get(), 0);
        t.set(2);
        assert_eq!(t.activations(), 2);
        wait_idle(&t);
        assert_eq!(t.get(), 0);
    }

    #[test]
    fn test_set_zero_does_not_arm() {
        let t = CountdownTimer::new("delay");
        t.set(0);
        assert!(!t.is_armed());
        assert_eq!(t.activations(), 0);
    }

    #[test]
    fn test_hammering_writes_never_doubles_up() {
        let t = CountdownTimer::new("delay").with_interval(Duration::from_millis(1));
        for round in 0..200u32 {
            t.set((round % 3) as u8 + 1);
            assert!(t.activations() as u32 <= round + 1);
        }
        wait_idle(&t);
        assert_eq!(t.get(), 0);
        assert!(!t.is_armed());
    }

    #[test]
    fn test_sound_timer_beeps_each_tick() {
        let mute = Arc::new(Mute::new());
        let t = CountdownTimer::with_sound("sound", mute.clone())
            .with_interval(Duration::from_millis(2));
        t.set(4);
        wait_idle(&t);
        assert_eq!(t.get(), 0);
        assert_eq!(mute.beeps(), 4);
    }

    #[test]
    fn test_disarm_stops_thread() {
        let t = CountdownTimer::new("delay");
        t.set(200);
        t.disarm();
        wait_idle(&t);
        assert_eq!(t.get(), 0);
        assert!(!t.is_armed());
    }
}
