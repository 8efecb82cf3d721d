use beep::beep;
use std::error::Error;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// makes beeps. called from the sound timer's own thread, hence Send + Sync
/// and &self everywhere
pub trait Sound: Send + Sync {
    /// sound for roughly `duration`; may block for that long
    fn beep_for(&self, duration: Duration) -> Result<(), Box<dyn Error>>;

    /// stop any tone and refuse to start new ones
    fn shutdown(&self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }
}

pub const SIMPLEBEEP_PITCH: u16 = 2093; // C

/// square-ish tone through the PC speaker, via the beep crate
pub struct SimpleBeep {
    pitch: u16,
    muted: AtomicBool,
}

impl SimpleBeep {
    pub fn new(pitch: u16) -> Self {
        SimpleBeep {
            pitch,
            muted: AtomicBool::new(false),
        }
    }
}

impl Default for SimpleBeep {
    fn default() -> Self {
        Self::new(SIMPLEBEEP_PITCH)
    }
}

impl Sound for SimpleBeep {
    fn beep_for(&self, duration: Duration) -> Result<(), Box<dyn Error>> {
        if self.muted.load(Ordering::SeqCst) {
            return Ok(());
        }
        beep(self.pitch)?;
        spin_sleep::sleep(duration);
        beep(0)?;
        Ok(())
    }

    fn shutdown(&self) -> Result<(), Box<dyn Error>> {
        self.muted.store(true, Ordering::SeqCst);
        beep(0)?;
        Ok(())
    }
}

/// silent; just counts the beeps it was asked for
#[derive(Default)]
pub struct Mute {
    beeps: AtomicUsize,
}

impl Mute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beeps(&self) -> usize {
        self.beeps.load(Ordering::SeqCst)
    }
}

impl Sound for Mute {
    fn beep_for(&self, _duration: Duration) -> Result<(), Box<dyn Error>> {
        self.beeps.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_counts() -> Result<(), Box<dyn Error>> {
        let m = Mute::new();
        m.beep_for(Duration::from_millis(16))?;
        m.beep_for(Duration::from_millis(16))?;
        assert_eq!(m.beeps(), 2);
        m.shutdown()
    }

    #[test]
    fn test_shut_down_beep_is_silent() {
        let b = SimpleBeep::default();
        b.muted.store(true, Ordering::SeqCst);
        // no speaker access once muted, so this works on any box
        assert!(b.beep_for(Duration::from_millis(1)).is_ok());
    }
}
