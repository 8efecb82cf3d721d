use std::time::Duration;

pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u32 = 700;

/// knobs for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// None runs flat out
    pub instructions_per_second: Option<u32>,
    /// seed for RND; None picks one from the OS
    pub seed: Option<u64>,
    /// stop after this many steps; None runs until the program falls off the
    /// end of RAM or a shutdown
    pub max_steps: Option<u64>,
}

impl Config {
    /// how long one step should take, if throttled
    pub fn step_interval(&self) -> Option<Duration> {
        self.instructions_per_second
            .filter(|&ips| ips > 0)
            .map(|ips| Duration::from_secs(1) / ips)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instructions_per_second: Some(DEFAULT_INSTRUCTIONS_PER_SECOND),
            seed: None,
            max_steps: None,
        }
    }
}
