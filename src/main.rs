use clap::Parser;
use env_logger::Env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use chip8::config::DEFAULT_INSTRUCTIONS_PER_SECOND;
use chip8::display::MonoTermDisplay;
use chip8::input::StdinInput;
use chip8::memory::Memory;
use chip8::sound::{Mute, SimpleBeep, Sound, SIMPLEBEEP_PITCH};
use chip8::{Chip8Interpreter, Config, RunSummary, Shutdown};

/// Run a CHIP-8 program in the terminal. Esc quits.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// program image, loaded at 0x200
    rom: PathBuf,

    /// instructions per second; 0 runs flat out
    #[arg(long, default_value_t = DEFAULT_INSTRUCTIONS_PER_SECOND)]
    ips: u32,

    /// seed for RND, for repeatable runs
    #[arg(long)]
    seed: Option<u64>,

    /// stop after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,

    /// paint only every Nth changed frame
    #[arg(long, default_value_t = 1)]
    render_every: u32,

    /// how long a key press counts as held, in ms
    #[arg(long, default_value_t = 150)]
    key_hold: u64,

    /// no beeps
    #[arg(long)]
    mute: bool,

    /// beep pitch in Hz
    #[arg(long, default_value_t = SIMPLEBEEP_PITCH)]
    pitch: u16,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            instructions_per_second: Some(self.ips),
            seed: self.seed,
            max_steps: self.max_steps,
        }
    }
}

fn run(args: &Args, rom: &[u8]) -> Result<RunSummary, Box<dyn Error>> {
    let shutdown = Shutdown::new();
    // input first: if the display can't start, dropping input restores the terminal
    let mut input = StdinInput::new(Duration::from_millis(args.key_hold), shutdown.clone())?;
    let mut display = MonoTermDisplay::new(args.render_every)?;
    let sound: Arc<dyn Sound> = if args.mute {
        Arc::new(Mute::new())
    } else {
        Arc::new(SimpleBeep::new(args.pitch))
    };

    let mut interpreter =
        Chip8Interpreter::new(&mut display, &mut input, sound, shutdown, args.config());
    interpreter.load_image(rom)?;
    Ok(interpreter.main_loop()?)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let rom = fs::read(&args.rom)?;
    // refuse oversized images before the terminal goes raw
    Memory::new().load_image(&rom)?;

    match run(&args, &rom) {
        Ok(summary) => {
            log::info!("{} steps, halted: {:?}", summary.steps, summary.halt);
            Ok(())
        }
        Err(e) => {
            // drivers are shut down by now, so this lands on a sane terminal
            eprintln!("chip8: {}", e);
            process::exit(1);
        }
    }
}
