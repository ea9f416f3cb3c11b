//! chirp CLI: headless playback, WAV export and save states for sound carts.
//!
//! Usage:
//!   chirp-cli cart.bin --sfx 3
//!   chirp-cli cart.bin --music 0 --seconds 30 --wav out.wav
//!   chirp-cli cart.bin --load-state snap.state --wav rest.wav

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chirp_master::{Controller, EngineConfig, NATIVE_SAMPLE_RATE};
use clap::Parser;

#[derive(Parser)]
#[command(name = "chirp-cli")]
#[command(author, version, about = "Play and render chirp sound carts")]
struct Args {
    /// Sound cart image (or raw 4608-byte sound RAM dump)
    cart: PathBuf,

    /// Music bus volume (0-10)
    #[arg(long, default_value = "10")]
    volume_music: u8,

    /// SFX bus volume (0-10)
    #[arg(long, default_value = "10")]
    volume_sfx: u8,

    /// Enable the bit-crush output stage
    #[arg(long)]
    distortion: bool,

    /// Instrument slot to trigger (0-63)
    #[arg(long)]
    sfx: Option<u8>,

    /// Channel for --sfx (0-3); the first idle channel if omitted
    #[arg(long)]
    channel: Option<usize>,

    /// Row --sfx starts from (0-31)
    #[arg(long, default_value = "0")]
    row: u8,

    /// Pattern to start music from (0-63)
    #[arg(long)]
    music: Option<u8>,

    /// Channels music may use, one bit per channel
    #[arg(long, default_value = "15")]
    mask: u8,

    /// How long to play or render, in seconds
    #[arg(long, default_value = "5")]
    seconds: f32,

    /// Render offline to this WAV file instead of playing
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Write the engine state here when done
    #[arg(long)]
    save_state: Option<PathBuf>,

    /// Resume from a state written by --save-state
    #[arg(long)]
    load_state: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.volume_music > 10 || args.volume_sfx > 10 {
        bail!("volumes must be between 0 and 10");
    }

    let config = EngineConfig {
        volume_music: args.volume_music,
        volume_sfx: args.volume_sfx,
        distortion: args.distortion,
        muted: false,
    };
    let mut ctrl = Controller::with_config(config);

    let data = fs::read(&args.cart).with_context(|| format!("failed to read {}", args.cart.display()))?;
    ctrl.load_cart(&data)
        .with_context(|| format!("failed to load cart {}", args.cart.display()))?;

    if let Some(path) = &args.load_state {
        let state = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        ctrl.load_state(&state)
            .with_context(|| format!("failed to load state {}", path.display()))?;
    }

    if let Some(pattern) = args.music {
        ctrl.play_music(pattern, args.mask);
    }
    if let Some(sfx) = args.sfx {
        match ctrl.play_sfx(sfx, args.channel, args.row) {
            Some(ch) => println!("SFX {} on channel {}", sfx, ch),
            None => bail!("instrument {} is out of range", sfx),
        }
    }

    match &args.wav {
        Some(path) => render_to_wav(&mut ctrl, path, args.seconds)?,
        None => play_audio(&mut ctrl, args.seconds),
    }

    if let Some(path) = &args.save_state {
        let state = ctrl.save_state()?;
        fs::write(path, state).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Saved state to {}", path.display());
    }

    Ok(())
}

fn play_audio(ctrl: &mut Controller, seconds: f32) {
    ctrl.play();
    println!("Playing...");

    let deadline = Instant::now() + Duration::from_secs_f32(seconds.max(0.0));
    while ctrl.is_playing() && Instant::now() < deadline {
        let played = ctrl.samples_played() as f32 / NATIVE_SAMPLE_RATE as f32;
        print!("\rTime: {:6.2}s", played);
        let _ = std::io::stdout().flush();
        std::thread::sleep(Duration::from_millis(10));
    }

    ctrl.stop();
    println!("\rDone.          ");
}

fn render_to_wav(ctrl: &mut Controller, path: &Path, seconds: f32) -> Result<()> {
    println!("Rendering {:.2}s to {} at {} Hz...", seconds, path.display(), NATIVE_SAMPLE_RATE);

    let wav = ctrl.render_to_wav(seconds)?;
    println!("Rendered {} bytes", wav.len());

    fs::write(path, &wav).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Done.");
    Ok(())
}
