//! Melodizer command line: generate, play, list and test the synth.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use melodizer::audio::{AudioEngine, AudioError};
use melodizer::config::Config;
use melodizer::generator::{root_pitch, GenerationSettings, PhraseGenerator};
use melodizer::midi::{ExternalOutput, MidiOut, MidiOutputConfig};
use melodizer::roll::{chord_line, key_rows, render_roll, RollRange, TerminalObserver};
use melodizer::sequencer::{is_valid_tempo, OutputTarget, Routing};
use melodizer::session::Session;
use melodizer::synth::{PatchType, SynthEngine};
use melodizer::theory::{TheoryTables, RANDOM_PROGRESSION};

/// Frames rendered per audio block.
const BLOCK_FRAMES: u64 = 512;
/// How far rendering runs ahead of the device.
const LOOKAHEAD_MS: u64 = 60;
/// Audio rendered after playback ends so releases and reverb can ring out.
const TAIL_MS: u64 = 2500;
/// Clock rate when nothing is rendered for a device.
const HEADLESS_SAMPLE_RATE: u32 = 48000;

#[derive(Parser)]
#[command(name = "melodizer", version, about = "Generative synth phrases")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a phrase and print it as a piano roll.
    Generate {
        #[command(flatten)]
        phrase: PhraseArgs,
    },
    /// Generate a phrase and play it.
    Play {
        #[command(flatten)]
        phrase: PhraseArgs,
        /// Loop until Ctrl-C.
        #[arg(long = "loop")]
        looping: bool,
        /// Master volume, 0.0 to 1.0.
        #[arg(long, default_value_t = 0.8)]
        volume: f32,
        /// Melody output: internal or midi.
        #[arg(long, value_parser = parse_target)]
        melody_out: Option<OutputTarget>,
        /// Bass output: internal or midi.
        #[arg(long, value_parser = parse_target)]
        bass_out: Option<OutputTarget>,
        /// MIDI device name substring.
        #[arg(long)]
        device: Option<String>,
    },
    /// List scales, styles, rhythms, progressions and MIDI ports.
    List {
        /// Scale whose progressions are listed.
        #[arg(long, default_value = "Minor")]
        scale: String,
    },
    /// Play a test arpeggio on the internal synth.
    Keys {
        #[arg(long, value_parser = parse_patch, default_value = "melody")]
        patch: PatchType,
        #[arg(long, default_value_t = 0.8)]
        volume: f32,
    },
}

/// Generation flags. Anything left out comes from the config file.
#[derive(Args, Clone)]
struct PhraseArgs {
    /// Root note, e.g. C, Eb, F#.
    #[arg(long)]
    root: Option<String>,
    /// Octave of the root, 2-7; octave 4 holds middle C.
    #[arg(long, value_parser = clap::value_parser!(i32).range(2..=7))]
    octave: Option<i32>,
    #[arg(long)]
    scale: Option<String>,
    #[arg(long)]
    style: Option<String>,
    #[arg(long)]
    rhythm: Option<String>,
    /// Tempo in BPM.
    #[arg(long, value_parser = parse_tempo)]
    tempo: Option<f64>,
    /// Build the melody over a chord progression.
    #[arg(long)]
    chords: bool,
    /// Progression id, or "random".
    #[arg(long)]
    progression: Option<String>,
    /// Add a bass line.
    #[arg(long)]
    bass: bool,
    /// Melody MIDI channel, 1-16.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
    channel: Option<u8>,
    /// Bass MIDI channel, 1-16. Defaults to the melody channel.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
    bass_channel: Option<u8>,
    /// Seed for a repeatable phrase.
    #[arg(long)]
    seed: Option<u64>,
}

impl PhraseArgs {
    fn apply(&self, mut settings: GenerationSettings) -> GenerationSettings {
        if let Some(root) = &self.root {
            settings.root = root.clone();
        }
        if let Some(octave) = self.octave {
            settings.octave = octave;
        }
        if let Some(scale) = &self.scale {
            settings.scale = scale.clone();
        }
        if let Some(style) = &self.style {
            settings.style = style.clone();
        }
        if let Some(rhythm) = &self.rhythm {
            settings.rhythm = rhythm.clone();
        }
        if let Some(tempo) = self.tempo {
            settings.tempo = tempo;
        }
        if let Some(progression) = &self.progression {
            settings.progression = progression.clone();
            settings.use_chords = true;
        }
        settings.use_chords |= self.chords;
        settings.use_bass |= self.bass;
        if let Some(channel) = self.channel {
            settings.channel = channel;
        }
        if self.bass_channel.is_some() {
            settings.bass_channel = self.bass_channel;
        }
        settings
    }
}

fn parse_target(s: &str) -> Result<OutputTarget, String> {
    match s {
        "internal" => Ok(OutputTarget::Internal),
        "midi" => Ok(OutputTarget::Midi),
        other => Err(format!("unknown output '{other}' (expected internal or midi)")),
    }
}

fn parse_tempo(s: &str) -> Result<f64, String> {
    let tempo: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if is_valid_tempo(tempo) {
        Ok(tempo)
    } else {
        Err(format!("tempo must be a positive number of BPM, got {tempo}"))
    }
}

fn parse_patch(s: &str) -> Result<PatchType, String> {
    match s {
        "melody" => Ok(PatchType::Melody),
        "bass" => Ok(PatchType::Bass),
        other => Err(format!("unknown patch '{other}' (expected melody or bass)")),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    let result = match cli.command {
        Command::Generate { phrase } => generate(&config, &phrase),
        Command::Play {
            phrase,
            looping,
            volume,
            melody_out,
            bass_out,
            device,
        } => {
            let mut midi = config.midi.clone();
            midi.melody = melody_out.unwrap_or(midi.melody);
            midi.bass = bass_out.unwrap_or(midi.bass);
            if device.is_some() {
                midi.device_name = device;
            }
            play(&config, &phrase, &midi, looping, volume)
        }
        Command::List { scale } => list(&config, &scale),
        Command::Keys { patch, volume } => keys(&config, patch, volume),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

struct Generated {
    settings: GenerationSettings,
    tables: TheoryTables,
    events: Vec<melodizer::generator::NoteEvent>,
    chords: Option<Vec<melodizer::generator::ChordInstance>>,
}

fn generate_phrase(config: &Config, phrase: &PhraseArgs) -> Result<Generated, Box<dyn std::error::Error>> {
    let tables = config.theory_tables()?;
    let settings = phrase.apply(config.settings.clone());
    let mut generator = match phrase.seed {
        Some(seed) => PhraseGenerator::with_seed(tables.clone(), seed),
        None => PhraseGenerator::new(tables.clone()),
    }
    .with_tuning(config.tuning.clone());
    let events = generator.generate(&settings);
    let chords = generator.last_progression().map(<[_]>::to_vec);
    Ok(Generated {
        settings,
        tables,
        events,
        chords,
    })
}

fn print_phrase(g: &Generated) {
    let root = root_pitch(&g.settings);
    let range = RollRange::for_root(root, g.settings.use_bass);
    let rows = key_rows(range, root, g.tables.scale(&g.settings.scale));
    println!(
        "{} {} {} / {} @ {} BPM",
        g.settings.root, g.settings.scale, g.settings.style, g.settings.rhythm, g.settings.tempo
    );
    print!("{}", render_roll(&g.events, &rows, None));
    if let Some(chords) = &g.chords {
        println!("{}", chord_line(chords));
    }
}

fn generate(config: &Config, phrase: &PhraseArgs) -> CliResult {
    let generated = generate_phrase(config, phrase)?;
    print_phrase(&generated);
    Ok(())
}

fn play(config: &Config, phrase: &PhraseArgs, midi: &MidiOutputConfig, looping: bool, volume: f32) -> CliResult {
    let generated = generate_phrase(config, phrase)?;
    let tempo = generated.settings.tempo;
    if !is_valid_tempo(tempo) {
        return Err(format!("invalid tempo {tempo} BPM").into());
    }
    print_phrase(&generated);

    // Without a bass line the bass route is irrelevant; follow the melody.
    let bass_target = if generated.settings.use_bass { midi.bass } else { midi.melody };
    let routing = Routing::from_settings(&generated.settings, midi.melody, bass_target);
    let output = if routing.needs_midi() {
        MidiOut::connect_or_disconnected(midi)
    } else {
        MidiOut::disconnected()
    };
    if routing.needs_midi() && !output.is_connected() {
        return Err("MIDI output selected but no MIDI device is connected".into());
    }

    let internal = routing.melody == OutputTarget::Internal || routing.bass == OutputTarget::Internal;
    let mut engine = if internal {
        let mut engine = AudioEngine::new()?;
        engine.set_volume(volume)?;
        Some(engine)
    } else {
        None
    };
    let sample_rate = engine.as_ref().map_or(HEADLESS_SAMPLE_RATE, AudioEngine::sample_rate);

    let synth = SynthEngine::with_patches(sample_rate, config.patch_bank()?);
    let mut session = Session::with_observer(synth, Box::new(output), TerminalObserver::stdout());
    session.set_routing(routing);
    session.load_phrase(generated.events, generated.chords);

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))?;

    if !session.play(tempo, looping) {
        return Err("nothing to play".into());
    }

    match engine.as_mut() {
        Some(engine) => {
            let mut rendered = 0;
            while running.load(Ordering::SeqCst) && session.is_playing() {
                pump(engine, &mut rendered, BLOCK_FRAMES, |buf| session.render(buf))?;
            }
            if session.is_playing() {
                session.stop();
            }
            let tail = session.synth().ms_to_frames(TAIL_MS as f64);
            pump(engine, &mut rendered, tail, |buf| session.render(buf))?;
            drain(engine, rendered);
        }
        None => {
            let start = Instant::now();
            while running.load(Ordering::SeqCst) && session.is_playing() {
                let target = session.synth().ms_to_frames(start.elapsed().as_secs_f64() * 1000.0);
                let behind = target.saturating_sub(session.synth().frame());
                session.advance(behind);
                thread::sleep(Duration::from_millis(1));
            }
            if session.is_playing() {
                session.stop();
            }
        }
    }
    info!("done");
    Ok(())
}

/// Render `frames` frames into the device, staying `LOOKAHEAD_MS` ahead of it.
fn pump(
    engine: &mut AudioEngine,
    rendered: &mut u64,
    frames: u64,
    mut render: impl FnMut(&mut [f32]),
) -> Result<(), AudioError> {
    let lookahead = engine.sample_rate() as u64 * LOOKAHEAD_MS / 1000;
    let mut left = frames;
    while left > 0 {
        if rendered.saturating_sub(engine.frames_played()) >= lookahead {
            thread::sleep(Duration::from_millis(2));
            continue;
        }
        let n = left.min(BLOCK_FRAMES);
        let mut block = vec![0.0f32; 2 * n as usize];
        render(&mut block);
        engine.send_block(block)?;
        *rendered += n;
        left -= n;
    }
    Ok(())
}

/// Wait for the device to play what was queued.
fn drain(engine: &AudioEngine, rendered: u64) {
    let deadline = Instant::now() + Duration::from_millis(LOOKAHEAD_MS * 4);
    while engine.frames_played() < rendered && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
}

fn list(config: &Config, scale: &str) -> CliResult {
    let tables = config.theory_tables()?;
    println!("scales:");
    for s in &tables.scales {
        println!("  {}", s.id);
    }
    println!("styles:");
    for s in &tables.styles {
        println!("  {:<12} {} (rhythm: {})", s.id, s.name, s.pref_rhythm);
    }
    println!("rhythms:");
    for r in &tables.rhythms {
        println!("  {:<12} {} patterns", r.id, r.patterns.len());
    }
    println!("progressions for {scale}:");
    println!("  {RANDOM_PROGRESSION}");
    for p in tables.progressions_for_scale(scale) {
        println!("  {:<12} {}", p.id, p.name);
    }
    println!("MIDI outputs:");
    let ports = MidiOut::list_ports();
    if ports.is_empty() {
        println!("  (none)");
    }
    for port in ports {
        println!("  {port}");
    }
    Ok(())
}

fn keys(config: &Config, patch: PatchType, volume: f32) -> CliResult {
    let mut engine = AudioEngine::new()?;
    engine.set_volume(volume)?;
    let mut synth = SynthEngine::with_patches(engine.sample_rate(), config.patch_bank()?);
    let base: u8 = if patch == PatchType::Bass { 36 } else { 60 };
    let hold = synth.ms_to_frames(300.0);
    let gap = synth.ms_to_frames(100.0);
    let mut rendered = 0;

    for offset in [0u8, 4, 7, 12, 7, 4, 0] {
        let pitch = base + offset;
        synth.note_on(pitch, 100, patch);
        pump(&mut engine, &mut rendered, hold, |buf| synth.render(buf))?;
        synth.note_off(pitch, patch);
        pump(&mut engine, &mut rendered, gap, |buf| synth.render(buf))?;
    }
    let tail = synth.ms_to_frames(TAIL_MS as f64);
    pump(&mut engine, &mut rendered, tail, |buf| synth.render(buf))?;
    if synth.active_voices() > 0 {
        warn!(voices = synth.active_voices(), "voices still sounding at exit");
    }
    drain(&engine, rendered);
    Ok(())
}
