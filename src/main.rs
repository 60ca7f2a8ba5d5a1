//! mapsonic - Sonify and glyph-annotate urban map features

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::Level;

use mapsonic::config::{self, MapsonicConfig};
use mapsonic::engine::{default_port_name, list_midi_ports, AudioBackend, CueRecorder, MidiBackend};
use mapsonic::feature::FeatureAttributes;
use mapsonic::gate::{Replay, Scenario};
use mapsonic::glyph::{block_glyph, to_svg};
use mapsonic::mapping::{
    age_reverb_wet, height_gain_db, Classifier, Instrument, MetricSet, RhythmPattern, AGE_ALPHA,
    AGE_NOTE, AGE_PATTERN, HEIGHT_NOTE, HEIGHT_PANNING, HEIGHT_SIZE, HEIGHT_TEMPO, HEIGHT_TONE,
};

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay {
            scenario,
            config: config_path,
            fast,
            record,
            midi,
        } => {
            let cfg = match &config_path {
                Some(path) => config::load_config(path)?,
                None => MapsonicConfig::default(),
            };
            let scenario = Scenario::load(&scenario)?;
            eprintln!(
                "Replaying {} events over {} layers...",
                scenario.events.len(),
                scenario.map.layers.len()
            );

            match midi {
                Some(port) => {
                    let port = if port.is_empty() {
                        cfg.midi.port.clone()
                    } else {
                        Some(port)
                    };
                    let backend = MidiBackend::new(port.as_deref(), cfg.midi.velocity_scale)?;
                    let mut replay = Replay::new(scenario, backend, &cfg);
                    drive(&mut replay, fast)?;
                }
                None => {
                    let mut replay = Replay::new(scenario, CueRecorder::new(), &cfg);
                    drive(&mut replay, fast)?;

                    let session = replay.into_session();
                    let evaluations = session.evaluations();
                    let (_, recorder) = session.into_parts();
                    eprintln!(
                        "Done: {} evaluations, {} notes scheduled",
                        evaluations,
                        recorder.notes().len()
                    );
                    if let Some(path) = record {
                        recorder.write_jsonl(&path)?;
                        eprintln!("Cue sheet written to {:?}", path);
                    }
                }
            }
        }

        Commands::Glyph {
            properties,
            output,
            no_height,
            no_age,
            no_land_use,
            no_street,
        } => {
            let attrs = read_properties(&properties)?;
            let metrics = MetricSet {
                height: !no_height,
                age: !no_age,
                land_use: !no_land_use,
                street: !no_street,
            };
            let svg = to_svg(&block_glyph(&attrs, metrics));

            match output {
                Some(path) => {
                    std::fs::write(&path, &svg)
                        .with_context(|| format!("failed to write glyph: {:?}", path))?;
                    println!("Glyph written to {:?}", path);
                }
                None => println!("{}", svg),
            }
        }

        Commands::Classify { height, age } => {
            if height.is_none() && age.is_none() {
                println!("Nothing to classify. Pass --height and/or --age.");
            }

            if let Some(h) = height {
                let tone = HEIGHT_TONE.classify(h);
                println!("Height {} m:", h);
                println!("  {}: {}", HEIGHT_SIZE.name(), HEIGHT_SIZE.classify(h));
                println!(
                    "  {}: octave {:+}, volume {}",
                    HEIGHT_TONE.name(),
                    tone.octave_shift,
                    tone.volume
                );
                println!("  {}: {}", HEIGHT_NOTE.name(), HEIGHT_NOTE.classify(h));
                println!("  {}: {}", HEIGHT_PANNING.name(), HEIGHT_PANNING.classify(h));
                println!("  {}: {} bpm", HEIGHT_TEMPO.name(), HEIGHT_TEMPO.classify(h));
                println!("  gain: {:.1} dB", height_gain_db(h));
            }

            if let Some(a) = age {
                let pattern = RhythmPattern::new(AGE_PATTERN.classify(a));
                println!("Age {} years:", a);
                println!("  {}: {}", AGE_ALPHA.name(), AGE_ALPHA.classify(a));
                println!("  {}: {}", AGE_PATTERN.name(), pattern);
                println!("  {}: {}", AGE_NOTE.name(), AGE_NOTE.classify(a));
                println!("  reverb: {:.2}", age_reverb_wet(a));
            }
        }

        Commands::Instruments => {
            println!("Instruments:\n");
            for instrument in Instrument::ALL {
                println!(
                    "  {} (channel {}, program {})",
                    instrument,
                    instrument.midi_channel() + 1,
                    instrument.gm_program()
                );
                for (note, url) in instrument.sample_urls() {
                    println!("    {} -> {}", note, url);
                }
            }

            println!("\nMIDI output ports:");
            match list_midi_ports() {
                Ok(ports) if ports.is_empty() => println!("  (none)"),
                Ok(ports) => {
                    let default = default_port_name();
                    for port in ports {
                        let marker = if default.as_deref() == Some(port.as_str()) {
                            " (default)"
                        } else {
                            ""
                        };
                        println!("  - {}{}", port, marker);
                    }
                }
                Err(e) => println!("  Error listing ports: {}", e),
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    let t = &cfg.timing;
                    println!("Configuration is valid!");
                    println!("  Hover interval: {} ms", t.hover_interval_ms);
                    println!("  Settle delay: {} ms", t.settle_delay_ms);
                    println!("  Exit recheck: {} ms", t.exit_recheck_ms);
                    println!(
                        "  Glyph: {} ms visible, {} ms fade",
                        t.glyph_visible_ms, t.glyph_fade_ms
                    );
                    println!(
                        "  Retries: {} x {} ms",
                        t.max_retries, t.retry_delay_ms
                    );
                    println!("  Tempo: {} bpm", cfg.audio.tempo_bpm);
                    println!("  Hover bip: {}", cfg.audio.hover_bip);
                    println!(
                        "  MIDI port: {}",
                        cfg.midi.port.as_deref().unwrap_or("(first available)")
                    );
                    println!(
                        "  Sound: {}, visual: {}, identify clusters: {}",
                        cfg.toggles.sound, cfg.toggles.visual, cfg.toggles.identify_clusters
                    );
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let example_config = include_str!("../mapsonic.example.yaml");

            let path = "mapsonic.yaml";
            if Path::new(path).exists() {
                println!("mapsonic.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, example_config)?;
                println!("Created mapsonic.yaml with example configuration.");
            }
        }
    }

    Ok(())
}

/// Run a replay to the end, printing session events as JSON lines
fn drive<A: AudioBackend>(replay: &mut Replay<A>, fast: bool) -> Result<()> {
    if fast {
        while let Some(at) = replay.next_instant() {
            replay.step(at);
            print_events(replay)?;
        }
        return Ok(());
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    rt.block_on(async {
        let start = tokio::time::Instant::now();
        while let Some(at) = replay.next_instant() {
            tokio::time::sleep_until(start + at).await;
            replay.step(at);
            print_events(replay)?;
        }
        Ok::<(), anyhow::Error>(())
    })
}

fn print_events<A: AudioBackend>(replay: &mut Replay<A>) -> Result<()> {
    for event in replay.drain_events() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

/// Block properties from a JSON file, or YAML for any other extension
fn read_properties(path: &Path) -> Result<FeatureAttributes> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read properties: {:?}", path))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let attrs = if is_json {
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse properties: {:?}", path))?
    } else {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse properties: {:?}", path))?
    };
    Ok(attrs)
}
