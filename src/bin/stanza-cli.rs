// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The CLI (command-line interface) tool renders composition files.

use anyhow::Context;
use clap::Parser;
use stanza::app_version;
use stanza_midi::{write_midi_file, JsonMidiPlayer, PlaylistFileSink};
use stanza_orchestration::Orchestrator;
use stanza_settings::load_composition;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Default)]
#[clap(author, about, long_about = None)]
struct Args {
    /// Names of composition files (Json Midi Creator JSON) to process.
    input: Vec<String>,

    /// Export as Standard MIDI file(s) (file will appear next to source file)
    #[clap(short = 'm', long, value_parser)]
    midi: bool,

    /// Export as Json Midi Player playlist file(s)
    #[clap(short = 'p', long, value_parser)]
    playlist: bool,

    /// Play through the native player library
    #[clap(long, value_parser)]
    play: bool,

    /// Directory holding the player shared library (default: ./lib)
    #[clap(long, value_parser)]
    lib_dir: Option<PathBuf>,

    /// Suppress status updates while processing
    #[clap(short = 'q', long, value_parser)]
    quiet: bool,

    /// Print version and exit
    #[clap(short = 'v', long, value_parser)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.version {
        println!("stanza-cli {}", app_version());
        return Ok(());
    }

    let mut player = args
        .play
        .then(|| match &args.lib_dir {
            Some(dir) => JsonMidiPlayer::with_lib_dir(dir),
            None => JsonMidiPlayer::default(),
        });

    for input_filename in &args.input {
        if input_filename == "-" {
            // This is a separator for cases like
            //
            // `cargo run --bin stanza-cli - x.json`
            continue;
        }
        let input_path = Path::new(input_filename);
        let composition = load_composition(input_path)
            .with_context(|| format!("loading {input_filename}"))?;
        let orchestrator = Orchestrator::new(composition);

        if !args.quiet {
            println!(
                "{}: {} part(s), {:.3} s",
                input_filename,
                orchestrator.composition().parts.len(),
                orchestrator.composition().duration_ms() / 1000.0
            );
        }

        if args.midi {
            let output = input_path.with_extension("mid");
            let events = orchestrator.export();
            write_midi_file(&events, &output)
                .with_context(|| format!("exporting {}", output.display()))?;
            if !args.quiet {
                println!("  wrote {}", output.display());
            }
        }

        if args.playlist {
            let output = input_path.with_extension("playlist.json");
            let mut sink = PlaylistFileSink::new(&output);
            orchestrator
                .perform(&mut sink)
                .with_context(|| format!("exporting {}", output.display()))?;
            if !args.quiet {
                println!("  wrote {}", output.display());
            }
        }

        if let Some(player) = player.as_mut() {
            log::info!("playing {input_filename}");
            orchestrator
                .perform(player)
                .with_context(|| format!("playing {input_filename}"))?;
        }
    }

    Ok(())
}
