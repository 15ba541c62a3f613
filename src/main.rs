use clap::Parser;
use crossbeam::channel::bounded;
use dialoguer::Select;
use miditape::{
    cli::{validate_device, Args},
    create_scheduler, create_session_state, handle_input_device_list, handle_output_device_list,
    midi::DefaultMidiEngine,
    player::{run_playback, PlaybackOptions, SendPolicy},
    recorder::{run_recorder, CaptureSession},
    smf,
    ui::run_session_inspector,
    Scheduler,
};
use std::io::BufRead;
use std::path::{Path, PathBuf};

fn main() {
    initialize_logging();
    let args = Args::parse();

    if args.device_list {
        list_available_devices();
        return;
    }

    if let Some(path) = &args.play {
        run_play_command(&args, Path::new(path));
    } else if args.record {
        run_record_command(&args);
    } else {
        eprintln!("Nothing to do: pass --record, --play FILE, or --device-list");
        std::process::exit(2);
    }
}

fn initialize_logging() {
    miditape::logging::init_logger().expect("Logger initialization failed");
    log::info!("Application starting");
}

fn list_available_devices() {
    println!("MidiIn:");
    for (index, device) in handle_input_device_list().iter().enumerate() {
        println!("{}: {}", index, device);
    }
    println!();
    println!("MidiOut:");
    for (index, device) in handle_output_device_list().iter().enumerate() {
        println!("{}: {}", index, device);
    }
}

/// Resolves a device name from the flag value, or prompts when there is a
/// choice to make.
fn select_device(
    direction: &str,
    requested: Option<&String>,
    devices: &[String],
) -> Result<String, String> {
    if let Some(name) = requested {
        validate_device(name, devices)?;
        return Ok(name.clone());
    }

    match devices.len() {
        0 => Err(format!("No MIDI {} devices available", direction)),
        1 => Ok(devices[0].clone()),
        _ => {
            let selection = Select::new()
                .with_prompt(format!("Select a MIDI {} device", direction))
                .items(devices)
                .default(0)
                .interact()
                .map_err(|e| format!("Device selection failed: {}", e))?;
            Ok(devices[selection].clone())
        }
    }
}

fn run_record_command(args: &Args) {
    let devices = handle_input_device_list();
    let device = match select_device("input", args.input_device.as_ref(), &devices) {
        Ok(device) => device,
        Err(error_msg) => {
            log::error!("{}", error_msg);
            eprintln!("{}", error_msg);
            std::process::exit(1);
        }
    };

    let engine = match DefaultMidiEngine::new(Some(device.clone()), None) {
        Ok(engine) => {
            log::info!("Successfully connected to MIDI device: {}", device);
            println!("Successfully connected to MIDI device: {}", device);
            engine
        }
        Err(e) => {
            let error_msg = format!("Error connecting to MIDI device: {}", e);
            log::error!("{}", error_msg);
            eprintln!("{}", error_msg);
            std::process::exit(1);
        }
    };

    let mut session = match CaptureSession::new(args.resolution) {
        Ok(session) => session,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let scheduler = create_scheduler();
    let status = create_session_state();
    let (stop_tx, stop_rx) = bounded(1);
    let (ui_stop_tx, ui_stop_rx) = bounded(1);

    let inspector_state = status.clone();
    let inspector = scheduler.spawn(move || {
        run_session_inspector(inspector_state, ui_stop_rx);
    });

    println!("Recording... press Enter to stop");
    scheduler.spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
        let _ = stop_tx.send(());
    });

    run_recorder(engine, &mut session, status, stop_rx);
    let _ = ui_stop_tx.send(());
    let _ = inspector.join();

    match session.stop() {
        Ok(sequence) => {
            let path = output_path(args);
            match smf::export_to_path(&sequence, &path) {
                Ok(()) => {
                    let shown = std::fs::canonicalize(&path).unwrap_or(path);
                    println!("Notes exported to file: {}", shown.display());
                }
                Err(e) => {
                    log::error!("Export failed: {}", e);
                    eprintln!("Export failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            log::error!("Capture produced an invalid sequence: {}", e);
            eprintln!("Capture produced an invalid sequence: {}", e);
            std::process::exit(1);
        }
    }
}

fn output_path(args: &Args) -> PathBuf {
    match &args.output {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(format!(
            "capture-{}.mid",
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        )),
    }
}

fn run_play_command(args: &Args, path: &Path) {
    let sequence = match smf::import_from_path(path) {
        Ok(sequence) => sequence,
        Err(e) => {
            log::error!("Cannot load {}: {}", path.display(), e);
            eprintln!("Cannot load {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };
    println!(
        "Tracks {}, Delta Ticks Per Quarter Note {}",
        sequence.tracks().len(),
        sequence.resolution()
    );

    let devices = handle_output_device_list();
    let device = match select_device("output", args.output_device.as_ref(), &devices) {
        Ok(device) => device,
        Err(error_msg) => {
            log::error!("{}", error_msg);
            eprintln!("{}", error_msg);
            std::process::exit(1);
        }
    };

    let mut engine = match DefaultMidiEngine::new(None, Some(device.clone())) {
        Ok(engine) => {
            log::info!("Successfully connected to MIDI device: {}", device);
            engine
        }
        Err(e) => {
            let error_msg = format!("Error connecting to MIDI device: {}", e);
            log::error!("{}", error_msg);
            eprintln!("{}", error_msg);
            std::process::exit(1);
        }
    };

    let scheduler = create_scheduler();
    let (stop_tx, stop_rx) = bounded(1);
    println!("Replaying... press Enter to stop");
    scheduler.spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
        let _ = stop_tx.send(());
    });

    let options = PlaybackOptions {
        policy: if args.strict_send {
            SendPolicy::Abort
        } else {
            SendPolicy::Skip
        },
        announce: true,
    };

    match run_playback(&mut engine, &sequence, &options, stop_rx) {
        Ok(summary) => {
            if summary.cancelled {
                println!("Playback cancelled after {} events", summary.dispatched);
            } else {
                println!(
                    "Playback finished: {} events dispatched, {} skipped",
                    summary.dispatched, summary.skipped
                );
            }
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
