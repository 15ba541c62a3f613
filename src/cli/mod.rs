use crate::config;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// List available MIDI input and output devices
    #[arg(long)]
    pub device_list: bool,

    /// Record incoming MIDI into a Standard MIDI File
    #[arg(long)]
    pub record: bool,

    /// Replay a Standard MIDI File
    #[arg(long, value_name = "FILE")]
    pub play: Option<String>,

    /// MIDI input device to capture from
    #[arg(long, value_name = "DEVICE")]
    pub input_device: Option<String>,

    /// MIDI output device to replay into
    #[arg(long, value_name = "DEVICE")]
    pub output_device: Option<String>,

    /// Capture resolution in ticks per quarter note
    #[arg(long, default_value_t = config::DEFAULT_RESOLUTION)]
    pub resolution: u16,

    /// Output path for the captured sequence
    #[arg(long, value_name = "FILE")]
    pub output: Option<String>,

    /// Abort playback on the first failed send instead of skipping
    #[arg(long)]
    pub strict_send: bool,
}

pub fn validate_device(device_name: &str, devices: &[String]) -> Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: Device '{}' not found in available devices:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}
