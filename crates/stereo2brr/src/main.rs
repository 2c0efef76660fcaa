//! stereo2brr binary

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::LevelFilter;

use midside::errors::WavError;
use midside::pcm_wav::{read_pcm_wave_file, write_stereo_wave_file};
use midside::{convert, load_config_file, reconstruct, ConversionConfig, LinearResampler};

// Caps input wave files at 2 GiB of samples.
const MAX_WAV_SAMPLES: usize = 1 << 30;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Writes PREFIX.mid.brr and PREFIX.side.brr")]
#[command(arg_required_else_help = true)]
struct Args {
    #[arg(value_name = "WAV_FILE", help = "input stereo wave file")]
    input: PathBuf,

    #[arg(short = 'o', long, value_name = "PREFIX", help = "output file prefix")]
    output: PathBuf,

    #[arg(long, value_name = "HZ", help = "Mid channel target sample rate")]
    mid_rate: Option<u32>,

    #[arg(long, value_name = "HZ", help = "Side channel target sample rate")]
    side_rate: Option<u32>,

    #[arg(long, help = "Apply the Gaussian output filter to the preview")]
    gauss: bool,

    #[arg(
        long,
        value_name = "WAV_FILE",
        help = "Write a decoded round-trip preview wave file"
    )]
    preview: Option<PathBuf>,

    #[arg(
        short = 'c',
        long,
        value_name = "JSON_FILE",
        help = "Read the conversion config from a JSON file"
    )]
    config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Verbosity level")]
    verbose: u8,
}

macro_rules! error {
    ($($arg:tt)*) => {{
        eprintln!($($arg)*);
        std::process::exit(1);
    }};
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut p = prefix.to_path_buf().into_os_string();
    p.push(suffix);
    p.into()
}

fn main() {
    let args = Args::parse();

    simple_logger::SimpleLogger::new()
        .with_level(match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            3.. => LevelFilter::Trace,
        })
        .init()
        .ok();

    let mut config = match &args.config {
        Some(path) => match load_config_file(path) {
            Ok(c) => c,
            Err(why) => error!("{}", why),
        },
        None => ConversionConfig::default(),
    };
    if let Some(r) = args.mid_rate {
        config.mid_sample_rate = r;
    }
    if let Some(r) = args.side_rate {
        config.side_sample_rate = r;
    }
    if args.gauss {
        config.gauss_on_decode = true;
    }

    let stereo = {
        let mut wave_file = match fs::File::open(&args.input) {
            Err(why) => error!("Couldn't open {}: {}", args.input.display(), why),
            Ok(file) => file,
        };

        let wav = match read_pcm_wave_file(&mut wave_file, MAX_WAV_SAMPLES) {
            Err(why) => error!("Error reading {}: {}", args.input.display(), why),
            Ok(wav) => wav,
        };

        match wav.to_stereo() {
            Err(WavError::UnsupportedChannelCount(c)) => {
                error!("{} is not stereo ({} channel)", args.input.display(), c)
            }
            Err(why) => error!("Error reading {}: {}", args.input.display(), why),
            Ok(stereo) => stereo,
        }
    };

    let output = match convert(&stereo, &config, &LinearResampler) {
        Err(why) => error!("Cannot convert: {}", why),
        Ok(output) => output,
    };

    if let Some(gain) = output.normalization_gain {
        log::info!("applied normalization gain {gain:.4}");
    }

    let mid_path = with_suffix(&args.output, ".mid.brr");
    let side_path = with_suffix(&args.output, ".side.brr");

    if let Err(why) = fs::write(&mid_path, output.mid.brr_data()) {
        error!("Error writing {}: {}", mid_path.display(), why);
    }
    if let Err(why) = fs::write(&side_path, output.side.brr_data()) {
        error!("Error writing {}: {}", side_path.display(), why);
    }

    if let Some(preview_path) = &args.preview {
        let rec = match reconstruct(
            &output.mid,
            &output.side,
            stereo.sample_rate,
            config.gauss_on_decode,
            &LinearResampler,
        ) {
            Err(why) => error!("Cannot decode preview: {}", why),
            Ok(rec) => rec,
        };

        let file = match fs::File::create(preview_path) {
            Err(why) => error!("Couldn't create {}: {}", preview_path.display(), why),
            Ok(file) => file,
        };

        if let Err(why) = write_stereo_wave_file(&mut BufWriter::new(file), &rec) {
            error!("Error writing {}: {}", preview_path.display(), why);
        }
    }
}
