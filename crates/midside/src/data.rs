//! JSON configuration data

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{DeserializeError, PipelineError};

pub const DEFAULT_MID_SAMPLE_RATE: u32 = 32000;
pub const DEFAULT_SIDE_SAMPLE_RATE: u32 = 16000;

/// Pipeline configuration.
///
/// The Mid and Side target rates are independently selectable; targets
/// below 8000Hz switch that channel to the internal FIR downsampler.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ConversionConfig {
    pub mid_sample_rate: u32,
    pub side_sample_rate: u32,

    /// Apply the Gaussian output filter when decoding a preview.
    pub gauss_on_decode: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            mid_sample_rate: DEFAULT_MID_SAMPLE_RATE,
            side_sample_rate: DEFAULT_SIDE_SAMPLE_RATE,
            gauss_on_decode: false,
        }
    }
}

impl ConversionConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.mid_sample_rate == 0 {
            return Err(PipelineError::InvalidSampleRate(self.mid_sample_rate));
        }
        if self.side_sample_rate == 0 {
            return Err(PipelineError::InvalidSampleRate(self.side_sample_rate));
        }
        Ok(())
    }
}

pub fn load_config_file(path: &Path) -> Result<ConversionConfig, DeserializeError> {
    let file_name = path
        .file_name()
        .map_or_else(|| "config".to_owned(), |f| f.to_string_lossy().to_string());

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return Err(DeserializeError::OpenError(file_name, e)),
    };

    match serde_json::from_reader(BufReader::new(file)) {
        Ok(config) => Ok(config),
        Err(e) => Err(DeserializeError::SerdeError(file_name, e)),
    }
}
