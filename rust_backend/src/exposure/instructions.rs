//! A minimal model of the host's instruction tree, enough to push a new
//! exposure time into every light-frame capture below a container.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Light,
    Dark,
    Flat,
    Bias,
    Snapshot,
}

/// A capture instruction, full frame or subframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureInstruction {
    pub image_type: ImageType,
    pub exposure_seconds: f64,
    #[serde(default)]
    pub gain: Option<i32>,
    #[serde(default)]
    pub offset: Option<i32>,
    #[serde(default = "default_binning")]
    pub binning: u16,
}

fn default_binning() -> u16 {
    1
}

impl ExposureInstruction {
    pub fn new(image_type: ImageType, exposure_seconds: f64) -> Self {
        Self {
            image_type,
            exposure_seconds,
            gain: None,
            offset: None,
            binning: default_binning(),
        }
    }

    pub fn light(exposure_seconds: f64) -> Self {
        Self::new(ImageType::Light, exposure_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instruction {
    TakeExposure(ExposureInstruction),
    TakeSubframeExposure {
        #[serde(flatten)]
        exposure: ExposureInstruction,
        subframe_fraction: f64,
    },
    Container(SequenceContainer),
    /// Anything the propagation leaves alone (slews, waits, filter changes).
    Other { name: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceContainer {
    pub name: String,
    #[serde(default)]
    pub items: Vec<Instruction>,
}

impl SequenceContainer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn with(mut self, item: Instruction) -> Self {
        self.items.push(item);
        self
    }

    /// Sets `exposure_seconds` on every light-frame capture in this container
    /// and all nested containers.
    ///
    /// # Returns
    /// The number of instructions updated
    pub fn propagate_exposure_time(&mut self, exposure_seconds: f64) -> usize {
        let mut updated = 0;
        for item in &mut self.items {
            match item {
                Instruction::TakeExposure(exposure)
                | Instruction::TakeSubframeExposure { exposure, .. } => {
                    if exposure.image_type == ImageType::Light {
                        exposure.exposure_seconds = exposure_seconds;
                        updated += 1;
                    }
                }
                Instruction::Container(container) => {
                    updated += container.propagate_exposure_time(exposure_seconds)
                }
                Instruction::Other { .. } => {}
            }
        }
        updated
    }

    /// Exposure times of the light-frame captures, depth first.
    pub fn light_exposure_times(&self) -> Vec<f64> {
        let mut times = Vec::new();
        for item in &self.items {
            match item {
                Instruction::TakeExposure(exposure)
                | Instruction::TakeSubframeExposure { exposure, .. }
                    if exposure.image_type == ImageType::Light =>
                {
                    times.push(exposure.exposure_seconds)
                }
                Instruction::Container(container) => times.extend(container.light_exposure_times()),
                _ => {}
            }
        }
        times
    }
}
