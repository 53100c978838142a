use serde::{Deserialize, Serialize};

/// Tunable randomization parameters, owned and persisted by the engine.
///
/// The session pulls a full copy when the settings panel opens and pushes a
/// full copy back on save; partial merges never happen.  Field names are
/// camelCase on the wire because they double as the settings-form control
/// names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WheelConfig {
    /// Selected audio output device id; empty means system default.
    pub audio_device: String,
    pub music: bool,
    /// Probability of the wheel spinning backwards, 0.0..=1.0.
    pub reverse_chance: f64,
    pub speed_reduce_max: f64,
    pub speed_reduce_min: f64,
    /// Speed below which the slow-phase reduction takes over.
    pub speed_slow_limit: f64,
    pub speed_slow_reduce_max: f64,
    pub speed_slow_reduce_min: f64,
    pub speed_start_max: f64,
    pub speed_start_min: f64,
    pub speed_stop_max: f64,
    pub speed_stop_min: f64,
    pub start_fullscreen: bool,
    /// Playback volume, 0..=100.
    pub volume: u32,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            audio_device: String::new(),
            music: true,
            reverse_chance: 0.25,
            speed_reduce_max: 0.05,
            speed_reduce_min: 0.03,
            speed_slow_limit: 1.0,
            speed_slow_reduce_max: 0.001,
            speed_slow_reduce_min: 0.01,
            speed_start_max: 5.0,
            speed_start_min: 4.5,
            speed_stop_max: 0.5,
            speed_stop_min: 0.25,
            start_fullscreen: false,
            volume: 100,
        }
    }
}

impl WheelConfig {
    /// Swap any inverted (min, max) speed pair so min ≤ max holds.
    ///
    /// The session never range-checks edits; the engine applies this exact
    /// normalization when it loads a saved config, so an inverted pair
    /// saved through the form is silently repaired rather than rejected.
    pub fn normalize(&mut self) {
        for (min, max) in [
            (&mut self.speed_reduce_min, &mut self.speed_reduce_max),
            (
                &mut self.speed_slow_reduce_min,
                &mut self.speed_slow_reduce_max,
            ),
            (&mut self.speed_start_min, &mut self.speed_start_max),
            (&mut self.speed_stop_min, &mut self.speed_stop_max),
        ] {
            if *max < *min {
                std::mem::swap(min, max);
            }
        }
    }
}
