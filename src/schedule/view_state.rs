use crate::foundation::error::{WavecastError, WavecastResult};

/// Timing parameters of the view cycle, all in seconds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScheduleParams {
    /// Leading composite segment (`I`).
    pub initial_composite_secs: f64,
    /// Full-screen segment length, transitions included (`F`).
    pub fullscreen_secs: f64,
    /// Composite segment between full-screen segments, transitions included (`C`).
    pub composite_secs: f64,
    /// Length of one zoom transition (`X`).
    pub transition_secs: f64,
    /// Trailing composite that is always honoured (`E`).
    pub outro_composite_secs: f64,
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self {
            initial_composite_secs: 60.0,
            fullscreen_secs: 300.0,
            composite_secs: 30.0,
            transition_secs: 1.5,
            outro_composite_secs: 60.0,
        }
    }
}

impl ScheduleParams {
    /// Check that the cycle is well formed.
    pub fn validate(&self) -> WavecastResult<()> {
        let all = [
            self.initial_composite_secs,
            self.fullscreen_secs,
            self.composite_secs,
            self.transition_secs,
            self.outro_composite_secs,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(WavecastError::validation(
                "schedule durations must be finite",
            ));
        }
        if self.initial_composite_secs < 0.0 || self.outro_composite_secs < 0.0 {
            return Err(WavecastError::validation(
                "schedule initial/outro composite durations must be >= 0",
            ));
        }
        if self.transition_secs <= 0.0 {
            return Err(WavecastError::validation(
                "schedule transition duration must be > 0",
            ));
        }
        if self.transition_secs > self.fullscreen_secs {
            return Err(WavecastError::validation(
                "schedule transition must not exceed the full-screen segment",
            ));
        }
        if self.transition_secs > self.composite_secs {
            return Err(WavecastError::validation(
                "schedule transition must not exceed the composite segment",
            ));
        }
        Ok(())
    }

    fn cycle_secs(&self) -> f64 {
        self.fullscreen_secs + self.composite_secs
    }
}

/// What a frame shows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewState {
    /// Logo, waveform, thematic image and text.
    Composite,
    /// Full-canvas thematic image.
    Fullscreen,
    /// Composite zooming into the full-screen image; progress in `[0, 1]`.
    ZoomIn {
        /// Raw (un-eased) progress.
        progress: f64,
    },
    /// Full-screen image returning to the composite; progress in `[0, 1]`.
    ZoomOut {
        /// Raw (un-eased) progress.
        progress: f64,
    },
}

impl ViewState {
    /// Transition progress, `None` for steady states.
    pub fn progress(self) -> Option<f64> {
        match self {
            Self::ZoomIn { progress } | Self::ZoomOut { progress } => Some(progress),
            Self::Composite | Self::Fullscreen => None,
        }
    }

    /// `true` for `ZoomIn` and `ZoomOut`.
    pub fn is_transition(self) -> bool {
        self.progress().is_some()
    }
}

/// Decide the view for time `t` of an episode lasting `duration` seconds.
///
/// Rules, first match wins:
/// 1. within the trailing `E` seconds: composite;
/// 2. before `I`: composite;
/// 3. `[I, I + X)`: zoom in;
/// 4. afterwards the cycle `F + C` repeats: full-screen, zoom out, composite, zoom in.
pub fn schedule(t: f64, duration: f64, params: &ScheduleParams) -> ViewState {
    let ScheduleParams {
        initial_composite_secs: i,
        fullscreen_secs: f,
        transition_secs: x,
        outro_composite_secs: e,
        ..
    } = *params;

    if duration - t <= e {
        return ViewState::Composite;
    }
    if t < i {
        return ViewState::Composite;
    }
    if t < i + x {
        return ViewState::ZoomIn {
            progress: unit((t - i) / x),
        };
    }

    let cycle = params.cycle_secs();
    let v = (t - i - x).rem_euclid(cycle);
    if v < f - x {
        ViewState::Fullscreen
    } else if v < f {
        ViewState::ZoomOut {
            progress: unit((v - (f - x)) / x),
        }
    } else if v < cycle - x {
        ViewState::Composite
    } else {
        ViewState::ZoomIn {
            progress: unit((v - (cycle - x)) / x),
        }
    }
}

fn unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/view_state.rs"]
mod tests;
