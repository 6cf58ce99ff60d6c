/// Convenience result type used across wavecast.
pub type WavecastResult<T> = Result<T, WavecastError>;

/// Top-level error taxonomy.
///
/// Only [`WavecastError::Encode`] is fatal for an episode. Cache, asset and font failures are
/// absorbed at the component boundary and surface as [`Degradation`]s on an [`Outcome`].
#[derive(thiserror::Error, Debug)]
pub enum WavecastError {
    /// Invalid configuration or caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unreadable, corrupt or mismatched waveform cache.
    #[error("cache error: {0}")]
    Cache(String),

    /// Missing or undecodable logo / thematic image.
    #[error("asset load error: {0}")]
    AssetLoad(String),

    /// No usable font could be resolved.
    #[error("font resolution error: {0}")]
    FontResolution(String),

    /// Internal failure while producing pixels.
    #[error("render error: {0}")]
    Render(String),

    /// Failure writing or muxing the output.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WavecastError {
    /// Build a [`WavecastError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`WavecastError::Cache`] value.
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Build a [`WavecastError::AssetLoad`] value.
    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad(msg.into())
    }

    /// Build a [`WavecastError::FontResolution`] value.
    pub fn font_resolution(msg: impl Into<String>) -> Self {
        Self::FontResolution(msg.into())
    }

    /// Build a [`WavecastError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`WavecastError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`WavecastError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for errors that must abort the current episode.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::Cache(_) | Self::AssetLoad(_) | Self::FontResolution(_)
        )
    }
}

/// Reason a result was produced in degraded form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Degradation {
    /// The waveform cache could not be used and analysis was recomputed.
    CacheRecomputed {
        /// Why the stored record was rejected.
        reason: String,
    },
    /// Fresh analysis could not be persisted; the next run recomputes again.
    CacheNotPersisted {
        /// Underlying write failure.
        reason: String,
    },
    /// The logo was omitted from the layout.
    LogoOmitted {
        /// Underlying load failure.
        reason: String,
    },
    /// The thematic image (and the full-screen view) was omitted.
    ThematicImageOmitted {
        /// Underlying load failure.
        reason: String,
    },
    /// Text used the built-in bitmap renderer.
    BuiltinFont {
        /// Which overlay line fell back.
        role: String,
        /// Font sources that were tried.
        tried: Vec<String>,
    },
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CacheRecomputed { reason } => write!(f, "waveform cache recomputed: {reason}"),
            Self::CacheNotPersisted { reason } => {
                write!(f, "waveform cache not persisted: {reason}")
            }
            Self::LogoOmitted { reason } => write!(f, "logo omitted: {reason}"),
            Self::ThematicImageOmitted { reason } => {
                write!(f, "thematic image omitted: {reason}")
            }
            Self::BuiltinFont { role, tried } => write!(
                f,
                "{role} text uses the built-in renderer (tried: {})",
                tried.join(", ")
            ),
        }
    }
}

/// A value together with the degradations that shaped it.
#[derive(Clone, Debug)]
pub struct Outcome<T> {
    /// The produced value.
    pub value: T,
    /// Everything that was absorbed on the way.
    pub degradations: Vec<Degradation>,
}

impl<T> Outcome<T> {
    /// A clean, non-degraded outcome.
    pub fn clean(value: T) -> Self {
        Self {
            value,
            degradations: Vec::new(),
        }
    }

    /// An outcome carrying the given degradations.
    pub fn degraded(value: T, degradations: Vec<Degradation>) -> Self {
        Self {
            value,
            degradations,
        }
    }

    /// `true` when anything was absorbed.
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    /// Map the value, keeping degradations.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            degradations: self.degradations,
        }
    }

    /// Move this outcome's degradations into `sink` and return the value.
    pub fn absorb_into(self, sink: &mut Vec<Degradation>) -> T {
        sink.extend(self.degradations);
        self.value
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
