//! Font lookup for the text overlay.

use std::path::PathBuf;
use std::sync::Arc;

/// Which text element a font is needed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontRole {
    /// Episode title (serif preferred).
    Title,
    /// Podcast name (sans-serif preferred).
    Podcast,
}

impl FontRole {
    /// Stable lowercase name used in logs and degradations.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Podcast => "podcast",
        }
    }
}

/// Raw font file bytes plus a display name.
#[derive(Clone, Debug)]
pub struct FontFace {
    /// Where the face came from (path or caller label).
    pub name: String,
    /// TrueType/OpenType bytes.
    pub bytes: Arc<Vec<u8>>,
}

/// Result of asking a resolver for a font.
#[derive(Clone, Debug)]
pub enum FontLookup {
    /// A usable face.
    Found(FontFace),
    /// Nothing matched; `tried` lists the candidates that were attempted.
    NotFound {
        /// Candidate sources in the order they were tried.
        tried: Vec<String>,
    },
}

/// Source of font faces for each text role.
pub trait FontResolver: Send + Sync {
    /// Resolve a face for `role`.
    fn resolve(&self, role: FontRole) -> FontLookup;
}

/// Tries an ordered list of font files per role and returns the first readable one.
#[derive(Clone, Debug)]
pub struct CandidateFontResolver {
    title: Vec<PathBuf>,
    podcast: Vec<PathBuf>,
}

const TITLE_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Bold.ttf",
    "/usr/share/fonts/liberation-serif/LiberationSerif-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Georgia.ttf",
    "/System/Library/Fonts/Supplemental/Times New Roman.ttf",
    "C:\\Windows\\Fonts\\georgia.ttf",
    "C:\\Windows\\Fonts\\times.ttf",
];

const PODCAST_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\verdana.ttf",
];

impl Default for CandidateFontResolver {
    fn default() -> Self {
        Self::system()
    }
}

impl CandidateFontResolver {
    /// Common serif/sans locations on Linux, macOS and Windows.
    pub fn system() -> Self {
        Self {
            title: TITLE_CANDIDATES.iter().map(PathBuf::from).collect(),
            podcast: PODCAST_CANDIDATES.iter().map(PathBuf::from).collect(),
        }
    }

    /// Explicit candidate lists.
    pub fn new(title: Vec<PathBuf>, podcast: Vec<PathBuf>) -> Self {
        Self { title, podcast }
    }

    /// Put `path` ahead of the existing candidates for both roles.
    pub fn with_preferred(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.title.insert(0, path.clone());
        self.podcast.insert(0, path);
        self
    }

    fn candidates(&self, role: FontRole) -> &[PathBuf] {
        match role {
            FontRole::Title => &self.title,
            FontRole::Podcast => &self.podcast,
        }
    }
}

impl FontResolver for CandidateFontResolver {
    fn resolve(&self, role: FontRole) -> FontLookup {
        let mut tried = Vec::new();
        for path in self.candidates(role) {
            tried.push(path.display().to_string());
            match std::fs::read(path) {
                Ok(bytes) if !bytes.is_empty() => {
                    tracing::debug!(role = role.as_str(), path = %path.display(), "font resolved");
                    return FontLookup::Found(FontFace {
                        name: path.display().to_string(),
                        bytes: Arc::new(bytes),
                    });
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::trace!(path = %path.display(), %err, "font candidate unavailable");
                }
            }
        }
        FontLookup::NotFound { tried }
    }
}

/// Always reports [`FontLookup::NotFound`], forcing the built-in bitmap renderer.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinOnlyResolver;

impl FontResolver for BuiltinOnlyResolver {
    fn resolve(&self, _role: FontRole) -> FontLookup {
        FontLookup::NotFound { tried: Vec::new() }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
