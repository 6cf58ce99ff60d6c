//! Per-episode visual assets: decoding, raster preparation, fonts, text and layout.

pub(crate) mod builder;
pub(crate) mod builtin_font;
pub(crate) mod color;
pub(crate) mod decode;
pub(crate) mod fonts;
pub(crate) mod layout;
pub(crate) mod raster;
pub(crate) mod text;

pub use builder::{CompositeAssetBuilder, CompositeAssets, EpisodeVisuals};
pub use color::Palette;
pub use decode::{ImageInput, PreparedImage, decode_image, rasterize_svg};
pub use fonts::{
    BuiltinOnlyResolver, CandidateFontResolver, FontFace, FontLookup, FontResolver, FontRole,
};
pub use layout::{Layout, LayoutParams};
pub use text::{FaceKind, TextBlock, TextOverlay, strip_episode_prefix};
