use crate::assets::color::Palette;
use crate::assets::decode::{ImageInput, PreparedImage};
use crate::assets::fonts::{FontResolver, FontRole};
use crate::assets::layout::{self, Layout, LayoutParams};
use crate::assets::raster;
use crate::assets::text::{TextOverlay, TextOverlayBuilder, TextShadow, strip_episode_prefix};
use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{Degradation, Outcome, WavecastError, WavecastResult};

/// Visual inputs of one episode.
#[derive(Clone, Debug, Default)]
pub struct EpisodeVisuals {
    /// Episode title; a leading `"episode: "` is dropped.
    pub title: String,
    /// Fixed podcast name shown at the bottom.
    pub podcast_name: String,
    /// Podcast logo.
    pub logo: Option<ImageInput>,
    /// Episode-specific thematic image.
    pub thematic: Option<ImageInput>,
}

/// Everything the per-frame renderers read, built once per episode.
#[derive(Clone, Debug)]
pub struct CompositeAssets {
    /// Output canvas.
    pub canvas: Canvas,
    /// Colours.
    pub palette: Palette,
    /// Resolved placement.
    pub layout: Layout,
    /// Circular logo with glow, padded.
    pub logo: Option<PreparedImage>,
    /// Thematic image inside its gradient frame.
    pub thematic: Option<PreparedImage>,
    /// Thematic image fitted to the whole canvas on the background colour.
    pub fullscreen: Option<PreparedImage>,
    /// Title and podcast lines.
    pub text: TextOverlay,
}

impl CompositeAssets {
    /// `true` when a thematic image (and so a full-screen view) exists.
    pub fn has_thematic(&self) -> bool {
        self.fullscreen.is_some()
    }
}

/// Prepares [`CompositeAssets`] from [`EpisodeVisuals`].
pub struct CompositeAssetBuilder<'a> {
    canvas: Canvas,
    palette: Palette,
    params: LayoutParams,
    fonts: &'a dyn FontResolver,
}

struct ThematicVariants {
    framed: PreparedImage,
    rect: Rect,
    fullscreen: PreparedImage,
}

impl<'a> CompositeAssetBuilder<'a> {
    /// Builder for one canvas and colour scheme.
    pub fn new(
        canvas: Canvas,
        palette: Palette,
        params: LayoutParams,
        fonts: &'a dyn FontResolver,
    ) -> Self {
        Self {
            canvas,
            palette,
            params,
            fonts,
        }
    }

    /// Build all assets. Unusable images and fonts degrade the result instead of failing it.
    #[tracing::instrument(skip_all, fields(title = %visuals.title))]
    pub fn build(&self, visuals: &EpisodeVisuals) -> WavecastResult<Outcome<CompositeAssets>> {
        self.params.validate()?;
        let canvas = self.canvas;
        let mut degradations = Vec::new();

        let logo = match visuals.logo.as_ref().map(|input| self.prepare_logo(input)) {
            None => None,
            Some(Ok(img)) => Some(img),
            Some(Err(err)) => {
                tracing::warn!(%err, "logo unusable, omitting it");
                degradations.push(Degradation::LogoOmitted {
                    reason: err.to_string(),
                });
                None
            }
        };
        let logo_origin = logo
            .as_ref()
            .map(|img| layout::logo_origin(canvas, &self.params, img.height));
        let logo_right = logo_origin
            .zip(logo.as_ref())
            .map(|((x, _), img)| (x + i64::from(img.width)) as f64);

        let thematic = match visuals
            .thematic
            .as_ref()
            .map(|input| self.prepare_thematic(input, logo_right))
        {
            None => None,
            Some(Ok(v)) => Some(v),
            Some(Err(err)) => {
                tracing::warn!(%err, "thematic image unusable, omitting it");
                degradations.push(Degradation::ThematicImageOmitted {
                    reason: err.to_string(),
                });
                None
            }
        };

        let thematic_rect = thematic.as_ref().map(|t| t.rect);
        let (title_band, podcast_band) = layout::text_bands(canvas, &self.params, thematic_rect);

        let shadow = TextShadow {
            offset_px: canvas.px(self.params.shadow_offset_px).round().max(1.0) as u32,
            alpha: self.params.shadow_alpha,
        };
        let min_font = canvas.px(self.params.min_font_px).round().max(1.0) as u32;
        let mut text_builder = TextOverlayBuilder::new(self.fonts, min_font, shadow);
        let text = TextOverlay {
            title: text_builder.block(
                FontRole::Title,
                strip_episode_prefix(visuals.title.trim()),
                title_band,
                self.palette.accent,
                &mut degradations,
            )?,
            podcast: text_builder.block(
                FontRole::Podcast,
                &visuals.podcast_name,
                podcast_band,
                self.palette.podcast,
                &mut degradations,
            )?,
        };

        let (thematic, fullscreen) = match thematic {
            Some(t) => (Some(t.framed), Some(t.fullscreen)),
            None => (None, None),
        };
        tracing::info!(
            logo = logo.is_some(),
            thematic = thematic.is_some(),
            degradations = degradations.len(),
            "composite assets ready"
        );
        Ok(Outcome::degraded(
            CompositeAssets {
                canvas,
                palette: self.palette.clone(),
                layout: Layout {
                    logo_origin,
                    thematic_rect,
                    title_band,
                    podcast_band,
                },
                logo,
                thematic,
                fullscreen,
                text,
            },
            degradations,
        ))
    }

    fn prepare_logo(&self, input: &ImageInput) -> WavecastResult<PreparedImage> {
        let max = self.canvas.px(self.params.logo_max_px).max(1.0);
        let src = input.prepare(max.round() as u32)?;
        if src.width == 0 || src.height == 0 {
            return Err(WavecastError::asset_load("logo has no pixels"));
        }
        let (w, h) = raster::fit_size(src.width, src.height, max, max, false);
        let fitted = raster::resize(&src, w, h)?;
        let round = raster::circle_mask(&fitted);
        let pad = self.canvas.px(self.params.logo_pad_px).round() as u32;
        let padded = raster::pad(&round, pad)?;
        let sigma = self.canvas.px(self.params.logo_glow_radius_px) as f32;
        let glow = raster::gaussian_blur(&padded, sigma)?;
        let mut out = glow.rgba8_premul.as_ref().clone();
        raster::blit_over(&mut out, padded.width, padded.height, &padded, 0, 0);
        PreparedImage::from_premul(padded.width, padded.height, out)
    }

    fn prepare_thematic(
        &self,
        input: &ImageInput,
        logo_right: Option<f64>,
    ) -> WavecastResult<ThematicVariants> {
        let src = input.prepare(self.canvas.height.max(self.canvas.width))?;
        if src.width == 0 || src.height == 0 {
            return Err(WavecastError::asset_load("thematic image has no pixels"));
        }
        let area = layout::image_area(self.canvas, &self.params, logo_right);
        let border = self.canvas.px(self.params.frame_border_px).round() as u32;
        let inner_w = area.width() - 2.0 * f64::from(border);
        let inner_h = area.height() - 2.0 * f64::from(border);
        if inner_w < 1.0 || inner_h < 1.0 {
            return Err(WavecastError::asset_load(
                "no room for the thematic image beside the logo",
            ));
        }
        let (w, h) = raster::fit_size(src.width, src.height, inner_w, inner_h, true);
        let fitted = raster::resize(&src, w, h)?;
        let framed = raster::gradient_frame(
            &fitted,
            border,
            self.palette.accent,
            self.palette.waveform_dark,
        )?;
        let rect = layout::centre_in(area, framed.width, framed.height);
        let fullscreen = raster::letterbox(&src, self.canvas, self.palette.background)?;
        Ok(ThematicVariants {
            framed,
            rect,
            fullscreen,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/builder.rs"]
mod tests;
