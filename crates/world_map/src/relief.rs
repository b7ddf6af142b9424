//! Shaded-relief background.
//!
//! The Natural Earth relief GeoTIFF is plate carrée over the whole globe. It is
//! warped into the map projection once and cached as a JPEG; the SVG embeds
//! that JPEG as a base64 data URI.

use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
    time::Instant,
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use geo::{coord, Rect};
use image::{codecs::jpeg::JpegEncoder, Rgb, RgbImage};
use log::{debug, info};
use mapcolor::Projection;
use rayon::prelude::*;

use crate::error::PipelineError;

pub const DEFAULT_CACHE: &str = "ne_50m_relief.jpg";
pub const DEFAULT_SOURCE: &str = "NE2_50M_SR_W/NE2_50M_SR_W.tif";
pub const DEFAULT_WIDTH: u32 = 10_000;

const JPEG_QUALITY: u8 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct ReliefConfig {
    /// Reprojected JPEG; used as-is when present.
    pub cache: PathBuf,
    /// Global plate carrée raster the cache is built from.
    pub source: PathBuf,
    /// Output width in pixels.
    pub width: u32,
}

impl ReliefConfig {
    /// Fail before any work is done if neither cache nor source exists.
    pub fn check(&self) -> Result<(), PipelineError> {
        if self.cache.is_file() || self.source.is_file() {
            Ok(())
        } else {
            Err(PipelineError::MissingInput {
                what: format!("relief raster (no cache at {})", self.cache.display()),
                path: self.source.clone(),
            })
        }
    }
}

/// JPEG bytes of the projected relief, building and caching them if needed.
pub fn load_or_build(config: &ReliefConfig, projection: &Projection) -> Result<Vec<u8>, PipelineError> {
    if config.cache.is_file() {
        debug!("Using cached relief {}", config.cache.display());
        return Ok(fs::read(&config.cache)?);
    }

    let started = Instant::now();
    info!("Reprojecting relief {}", config.source.display());
    let source = image::open(&config.source)?.to_rgb8();
    let warped = reproject_relief(&source, projection, config.width);
    let jpeg = encode_jpeg(&warped)?;

    write_cache(&config.cache, &jpeg)?;
    info!(
        "Relief {}x{} -> {}x{} in {:.1?}, cached at {}",
        source.width(),
        source.height(),
        warped.width(),
        warped.height(),
        started.elapsed(),
        config.cache.display()
    );
    Ok(jpeg)
}

fn write_cache(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, PipelineError> {
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(image)?;
    Ok(out.into_inner())
}

pub fn data_uri(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg))
}

/// Output height keeping the source's pixel aspect, as `src_h * width / src_w`.
fn output_height(src: &RgbImage, dst_width: u32) -> u32 {
    let h = u64::from(src.height()) * u64::from(dst_width) / u64::from(src.width().max(1));
    h.clamp(1, u64::from(u32::MAX)) as u32
}

/// Bilinear sample at fractional pixel position `(u, v)` (pixel centres at `.5`),
/// clamping at the raster edges.
fn sample_bilinear(src: &RgbImage, u: f64, v: f64) -> Rgb<u8> {
    let (w, h) = (src.width() as i64, src.height() as i64);
    let (fx, fy) = (u - 0.5, v - 0.5);
    let (x0, y0) = (fx.floor(), fy.floor());
    let (tx, ty) = (fx - x0, fy - y0);

    let px = |x: i64, y: i64| src.get_pixel(x.clamp(0, w - 1) as u32, y.clamp(0, h - 1) as u32).0;
    let (x0, y0) = (x0 as i64, y0 as i64);
    let (a, b, c, d) = (px(x0, y0), px(x0 + 1, y0), px(x0, y0 + 1), px(x0 + 1, y0 + 1));

    let mut out = [0u8; 3];
    for i in 0..3 {
        let top = f64::from(a[i]) * (1.0 - tx) + f64::from(b[i]) * tx;
        let bottom = f64::from(c[i]) * (1.0 - tx) + f64::from(d[i]) * tx;
        out[i] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

/// Warp a global lon/lat raster into `projection`.
///
/// The output covers the projected bounds of the whole globe; pixels whose
/// centre falls outside the projection's outline stay black.
pub fn reproject_relief(src: &RgbImage, projection: &Projection, dst_width: u32) -> RgbImage {
    let dst_width = dst_width.max(1);
    let dst_height = output_height(src, dst_width);

    let world = Rect::new(coord! { x: -180.0, y: -90.0 }, coord! { x: 180.0, y: 90.0 });
    let bounds = projection.projected_bounds(world);
    let px_w = bounds.width() / f64::from(dst_width);
    let px_h = bounds.height() / f64::from(dst_height);
    let (src_w, src_h) = (f64::from(src.width()), f64::from(src.height()));

    debug!(
        "Relief grid {}x{}, pixel {:.1}x{:.1} projected units",
        dst_width, dst_height, px_w, px_h
    );

    let mut out = RgbImage::new(dst_width, dst_height);
    let row_len = dst_width as usize * 3;
    let buf: &mut [u8] = &mut out;

    buf.par_chunks_mut(row_len).enumerate().for_each(|(row, pixels)| {
        let y = bounds.max().y - (row as f64 + 0.5) * px_h;
        for (col, px) in pixels.chunks_exact_mut(3).enumerate() {
            let x = bounds.min().x + (col as f64 + 0.5) * px_w;
            let Some((lon, lat)) = projection.inverse(x, y) else {
                continue;
            };
            let u = (lon + 180.0) / 360.0 * src_w;
            let v = (90.0 - lat) / 180.0 * src_h;
            px.copy_from_slice(&sample_bilinear(src, u, v).0);
        }
    });

    out
}
