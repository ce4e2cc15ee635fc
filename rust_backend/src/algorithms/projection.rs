//! Stereographic sky-to-pixel projection around a plate-solved center.

use serde::{Deserialize, Serialize};

use crate::core::Coordinates;

/// Arcseconds per radian divided by the micrometre/millimetre ratio.
const ARCSEC_PER_PIXEL_FACTOR: f64 = 206.265;

const ARCSEC_PER_RADIAN: f64 = 206_264.806_247_096_36;

/// Image scale in arcseconds per pixel.
///
/// # Arguments
/// * `pixel_size_um` - unbinned pixel size in micrometres
/// * `binning` - binning factor
/// * `focal_length_mm` - telescope focal length in millimetres
pub fn arcsec_per_pixel(pixel_size_um: f64, binning: u16, focal_length_mm: f64) -> f64 {
    pixel_size_um * f64::from(binning.max(1)) / focal_length_mm * ARCSEC_PER_PIXEL_FACTOR
}

/// A position on the image in pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn squared_distance(&self, other: &PixelPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Nearest integer pixel.
    pub fn rounded(&self) -> PixelPoint {
        PixelPoint::new(self.x.round(), self.y.round())
    }
}

/// Maps sky coordinates onto an image whose center and orientation are known.
///
/// North is up and east is left when the rotation is zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyProjection {
    center: Coordinates,
    rotation_deg: f64,
    arcsec_per_pixel: f64,
    width: u32,
    height: u32,
}

impl SkyProjection {
    pub fn new(
        center: Coordinates,
        rotation_deg: f64,
        arcsec_per_pixel: f64,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            center,
            rotation_deg,
            arcsec_per_pixel,
            width,
            height,
        }
    }

    /// Pixel the image center maps to (integer halves of the dimensions).
    pub fn center_pixel(&self) -> PixelPoint {
        PixelPoint::new(f64::from(self.width / 2), f64::from(self.height / 2))
    }

    /// Projects `coords` onto the image plane.
    ///
    /// Returns `None` for the antipode of the center, where the projection
    /// is undefined.
    pub fn project(&self, coords: &Coordinates) -> Option<PixelPoint> {
        let ra0 = self.center.ra_degrees().to_radians();
        let dec0 = self.center.dec_degrees().to_radians();
        let ra = coords.ra_degrees().to_radians();
        let dec = coords.dec_degrees().to_radians();
        let delta_ra = ra - ra0;

        let cos_c = dec0.sin() * dec.sin() + dec0.cos() * dec.cos() * delta_ra.cos();
        if 1.0 + cos_c <= 1e-12 {
            return None;
        }
        let k = 2.0 / (1.0 + cos_c);
        let xi = k * dec.cos() * delta_ra.sin();
        let eta = k * (dec0.cos() * dec.sin() - dec0.sin() * dec.cos() * delta_ra.cos());

        let scale = ARCSEC_PER_RADIAN / self.arcsec_per_pixel;
        let (sin_r, cos_r) = self.rotation_deg.to_radians().sin_cos();
        let x = (xi * cos_r - eta * sin_r) * scale;
        let y = (xi * sin_r + eta * cos_r) * scale;

        let center = self.center_pixel();
        Some(PixelPoint::new(center.x - x, center.y - y))
    }

    /// Whether `point` lies on the image, edges included.
    pub fn contains(&self, point: &PixelPoint) -> bool {
        (0.0..=f64::from(self.width)).contains(&point.x)
            && (0.0..=f64::from(self.height)).contains(&point.y)
    }

    /// Projects and keeps only points on the image.
    pub fn project_within(&self, coords: &Coordinates) -> Option<PixelPoint> {
        self.project(coords).filter(|p| self.contains(p))
    }

    pub fn arcsec_per_pixel(&self) -> f64 {
        self.arcsec_per_pixel
    }
}
