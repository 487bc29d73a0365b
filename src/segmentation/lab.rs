//! Device RGB to CIE L*a*b* conversion.
//!
//! Clustering and classification only rely on squared Euclidean distance
//! in this space approximating perceived colour difference, so any
//! D65 sRGB -> Lab mapping works here.

/// D65 reference white
const D65_X: f32 = 0.95047;
const D65_Y: f32 = 1.00000;
const D65_Z: f32 = 1.08883;

const DELTA: f32 = 6.0 / 29.0;

/// A point in Lab space plus the number of pixels it stands for.
///
/// Raw samples have a cardinality of 1. Cluster centroids carry the summed
/// cardinality of their members.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSample {
    pub l: f32,
    pub a: f32,
    pub b: f32,
    pub cardinality: u32,
}

impl ColorSample {
    pub fn new(l: f32, a: f32, b: f32) -> Self {
        Self { l, a, b, cardinality: 1 }
    }

    /// Convert an 8-bit sRGB colour.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let (l, a, b) = rgb_to_lab(r, g, b);
        Self::new(l, a, b)
    }

    /// Coordinate along clustering dimension `dim` (0 = L, 1 = a, 2 = b).
    #[inline]
    pub fn component(&self, dim: usize) -> f32 {
        match dim {
            0 => self.l,
            1 => self.a,
            _ => self.b,
        }
    }

    /// Squared Euclidean distance, ignoring cardinality.
    #[inline]
    pub fn distance_sq(&self, other: &ColorSample) -> f32 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        dl * dl + da * da + db * db
    }
}

#[inline]
fn srgb_to_linear(c: u8) -> f32 {
    let c = c as f32 / 255.0;
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

#[inline]
fn linear_to_srgb(c: f32) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let v = if c > 0.0031308 {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    } else {
        12.92 * c
    };
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

#[inline]
fn lab_f_inv(t: f32) -> f32 {
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

/// Convert 8-bit sRGB to CIE Lab (D65).
///
/// # Returns
/// `(l, a, b)` where L is 0-100 and a, b are roughly -128 to +128
pub fn rgb_to_lab(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = srgb_to_linear(r);
    let g = srgb_to_linear(g);
    let b = srgb_to_linear(b);

    let x = r * 0.4124564 + g * 0.3575761 + b * 0.1804375;
    let y = r * 0.2126729 + g * 0.7151522 + b * 0.0721750;
    let z = r * 0.0193339 + g * 0.1191920 + b * 0.9503041;

    let fx = lab_f(x / D65_X);
    let fy = lab_f(y / D65_Y);
    let fz = lab_f(z / D65_Z);

    (116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz))
}

/// Convert CIE Lab (D65) back to 8-bit sRGB, clamping out-of-gamut values.
pub fn lab_to_rgb(l: f32, a: f32, b: f32) -> (u8, u8, u8) {
    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let x = lab_f_inv(fx) * D65_X;
    let y = lab_f_inv(fy) * D65_Y;
    let z = lab_f_inv(fz) * D65_Z;

    let r = 3.2404542 * x - 1.5371385 * y - 0.4985314 * z;
    let g = -0.9692660 * x + 1.8760108 * y + 0.0415560 * z;
    let b = 0.0556434 * x - 0.2040259 * y + 1.0572252 * z;

    (linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b))
}
