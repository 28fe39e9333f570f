//! CSS strings applied to a slot's rendered element: the pixel-filter chain
//! and the swipe curtain clip.

use crate::symbology::FilterParams;

/// Smallest CSS contrast factor produced for negative contrast.
pub const MIN_CONTRAST_FACTOR: f64 = 0.1;

/// CSS contrast multiplier for a normalized contrast value.
///
/// Non-negative values pass through unchanged; negative values are
/// compressed reciprocally into `(0, 1)`. The jump at zero is deliberate.
pub fn contrast_factor(c: f64) -> f64 {
    if c < 0.0 {
        (1.0 / (c.abs() + 1.0)).max(MIN_CONTRAST_FACTOR)
    } else {
        c
    }
}

/// CSS saturate multiplier: identity for non-negative, linear fade to grey
/// (reached at -4) for negative values.
pub fn saturation_factor(s: f64) -> f64 {
    if s < 0.0 { (1.0 + s / 4.0).max(0.0) } else { s }
}

/// Builds the CSS `filter` value for (clamped) `params`.
pub fn css_filter(params: &FilterParams) -> String {
    let p = params.clamped();
    let mut parts = vec![
        format!("brightness({}%)", fmt_number(100.0 + p.brightness * 100.0)),
        format!("contrast({})", fmt_number(contrast_factor(p.contrast))),
        format!("saturate({})", fmt_number(saturation_factor(p.saturation))),
    ];
    if let Some(h) = p.hue {
        parts.push(format!("hue-rotate({}deg)", fmt_number(h)));
    }
    if let Some(s) = p.sepia {
        parts.push(format!("sepia({})", fmt_number(s)));
    }
    parts.join(" ")
}

/// Rectangular inset clip in percent of the element's box (top, right,
/// bottom, left).
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct ClipInset {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl ClipInset {
    pub fn to_css(&self) -> String {
        format!(
            "inset({} {} {} {})",
            fmt_percent(self.top),
            fmt_percent(self.right),
            fmt_percent(self.bottom),
            fmt_percent(self.left)
        )
    }

    /// Fraction of the element's width left visible.
    pub fn visible_width_fraction(&self) -> f64 {
        ((100.0 - self.left - self.right) / 100.0).clamp(0.0, 1.0)
    }
}

/// CSS value that removes any clip.
pub const CLIP_NONE: &str = "none";

/// Curtain clips for a divider at `percent` of the viewport width:
/// the primary keeps everything left of the divider, the secondary
/// everything right of it.
pub fn swipe_clips(percent: f64) -> (ClipInset, ClipInset) {
    let p = clamp_percent(percent);
    let primary = ClipInset {
        right: 100.0 - p,
        ..ClipInset::default()
    };
    let secondary = ClipInset {
        left: p,
        ..ClipInset::default()
    };
    (primary, secondary)
}

pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() { 50.0 } else { percent.clamp(0.0, 100.0) }
}

fn fmt_percent(v: f64) -> String {
    if v == 0.0 { "0".to_string() } else { format!("{}%", fmt_number(v)) }
}

/// Prints at most four decimals, without float noise like `170.00000000000003`.
pub fn fmt_number(v: f64) -> String {
    let r = (v * 10_000.0).round() / 10_000.0;
    if r == r.trunc() {
        format!("{}", r as i64)
    } else {
        format!("{r}")
    }
}
