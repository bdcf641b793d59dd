//! Ken Burns effect calculation.
//!
//! Turns a `KenBurnsEffect` into the per-frame zoom and crop-offset
//! expressions ffmpeg's `zoompan` filter evaluates. The source image is first
//! scaled onto an enlarged canvas so that the crop window never leaves the
//! source bounds, then `zoompan` animates a window over that canvas and
//! resamples it to the target resolution.
//!
//! Everything here is pure: the same inputs always produce the same
//! expression.

use crate::model::{KenBurnsEffect, KenBurnsKind};

/// Lower and upper bound applied to `zoom_scale`.
pub const ZOOM_SCALE_RANGE: (f64, f64) = (1.0, 2.0);

/// Lower and upper bound applied to `pan_amount`.
pub const PAN_AMOUNT_RANGE: (f64, f64) = (0.0, 0.5);

/// Headroom added on top of the largest zoom/pan requirement.
const OVERSAMPLE_MARGIN: f64 = 1.1;

/// Resolved animation for one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectExpression {
    /// Width of the enlarged canvas the source is scaled onto
    pub scaled_width: u32,
    /// Height of the enlarged canvas the source is scaled onto
    pub scaled_height: u32,
    /// Frames over which the animation runs
    pub total_frames: u64,
    /// `zoompan` zoom expression
    pub zoom: String,
    /// `zoompan` horizontal crop offset expression
    pub x: String,
    /// `zoompan` vertical crop offset expression
    pub y: String,
    pub output_width: u32,
    pub output_height: u32,
    pub frame_rate: u32,
}

impl EffectExpression {
    /// Filter chain segment: upscale, crop to canvas, animate.
    #[must_use]
    pub fn to_filter(&self) -> String {
        format!(
            "scale={sw}:{sh}:force_original_aspect_ratio=increase,crop={sw}:{sh},\
             zoompan=z='{z}':x='{x}':y='{y}':d=1:s={w}x{h}:fps={fps}",
            sw = self.scaled_width,
            sh = self.scaled_height,
            z = self.zoom,
            x = self.x,
            y = self.y,
            w = self.output_width,
            h = self.output_height,
            fps = self.frame_rate,
        )
    }
}

/// Clamps zoom and pan into their supported ranges. NaN falls to the lower bound.
#[must_use]
pub fn clamp_effect(effect: &KenBurnsEffect) -> (f64, f64) {
    (
        clamp_or_min(effect.zoom_scale, ZOOM_SCALE_RANGE),
        clamp_or_min(effect.pan_amount, PAN_AMOUNT_RANGE),
    )
}

fn clamp_or_min(value: f64, (min, max): (f64, f64)) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Computes the zoompan animation for a scene.
///
/// Out-of-range `zoom_scale` / `pan_amount` are silently clamped. Pans hold
/// `zoom_scale`, or the smallest zoom whose window leaves room for the full
/// travel, whichever is larger. An unrecognized effect type yields a static,
/// centered, unzoomed crop.
#[must_use]
pub fn compute_effect(
    effect: &KenBurnsEffect,
    width: u32,
    height: u32,
    duration_secs: f64,
    frame_rate: u32,
) -> EffectExpression {
    let (zoom_scale, pan_amount) = clamp_effect(effect);

    let total_frames = ceil_tolerant(duration_secs * f64::from(frame_rate)).max(0.0) as u64;
    // Denominator for progress; a zero-length scene stays on frame 0.
    let frames = total_frames.max(1);
    let progress = format!("min(on,{frames})/{frames}");

    let scale_factor = zoom_scale.max(1.0 + pan_amount) * OVERSAMPLE_MARGIN;
    let scaled_width = ceil_tolerant(f64::from(width) * scale_factor) as u32;
    let scaled_height = ceil_tolerant(f64::from(height) * scale_factor) as u32;

    let center_x = "iw/2-(iw/zoom/2)".to_string();
    let center_y = "ih/2-(ih/zoom/2)".to_string();
    let zs = fmt_num(zoom_scale);
    let zoom_delta = fmt_num(zoom_scale - 1.0);
    let travel_x = f64::from(width) * pan_amount;
    let travel_y = f64::from(height) * pan_amount;

    let (zoom, x, y) = match effect.kind {
        KenBurnsKind::ZoomIn => (format!("1+{zoom_delta}*{progress}"), center_x, center_y),
        KenBurnsKind::ZoomOut => (format!("{zs}-{zoom_delta}*{progress}"), center_x, center_y),
        KenBurnsKind::PanLeft => (
            pan_zoom(zoom_scale, scaled_width, travel_x),
            pan_offset("iw/2-(iw/zoom/2)", "iw-iw/zoom", travel_x, &progress, false),
            center_y,
        ),
        KenBurnsKind::PanRight => (
            pan_zoom(zoom_scale, scaled_width, travel_x),
            pan_offset("iw/2-(iw/zoom/2)", "iw-iw/zoom", travel_x, &progress, true),
            center_y,
        ),
        KenBurnsKind::PanUp => (
            pan_zoom(zoom_scale, scaled_height, travel_y),
            center_x,
            pan_offset("ih/2-(ih/zoom/2)", "ih-ih/zoom", travel_y, &progress, false),
        ),
        KenBurnsKind::PanDown => (
            pan_zoom(zoom_scale, scaled_height, travel_y),
            center_x,
            pan_offset("ih/2-(ih/zoom/2)", "ih-ih/zoom", travel_y, &progress, true),
        ),
        KenBurnsKind::Unrecognized(_) => ("1".to_string(), center_x, center_y),
    };

    EffectExpression {
        scaled_width,
        scaled_height,
        total_frames,
        zoom,
        x,
        y,
        output_width: width,
        output_height: height,
        frame_rate,
    }
}

/// Constant zoom for a pan: `zoom_scale`, raised just enough that the crop
/// window (`canvas / zoom`) leaves `travel` pixels of room on the canvas.
///
/// Rounded up at the fourth decimal so the printed value never shrinks the room.
fn pan_zoom(zoom_scale: f64, canvas: u32, travel: f64) -> String {
    let canvas = f64::from(canvas);
    let room_limited = if travel > 0.0 && travel < canvas {
        canvas / (canvas - travel)
    } else {
        1.0
    };
    let zoom = (zoom_scale.max(room_limited) * 10_000.0 - 1e-6).ceil() / 10_000.0;
    fmt_num(zoom)
}

/// Offset moving linearly across `travel` pixels centered on `center`,
/// clipped to `[0, limit]`.
fn pan_offset(center: &str, limit: &str, travel: f64, progress: &str, forward: bool) -> String {
    let half = fmt_num(travel / 2.0);
    let travel = fmt_num(travel);
    if forward {
        format!("clip({center}-{half}+{travel}*{progress},0,{limit})")
    } else {
        format!("clip({center}+{half}-{travel}*{progress},0,{limit})")
    }
}

/// `ceil` that ignores floating-point noise, so `1000.0 * 1.43` stays 1430.
fn ceil_tolerant(value: f64) -> f64 {
    (value - 1e-9).ceil()
}

/// Formats a number with at most four decimals and no trailing zeros.
pub(crate) fn fmt_num(value: f64) -> String {
    let formatted = format!("{value:.4}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" || trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
