//! Template matching primitive
//!
//! Thin wrapper over `imageproc`'s normalized cross-correlation: given a
//! grayscale frame and a reference template, report where the template
//! matches best and how well. Everything above this (thresholds, caching,
//! naming) lives in the oracle.

use image::GrayImage;
use imageproc::template_matching::{find_extremes, match_template, MatchTemplateMethod};

/// Best placement of a template over a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Top-left corner of the best placement.
    pub x: u32,
    pub y: u32,
    /// Normalized correlation score in [0, 1].
    pub score: f32,
}

/// Find the best placement of `template` inside `frame`.
///
/// Returns `None` when the template cannot fit inside the frame.
pub fn best_match(frame: &GrayImage, template: &GrayImage) -> Option<Match> {
    if template.width() > frame.width()
        || template.height() > frame.height()
        || template.width() == 0
        || template.height() == 0
    {
        return None;
    }

    let scores = match_template(
        frame,
        template,
        MatchTemplateMethod::CrossCorrelationNormalized,
    );
    let extremes = find_extremes(&scores);

    Some(Match {
        x: extremes.max_value_location.0,
        y: extremes.max_value_location.1,
        score: extremes.max_value,
    })
}
