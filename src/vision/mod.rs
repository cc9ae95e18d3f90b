//! Screen perception
//!
//! Turns captured frames into confidence-gated answers about the UI: is a
//! control visible, where is it, how large is its reference image. The
//! engine consumes the [`Screen`] trait; [`ScreenOracle`] implements it with
//! template matching over a cached grayscale frame.

pub mod matcher;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage};

pub use matcher::{best_match, Match};

/// Perception errors
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("failed to load template '{name}' from {path}: {source}")]
    TemplateLoad {
        name: String,
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

/// Confidence-gated visual queries against named reference templates
///
/// All queries run against the cached frame from the most recent
/// [`Screen::refresh`]; a stale cache answers about a stale screen. A match
/// below threshold is an absence, never an error.
pub trait Screen {
    /// Replace the cached frame with a freshly captured one.
    fn refresh(&mut self, frame: DynamicImage) -> Result<(), VisionError>;

    /// Whether the named template matches anywhere at or above threshold.
    fn exists(&self, name: &str, threshold: Option<f32>) -> bool {
        self.find(name, threshold).is_some()
    }

    /// Top-left corner of the best match, if it clears the threshold.
    fn find(&self, name: &str, threshold: Option<f32>) -> Option<(i32, i32)>;

    /// Best-match confidence in [0, 1]; 0.0 when unanswerable.
    fn probability(&self, name: &str) -> f32;

    /// Pixel size of the named reference template.
    fn template_size(&self, name: &str) -> Option<(u32, u32)>;
}

/// Template-matching implementation of [`Screen`]
///
/// Owns the reference template store and the single-writer frame cache.
pub struct ScreenOracle {
    templates: HashMap<String, GrayImage>,
    frame: Option<GrayImage>,
    threshold: f32,
}

impl ScreenOracle {
    /// Oracle with the given default confidence floor.
    pub fn new(threshold: f32) -> Self {
        Self {
            templates: HashMap::new(),
            frame: None,
            threshold,
        }
    }

    /// Load a reference image from disk under the given query name.
    pub fn load_template(
        &mut self,
        path: impl AsRef<Path>,
        name: impl Into<String>,
    ) -> Result<(), VisionError> {
        let name = name.into();
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| VisionError::TemplateLoad {
            name: name.clone(),
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded template '{name}' from {}", path.display());
        self.insert_template(name, &image);
        Ok(())
    }

    /// Register an already-decoded reference image under a query name.
    pub fn insert_template(&mut self, name: impl Into<String>, image: &DynamicImage) {
        self.templates.insert(name.into(), image.to_luma8());
    }

    /// Names of all registered templates.
    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    fn query(&self, name: &str) -> Option<Match> {
        let frame = self.frame.as_ref()?;
        let template = match self.templates.get(name) {
            Some(t) => t,
            None => {
                log::warn!("query for unknown template '{name}'");
                return None;
            }
        };
        best_match(frame, template)
    }
}

impl Screen for ScreenOracle {
    fn refresh(&mut self, frame: DynamicImage) -> Result<(), VisionError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(VisionError::InvalidFrame("empty frame".to_string()));
        }
        self.frame = Some(frame.to_luma8());
        Ok(())
    }

    fn find(&self, name: &str, threshold: Option<f32>) -> Option<(i32, i32)> {
        let floor = threshold.unwrap_or(self.threshold);
        let found = self.query(name)?;
        if found.score >= floor {
            Some((found.x as i32, found.y as i32))
        } else {
            log::trace!(
                "'{name}' below threshold: {:.3} < {floor:.3}",
                found.score
            );
            None
        }
    }

    fn probability(&self, name: &str) -> f32 {
        self.query(name).map(|m| m.score).unwrap_or(0.0)
    }

    fn template_size(&self, name: &str) -> Option<(u32, u32)> {
        self.templates.get(name).map(|t| t.dimensions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                image::Luma([255u8])
            } else {
                image::Luma([0u8])
            }
        }))
    }

    fn frame_with_patch(patch: &DynamicImage, px: i64, py: i64) -> DynamicImage {
        let mut frame = GrayImage::from_pixel(96, 96, image::Luma([128u8]));
        image::imageops::overlay(&mut frame, &patch.to_luma8(), px, py);
        DynamicImage::ImageLuma8(frame)
    }

    #[test]
    fn test_find_locates_template() {
        let patch = checkerboard(12, 12);
        let mut oracle = ScreenOracle::new(0.95);
        oracle.insert_template("attack", &patch);
        oracle.refresh(frame_with_patch(&patch, 40, 24)).unwrap();

        assert!(oracle.exists("attack", None));
        assert_eq!(oracle.find("attack", None), Some((40, 24)));
        assert!(oracle.probability("attack") > 0.99);
        assert_eq!(oracle.template_size("attack"), Some((12, 12)));
    }

    #[test]
    fn test_threshold_gates_match() {
        let patch = checkerboard(12, 12);
        let mut oracle = ScreenOracle::new(0.95);
        oracle.insert_template("attack", &patch);
        // Flat frame: correlation against the checkerboard stays low.
        oracle
            .refresh(DynamicImage::ImageLuma8(GrayImage::from_pixel(
                96,
                96,
                image::Luma([128u8]),
            )))
            .unwrap();

        assert!(!oracle.exists("attack", None));
        assert!(oracle.find("attack", None).is_none());
        // A permissive per-call threshold overrides the default floor.
        assert!(oracle.exists("attack", Some(0.1)));
    }

    #[test]
    fn test_queries_without_frame_are_absent() {
        let mut oracle = ScreenOracle::new(0.95);
        oracle.insert_template("attack", &checkerboard(12, 12));

        assert!(!oracle.exists("attack", None));
        assert_eq!(oracle.probability("attack"), 0.0);
    }

    #[test]
    fn test_unknown_template_is_absent() {
        let patch = checkerboard(12, 12);
        let mut oracle = ScreenOracle::new(0.95);
        oracle.refresh(frame_with_patch(&patch, 0, 0)).unwrap();

        assert!(!oracle.exists("attack", None));
        assert_eq!(oracle.probability("attack"), 0.0);
        assert!(oracle.template_size("attack").is_none());
    }

    #[test]
    fn test_empty_frame_rejected() {
        let mut oracle = ScreenOracle::new(0.95);
        let empty = DynamicImage::new_luma8(0, 0);
        assert!(oracle.refresh(empty).is_err());
    }
}
