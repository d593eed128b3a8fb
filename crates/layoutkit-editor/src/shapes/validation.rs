//! Per-element point validators.
//!
//! Checks run in a fixed order: page bounds, optional containment in the
//! parent polygon, then (on completion only) point count, bounding box size
//! and the baseline-specific angle and length limits.

use layoutkit_core::{
    angle_between, point_in_polygon, polyline_length, segment_angle, BoundingBox, GeometryError,
    Point2D,
};
use layoutkit_settings::ValidationSettings;

use crate::model::ElementType;

/// Which validator applies to a point list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Region,
    Cell,
    Line,
    Word,
    Glyph,
    Baseline,
}

impl ShapeKind {
    /// Validator for the coords of an element type.
    pub fn for_coords(element: ElementType) -> Option<Self> {
        match element {
            ElementType::TextRegion | ElementType::TableRegion => Some(Self::Region),
            ElementType::TableCell => Some(Self::Cell),
            ElementType::TextLine => Some(Self::Line),
            ElementType::Word => Some(Self::Word),
            ElementType::Glyph => Some(Self::Glyph),
            _ => None,
        }
    }

    pub fn min_points(self) -> usize {
        match self {
            Self::Baseline => 2,
            _ => 3,
        }
    }
}

/// When a validator is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// While points are still being placed or dragged.
    Live,
    /// The shape is finished and about to be committed.
    Completion,
}

/// Validator thresholds, usually taken from the `validation` config section.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationLimits {
    pub fully_in_parent: bool,
    pub min_width: f64,
    pub min_height: f64,
    pub max_angle_change: f64,
    pub first_segment_angle: Option<[f64; 2]>,
    pub min_baseline_length: f64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self::from(&ValidationSettings::default())
    }
}

impl From<&ValidationSettings> for ValidationLimits {
    fn from(settings: &ValidationSettings) -> Self {
        Self {
            fully_in_parent: settings.fully_in_parent,
            min_width: settings.min_width,
            min_height: settings.min_height,
            max_angle_change: settings.max_angle_change,
            first_segment_angle: settings.first_segment_angle,
            min_baseline_length: settings.min_baseline_length,
        }
    }
}

/// Validates point lists of one element against its page and parent.
#[derive(Debug, Clone)]
pub struct Validator<'a> {
    kind: ShapeKind,
    limits: &'a ValidationLimits,
    page: Option<(f64, f64)>,
    parent: Option<(&'a str, &'a [Point2D])>,
}

impl<'a> Validator<'a> {
    pub fn new(kind: ShapeKind, limits: &'a ValidationLimits) -> Self {
        Self {
            kind,
            limits,
            page: None,
            parent: None,
        }
    }

    /// Page image size; points must stay within `[0, width] x [0, height]`.
    pub fn with_page(mut self, width: f64, height: f64) -> Self {
        self.page = Some((width, height));
        self
    }

    /// Parent polygon used in fully-in-parent mode.
    pub fn with_parent(mut self, id: &'a str, polygon: &'a [Point2D]) -> Self {
        self.parent = Some((id, polygon));
        self
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn validate(&self, points: &[Point2D], stage: Stage) -> Result<(), GeometryError> {
        self.check_page(points)?;
        self.check_parent(points)?;
        if stage == Stage::Completion {
            self.check_count(points)?;
            self.check_size(points)?;
            if self.kind == ShapeKind::Baseline {
                self.check_angles(points)?;
                self.check_length(points)?;
            }
        }
        Ok(())
    }

    fn check_page(&self, points: &[Point2D]) -> Result<(), GeometryError> {
        let Some((width, height)) = self.page else {
            return Ok(());
        };
        match points
            .iter()
            .find(|p| !(0.0..=width).contains(&p.x) || !(0.0..=height).contains(&p.y))
        {
            Some(p) => Err(GeometryError::OutOfBounds {
                x: p.x,
                y: p.y,
                width,
                height,
            }),
            None => Ok(()),
        }
    }

    fn check_parent(&self, points: &[Point2D]) -> Result<(), GeometryError> {
        if !self.limits.fully_in_parent {
            return Ok(());
        }
        let Some((id, polygon)) = self.parent else {
            return Ok(());
        };
        if polygon.len() < 3 {
            return Ok(());
        }
        match points.iter().find(|p| !point_in_polygon(**p, polygon)) {
            Some(p) => Err(GeometryError::OutsideParent {
                x: p.x,
                y: p.y,
                parent: id.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn check_count(&self, points: &[Point2D]) -> Result<(), GeometryError> {
        let min = self.kind.min_points();
        if points.len() < min {
            return Err(GeometryError::TooFewPoints {
                min,
                got: points.len(),
            });
        }
        Ok(())
    }

    fn check_size(&self, points: &[Point2D]) -> Result<(), GeometryError> {
        let Some(bbox) = BoundingBox::of(points) else {
            return Ok(());
        };
        let (width, height) = (bbox.width(), bbox.height());
        let too_small = if self.kind == ShapeKind::Baseline {
            // a baseline may run in any direction
            width.max(height) < self.limits.min_width
        } else {
            width < self.limits.min_width || height < self.limits.min_height
        };
        if too_small {
            return Err(GeometryError::TooSmall {
                width,
                height,
                min_width: self.limits.min_width,
                min_height: self.limits.min_height,
            });
        }
        Ok(())
    }

    fn check_angles(&self, points: &[Point2D]) -> Result<(), GeometryError> {
        let angles: Vec<f64> = points
            .windows(2)
            .filter(|w| w[0] != w[1])
            .map(|w| segment_angle(w[0], w[1]))
            .collect();

        if let (Some([min, max]), Some(&first)) = (self.limits.first_segment_angle, angles.first())
        {
            if first < min || first > max {
                return Err(GeometryError::FirstSegmentAngle {
                    angle: first,
                    min,
                    max,
                });
            }
        }

        for (i, pair) in angles.windows(2).enumerate() {
            let turn = angle_between(pair[0], pair[1]);
            if turn > self.limits.max_angle_change {
                return Err(GeometryError::AngleChangeTooLarge {
                    index: i + 1,
                    angle: turn,
                    max: self.limits.max_angle_change,
                });
            }
        }
        Ok(())
    }

    fn check_length(&self, points: &[Point2D]) -> Result<(), GeometryError> {
        let length = polyline_length(points);
        if length < self.limits.min_baseline_length {
            return Err(GeometryError::TooShort {
                length,
                min: self.limits.min_baseline_length,
            });
        }
        Ok(())
    }
}
