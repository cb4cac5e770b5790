/// An axis-aligned detection box in frame pixel coordinates.
///
/// `(x1, y1)` is the top-left corner, `(x2, y2)` the bottom-right.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
    pub class_id: usize,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Clamps the box to a `width x height` frame.
    pub fn clamped(&self, width: u32, height: u32) -> BoundingBox {
        let w = width as f64;
        let h = height as f64;
        BoundingBox {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn bbox(x1: f64, y1: f64, x2: f64, y2: f64) -> BoundingBox {
        BoundingBox {
            x1,
            y1,
            x2,
            y2,
            confidence: 0.9,
            class_id: 0,
        }
    }

    #[test]
    fn test_iou_identical() {
        let a = bbox(10.0, 10.0, 110.0, 110.0);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[rstest]
    #[case::no_overlap(bbox(0.0, 0.0, 50.0, 50.0), bbox(100.0, 100.0, 150.0, 150.0), 0.0)]
    #[case::partial(bbox(0.0, 0.0, 100.0, 100.0), bbox(50.0, 0.0, 150.0, 100.0), 5000.0 / 15000.0)]
    #[case::contained(bbox(0.0, 0.0, 100.0, 100.0), bbox(25.0, 25.0, 75.0, 75.0), 2500.0 / 10000.0)]
    #[case::touching(bbox(0.0, 0.0, 50.0, 50.0), bbox(50.0, 0.0, 100.0, 50.0), 0.0)]
    fn test_iou(#[case] a: BoundingBox, #[case] b: BoundingBox, #[case] expected: f64) {
        assert_relative_eq!(a.iou(&b), expected);
        assert_relative_eq!(b.iou(&a), expected);
    }

    #[test]
    fn test_degenerate_box_has_zero_area() {
        let b = bbox(10.0, 10.0, 5.0, 20.0);
        assert_relative_eq!(b.width(), 0.0);
        assert_relative_eq!(b.area(), 0.0);
    }

    #[test]
    fn test_clamped_keeps_metadata() {
        let b = BoundingBox {
            confidence: 0.4,
            class_id: 2,
            ..bbox(-10.0, -5.0, 700.0, 300.0)
        };
        let c = b.clamped(640, 480);
        assert_relative_eq!(c.x1, 0.0);
        assert_relative_eq!(c.y1, 0.0);
        assert_relative_eq!(c.x2, 640.0);
        assert_relative_eq!(c.y2, 300.0);
        assert_eq!(c.class_id, 2);
        assert_relative_eq!(c.confidence, 0.4);
    }
}
