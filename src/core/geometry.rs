use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in top-left, Y-down coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Box expressed as percentages of the page dimensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PercentBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.bottom - self.top).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn is_degenerate(&self) -> bool {
        self.right - self.left <= 0.0 || self.bottom - self.top <= 0.0
    }

    /// Finite coordinates with `left <= right` and `top <= bottom`.
    pub fn is_valid(&self) -> bool {
        [self.left, self.top, self.right, self.bottom]
            .iter()
            .all(|v| v.is_finite())
            && self.left <= self.right
            && self.top <= self.bottom
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// `other` lies inside `self`, edges included.
    pub fn contains(&self, other: &Self) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    pub fn iou(&self, other: &Self) -> f64 {
        let inter = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if inter.is_degenerate() {
            return 0.0;
        }

        let inter_area = inter.area();
        let union = self.area() + other.area() - inter_area;
        if union <= 0.0 {
            0.0
        } else {
            (inter_area / union).clamp(0.0, 1.0)
        }
    }
}

pub fn to_absolute(rect: &PercentBox, page_width: f64, page_height: f64) -> Rect {
    let left = rect.x / 100.0 * page_width;
    let top = rect.y / 100.0 * page_height;
    Rect {
        left,
        top,
        right: left + rect.width / 100.0 * page_width,
        bottom: top + rect.height / 100.0 * page_height,
    }
}

pub fn to_percentage(rect: &Rect, page_width: f64, page_height: f64) -> PercentBox {
    PercentBox {
        x: rect.left / page_width * 100.0,
        y: rect.top / page_height * 100.0,
        width: (rect.right - rect.left) / page_width * 100.0,
        height: (rect.bottom - rect.top) / page_height * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn computes_iou() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 15.0, 15.0);
        assert_eq!(a.iou(&b), 25.0 / 175.0);
        assert_eq!(a.iou(&b), b.iou(&a));
    }

    #[test]
    fn iou_of_identical_rect_is_one() {
        let a = Rect::new(3.0, 4.0, 20.0, 9.5);
        assert_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn disjoint_and_touching_rects_have_zero_iou() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.iou(&Rect::new(20.0, 20.0, 30.0, 30.0)), 0.0);
        // shared edge only
        assert_eq!(a.iou(&Rect::new(10.0, 0.0, 20.0, 10.0)), 0.0);
    }

    #[test]
    fn degenerate_rects_have_zero_iou() {
        let line = Rect::new(0.0, 5.0, 10.0, 5.0);
        assert_eq!(line.iou(&line), 0.0);
        assert_eq!(line.iou(&Rect::new(0.0, 0.0, 10.0, 10.0)), 0.0);
    }

    #[test]
    fn iou_stays_in_bounds() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(2.0, 3.0, 7.0, 12.0),
            Rect::new(-5.0, -5.0, 1.0, 1.0),
            Rect::new(0.0, 0.0, 0.0, 0.0),
            Rect::new(9.0, 9.0, 100.0, 100.0),
        ];
        for a in &rects {
            for b in &rects {
                let v = a.iou(b);
                assert!((0.0..=1.0).contains(&v));
                assert_eq!(v, b.iou(a));
            }
        }
    }

    #[test]
    fn containment_includes_edges() {
        let region = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert!(region.contains(&Rect::new(0.0, 0.0, 100.0, 50.0)));
        assert!(region.contains(&Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!region.contains(&Rect::new(90.0, 10.0, 101.0, 20.0)));
    }

    #[test]
    fn converts_percentage_to_absolute() {
        let p = PercentBox {
            x: 50.0,
            y: 50.0,
            width: 10.0,
            height: 10.0,
        };
        assert_eq!(to_absolute(&p, 200.0, 400.0), Rect::new(100.0, 200.0, 120.0, 240.0));
    }

    #[test]
    fn percentage_round_trips() {
        let boxes = [
            PercentBox { x: 12.5, y: 33.3, width: 7.1, height: 0.9 },
            PercentBox { x: 0.0, y: 0.0, width: 100.0, height: 100.0 },
            PercentBox { x: 87.21, y: 4.02, width: 1.3, height: 2.7 },
        ];
        for p in &boxes {
            for (w, h) in [(612.0, 792.0), (1.0, 1.0), (2480.0, 3508.0)] {
                let back = to_percentage(&to_absolute(p, w, h), w, h);
                assert!(close(back.x, p.x), "{back:?} vs {p:?}");
                assert!(close(back.y, p.y));
                assert!(close(back.width, p.width));
                assert!(close(back.height, p.height));
            }
        }
    }
}
