//! Stateless 2D collision detection and response helpers
//!
//! Pure geometry: rectangles, circles, points, segments and swept AABBs.
//! Only [`apply_circle_separation`] knows about particles, and it writes
//! into a caller-owned force array instead of touching velocities so it can
//! be summed with other force sources before integration.
//!
//! Boundary conventions:
//! - `rect_rect` is strict, rectangles that only share an edge do not collide
//! - circle and point tests are inclusive, touching counts as inside

use serde::Deserialize;

use crate::simulation::states::{NVec2, Particle, DIST_EPSILON};

/// Axis-aligned rectangle, `(x, y)` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> NVec2 {
        NVec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Grow by `amount` on every side
    pub fn expand(&self, amount: f64) -> Rect {
        Rect {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + 2.0 * amount,
            height: self.height + 2.0 * amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Circle {
    pub const fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }
}

/// Line segment `(x1, y1) -> (x2, y2)`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Result of a swept AABB test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    pub time: f64, // fraction of this frame's motion, in [0, 1]
    pub normal_x: f64,
    pub normal_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleOverlap {
    pub overlap: f64,
    pub nx: f64, // unit normal from a to b
    pub ny: f64,
    pub dist: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SeparationOptions {
    pub strength: f64,
    pub use_size_as_radius: bool,
    pub radius: f64, // fixed radius used when `use_size_as_radius` is false
}

impl Default for SeparationOptions {
    fn default() -> Self {
        Self {
            strength: 1.0,
            use_size_as_radius: true,
            radius: 5.0,
        }
    }
}

// =========================================================================================
// Predicates
// =========================================================================================

pub fn rect_rect(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

pub fn circle_circle(a: &Circle, b: &Circle) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let r = a.radius + b.radius;
    dx * dx + dy * dy <= r * r
}

/// Negative extents are normalised, and NaN bounds never panic
pub fn circle_rect(c: &Circle, r: &Rect) -> bool {
    // closest point on the rect to the circle center
    let cx = c.x.max(r.x.min(r.right())).min(r.x.max(r.right()));
    let cy = c.y.max(r.y.min(r.bottom())).min(r.y.max(r.bottom()));
    let dx = c.x - cx;
    let dy = c.y - cy;
    dx * dx + dy * dy <= c.radius * c.radius
}

pub fn point_rect(px: f64, py: f64, r: &Rect) -> bool {
    px >= r.x && px <= r.right() && py >= r.y && py <= r.bottom()
}

pub fn point_circle(px: f64, py: f64, c: &Circle) -> bool {
    let dx = px - c.x;
    let dy = py - c.y;
    dx * dx + dy * dy <= c.radius * c.radius
}

/// Segment/segment intersection via the cross-product parametrisation
///
/// Parallel segments (`denom == 0`) report `false`, which means colinear
/// overlapping segments are not detected.
#[allow(clippy::too_many_arguments)]
pub fn line_line(x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64, x4: f64, y4: f64) -> bool {
    let denom = (y4 - y3) * (x2 - x1) - (x4 - x3) * (y2 - y1);
    if denom == 0.0 {
        return false;
    }
    let ua = ((x4 - x3) * (y1 - y3) - (y4 - y3) * (x1 - x3)) / denom;
    let ub = ((x2 - x1) * (y1 - y3) - (y2 - y1) * (x1 - x3)) / denom;
    (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub)
}

/// Segment against a rect grown by `thickness / 2` on every side
pub fn line_rect(x1: f64, y1: f64, x2: f64, y2: f64, rect: &Rect, thickness: f64) -> bool {
    let r = rect.expand(thickness * 0.5);

    if point_rect(x1, y1, &r) || point_rect(x2, y2, &r) {
        return true;
    }

    let (left, top, right, bottom) = (r.x, r.y, r.right(), r.bottom());
    line_line(x1, y1, x2, y2, left, top, left, bottom)
        || line_line(x1, y1, x2, y2, right, top, right, bottom)
        || line_line(x1, y1, x2, y2, left, top, right, top)
        || line_line(x1, y1, x2, y2, left, bottom, right, bottom)
}

/// True if any segment of a multi-segment path touches the rect
pub fn segments_rect(segments: &[Segment], rect: &Rect, thickness: f64) -> bool {
    segments
        .iter()
        .any(|s| line_rect(s.x1, s.y1, s.x2, s.y2, rect, thickness))
}

// =========================================================================================
// Response helpers
// =========================================================================================

/// Per-axis penetration depth of two overlapping rects
pub fn get_overlap(a: &Rect, b: &Rect) -> Option<NVec2> {
    let ox = a.right().min(b.right()) - a.x.max(b.x);
    let oy = a.bottom().min(b.bottom()) - a.y.max(b.y);
    if ox <= 0.0 || oy <= 0.0 {
        return None;
    }
    Some(NVec2::new(ox, oy))
}

/// Minimum translation vector that moves `a` out of `b`
///
/// Pushes along the axis of smaller overlap only, away from `b`'s center.
/// Equal overlaps resolve on X. When the centers tie on that axis the sign
/// comes from the other axis, then from the top-left corners and sizes, so
/// `get_mtv(a, b) == -get_mtv(b, a)` for every pair except identical rects,
/// which are pushed in the positive direction both ways.
pub fn get_mtv(a: &Rect, b: &Rect) -> Option<NVec2> {
    let overlap = get_overlap(a, b)?;
    let ca = a.center();
    let cb = b.center();

    if overlap.x <= overlap.y {
        let sign = push_sign(&[
            (ca.x, cb.x),
            (ca.y, cb.y),
            (a.x, b.x),
            (a.y, b.y),
            (a.width, b.width),
            (a.height, b.height),
        ]);
        Some(NVec2::new(sign * overlap.x, 0.0))
    } else {
        let sign = push_sign(&[
            (ca.y, cb.y),
            (ca.x, cb.x),
            (a.y, b.y),
            (a.x, b.x),
            (a.height, b.height),
            (a.width, b.width),
        ]);
        Some(NVec2::new(0.0, sign * overlap.y))
    }
}

// first differing pair decides: `a` before `b` is pushed negative
fn push_sign(keys: &[(f64, f64)]) -> f64 {
    for &(ka, kb) in keys {
        if ka < kb {
            return -1.0;
        }
        if ka > kb {
            return 1.0;
        }
    }
    1.0
}

/// Swept AABB test of `rect` moving by `(vx, vy)` this frame against a static `target`
///
/// Minkowski-sums the two boxes and runs the slab method on the resulting
/// ray. Returns `None` when there is no contact within this frame's motion
/// or when the boxes already overlap at the start (use [`get_mtv`] for that).
pub fn sweep(rect: &Rect, vx: f64, vy: f64, target: &Rect) -> Option<SweepHit> {
    // Minkowski sum: target grown by rect's size, ray starts at rect's corner
    let min_x = target.x - rect.width;
    let max_x = target.right();
    let min_y = target.y - rect.height;
    let max_y = target.bottom();

    let (x_entry, x_exit) = if vx == 0.0 {
        if rect.x <= min_x || rect.x >= max_x {
            return None;
        }
        (f64::NEG_INFINITY, f64::INFINITY)
    } else {
        let t1 = (min_x - rect.x) / vx;
        let t2 = (max_x - rect.x) / vx;
        (t1.min(t2), t1.max(t2))
    };

    let (y_entry, y_exit) = if vy == 0.0 {
        if rect.y <= min_y || rect.y >= max_y {
            return None;
        }
        (f64::NEG_INFINITY, f64::INFINITY)
    } else {
        let t1 = (min_y - rect.y) / vy;
        let t2 = (max_y - rect.y) / vy;
        (t1.min(t2), t1.max(t2))
    };

    let entry = x_entry.max(y_entry);
    let exit = x_exit.min(y_exit);

    if entry > exit || entry < 0.0 || entry > 1.0 {
        return None;
    }

    let (normal_x, normal_y) = if x_entry > y_entry {
        (if vx > 0.0 { -1.0 } else { 1.0 }, 0.0)
    } else {
        (0.0, if vy > 0.0 { -1.0 } else { 1.0 })
    };

    Some(SweepHit {
        time: entry,
        normal_x,
        normal_y,
    })
}

pub fn get_circle_overlap(a: &Circle, b: &Circle) -> Option<CircleOverlap> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let dist = (dx * dx + dy * dy).sqrt();
    let overlap = a.radius + b.radius - dist;
    if overlap <= 0.0 {
        return None;
    }
    let safe = dist.max(DIST_EPSILON);
    Some(CircleOverlap {
        overlap,
        nx: dx / safe,
        ny: dy / safe,
        dist,
    })
}

/// Pairwise circle-overlap repulsion accumulated into `forces`
///
/// `forces[i]` belongs to `particles[i]`; dead particles are skipped. Each
/// overlapping pair receives equal and opposite pushes of
/// `overlap * strength` along the line between centers.
pub fn apply_circle_separation(particles: &[Particle], forces: &mut [NVec2], opts: &SeparationOptions) {
    let n = particles.len().min(forces.len());

    let circle = |p: &Particle| {
        let radius = if opts.use_size_as_radius {
            p.size * 0.5
        } else {
            opts.radius
        };
        Circle::new(p.pos.x, p.pos.y, radius)
    };

    for i in 0..n {
        if !particles[i].alive {
            continue;
        }
        let ci = circle(&particles[i]);
        for j in (i + 1)..n {
            if !particles[j].alive {
                continue;
            }
            let Some(hit) = get_circle_overlap(&ci, &circle(&particles[j])) else {
                continue;
            };
            let push = NVec2::new(hit.nx, hit.ny) * (hit.overlap * opts.strength);
            forces[i] -= push;
            forces[j] += push;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_rects_do_not_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!rect_rect(&a, &b));
        assert!(get_overlap(&a, &b).is_none());
    }

    #[test]
    fn touching_circles_collide() {
        let a = Circle::new(0.0, 0.0, 5.0);
        let b = Circle::new(10.0, 0.0, 5.0);
        assert!(circle_circle(&a, &b));
    }

    #[test]
    fn mtv_tie_on_push_axis_uses_other_axis() {
        // same x center, x overlap is the smaller one
        let a = Rect::new(0.0, 0.0, 2.0, 10.0);
        let b = Rect::new(0.0, 1.0, 2.0, 10.0);

        let ab = get_mtv(&a, &b).unwrap();
        let ba = get_mtv(&b, &a).unwrap();
        assert_eq!(ab, NVec2::new(-2.0, 0.0));
        assert_eq!(ab, -ba);

        // same center, different sizes
        let c = Rect::new(0.0, 0.0, 4.0, 4.0);
        let d = Rect::new(1.0, 1.0, 2.0, 2.0);
        assert_eq!(get_mtv(&c, &d).unwrap(), -get_mtv(&d, &c).unwrap());
    }

    #[test]
    fn circle_rect_handles_inverted_and_nan_rects() {
        let c = Circle::new(0.0, 0.0, 1.0);

        // negative width spans x in [5, 10]
        assert!(!circle_rect(&c, &Rect::new(10.0, 0.0, -5.0, 4.0)));
        assert!(circle_rect(&Circle::new(7.0, 2.0, 1.0), &Rect::new(10.0, 0.0, -5.0, 4.0)));
        let _ = circle_rect(&c, &Rect::new(f64::NAN, 0.0, 4.0, f64::NAN));
    }

    #[test]
    fn expand_grows_all_sides() {
        let r = Rect::new(0.0, 0.0, 4.0, 2.0).expand(1.0);
        assert_eq!(r, Rect::new(-1.0, -1.0, 6.0, 4.0));
    }
}
