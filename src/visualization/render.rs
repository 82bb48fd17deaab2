//! Render extraction: project live particles into a depth-sorted draw list
//!
//! The core never draws. A renderer calls [`extract`] once per frame and
//! paints the sprites in order (back to front). Points behind the camera are
//! culled here.

use crate::simulation::states::{Particle, Rgba, Shape};
use crate::simulation::system::ParticleSystem;
use crate::visualization::camera::{Camera3D, Projection};

/// One projected particle, ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub id: u64,
    pub x: f64,      // screen offset from the view center
    pub y: f64,
    pub depth: f64,  // rotated z, larger is further away
    pub radius: f64, // on-screen radius, size / 2 * scale
    pub color: Rgba,
    pub opacity: f64,
    pub shape: Shape,
}

/// Project one particle, `None` if it is behind the camera
pub fn project_particle(p: &Particle, camera: &Camera3D) -> Option<Sprite> {
    let proj = camera.project(p.pos.x, p.pos.y, p.pos.z);
    if !proj.is_visible() {
        return None;
    }
    Some(Sprite {
        id: p.id,
        x: proj.x,
        y: proj.y,
        depth: proj.z,
        radius: p.size * 0.5 * proj.scale,
        color: p.color,
        opacity: p.opacity,
        shape: p.shape,
    })
}

/// Project every live particle and sort back to front
pub fn extract(system: &ParticleSystem, camera: &Camera3D) -> Vec<Sprite> {
    let mut sprites: Vec<Sprite> = system
        .particles()
        .filter_map(|p| project_particle(p, camera))
        .collect();
    sprites.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    sprites
}

/// Whether a connecting segment between two projected points should be drawn
#[inline]
pub fn segment_visible(a: &Projection, b: &Projection) -> bool {
    a.is_visible() && b.is_visible()
}
