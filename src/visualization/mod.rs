pub mod camera;
pub mod render;
