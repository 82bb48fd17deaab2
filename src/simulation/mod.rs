pub mod states;
pub mod collision;
pub mod physics;
pub mod emitter;
pub mod system;
pub mod updaters;
pub mod grid;
pub mod fluid;
pub mod forces;
pub mod integrator;
pub mod scenario;
