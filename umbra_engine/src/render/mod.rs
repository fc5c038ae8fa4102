pub mod integrator;
pub mod renderer;
pub mod state;
pub mod threads;
