pub mod accel;
pub mod background;
pub mod camera;
pub mod core;
pub mod light;
pub mod material;
pub mod mesh;
pub mod render;
pub mod scene;
pub mod shared;
