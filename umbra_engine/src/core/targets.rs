use crate::tracing_targets;

tracing_targets! {
    SCENE = "scene",
    BUILDER = "builder",
    MESH = "mesh",
    SMOOTH = "smooth",
    ACCEL = "accel",
    RENDERER = "renderer",
}
