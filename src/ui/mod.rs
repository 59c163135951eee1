/// Drawing the loaded track
///
/// - Surface-independent rendering and canvas sizing (render.rs)
/// - iced canvas program and frame adapter (canvas.rs)

pub mod canvas;
pub mod render;
