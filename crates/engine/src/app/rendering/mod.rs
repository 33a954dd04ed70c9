mod hud;
mod primitive;
mod raster;
mod renderer;
mod transform;

pub(crate) use hud::OverlayData;
pub use primitive::{mix, shade, Color, Primitive};
pub use renderer::Renderer;
pub use transform::{project_point, Camera3D, Projected, Projection, Viewport, NEAR_PLANE};
