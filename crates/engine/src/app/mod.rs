mod input;
mod loop_runner;
mod metrics;
mod pacing;
mod rendering;
mod scene;

pub use input::{EdgeStates, InputAction, InputEdge};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{
    mix, project_point, shade, Camera3D, Color, Primitive, Projected, Projection, Renderer,
    Viewport, NEAR_PLANE,
};
pub use scene::{HudSlot, HudState, InputSnapshot, Scene, SceneCommand, SceneHost, SceneWorld};
