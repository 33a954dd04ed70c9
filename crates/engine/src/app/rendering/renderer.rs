use std::sync::Arc;

use glam::Vec3;
use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::SceneWorld;

use super::hud::{draw_hud, draw_overlay, OverlayData};
use super::primitive::{mix, Color, Primitive};
use super::raster::{apply_vignette, clear, fill_convex_polygon, fill_square};
use super::transform::{clip_to_near, project_view, Camera3D, Projection, Viewport};

const FOG_START: f32 = 25.0;
const FOG_RANGE: f32 = 55.0;
const FOG_MAX: f32 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Shape {
    Polygon(Vec<(f32, f32)>),
    Square { x: f32, y: f32, half_size: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawCommand {
    pub(crate) depth: f32,
    pub(crate) shape: Shape,
    pub(crate) color: Color,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    pixel_ratio: u32,
    draw_list: Vec<DrawCommand>,
}

impl Renderer {
    /// The framebuffer is the window size divided by `pixel_ratio`, scaled up on present.
    pub fn new(window: Arc<Window>, pixel_ratio: u32) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixel_ratio = pixel_ratio.max(1);
        let viewport = buffer_viewport(size.width, size.height, pixel_ratio);
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height, viewport)?;
        Ok(Self {
            window,
            pixels,
            viewport,
            pixel_ratio,
            draw_list: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        let viewport = buffer_viewport(width, height, self.pixel_ratio);
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height, viewport)?;
        self.viewport = viewport;
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
        buffer: Viewport,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(buffer.width, buffer.height, surface)
    }

    pub(crate) fn render_world(
        &mut self,
        world: &SceneWorld,
        overlay: Option<&OverlayData>,
    ) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        build_draw_list(world, self.viewport, &mut self.draw_list);
        let frame = self.pixels.frame_mut();
        rasterize(frame, self.viewport, world, &self.draw_list);
        if let Some(data) = overlay {
            draw_overlay(frame, self.viewport, data);
        }
        self.pixels.render()
    }
}

fn buffer_viewport(width: u32, height: u32, pixel_ratio: u32) -> Viewport {
    Viewport {
        width: (width / pixel_ratio).max(1),
        height: (height / pixel_ratio).max(1),
    }
}

/// Projects every visible primitive and sorts the result back to front.
pub(crate) fn build_draw_list(
    world: &SceneWorld,
    viewport: Viewport,
    draw_list: &mut Vec<DrawCommand>,
) {
    draw_list.clear();
    let camera = world.camera();
    let sky = world.sky_color();

    for primitive in world.primitives() {
        match primitive {
            Primitive::Quad { corners, color } => {
                if is_back_facing(primitive, camera) {
                    continue;
                }
                let view: Vec<Vec3> = corners
                    .iter()
                    .map(|corner| camera.to_view_space(*corner))
                    .collect();
                let clipped = clip_to_near(&view);
                if clipped.len() < 3 {
                    continue;
                }
                let mut points = Vec::with_capacity(clipped.len());
                let mut depth_sum = 0.0;
                for vertex in &clipped {
                    let Some(projected) = project_view(*vertex, camera, viewport) else {
                        continue;
                    };
                    depth_sum += projected.depth;
                    points.push((projected.x, projected.y));
                }
                if points.len() < 3 {
                    continue;
                }
                let depth = depth_sum / points.len() as f32;
                draw_list.push(DrawCommand {
                    depth,
                    shape: Shape::Polygon(points),
                    color: fogged(*color, sky, depth, camera),
                });
            }
            Primitive::Point {
                position,
                size,
                color,
            } => {
                let Some(projected) =
                    project_view(camera.to_view_space(*position), camera, viewport)
                else {
                    continue;
                };
                draw_list.push(DrawCommand {
                    depth: projected.depth,
                    shape: Shape::Square {
                        x: projected.x,
                        y: projected.y,
                        half_size: size * projected.scale * 0.5,
                    },
                    color: fogged(*color, sky, projected.depth, camera),
                });
            }
        }
    }

    draw_list.sort_by(|a, b| b.depth.total_cmp(&a.depth));
}

fn is_back_facing(primitive: &Primitive, camera: &Camera3D) -> bool {
    let Some(normal) = primitive.normal() else {
        return false;
    };
    let towards_camera = match camera.projection {
        Projection::Perspective { .. } => camera.position - primitive.center(),
        Projection::Orthographic { .. } => -(camera.rotation() * Vec3::NEG_Z),
    };
    normal.dot(towards_camera) <= 0.0
}

fn fogged(color: Color, sky: Color, depth: f32, camera: &Camera3D) -> Color {
    match camera.projection {
        Projection::Perspective { .. } => {
            let amount = ((depth - FOG_START) / FOG_RANGE).clamp(0.0, 1.0) * FOG_MAX;
            let mut result = mix(color, sky, amount);
            result[3] = color[3];
            result
        }
        Projection::Orthographic { .. } => color,
    }
}

pub(crate) fn rasterize(
    frame: &mut [u8],
    viewport: Viewport,
    world: &SceneWorld,
    draw_list: &[DrawCommand],
) {
    clear(frame, world.sky_color());
    for command in draw_list {
        match &command.shape {
            Shape::Polygon(points) => fill_convex_polygon(frame, viewport, points, command.color),
            Shape::Square { x, y, half_size } => {
                fill_square(frame, viewport, *x, *y, *half_size, command.color)
            }
        }
    }
    let hud = world.hud();
    apply_vignette(frame, viewport, hud.vignette);
    draw_hud(frame, viewport, hud);
}
