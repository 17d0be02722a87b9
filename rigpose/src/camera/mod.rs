pub mod orbit;

use {
    crate::scene::Global3,
    hecs::{Entity, World},
    nalgebra as na,
    parry3d::query::Ray,
};

#[derive(Clone, Copy, Debug)]
pub enum Camera {
    Perspective(na::Perspective3<f32>),
    Orthographic(na::Orthographic3<f32>),
}

impl Camera {
    pub fn projection(&self) -> na::Matrix4<f32> {
        match self {
            Camera::Perspective(perspective) => perspective.to_homogeneous(),
            Camera::Orthographic(orthographic) => orthographic.to_homogeneous(),
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        match self {
            Camera::Perspective(perspective) => perspective.set_aspect(aspect),
            Camera::Orthographic(orthographic) => {
                let half_height = (orthographic.top() - orthographic.bottom()) * 0.5;
                orthographic.set_left_and_right(-half_height * aspect, half_height * aspect);
            }
        }
    }

    /// Builds world space ray that starts at the near plane
    /// and passes through point at normalized device coordinates.
    pub fn ray(&self, view: &Global3, ndc: na::Point2<f32>) -> Ray {
        let near = na::Point3::new(ndc.x, ndc.y, -1.0);
        let far = na::Point3::new(ndc.x, ndc.y, 1.0);

        let (near, far) = match self {
            Camera::Perspective(perspective) => {
                (perspective.unproject_point(&near), perspective.unproject_point(&far))
            }
            Camera::Orthographic(orthographic) => (
                orthographic.unproject_point(&near),
                orthographic.unproject_point(&far),
            ),
        };

        let near = view.iso.transform_point(&near);
        let far = view.iso.transform_point(&far);
        Ray::new(near, (far - near).normalize())
    }

    /// Projects world space point into normalized device coordinates.
    pub fn project(&self, view: &Global3, point: &na::Point3<f32>) -> na::Point3<f32> {
        let point = view.iso.inverse_transform_point(point);
        match self {
            Camera::Perspective(perspective) => perspective.project_point(&point),
            Camera::Orthographic(orthographic) => orthographic.project_point(&point),
        }
    }
}

/// Finds first entity that has both `Camera` and `Global3`.
pub fn find_camera(world: &World) -> Option<(Entity, Camera, Global3)> {
    world
        .query::<(&Camera, &Global3)>()
        .iter()
        .next()
        .map(|(entity, (camera, global))| (entity, *camera, *global))
}

/// Size of the area input coordinates are relative to.
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Viewport { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }

    /// Zero area viewport, e.g. of a minimized window.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Maps pixel position, Y pointing down, to normalized device coordinates.
    /// Returns `None` for empty viewport.
    pub fn to_ndc(&self, x: f32, y: f32) -> Option<na::Point2<f32>> {
        if self.is_empty() {
            return None;
        }

        Some(na::Point2::new(
            (x / self.width) * 2.0 - 1.0,
            -(y / self.height) * 2.0 + 1.0,
        ))
    }

    pub fn to_screen(&self, ndc: na::Point2<f32>) -> na::Point2<f32> {
        na::Point2::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (1.0 - ndc.y) * 0.5 * self.height,
        )
    }
}
