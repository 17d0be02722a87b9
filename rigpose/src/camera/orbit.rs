use {
    super::{Camera, Viewport},
    crate::{
        config::CameraConfig,
        engine::{System, SystemContext},
        input::InputEvent,
        scene::Global3,
    },
    hecs::{Entity, World},
    nalgebra as na,
    std::f32::consts::{PI, TAU},
    winit::event::{ElementState, MouseButton, VirtualKeyCode},
};

const MIN_POLAR: f32 = 1e-4;

/// Camera orbiting around a target point.
///
/// Yaw is measured around Y axis from +Z,
/// pitch is the polar angle from +Y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pub target: na::Point3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    /// Disabled camera ignores input.
    pub enabled: bool,
}

impl OrbitCamera {
    pub fn looking_at(eye: na::Point3<f32>, target: na::Point3<f32>) -> Self {
        let offset = eye - target;
        let distance = offset.norm();
        let pitch = if distance > 0.0 {
            (offset.y / distance).max(-1.0).min(1.0).acos()
        } else {
            PI / 2.0
        };

        OrbitCamera {
            target,
            yaw: offset.x.atan2(offset.z),
            pitch,
            distance,
            enabled: true,
        }
    }

    pub fn eye(&self) -> na::Point3<f32> {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + na::Vector3::new(sp * sy, cp, sp * cy) * self.distance
    }

    pub fn isometry(&self) -> na::Isometry3<f32> {
        na::Isometry3::look_at_rh(&self.eye(), &self.target, &na::Vector3::y())
            .inverse()
    }
}

/// Enables or disables input handling of the orbit camera.
/// Does nothing if entity has no `OrbitCamera`.
pub fn set_enabled(world: &World, camera: Entity, enabled: bool) {
    match world.get_mut::<OrbitCamera>(camera) {
        Ok(mut orbit) => {
            if orbit.enabled != enabled {
                tracing::trace!("Orbit camera enabled: {}", enabled);
                orbit.enabled = enabled;
            }
        }
        Err(_) => {
            tracing::trace!("Entity {:?} has no orbit camera", camera);
        }
    }
}

/// Entity without `OrbitCamera` counts as disabled.
pub fn is_enabled(world: &World, camera: Entity) -> bool {
    world
        .get::<OrbitCamera>(camera)
        .map(|orbit| orbit.enabled)
        .unwrap_or(false)
}

bitflags::bitflags! {
    pub struct Held: u8 {
        const ROTATE = 0b001;
        const DOLLY = 0b010;
        const PAN_MODIFIER = 0b100;
    }
}

/// Orbit, pan and dolly camera control.
///
/// Right button rotates around the target, right button with Space held pans,
/// middle button dollies and the wheel zooms.
/// Rotation and pan come to rest gradually, decaying by `damping` each frame.
pub struct OrbitCameraSystem {
    held: Held,
    cursor: Option<na::Point2<f32>>,
    viewport_height: f32,
    yaw_delta: f32,
    pitch_delta: f32,
    pan_delta: na::Vector3<f32>,
    damping: f32,
    rotate_speed: f32,
    pan_speed: f32,
    zoom_speed: f32,
}

impl OrbitCameraSystem {
    pub fn new() -> Self {
        OrbitCameraSystem {
            held: Held::empty(),
            cursor: None,
            viewport_height: 1.0,
            yaw_delta: 0.0,
            pitch_delta: 0.0,
            pan_delta: na::Vector3::zeros(),
            damping: 0.05,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
        }
    }

    pub fn from_config(config: &CameraConfig, viewport: Viewport) -> Self {
        OrbitCameraSystem {
            damping: config.damping,
            rotate_speed: config.rotate_speed,
            pan_speed: config.pan_speed,
            zoom_speed: config.zoom_speed,
            viewport_height: viewport.height.max(1.0),
            ..OrbitCameraSystem::new()
        }
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    fn handle(&mut self, event: &InputEvent, orbit: &mut OrbitCamera, fovy: Option<f32>) {
        match *event {
            InputEvent::Resized { height, .. } => {
                if height > 0 {
                    self.viewport_height = height as f32;
                }
            }
            InputEvent::Key {
                code: VirtualKeyCode::Space,
                state,
            } => {
                self.held.set(Held::PAN_MODIFIER, state == ElementState::Pressed);
            }
            _ if !orbit.enabled => {
                self.held.remove(Held::ROTATE | Held::DOLLY);
            }
            InputEvent::PointerDown { button, x, y } => {
                let flag = match button {
                    MouseButton::Right => Held::ROTATE,
                    MouseButton::Middle => Held::DOLLY,
                    _ => return,
                };
                self.held.insert(flag);
                self.cursor = Some(na::Point2::new(x, y));
            }
            InputEvent::PointerUp { button } => match button {
                MouseButton::Right => self.held.remove(Held::ROTATE),
                MouseButton::Middle => self.held.remove(Held::DOLLY),
                _ => {}
            },
            InputEvent::PointerMove { x, y } => {
                let position = na::Point2::new(x, y);
                let delta = match self.cursor.replace(position) {
                    Some(last) => position - last,
                    None => return,
                };

                if self.held.contains(Held::ROTATE) {
                    if self.held.contains(Held::PAN_MODIFIER) {
                        self.pan(orbit, delta, fovy);
                    } else {
                        let scale = TAU / self.viewport_height * self.rotate_speed;
                        self.yaw_delta -= delta.x * scale;
                        self.pitch_delta -= delta.y * scale;
                    }
                } else if self.held.contains(Held::DOLLY) {
                    if delta.y > 0.0 {
                        orbit.distance /= self.zoom_scale();
                    } else if delta.y < 0.0 {
                        orbit.distance *= self.zoom_scale();
                    }
                }
            }
            InputEvent::Wheel { delta } => {
                if delta > 0.0 {
                    orbit.distance *= self.zoom_scale();
                } else if delta < 0.0 {
                    orbit.distance /= self.zoom_scale();
                }
            }
            InputEvent::Key { .. } => {}
        }
    }

    fn pan(&mut self, orbit: &OrbitCamera, delta: na::Vector2<f32>, fovy: Option<f32>) {
        // World units per pixel at target distance.
        let unit = match fovy {
            Some(fovy) => 2.0 * orbit.distance * (fovy * 0.5).tan() / self.viewport_height,
            None => 1.0 / self.viewport_height,
        } * self.pan_speed;

        let rotation = orbit.isometry().rotation;
        let right = rotation * na::Vector3::x();
        let up = rotation * na::Vector3::y();
        self.pan_delta += (up * delta.y - right * delta.x) * unit;
    }

    fn settle(&mut self, orbit: &mut OrbitCamera) {
        orbit.yaw += self.yaw_delta * self.damping;
        orbit.pitch = (orbit.pitch + self.pitch_delta * self.damping)
            .max(MIN_POLAR)
            .min(PI - MIN_POLAR);
        orbit.target += self.pan_delta * self.damping;

        let decay = 1.0 - self.damping;
        self.yaw_delta *= decay;
        self.pitch_delta *= decay;
        self.pan_delta *= decay;
    }
}

impl System for OrbitCameraSystem {
    fn name(&self) -> &str {
        "Orbit camera"
    }

    fn run(&mut self, ctx: SystemContext<'_>) {
        let mut query = ctx
            .world
            .query::<(&mut OrbitCamera, &mut Global3, &mut Camera)>();

        let (_, (orbit, global, camera)) = match query.iter().next() {
            Some(found) => found,
            None => return,
        };

        for event in ctx.input.read() {
            if let InputEvent::Resized { width, height } = *event {
                let viewport = Viewport::new(width as f32, height as f32);
                if !viewport.is_empty() {
                    camera.set_aspect(viewport.aspect());
                }
            }

            let fovy = match *camera {
                Camera::Perspective(perspective) => Some(perspective.fovy()),
                Camera::Orthographic(_) => None,
            };
            self.handle(&*event, orbit, fovy);
        }

        self.settle(orbit);
        *global = Global3::from_iso(orbit.isometry());
    }
}
