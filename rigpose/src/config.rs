use {
    crate::{
        camera::{orbit::OrbitCamera, Camera, Viewport},
        marker::{MarkerPalette, MarkerStyle},
        scene::Global3,
    },
    color_eyre::Report,
    eyre::WrapErr,
    hecs::{Entity, World},
    nalgebra as na,
    std::path::Path,
};

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    #[serde(default)]
    pub posing: PosingConfig,

    #[serde(default)]
    pub camera: CameraConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            viewport: default_viewport(),
            posing: PosingConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl Config {
    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self, Report> {
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("Failed to open config '{}'", path.display()))?;
        let config = ron::de::from_reader(file)
            .wrap_err_with(|| format!("Failed to parse config '{}'", path.display()))?;
        Ok(config)
    }
}

/// Tuning of the posing loop.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct PosingConfig {
    /// Radians of bone rotation per pixel of pointer motion.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,

    /// Largest per-axis deviation from rest still shown as unmodified.
    #[serde(default = "default_epsilon")]
    pub epsilon: f32,

    #[serde(default = "default_marker_radius")]
    pub marker_radius: f32,

    #[serde(default = "default_selected_scale")]
    pub selected_scale: f32,

    #[serde(default = "default_opacity")]
    pub opacity: f32,

    #[serde(default = "default_selected_opacity")]
    pub selected_opacity: f32,

    #[serde(default = "default_render_order")]
    pub render_order: u32,

    #[serde(default)]
    pub palette: MarkerPalette,
}

impl Default for PosingConfig {
    fn default() -> Self {
        PosingConfig {
            sensitivity: default_sensitivity(),
            epsilon: default_epsilon(),
            marker_radius: default_marker_radius(),
            selected_scale: default_selected_scale(),
            opacity: default_opacity(),
            selected_opacity: default_selected_opacity(),
            render_order: default_render_order(),
            palette: MarkerPalette::default(),
        }
    }
}

impl PosingConfig {
    pub fn marker_style(&self) -> MarkerStyle {
        MarkerStyle {
            radius: self.marker_radius,
            opacity: self.opacity,
            selected_opacity: self.selected_opacity,
            selected_scale: self.selected_scale,
            render_order: self.render_order,
            palette: self.palette,
        }
    }
}

#[derive(Clone, Copy, Debug, serde::Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_eye")]
    pub position: [f32; 3],
    #[serde(default = "default_target")]
    pub target: [f32; 3],
    /// Vertical field of view in degrees.
    #[serde(default = "default_fovy")]
    pub fovy: f32,
    #[serde(default = "default_znear")]
    pub znear: f32,
    #[serde(default = "default_zfar")]
    pub zfar: f32,
    #[serde(default = "default_damping")]
    pub damping: f32,
    #[serde(default = "default_speed")]
    pub rotate_speed: f32,
    #[serde(default = "default_speed")]
    pub pan_speed: f32,
    #[serde(default = "default_speed")]
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            position: default_eye(),
            target: default_target(),
            fovy: default_fovy(),
            znear: default_znear(),
            zfar: default_zfar(),
            damping: default_damping(),
            rotate_speed: default_speed(),
            pan_speed: default_speed(),
            zoom_speed: default_speed(),
        }
    }
}

impl CameraConfig {
    pub fn into_camera(self, aspect: f32) -> Camera {
        Camera::Perspective(na::Perspective3::new(
            aspect,
            self.fovy.to_radians(),
            self.znear,
            self.zfar,
        ))
    }

    /// Spawns camera entity controlled by `OrbitCameraSystem`.
    pub fn spawn(self, world: &mut World, viewport: Viewport) -> Entity {
        let [ex, ey, ez] = self.position;
        let [tx, ty, tz] = self.target;
        let orbit = OrbitCamera::looking_at(
            na::Point3::new(ex, ey, ez),
            na::Point3::new(tx, ty, tz),
        );
        world.spawn((
            self.into_camera(viewport.aspect()),
            Global3::from_iso(orbit.isometry()),
            orbit,
        ))
    }
}

fn default_viewport() -> Viewport {
    Viewport::new(1280.0, 720.0)
}

fn default_sensitivity() -> f32 {
    0.01
}

fn default_epsilon() -> f32 {
    0.001
}

fn default_marker_radius() -> f32 {
    0.0084
}

fn default_selected_scale() -> f32 {
    1.5
}

fn default_opacity() -> f32 {
    0.9
}

fn default_selected_opacity() -> f32 {
    1.0
}

fn default_render_order() -> u32 {
    999
}

fn default_eye() -> [f32; 3] {
    [5.0, 5.0, 5.0]
}

fn default_target() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

fn default_fovy() -> f32 {
    45.0
}

fn default_znear() -> f32 {
    0.1
}

fn default_zfar() -> f32 {
    1000.
}

fn default_damping() -> f32 {
    0.05
}

fn default_speed() -> f32 {
    1.0
}
