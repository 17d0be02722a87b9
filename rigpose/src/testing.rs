//! Small rigged character shared by unit tests.

use {
    crate::{
        camera::{orbit::OrbitCamera, Camera, Viewport},
        raycast::Collider,
        scene::{Global3, Local3},
        skeleton::{Bone, Skin},
    },
    hecs::{Entity, World},
    nalgebra as na,
    std::f32::consts::FRAC_PI_4,
};

/// Hips at (0, 1, 0), spine above, arm and wrist extending along +X at
/// shoulder height 1.5. A flat body box covers all of them. The camera looks
/// down -Z from (0, 1.2, 5).
pub struct Rig {
    pub world: World,
    pub root: Entity,
    pub hips: Entity,
    pub spine: Entity,
    pub arm: Entity,
    pub wrist: Entity,
    pub body: Entity,
    pub camera: Entity,
    pub viewport: Viewport,
}

impl Rig {
    pub fn bones(&self) -> [Entity; 4] {
        [self.hips, self.spine, self.arm, self.wrist]
    }

    /// Pixel position where world point appears on screen.
    pub fn screen_of(&self, point: na::Point3<f32>) -> (f32, f32) {
        let camera = *self.world.get::<Camera>(self.camera).unwrap();
        let view = *self.world.get::<Global3>(self.camera).unwrap();
        let ndc = camera.project(&view, &point);
        let screen = self.viewport.to_screen(ndc.xy());
        (screen.x, screen.y)
    }
}

fn bone(world: &mut World, name: &str, parent: Entity, x: f32, y: f32) -> Entity {
    world.spawn((
        Bone::new(name),
        Local3::from_translation(parent, na::Translation3::new(x, y, 0.0)),
        Global3::identity(),
    ))
}

pub fn rig() -> Rig {
    let mut world = World::new();

    let root = world.spawn((Global3::identity(),));
    let hips = bone(&mut world, "hips", root, 0.0, 1.0);
    let spine = bone(&mut world, "spine", hips, 0.0, 0.5);
    let arm = bone(&mut world, "arm", spine, 0.4, 0.0);
    let wrist = bone(&mut world, "wrist", arm, 0.4, 0.0);

    let body = world.spawn((
        Skin {
            joints: vec![hips, spine, arm, wrist].into(),
        },
        Collider::cuboid(na::Vector3::new(0.9, 0.6, 0.1)),
        Global3::from_iso(na::Isometry3::translation(0.0, 1.2, 0.0)),
    ));

    let eye = na::Point3::new(0.0, 1.2, 5.0);
    let camera = world.spawn((
        Camera::Perspective(na::Perspective3::new(1.0, FRAC_PI_4, 0.1, 100.0)),
        Global3::from_iso(na::Isometry3::translation(eye.x, eye.y, eye.z)),
        OrbitCamera::looking_at(eye, na::Point3::new(0.0, 1.2, 0.0)),
    ));

    for bone in [hips, spine, arm, wrist].iter() {
        crate::scene::refresh_global(&world, *bone);
    }

    Rig {
        world,
        root,
        hips,
        spine,
        arm,
        wrist,
        body,
        camera,
        viewport: Viewport::new(800.0, 800.0),
    }
}
