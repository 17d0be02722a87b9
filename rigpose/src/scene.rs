use {
    crate::engine::{System, SystemContext},
    ahash::AHashSet,
    bumpalo::collections::Vec as BVec,
    hecs::{Entity, World},
    nalgebra as na,
    serde::{Deserialize, Serialize},
};

/// Rotation expressed as three angles in radians.
/// Applied about X, then Y, then Z axis of the parent frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Euler {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Euler {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Euler { x, y, z }
    }

    pub fn to_quaternion(&self) -> na::UnitQuaternion<f32> {
        let x = na::UnitQuaternion::from_axis_angle(&na::Vector3::x_axis(), self.x);
        let y = na::UnitQuaternion::from_axis_angle(&na::Vector3::y_axis(), self.y);
        let z = na::UnitQuaternion::from_axis_angle(&na::Vector3::z_axis(), self.z);
        x * y * z
    }

    pub fn from_quaternion(rotation: &na::UnitQuaternion<f32>) -> Self {
        let m = rotation.to_rotation_matrix().into_inner();
        let m13 = m[(0, 2)].max(-1.0).min(1.0);
        let y = m13.asin();

        if m13.abs() < 0.999_999_9 {
            Euler {
                x: (-m[(1, 2)]).atan2(m[(2, 2)]),
                y,
                z: (-m[(0, 1)]).atan2(m[(0, 0)]),
            }
        } else {
            // Gimbal lock. Fold Z rotation into X.
            Euler {
                x: m[(2, 1)].atan2(m[(1, 1)]),
                y,
                z: 0.0,
            }
        }
    }

    /// Checks if any axis differs from `other` by more than `epsilon`.
    pub fn differs(&self, other: &Euler, epsilon: f32) -> bool {
        (self.x - other.x).abs() > epsilon
            || (self.y - other.y).abs() > epsilon
            || (self.z - other.z).abs() > epsilon
    }
}

/// Transform of a node relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Local3 {
    pub parent: Entity,
    pub translation: na::Translation3<f32>,
    pub rotation: Euler,
    pub scale: na::Vector3<f32>,
}

impl Local3 {
    pub fn identity(parent: Entity) -> Self {
        Local3 {
            parent,
            translation: na::Translation3::identity(),
            rotation: Euler::default(),
            scale: na::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_translation(parent: Entity, tr: na::Translation3<f32>) -> Self {
        Local3 {
            translation: tr,
            ..Local3::identity(parent)
        }
    }

    pub fn with_rotation(mut self, rotation: Euler) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: na::Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    pub fn iso(&self) -> na::Isometry3<f32> {
        na::Isometry3::from_parts(self.translation, self.rotation.to_quaternion())
    }
}

/// World transform of a node.
/// Nodes with `Local3` get it recomputed by `SceneSystem`,
/// root nodes have it set directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Global3 {
    pub iso: na::Isometry3<f32>,
    pub skew: na::Matrix3<f32>,
}

impl Global3 {
    pub fn identity() -> Self {
        Global3 {
            iso: na::Isometry3::identity(),
            skew: na::Matrix3::identity(),
        }
    }

    pub fn from_iso(iso: na::Isometry3<f32>) -> Self {
        Global3 {
            iso,
            skew: na::Matrix3::identity(),
        }
    }

    pub fn position(&self) -> na::Point3<f32> {
        self.iso.translation.vector.into()
    }

    pub fn append_iso_scale(
        &self,
        iso: &na::Isometry3<f32>,
        scale: &na::Vector3<f32>,
    ) -> Self {
        let total = self.to_homogeneous()
            * iso.to_homogeneous()
            * na::Matrix4::new_nonuniform_scaling(scale);
        let rotation = self.iso.rotation * iso.rotation;
        let inv_rotation = rotation.inverse().to_rotation_matrix();
        let translation = total.column(3).xyz();
        let rotskew = total.remove_column(3).remove_row(3);
        let skew = inv_rotation * rotskew;

        Global3 {
            iso: na::Isometry3 {
                translation: na::Translation3 {
                    vector: translation,
                },
                rotation,
            },
            skew,
        }
    }

    pub fn append_local(&self, local: &Local3) -> Self {
        self.append_iso_scale(&local.iso(), &local.scale)
    }

    pub fn to_homogeneous(&self) -> na::Matrix4<f32> {
        self.iso.to_homogeneous() * self.skew.to_homogeneous()
    }
}

/// Recomputes `Global3` of every node in hierarchy.
pub struct SceneSystem;

impl System for SceneSystem {
    fn name(&self) -> &str {
        "Scene"
    }

    fn run(&mut self, ctx: SystemContext<'_>) {
        let mut updated = AHashSet::new();
        let mut despawn = BVec::new_in(ctx.bump);

        for (entity, local) in
            ctx.world.query::<&Local3>().with::<Global3>().iter()
        {
            if !updated.contains(&entity) {
                update_global(entity, local, ctx.world, &mut updated, &mut despawn);
            }
        }

        // Despawn entities whose parents are despawned.
        for entity in despawn {
            let _ = ctx.world.despawn(entity);
        }
    }
}

fn update_global(
    entity: Entity,
    local: &Local3,
    world: &World,
    updated: &mut AHashSet<Entity>,
    despawn: &mut BVec<'_, Entity>,
) -> Option<Global3> {
    let parent_ref = match world.entity(local.parent) {
        Ok(parent_ref) => parent_ref,
        Err(hecs::NoSuchEntity) => {
            despawn.push(entity);
            return None;
        }
    };

    let parent_global = match parent_ref.get::<Local3>() {
        // Parent is root node.
        None => match parent_ref.get::<Global3>() {
            Some(parent_global) => *parent_global,
            None => {
                tracing::warn!(
                    "Entity's ({:?}) parent is not in scene and shall be despawned",
                    entity
                );
                despawn.push(entity);
                return None;
            }
        },
        Some(parent_local) => {
            let parent_global = if updated.contains(&local.parent) {
                parent_ref.get::<Global3>().map(|global| *global)
            } else {
                update_global(local.parent, &parent_local, world, updated, despawn)
            };

            match parent_global {
                Some(parent_global) => parent_global,
                None => {
                    despawn.push(entity);
                    return None;
                }
            }
        }
    };

    let global = parent_global.append_local(local);
    if let Ok(mut global_ref) = world.get_mut::<Global3>(entity) {
        *global_ref = global;
    }
    updated.insert(entity);
    Some(global)
}

/// Brings world transform of a single node up to date,
/// walking its whole ancestor chain.
///
/// Returns `None` if chain is broken.
pub fn refresh_global(world: &World, entity: Entity) -> Option<Global3> {
    let local = match world.get::<Local3>(entity) {
        Ok(local) => *local,
        Err(_) => return world.get::<Global3>(entity).ok().map(|global| *global),
    };

    let global = refresh_global(world, local.parent)?.append_local(&local);
    if let Ok(mut global_ref) = world.get_mut::<Global3>(entity) {
        *global_ref = global;
    }
    Some(global)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::engine::Engine,
        std::f32::consts::FRAC_PI_2,
    };

    fn close(a: na::Point3<f32>, b: na::Point3<f32>) -> bool {
        (a - b).norm() < 1e-5
    }

    #[test]
    fn euler_quaternion_conversion_preserves_angles() {
        let euler = Euler::new(0.3, -0.7, 1.1);
        let back = Euler::from_quaternion(&euler.to_quaternion());
        assert!(!euler.differs(&back, 1e-5), "{:?} != {:?}", euler, back);
    }

    #[test]
    fn euler_differs_checks_every_axis() {
        let rest = Euler::new(0.1, 0.2, 0.3);
        assert!(!rest.differs(&Euler::new(0.1005, 0.2, 0.3), 0.001));
        assert!(rest.differs(&Euler::new(0.1, 0.2, 0.302), 0.001));
    }

    #[test]
    fn scene_system_propagates_through_chain() {
        let mut engine = Engine::new();
        engine.add_system(SceneSystem);

        let root = engine.world.spawn((Global3::from_iso(
            na::Isometry3::translation(0.0, 1.0, 0.0),
        ),));
        let upper = engine.world.spawn((
            Local3::from_translation(root, na::Translation3::new(1.0, 0.0, 0.0))
                .with_rotation(Euler::new(0.0, 0.0, FRAC_PI_2)),
            Global3::identity(),
        ));
        let lower = engine.world.spawn((
            Local3::from_translation(upper, na::Translation3::new(1.0, 0.0, 0.0)),
            Global3::identity(),
        ));

        engine.advance();

        let global = *engine.world.get::<Global3>(lower).unwrap();
        assert!(close(global.position(), na::Point3::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn orphans_are_despawned() {
        let mut engine = Engine::new();
        engine.add_system(SceneSystem);

        let root = engine.world.spawn((Global3::identity(),));
        let child = engine.world.spawn((Local3::identity(root), Global3::identity()));
        engine.world.despawn(root).unwrap();

        engine.advance();
        assert!(!engine.world.contains(child));
    }

    #[test]
    fn refresh_global_sees_fresh_rotation() {
        let mut world = World::new();
        let root = world.spawn((Global3::identity(),));
        let joint = world.spawn((Local3::identity(root), Global3::identity()));
        let tip = world.spawn((
            Local3::from_translation(joint, na::Translation3::new(0.0, 1.0, 0.0)),
            Global3::identity(),
        ));

        world.get_mut::<Local3>(joint).unwrap().rotation.z = -FRAC_PI_2;

        let global = refresh_global(&world, tip).unwrap();
        assert!(close(global.position(), na::Point3::new(1.0, 0.0, 0.0)));
        assert_eq!(*world.get::<Global3>(tip).unwrap(), global);
    }

    #[test]
    fn refresh_global_reports_broken_chain() {
        let mut world = World::new();
        let root = world.spawn((Global3::identity(),));
        let node = world.spawn((Local3::identity(root), Global3::identity()));
        world.despawn(root).unwrap();

        assert!(refresh_global(&world, node).is_none());
    }
}
