use {
    crate::scene::{Euler, Local3},
    ahash::AHashSet,
    hecs::{Entity, World},
};

/// Named joint of a skeletal rig.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bone {
    pub name: Box<str>,
}

impl Bone {
    pub fn new(name: impl Into<Box<str>>) -> Self {
        Bone { name: name.into() }
    }
}

/// Joints that deform a skinned mesh.
/// Marks the entity as skinned mesh.
#[derive(Clone, Debug)]
pub struct Skin {
    pub joints: Box<[Entity]>,
}

/// Rotation of a bone before any edits.
/// Attached once by `SkeletonIndex::build` and never changed afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RestRotation(pub Euler);

/// Every bone of every skinned mesh, each listed once.
#[derive(Clone, Debug, Default)]
pub struct SkeletonIndex {
    bones: Box<[Entity]>,
}

impl SkeletonIndex {
    /// Walks skinned meshes of the world and snapshots rest rotation
    /// of their bones.
    ///
    /// Bones that already have `RestRotation` keep it.
    /// Joints without `Bone` and `Local3` are not indexed.
    pub fn build(world: &mut World) -> Self {
        let mut seen = AHashSet::new();
        let mut bones = Vec::new();
        let mut skins = 0;

        for (mesh, skin) in world.query::<&Skin>().iter() {
            skins += 1;
            for &joint in skin.joints.iter() {
                let posable = world
                    .entity(joint)
                    .map(|joint| {
                        joint.get::<Bone>().is_some()
                            && joint.get::<Local3>().is_some()
                    })
                    .unwrap_or(false);

                if !posable {
                    tracing::warn!(
                        "Joint {:?} of skinned mesh {:?} is not a posable bone",
                        joint,
                        mesh
                    );
                    continue;
                }

                if seen.insert(joint) {
                    bones.push(joint);
                }
            }
        }

        let mut captured = Vec::new();
        for &bone in &bones {
            if world.get::<RestRotation>(bone).is_ok() {
                continue;
            }
            if let Ok(local) = world.get::<Local3>(bone) {
                captured.push((bone, RestRotation(local.rotation)));
            }
        }

        let fresh = captured.len();
        for (bone, rest) in captured {
            let _ = world.insert_one(bone, rest);
        }

        tracing::info!(
            "Indexed {} bones of {} skinned meshes, {} rest rotations captured",
            bones.len(),
            skins,
            fresh
        );

        SkeletonIndex {
            bones: bones.into_boxed_slice(),
        }
    }

    pub fn bones(&self) -> &[Entity] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn contains(&self, bone: Entity) -> bool {
        self.bones.contains(&bone)
    }
}

pub fn rest_rotation(world: &World, bone: Entity) -> Option<Euler> {
    world.get::<RestRotation>(bone).ok().map(|rest| rest.0)
}

pub fn bone_name(world: &World, bone: Entity) -> Option<Box<str>> {
    world.get::<Bone>(bone).ok().map(|bone| bone.name.clone())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{scene::Global3, testing},
    };

    #[test]
    fn indexes_every_bone_once() {
        let mut rig = testing::rig();
        let index = SkeletonIndex::build(&mut rig.world);

        assert_eq!(index.bones(), &rig.bones()[..]);
        for &bone in index.bones() {
            let local = *rig.world.get::<Local3>(bone).unwrap();
            assert_eq!(rest_rotation(&rig.world, bone), Some(local.rotation));
        }
    }

    #[test]
    fn shared_bones_are_not_duplicated() {
        let mut rig = testing::rig();
        let joints: Box<[Entity]> = vec![rig.wrist, rig.arm].into();
        rig.world.spawn((Skin { joints }, Global3::identity()));

        let index = SkeletonIndex::build(&mut rig.world);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn rest_rotation_is_captured_once() {
        let mut rig = testing::rig();
        SkeletonIndex::build(&mut rig.world);

        rig.world.get_mut::<Local3>(rig.arm).unwrap().rotation.y = 1.0;
        SkeletonIndex::build(&mut rig.world);

        assert_eq!(rest_rotation(&rig.world, rig.arm), Some(Euler::default()));
    }

    #[test]
    fn world_without_skins_gives_empty_index() {
        let mut world = World::new();
        let root = world.spawn((Global3::identity(),));
        world.spawn((Bone::new("loose"), Local3::identity(root), Global3::identity()));

        let index = SkeletonIndex::build(&mut world);
        assert!(index.is_empty());
    }

    #[test]
    fn joints_without_bone_are_skipped() {
        let mut world = World::new();
        let root = world.spawn((Global3::identity(),));
        let plain = world.spawn((Local3::identity(root), Global3::identity()));
        world.spawn((Skin { joints: vec![plain].into() },));

        let index = SkeletonIndex::build(&mut world);
        assert!(index.is_empty());
    }
}
