use {
    crate::{
        marker::{BoneMarker, MarkerAppearance},
        scene::Global3,
        skeleton::Skin,
    },
    bumpalo::{collections::Vec as BVec, Bump},
    hecs::{Entity, World},
    nalgebra as na,
    ordered_float::OrderedFloat,
    parry3d::{
        query::{Ray, RayCast},
        shape::{Ball, SharedShape},
    },
};

/// Shape that rays can hit.
/// Placed at entity's `Global3`, scale and skew are not applied.
#[derive(Clone)]
pub struct Collider {
    pub shape: SharedShape,
}

impl std::fmt::Debug for Collider {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("Collider")
            .field("shape", &self.shape.shape_type())
            .finish()
    }
}

impl Collider {
    pub fn ball(radius: f32) -> Self {
        Collider {
            shape: SharedShape::ball(radius),
        }
    }

    pub fn cuboid(half_extents: na::Vector3<f32>) -> Self {
        Collider {
            shape: SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z),
        }
    }

    pub fn trimesh(vertices: Vec<na::Point3<f32>>, indices: Vec<[u32; 3]>) -> Self {
        Collider {
            shape: SharedShape::trimesh(vertices, indices),
        }
    }
}

/// What kind of node a ray hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitKind {
    Marker { bone: Entity },
    SkinnedMesh,
    Geometry,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub entity: Entity,
    pub kind: HitKind,
    pub toi: f32,
    pub point: na::Point3<f32>,
}

/// Tells what kind of node the entity is by the components it carries.
pub fn classify(world: &World, entity: Entity) -> Option<HitKind> {
    let entity = world.entity(entity).ok()?;

    if let Some(marker) = entity.get::<BoneMarker>() {
        return Some(HitKind::Marker { bone: marker.bone });
    }

    if entity.get::<Skin>().is_some() {
        Some(HitKind::SkinnedMesh)
    } else {
        Some(HitKind::Geometry)
    }
}

/// Casts ray against all colliders and bone markers.
/// Returns every hit, nearest first.
pub fn cast<'a>(world: &World, ray: &Ray, bump: &'a Bump) -> BVec<'a, Hit> {
    let mut hits = BVec::new_in(bump);

    for (entity, (marker, appearance)) in
        world.query::<(&BoneMarker, &MarkerAppearance)>().iter()
    {
        let ball = Ball::new(marker.radius * appearance.scale);
        let position = appearance.position;
        let iso = na::Isometry3::translation(position.x, position.y, position.z);

        if let Some(toi) = ball.cast_ray(&iso, ray, f32::MAX, true) {
            hits.push(Hit {
                entity,
                kind: HitKind::Marker { bone: marker.bone },
                toi,
                point: ray.point_at(toi),
            });
        }
    }

    for (entity, (collider, global)) in world.query::<(&Collider, &Global3)>().iter() {
        if let Some(toi) = collider.shape.cast_ray(&global.iso, ray, f32::MAX, true) {
            let kind = match classify(world, entity) {
                Some(kind) => kind,
                None => continue,
            };
            hits.push(Hit {
                entity,
                kind,
                toi,
                point: ray.point_at(toi),
            });
        }
    }

    hits.sort_by_key(|hit| OrderedFloat(hit.toi));
    tracing::trace!("Ray hit {} nodes", hits.len());
    hits
}
