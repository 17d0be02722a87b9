use {
    crate::{
        camera::{Camera, Viewport},
        marker::MarkerSet,
        raycast::{self, Hit, HitKind},
        scene::{refresh_global, Global3},
        skeleton::{Skin, SkeletonIndex},
    },
    bumpalo::Bump,
    hecs::{Entity, World},
    nalgebra as na,
    ordered_float::OrderedFloat,
};

/// Picks bone under the pointer.
///
/// Markers take priority over everything else, even when geometry is in front
/// of them. Otherwise the nearest skinned mesh hit selects the joint of that
/// mesh closest to the hit point.
/// Empty viewport picks nothing.
pub fn pick(
    world: &World,
    camera: &Camera,
    view: &Global3,
    viewport: &Viewport,
    pointer: na::Point2<f32>,
    markers: &MarkerSet,
    index: &SkeletonIndex,
    bump: &Bump,
) -> Option<Entity> {
    let ndc = viewport.to_ndc(pointer.x, pointer.y)?;
    let ray = camera.ray(view, ndc);
    let hits = raycast::cast(world, &ray, bump);
    resolve(world, &hits, markers, index)
}

/// Applies the priority rule to hits ordered nearest first.
pub fn resolve(
    world: &World,
    hits: &[Hit],
    markers: &MarkerSet,
    index: &SkeletonIndex,
) -> Option<Entity> {
    let marked = hits.iter().find_map(|hit| match hit.kind {
        HitKind::Marker { bone } if markers.bone_of(hit.entity) == Some(bone) => {
            Some(bone)
        }
        _ => None,
    });

    if let Some(bone) = marked {
        tracing::trace!("Marker of bone {:?} hit", bone);
        return Some(bone);
    }

    // Meshes with no indexed joints are passed through.
    hits.iter()
        .filter(|hit| hit.kind == HitKind::SkinnedMesh)
        .find_map(|hit| {
            let skin = world.get::<Skin>(hit.entity).ok()?;
            let bone = nearest_joint(world, &skin, &hit.point, index)?;
            tracing::trace!("Skinned mesh {:?} hit, nearest bone {:?}", hit.entity, bone);
            Some(bone)
        })
}

/// Finds indexed joint of the skin closest to the point in world space.
/// Ties keep the joint listed first.
pub fn nearest_joint(
    world: &World,
    skin: &Skin,
    point: &na::Point3<f32>,
    index: &SkeletonIndex,
) -> Option<Entity> {
    skin.joints
        .iter()
        .filter(|&&joint| index.contains(joint))
        .filter_map(|&joint| {
            let global = refresh_global(world, joint)?;
            Some((joint, na::distance(&global.position(), point)))
        })
        .min_by_key(|&(_, distance)| OrderedFloat(distance))
        .map(|(joint, _)| joint)
}
