use {
    crate::{
        marker::{MarkerAppearance, MarkerSet, MarkerStyle},
        scene::{refresh_global, Euler, Local3},
        skeleton::RestRotation,
    },
    hecs::{Entity, World},
    nalgebra as na,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayState {
    Default,
    Modified,
    Selected,
}

pub fn is_modified(current: &Euler, rest: &Euler, epsilon: f32) -> bool {
    current.differs(rest, epsilon)
}

/// Selection wins over modification.
pub fn display_state(selected: bool, modified: bool) -> DisplayState {
    if selected {
        DisplayState::Selected
    } else if modified {
        DisplayState::Modified
    } else {
        DisplayState::Default
    }
}

pub fn appearance(
    position: na::Point3<f32>,
    state: DisplayState,
    style: &MarkerStyle,
) -> MarkerAppearance {
    match state {
        DisplayState::Selected => MarkerAppearance {
            position,
            color: style.palette.selected,
            opacity: style.selected_opacity,
            scale: style.selected_scale,
        },
        DisplayState::Modified => MarkerAppearance {
            position,
            color: style.palette.modified,
            opacity: style.opacity,
            scale: 1.0,
        },
        DisplayState::Default => MarkerAppearance {
            position,
            color: style.palette.default,
            opacity: style.opacity,
            scale: 1.0,
        },
    }
}

/// Writes appearance of every marker from current pose of its bone.
///
/// Bones without captured rest rotation are left alone.
/// Running it twice without changes in between writes the same values.
pub fn sync_markers(
    world: &World,
    markers: &MarkerSet,
    selection: Option<Entity>,
    style: &MarkerStyle,
    epsilon: f32,
) {
    for (bone, marker) in markers.iter() {
        let (rotation, rest) = match (world.get::<Local3>(bone), world.get::<RestRotation>(bone)) {
            (Ok(local), Ok(rest)) => (local.rotation, rest.0),
            _ => continue,
        };

        let global = match refresh_global(world, bone) {
            Some(global) => global,
            None => {
                tracing::warn!("Bone {:?} is detached from scene", bone);
                continue;
            }
        };

        let state = display_state(
            selection == Some(bone),
            is_modified(&rotation, &rest, epsilon),
        );

        match world.get_mut::<MarkerAppearance>(marker) {
            Ok(mut current) => *current = appearance(global.position(), state, style),
            Err(_) => tracing::warn!("Marker {:?} of bone {:?} is missing", marker, bone),
        }
    }
}
