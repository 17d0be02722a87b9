pub mod camera;
pub mod config;
pub mod engine;
pub mod gltf;
pub mod input;
pub mod interaction;
pub mod marker;
pub mod picking;
pub mod raycast;
pub mod resources;
pub mod scene;
pub mod session;
pub mod skeleton;
pub mod visual;

#[cfg(test)]
mod testing;

pub use self::{
    camera::{
        orbit::{OrbitCamera, OrbitCameraSystem},
        Camera, Viewport,
    },
    config::{Config, PosingConfig},
    engine::{Engine, System, SystemContext},
    gltf::{GltfError, GltfScene},
    input::{InputEvent, InputTranslator},
    interaction::InteractionState,
    marker::{BoneMarker, MarkerAppearance, MarkerSet},
    raycast::Collider,
    resources::Resources,
    scene::{Euler, Global3, Local3, SceneSystem},
    session::{MarkerSyncSystem, PoseSession, PoseSystem},
    skeleton::{Bone, RestRotation, SkeletonIndex, Skin},
};
