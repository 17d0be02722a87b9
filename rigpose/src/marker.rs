use {
    crate::{
        scene::refresh_global,
        skeleton::{Bone, SkeletonIndex},
    },
    ahash::AHashMap,
    hecs::{Entity, World},
    nalgebra as na,
    palette::Srgb,
};

pub const MARKER_NAME_PREFIX: &str = "bone_helper_";

/// Colors a marker shows in each display state.
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize)]
pub struct MarkerPalette {
    #[serde(default = "default_color")]
    pub default: Srgb<u8>,
    #[serde(default = "modified_color")]
    pub modified: Srgb<u8>,
    #[serde(default = "selected_color")]
    pub selected: Srgb<u8>,
}

impl Default for MarkerPalette {
    fn default() -> Self {
        MarkerPalette {
            default: default_color(),
            modified: modified_color(),
            selected: selected_color(),
        }
    }
}

fn default_color() -> Srgb<u8> {
    Srgb::new(0x10, 0xb9, 0x81)
}

fn modified_color() -> Srgb<u8> {
    Srgb::new(0x3b, 0x82, 0xf6)
}

fn selected_color() -> Srgb<u8> {
    Srgb::new(0xff, 0xff, 0x00)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerStyle {
    pub radius: f32,
    pub opacity: f32,
    pub selected_opacity: f32,
    pub selected_scale: f32,
    pub render_order: u32,
    pub palette: MarkerPalette,
}

/// Small sphere standing for a bone.
#[derive(Clone, Debug)]
pub struct BoneMarker {
    pub bone: Entity,
    pub name: Box<str>,
    pub radius: f32,
    /// Markers are drawn on top of geometry.
    pub depth_test: bool,
    pub palette: MarkerPalette,
}

/// What renderer needs to draw a marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerAppearance {
    pub position: na::Point3<f32>,
    pub color: Srgb<u8>,
    pub opacity: f32,
    pub scale: f32,
}

/// Draw order. Higher is drawn later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderOrder(pub u32);

/// Markers of all indexed bones.
#[derive(Debug)]
pub struct MarkerSet {
    pairs: Box<[(Entity, Entity)]>,
    by_bone: AHashMap<Entity, Entity>,
    by_marker: AHashMap<Entity, Entity>,
}

impl MarkerSet {
    /// Spawns one marker per bone of the index at bone's current position.
    pub fn spawn(world: &mut World, index: &SkeletonIndex, style: &MarkerStyle) -> Self {
        let mut pairs = Vec::with_capacity(index.len());
        let mut by_bone = AHashMap::with_capacity(index.len());
        let mut by_marker = AHashMap::with_capacity(index.len());

        for &bone in index.bones() {
            let name = match world.get::<Bone>(bone) {
                Ok(bone) => format!("{}{}", MARKER_NAME_PREFIX, bone.name),
                Err(_) => format!("{}{:?}", MARKER_NAME_PREFIX, bone),
            };

            let position = refresh_global(world, bone)
                .map(|global| global.position())
                .unwrap_or_else(na::Point3::origin);

            let marker = world.spawn((
                BoneMarker {
                    bone,
                    name: name.into(),
                    radius: style.radius,
                    depth_test: false,
                    palette: style.palette,
                },
                MarkerAppearance {
                    position,
                    color: style.palette.default,
                    opacity: style.opacity,
                    scale: 1.0,
                },
                RenderOrder(style.render_order),
            ));

            pairs.push((bone, marker));
            by_bone.insert(bone, marker);
            by_marker.insert(marker, bone);
        }

        tracing::debug!("Spawned {} bone markers", pairs.len());

        MarkerSet {
            pairs: pairs.into_boxed_slice(),
            by_bone,
            by_marker,
        }
    }

    pub fn marker_of(&self, bone: Entity) -> Option<Entity> {
        self.by_bone.get(&bone).copied()
    }

    pub fn bone_of(&self, marker: Entity) -> Option<Entity> {
        self.by_marker.get(&marker).copied()
    }

    /// Iterates over `(bone, marker)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, Entity)> + '_ {
        self.pairs.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Removes every marker from the world.
    pub fn despawn(self, world: &mut World) {
        let mut missing = 0;
        for (_, marker) in self.pairs.iter() {
            if world.despawn(*marker).is_err() {
                missing += 1;
            }
        }

        if missing > 0 {
            tracing::warn!("{} bone markers were despawned elsewhere", missing);
        }
        tracing::debug!("Despawned {} bone markers", self.pairs.len() - missing);
    }
}
