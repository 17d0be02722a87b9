use {
    crate::{
        raycast::Collider,
        scene::{Euler, Global3, Local3},
        skeleton::{Bone, Skin},
    },
    gltf::{buffer, mesh::Mode, Document, Node},
    hecs::{Entity, World},
    nalgebra as na,
    std::path::Path,
};

#[derive(Debug, thiserror::Error)]
pub enum GltfError {
    #[error(transparent)]
    Gltf {
        #[from]
        source: gltf::Error,
    },

    #[error("GLTF with no scenes")]
    NoScene,
}

/// Entities spawned for a glTF scene.
#[derive(Clone, Debug)]
pub struct GltfScene {
    /// Root node placed at the transform given to `load`.
    pub root: Entity,
    /// Top level nodes of the scene.
    pub nodes: Box<[Entity]>,
}

/// Imports glTF file and spawns its default scene into the world.
#[tracing::instrument(skip(world))]
pub fn load(
    path: &Path,
    world: &mut World,
    transform: na::Isometry3<f32>,
) -> Result<GltfScene, GltfError> {
    let (document, buffers, _images) = gltf::import(path)?;
    spawn_document(&document, &buffers, world, transform)
}

/// Spawns nodes of the default scene, or the first one if there is no default.
///
/// Skin joints become `Bone`s, skinned nodes get `Skin`.
/// Nodes with triangle meshes get a `Collider` built from bind pose vertices.
pub fn spawn_document(
    document: &Document,
    buffers: &[buffer::Data],
    world: &mut World,
    transform: na::Isometry3<f32>,
) -> Result<GltfScene, GltfError> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(GltfError::NoScene)?;

    let root = world.spawn((Global3::from_iso(transform),));
    let mut entities = vec![None; document.nodes().len()];

    let nodes = scene
        .nodes()
        .map(|node| spawn_node(root, node, buffers, world, &mut entities))
        .collect();

    let mut bones = 0;
    for skin in document.skins() {
        for joint in skin.joints() {
            let entity = match entities[joint.index()] {
                Some(entity) => entity,
                None => continue,
            };
            if world.get::<Bone>(entity).is_ok() {
                continue;
            }
            let name = match joint.name() {
                Some(name) => name.to_owned(),
                None => format!("joint{}", joint.index()),
            };
            let _ = world.insert_one(entity, Bone::new(name));
            bones += 1;
        }
    }

    let mut skinned = 0;
    for node in document.nodes() {
        let (entity, skin) = match (entities[node.index()], node.skin()) {
            (Some(entity), Some(skin)) => (entity, skin),
            _ => continue,
        };

        let joints: Box<[Entity]> = skin
            .joints()
            .filter_map(|joint| entities[joint.index()])
            .collect();

        let _ = world.insert_one(entity, Skin { joints });
        skinned += 1;
    }

    tracing::info!(
        "GLTF scene with {} nodes, {} bones and {} skinned meshes spawned",
        entities.iter().filter(|entity| entity.is_some()).count(),
        bones,
        skinned
    );

    Ok(GltfScene { root, nodes })
}

fn spawn_node(
    parent: Entity,
    node: Node<'_>,
    buffers: &[buffer::Data],
    world: &mut World,
    entities: &mut [Option<Entity>],
) -> Entity {
    let local = node_local(parent, &node);

    let entity = match node.mesh().and_then(|mesh| mesh_collider(&mesh, buffers)) {
        Some(collider) => world.spawn((local, Global3::identity(), collider)),
        None => world.spawn((local, Global3::identity())),
    };
    entities[node.index()] = Some(entity);

    for child in node.children() {
        spawn_node(entity, child, buffers, world, entities);
    }
    entity
}

fn node_local(parent: Entity, node: &Node<'_>) -> Local3 {
    let (t, r, s) = node.transform().decomposed();
    let [tx, ty, tz] = t;
    let [rx, ry, rz, rw] = r;
    let rotation = na::Unit::new_normalize(na::Quaternion::new(rw, rx, ry, rz));

    Local3::from_translation(parent, na::Translation3::new(tx, ty, tz))
        .with_rotation(Euler::from_quaternion(&rotation))
        .with_scale(s.into())
}

fn mesh_collider(mesh: &gltf::Mesh<'_>, buffers: &[buffer::Data]) -> Option<Collider> {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for primitive in mesh.primitives() {
        if primitive.mode() != Mode::Triangles {
            tracing::warn!("Skipping {:?} primitive in collider", primitive.mode());
            continue;
        }

        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
        let positions = match reader.read_positions() {
            Some(positions) => positions,
            None => continue,
        };

        let base = vertices.len() as u32;
        vertices.extend(positions.map(|[x, y, z]| na::Point3::new(x, y, z)));
        let count = vertices.len() as u32 - base;

        let flat: Vec<u32> = match reader.read_indices() {
            Some(read) => read.into_u32().collect(),
            None => (0..count).collect(),
        };

        indices.extend(
            flat.chunks_exact(3)
                .map(|tri| [base + tri[0], base + tri[1], base + tri[2]]),
        );
    }

    if indices.is_empty() {
        None
    } else {
        Some(Collider::trimesh(vertices, indices))
    }
}
