mod config;
mod script;

use {
    self::{config::Config, script::Script},
    color_eyre::Report,
    eyre::WrapErr,
    hecs::World,
    nalgebra as na,
    rigpose::{
        skeleton::{bone_name, rest_rotation},
        visual::is_modified,
        Engine, Local3, MarkerSyncSystem, OrbitCameraSystem, PoseSession, PoseSystem,
        SceneSystem,
    },
    tracing_error::ErrorLayer,
    tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter},
};

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::info!("Running at {}", std::env::current_dir()?.display());
    let config = Config::load_default()?;
    tracing::info!("Config loaded: {:?}", config);

    let viewport = config.engine.viewport;
    let mut engine = Engine::new();
    engine
        .add_system(PoseSystem)
        .add_system(OrbitCameraSystem::from_config(&config.engine.camera, viewport))
        .add_system(SceneSystem)
        .add_system(MarkerSyncSystem);

    let scene = rigpose::gltf::load(
        &config.viewer.model,
        &mut engine.world,
        na::Isometry3::identity(),
    )
    .wrap_err_with(|| format!("Failed to load model '{}'", config.viewer.model.display()))?;
    tracing::info!("Model loaded with {} top level nodes", scene.nodes.len());

    let camera = config.engine.camera.spawn(&mut engine.world, viewport);

    // Bring world transforms up to date before markers are placed.
    engine.advance();

    let session = PoseSession::mount(
        &mut engine.world,
        &config.engine.posing,
        Some(camera),
        viewport,
    );
    engine.resources.insert(session);

    let script = match &config.viewer.script {
        Some(path) => Script::load(path)?,
        None => Script::default(),
    };

    for (frame, events) in script.frames.into_iter().enumerate() {
        for event in events {
            engine.push_event(event);
        }
        engine.advance();

        if let Some(session) = engine.resources.get::<PoseSession>() {
            tracing::info!(
                "Frame {}: {:?}, selected {:?}",
                frame,
                session.state(),
                session.selected_name(&engine.world)
            );
        }
    }

    if let Some(session) = engine.resources.get::<PoseSession>() {
        report_pose(&engine.world, session, config.engine.posing.epsilon);
    }

    rigpose::session::unmount(&mut engine.world, &mut engine.resources);
    Ok(())
}

fn report_pose(world: &World, session: &PoseSession, epsilon: f32) {
    let mut modified = 0;
    for &bone in session.index().bones() {
        let rest = match rest_rotation(world, bone) {
            Some(rest) => rest,
            None => continue,
        };
        let rotation = match world.get::<Local3>(bone) {
            Ok(local) => local.rotation,
            Err(_) => continue,
        };

        if is_modified(&rotation, &rest, epsilon) {
            modified += 1;
            tracing::info!(
                "Bone {:?} posed: {:?} (rest {:?})",
                bone_name(world, bone),
                rotation,
                rest
            );
        }
    }

    tracing::info!(
        "{} of {} bones posed",
        modified,
        session.index().len()
    );
}
