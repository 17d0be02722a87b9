use {
    crate::{
        camera::{
            find_camera,
            orbit,
            Camera, Viewport,
        },
        config::PosingConfig,
        engine::{System, SystemContext},
        input::InputEvent,
        interaction::{apply_drag, Interaction, InteractionState},
        marker::{MarkerSet, MarkerStyle},
        picking,
        scene::{Global3, Local3},
        skeleton::{bone_name, SkeletonIndex},
        visual,
    },
    bumpalo::Bump,
    hecs::{Entity, World},
    nalgebra as na,
    winit::event::MouseButton,
};

/// Interactive posing of the skinned characters in the world.
///
/// Mounting indexes the skeleton and spawns bone markers.
/// Primary button press on a marker or skinned mesh selects a bone and starts
/// dragging it, which disables the orbit camera until any button is released.
pub struct PoseSession {
    index: SkeletonIndex,
    markers: MarkerSet,
    interaction: Interaction,
    camera: Option<Entity>,
    viewport: Viewport,
    style: MarkerStyle,
    sensitivity: f32,
    epsilon: f32,
}

impl PoseSession {
    /// Uses first camera in the world if `camera` is `None`.
    pub fn mount(
        world: &mut World,
        config: &PosingConfig,
        camera: Option<Entity>,
        viewport: Viewport,
    ) -> Self {
        let index = SkeletonIndex::build(world);
        let style = config.marker_style();
        let markers = MarkerSet::spawn(world, &index, &style);

        let camera = camera.or_else(|| find_camera(world).map(|(entity, _, _)| entity));
        if camera.is_none() {
            tracing::warn!("No camera to pick bones through");
        }

        let session = PoseSession {
            index,
            markers,
            interaction: Interaction::new(),
            camera,
            viewport,
            style,
            sensitivity: config.sensitivity,
            epsilon: config.epsilon,
        };
        session.sync(world);

        tracing::info!("Pose session mounted with {} bones", session.index.len());
        session
    }

    /// Despawns markers and gives control back to the camera.
    pub fn unmount(self, world: &mut World) {
        if let Some(camera) = self.camera {
            orbit::set_enabled(world, camera, true);
        }
        self.markers.despawn(world);
        tracing::info!("Pose session unmounted");
    }

    pub fn index(&self) -> &SkeletonIndex {
        &self.index
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn selection(&self) -> Option<Entity> {
        self.interaction.selection()
    }

    pub fn selected_name(&self, world: &World) -> Option<Box<str>> {
        bone_name(world, self.selection()?)
    }

    pub fn state(&self) -> InteractionState {
        self.interaction.state()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Empty viewport of a minimized window is ignored.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            tracing::trace!("Empty viewport {:?} ignored", viewport);
            return;
        }
        self.viewport = viewport;
    }

    fn view(&self, world: &World) -> Option<(Camera, Global3)> {
        let camera = self.camera?;
        let projection = *world.get::<Camera>(camera).ok()?;
        let view = *world.get::<Global3>(camera).ok()?;
        Some((projection, view))
    }

    /// Handles button press at pointer position.
    /// Returns `true` if a bone was grabbed.
    pub fn pointer_down(
        &mut self,
        world: &World,
        button: MouseButton,
        pointer: na::Point2<f32>,
        bump: &Bump,
    ) -> bool {
        if button != MouseButton::Left {
            return false;
        }

        let (camera, view) = match self.view(world) {
            Some(view) => view,
            None => return false,
        };

        let picked = picking::pick(
            world,
            &camera,
            &view,
            &self.viewport,
            pointer,
            &self.markers,
            &self.index,
            bump,
        );

        match picked {
            Some(bone) => {
                tracing::debug!(
                    "Bone {:?} ({:?}) selected",
                    bone,
                    bone_name(world, bone)
                );
                self.interaction.grab(bone, pointer);
                if let Some(camera) = self.camera {
                    orbit::set_enabled(world, camera, false);
                }
                true
            }
            None => {
                if self.interaction.selection().is_some() {
                    tracing::debug!("Selection cleared");
                }
                self.interaction.deselect();
                false
            }
        }
    }

    /// Rotates dragged bone by pointer motion since last event.
    pub fn pointer_move(&mut self, world: &World, pointer: na::Point2<f32>) {
        let (bone, delta) = match self.interaction.drag_to(pointer) {
            Some(dragged) => dragged,
            None => return,
        };

        match world.get_mut::<Local3>(bone) {
            Ok(mut local) => {
                apply_drag(&mut local.rotation, delta, self.sensitivity);
                tracing::trace!("Bone {:?} rotated to {:?}", bone, local.rotation);
            }
            Err(_) => tracing::warn!("Dragged bone {:?} is gone", bone),
        }
    }

    /// Ends drag on release of any button.
    pub fn pointer_up(&mut self, world: &World) {
        if self.interaction.release() {
            tracing::trace!("Drag ended");
        }
        if let Some(camera) = self.camera {
            orbit::set_enabled(world, camera, true);
        }
    }

    /// Updates marker appearance from current pose and selection.
    pub fn sync(&self, world: &World) {
        visual::sync_markers(
            world,
            &self.markers,
            self.interaction.selection(),
            &self.style,
            self.epsilon,
        );
    }
}

/// Feeds input to mounted `PoseSession`.
///
/// Must run before `OrbitCameraSystem` so a grab disables the camera
/// before it sees the drag.
pub struct PoseSystem;

impl System for PoseSystem {
    fn name(&self) -> &str {
        "Pose"
    }

    fn run(&mut self, ctx: SystemContext<'_>) {
        let session = match ctx.resources.get_mut::<PoseSession>() {
            Some(session) => session,
            None => return,
        };

        for event in ctx.input.read() {
            let input = *event;
            match input {
                InputEvent::PointerDown { button, x, y } => {
                    if session.pointer_down(ctx.world, button, na::Point2::new(x, y), ctx.bump) {
                        event.consume();
                    }
                }
                InputEvent::PointerMove { x, y } => {
                    session.pointer_move(ctx.world, na::Point2::new(x, y));
                }
                InputEvent::PointerUp { .. } => session.pointer_up(ctx.world),
                InputEvent::Resized { width, height } => {
                    session.resize(Viewport::new(width as f32, height as f32));
                }
                InputEvent::Wheel { .. } | InputEvent::Key { .. } => {}
            }
        }
    }
}

/// Keeps bone markers in sync with the skeleton.
/// Runs after `SceneSystem`.
pub struct MarkerSyncSystem;

impl System for MarkerSyncSystem {
    fn name(&self) -> &str {
        "Marker sync"
    }

    fn run(&mut self, ctx: SystemContext<'_>) {
        if let Some(session) = ctx.resources.get::<PoseSession>() {
            session.sync(ctx.world);
        }
    }
}

/// Unmounts session stored in resources, if any.
pub fn unmount(world: &mut World, resources: &mut crate::resources::Resources) -> bool {
    match resources.remove::<PoseSession>() {
        Some(session) => {
            session.unmount(world);
            true
        }
        None => false,
    }
}


#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            camera::orbit::OrbitCameraSystem,
            engine::Engine,
            marker::{BoneMarker, MarkerAppearance},
            scene::{Euler, SceneSystem},
            skeleton::rest_rotation,
            testing,
        },
    };

    struct Posing {
        engine: Engine,
        hips: Entity,
        arm: Entity,
        wrist: Entity,
        wrist_on_screen: (f32, f32),
        body_on_screen: (f32, f32),
    }

    impl Posing {
        fn new() -> Self {
            let rig = testing::rig();
            let wrist_on_screen = rig.screen_of(na::Point3::new(0.8, 1.5, 0.0));
            let body_on_screen = rig.screen_of(na::Point3::new(-0.5, 1.0, 0.1));
            let (hips, arm, wrist, camera, viewport) =
                (rig.hips, rig.arm, rig.wrist, rig.camera, rig.viewport);

            let mut engine = Engine::new();
            engine.world = rig.world;
            engine
                .add_system(PoseSystem)
                .add_system(OrbitCameraSystem::new())
                .add_system(SceneSystem)
                .add_system(MarkerSyncSystem);

            let mut posing = Posing {
                engine,
                hips,
                arm,
                wrist,
                wrist_on_screen,
                body_on_screen,
            };
            posing.mount(camera, viewport);
            posing
        }

        fn mount(&mut self, camera: Entity, viewport: Viewport) {
            let session = PoseSession::mount(
                &mut self.engine.world,
                &PosingConfig::default(),
                Some(camera),
                viewport,
            );
            self.engine.resources.insert(session);
        }

        fn session(&self) -> &PoseSession {
            self.engine.resources.get::<PoseSession>().unwrap()
        }

        fn press(&mut self, (x, y): (f32, f32)) {
            self.engine.push_event(InputEvent::PointerDown {
                button: MouseButton::Left,
                x,
                y,
            });
            self.engine.advance();
        }

        fn move_to(&mut self, (x, y): (f32, f32)) {
            self.engine.push_event(InputEvent::PointerMove { x, y });
            self.engine.advance();
        }

        fn release(&mut self, button: MouseButton) {
            self.engine.push_event(InputEvent::PointerUp { button });
            self.engine.advance();
        }

        fn rotation(&self, bone: Entity) -> Euler {
            self.engine.world.get::<Local3>(bone).unwrap().rotation
        }

        fn color(&self, bone: Entity) -> palette::Srgb<u8> {
            let marker = self.session().markers().marker_of(bone).unwrap();
            self.engine.world.get::<MarkerAppearance>(marker).unwrap().color
        }

        fn scale(&self, bone: Entity) -> f32 {
            let marker = self.session().markers().marker_of(bone).unwrap();
            self.engine.world.get::<MarkerAppearance>(marker).unwrap().scale
        }

        fn camera_enabled(&self) -> bool {
            let camera = self.session().camera.unwrap();
            orbit::is_enabled(&self.engine.world, camera)
        }

        fn marker_count(&self) -> usize {
            self.engine.world.query::<&BoneMarker>().iter().count()
        }
    }

    fn palette() -> crate::marker::MarkerPalette {
        PosingConfig::default().palette
    }

    #[test]
    fn marker_click_selects_bone_behind_mesh() {
        let mut posing = Posing::new();
        posing.press(posing.wrist_on_screen);

        assert_eq!(posing.session().selection(), Some(posing.wrist));
        assert_eq!(posing.session().state(), InteractionState::Dragging(posing.wrist));
        assert_eq!(
            posing.session().selected_name(&posing.engine.world).as_deref(),
            Some("wrist")
        );
        assert!(!posing.camera_enabled());
        assert_eq!(posing.color(posing.wrist), palette().selected);
        assert_eq!(posing.scale(posing.wrist), 1.5);
        assert_eq!(posing.scale(posing.hips), 1.0);
    }

    #[test]
    fn mesh_click_selects_nearest_bone() {
        let mut posing = Posing::new();
        posing.press(posing.body_on_screen);
        assert_eq!(posing.session().selection(), Some(posing.hips));
    }

    #[test]
    fn drag_right_then_up_rotates_bone() {
        let mut posing = Posing::new();
        let (x, y) = posing.wrist_on_screen;

        posing.press((x, y));
        posing.move_to((x + 100.0, y));
        posing.move_to((x + 100.0, y - 50.0));

        let rotation = posing.rotation(posing.wrist);
        assert!((rotation.y - 1.0).abs() < 1e-5);
        assert!((rotation.x + 0.5).abs() < 1e-5);
        assert_eq!(rotation.z, 0.0);

        posing.release(MouseButton::Left);
        assert!(posing.camera_enabled());
        assert_eq!(posing.session().state(), InteractionState::Selected(posing.wrist));

        // Moves after release do nothing.
        posing.move_to((x, y));
        assert!((posing.rotation(posing.wrist).y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn any_button_release_ends_drag() {
        let mut posing = Posing::new();
        posing.press(posing.wrist_on_screen);
        posing.release(MouseButton::Right);

        assert!(posing.camera_enabled());
        assert_eq!(posing.session().state(), InteractionState::Selected(posing.wrist));
    }

    #[test]
    fn secondary_button_does_not_select() {
        let mut posing = Posing::new();
        let (x, y) = posing.wrist_on_screen;
        posing.engine.push_event(InputEvent::PointerDown {
            button: MouseButton::Right,
            x,
            y,
        });
        posing.engine.advance();

        assert_eq!(posing.session().selection(), None);
        assert!(posing.camera_enabled());
    }

    #[test]
    fn empty_click_deselects_and_keeps_modified_color() {
        let mut posing = Posing::new();
        let (x, y) = posing.wrist_on_screen;

        posing.press((x, y));
        posing.move_to((x + 30.0, y));
        posing.release(MouseButton::Left);

        posing.press((5.0, 5.0));
        assert_eq!(posing.session().state(), InteractionState::Idle);
        assert!(posing.camera_enabled());
        assert_eq!(posing.color(posing.wrist), palette().modified);
        assert_eq!(posing.color(posing.arm), palette().default);
        for &bone in &[posing.hips, posing.arm, posing.wrist] {
            assert_ne!(posing.color(bone), palette().selected);
        }
    }

    #[test]
    fn selection_switches_without_touching_previous_bone() {
        let mut posing = Posing::new();
        posing.press(posing.wrist_on_screen);
        posing.release(MouseButton::Left);
        posing.press(posing.body_on_screen);

        assert_eq!(posing.session().selection(), Some(posing.hips));
        assert_eq!(posing.color(posing.wrist), palette().default);
        assert_eq!(posing.color(posing.hips), palette().selected);
    }

    #[test]
    fn remount_cycles_leave_no_markers_and_keep_rest() {
        let mut posing = Posing::new();
        let (x, y) = posing.wrist_on_screen;
        posing.press((x, y));
        posing.move_to((x, y + 20.0));
        posing.release(MouseButton::Left);

        let camera = posing.session().camera.unwrap();
        let viewport = posing.session().viewport();

        for _ in 0..3 {
            let engine = &mut posing.engine;
            assert!(unmount(&mut engine.world, &mut engine.resources));
            assert_eq!(posing.marker_count(), 0);

            posing.mount(camera, viewport);
            assert_eq!(posing.marker_count(), 4);
        }

        assert_eq!(rest_rotation(&posing.engine.world, posing.wrist), Some(Euler::default()));
        assert_eq!(posing.color(posing.wrist), palette().modified);
        assert_eq!(posing.session().selection(), None);
    }

    #[test]
    fn systems_are_inert_without_session() {
        let mut posing = Posing::new();
        let engine = &mut posing.engine;
        unmount(&mut engine.world, &mut engine.resources);

        let (x, y) = posing.wrist_on_screen;
        posing.engine.push_event(InputEvent::PointerDown {
            button: MouseButton::Left,
            x,
            y,
        });
        posing.engine.push_event(InputEvent::PointerMove { x: x + 50.0, y });
        posing.engine.advance();

        assert_eq!(posing.rotation(posing.wrist), Euler::default());
        assert_eq!(posing.marker_count(), 0);
    }

    #[test]
    fn resize_changes_pointer_mapping() {
        let mut posing = Posing::new();
        let (x, y) = posing.wrist_on_screen;

        posing.engine.push_event(InputEvent::Resized {
            width: 400,
            height: 400,
        });
        posing.engine.advance();
        assert_eq!(posing.session().viewport(), Viewport::new(400.0, 400.0));

        posing.press((x / 2.0, y / 2.0));
        assert_eq!(posing.session().selection(), Some(posing.wrist));
    }

    #[test]
    fn minimized_window_keeps_viewport() {
        let mut posing = Posing::new();
        posing.engine.push_event(InputEvent::Resized {
            width: 0,
            height: 0,
        });
        posing.engine.advance();
        assert_eq!(posing.session().viewport(), Viewport::new(800.0, 800.0));

        posing.press((0.0, 0.0));
        assert_eq!(posing.session().state(), InteractionState::Idle);
        assert!(posing.camera_enabled());
    }

    #[test]
    fn session_with_empty_viewport_picks_nothing() {
        let mut posing = Posing::new();
        let camera = posing.session().camera.unwrap();
        let engine = &mut posing.engine;
        unmount(&mut engine.world, &mut engine.resources);
        posing.mount(camera, Viewport::new(0.0, 0.0));

        posing.press(posing.wrist_on_screen);
        assert_eq!(posing.session().selection(), None);
        assert!(posing.camera_enabled());
    }
}
