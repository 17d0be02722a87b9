use {
    crate::{
        input::{EventBroker, InputEvent},
        resources::Resources,
    },
    bumpalo::Bump,
    hecs::World,
};

pub type InputEvents = EventBroker<InputEvent>;

/// Everything a system may touch during one frame.
pub struct SystemContext<'a> {
    pub world: &'a mut World,
    pub resources: &'a mut Resources,
    pub input: &'a mut InputEvents,
    /// Scratch memory. Reset after each frame.
    pub bump: &'a Bump,
}

pub trait System {
    fn name(&self) -> &str;

    fn run(&mut self, ctx: SystemContext<'_>);
}

impl<F> System for F
where
    F: FnMut(SystemContext<'_>),
{
    fn name(&self) -> &str {
        std::any::type_name::<F>()
    }

    fn run(&mut self, ctx: SystemContext<'_>) {
        self(ctx)
    }
}

/// Root data structure of the posing runtime.
///
/// Owns the world and runs systems in the order they were added,
/// once per `advance` call. Input events pushed between frames are
/// visible to every system of the next frame and dropped afterwards.
pub struct Engine {
    pub world: World,
    pub resources: Resources,
    pub input: InputEvents,
    schedule: Vec<Box<dyn System>>,
    bump: Bump,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            world: World::new(),
            resources: Resources::new(),
            input: EventBroker::new(),
            schedule: Vec::new(),
            bump: Bump::new(),
        }
    }

    /// Adds a system to this engine.
    pub fn add_system<S>(&mut self, system: S) -> &mut Self
    where
        S: System + 'static,
    {
        self.schedule.push(Box::new(system));
        self
    }

    pub fn push_event(&mut self, event: InputEvent) {
        self.input.add(event);
    }

    pub fn advance(&mut self) {
        for system in &mut self.schedule {
            let _span =
                tracing::trace_span!("system", name = system.name()).entered();

            system.run(SystemContext {
                world: &mut self.world,
                resources: &mut self.resources,
                input: &mut self.input,
                bump: &self.bump,
            });
        }

        self.input.clear();
        self.bump.reset();
    }
}
