use {
    serde::{Deserialize, Serialize},
    winit::{
        dpi::PhysicalSize,
        event::{
            ElementState, KeyboardInput, MouseButton, MouseScrollDelta,
            VirtualKeyCode, WindowEvent,
        },
    },
};

/// Input event in screen coordinates.
/// Positions are in physical pixels from top-left corner of the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown { button: MouseButton, x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { button: MouseButton },
    /// Positive delta scrolls away from the user.
    Wheel { delta: f32 },
    Key { code: VirtualKeyCode, state: ElementState },
    Resized { width: u32, height: u32 },
}

/// Translates window events into `InputEvent`s.
///
/// Winit reports button presses without position,
/// so the last known cursor position is tracked here.
#[derive(Clone, Debug, Default)]
pub struct InputTranslator {
    cursor: [f32; 2],
}

impl InputTranslator {
    pub fn new() -> Self {
        InputTranslator::default()
    }

    pub fn translate(&mut self, event: &WindowEvent<'_>) -> Option<InputEvent> {
        match event {
            &WindowEvent::Resized(PhysicalSize { width, height }) => {
                Some(InputEvent::Resized { width, height })
            }
            &WindowEvent::CursorMoved { position, .. } => {
                self.cursor = [position.x as f32, position.y as f32];
                Some(InputEvent::PointerMove {
                    x: self.cursor[0],
                    y: self.cursor[1],
                })
            }
            &WindowEvent::MouseInput { button, state, .. } => match state {
                ElementState::Pressed => Some(InputEvent::PointerDown {
                    button,
                    x: self.cursor[0],
                    y: self.cursor[1],
                }),
                ElementState::Released => Some(InputEvent::PointerUp { button }),
            },
            &WindowEvent::MouseWheel { delta, .. } => match delta {
                MouseScrollDelta::LineDelta(_, y) => Some(InputEvent::Wheel { delta: y }),
                MouseScrollDelta::PixelDelta(pos) => Some(InputEvent::Wheel {
                    delta: pos.y as f32 / 100.0,
                }),
            },
            &WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        virtual_keycode: Some(code),
                        state,
                        ..
                    },
                ..
            } => Some(InputEvent::Key { code, state }),
            _ => None,
        }
    }
}

pub struct Ref<'a, T> {
    event: &'a T,
    consumed: &'a mut bool,
}

impl<T> std::ops::Deref for Ref<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.event
    }
}

impl<'a, T> Ref<'a, T> {
    /// Hides the event from readers that come after.
    pub fn consume(self) -> &'a T {
        *self.consumed = true;
        self.event
    }
}

/// Distributes events of type `T` among readers.
pub struct EventBroker<T> {
    pool: Vec<(T, bool)>,
}

impl<T> EventBroker<T> {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        EventBroker {
            pool: Vec::with_capacity(capacity),
        }
    }

    /// Iterates over events not yet consumed, in arrival order.
    pub fn read(&mut self) -> impl Iterator<Item = Ref<'_, T>> {
        self.pool
            .iter_mut()
            .filter(|(_, consumed)| !*consumed)
            .map(|(event, consumed)| Ref {
                event: &*event,
                consumed,
            })
    }

    pub fn add(&mut self, event: T) {
        self.pool.push((event, false));
    }

    pub fn clear(&mut self) {
        self.pool.clear();
    }
}
