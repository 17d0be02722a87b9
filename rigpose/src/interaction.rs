use {crate::scene::Euler, hecs::Entity, nalgebra as na};

/// Drag state of the selected bone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Drag {
    Inactive,
    /// Pointer position the next delta is measured from.
    Active { anchor: na::Point2<f32> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Selected(Entity),
    Dragging(Entity),
}

/// Selection and drag state of posing session.
///
/// Drag may only be active while a bone is selected.
#[derive(Clone, Debug)]
pub struct Interaction {
    selection: Option<Entity>,
    drag: Drag,
}

impl Default for Interaction {
    fn default() -> Self {
        Interaction::new()
    }
}

impl Interaction {
    pub fn new() -> Self {
        Interaction {
            selection: None,
            drag: Drag::Inactive,
        }
    }

    pub fn selection(&self) -> Option<Entity> {
        self.selection
    }

    pub fn drag(&self) -> Drag {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, Drag::Active { .. })
    }

    pub fn state(&self) -> InteractionState {
        match (self.selection, self.drag) {
            (None, _) => InteractionState::Idle,
            (Some(bone), Drag::Inactive) => InteractionState::Selected(bone),
            (Some(bone), Drag::Active { .. }) => InteractionState::Dragging(bone),
        }
    }

    /// Selects the bone and starts dragging it from pointer position.
    pub fn grab(&mut self, bone: Entity, pointer: na::Point2<f32>) {
        self.selection = Some(bone);
        self.drag = Drag::Active { anchor: pointer };
    }

    pub fn deselect(&mut self) {
        self.selection = None;
        self.drag = Drag::Inactive;
    }

    /// Ends drag, keeping selection.
    /// Returns `true` if drag was active.
    pub fn release(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.drag = Drag::Inactive;
        was_dragging
    }

    /// Moves drag anchor to pointer position.
    /// Returns the dragged bone and pointer offset from previous anchor.
    pub fn drag_to(
        &mut self,
        pointer: na::Point2<f32>,
    ) -> Option<(Entity, na::Vector2<f32>)> {
        let bone = self.selection?;
        match &mut self.drag {
            Drag::Active { anchor } => {
                let delta = pointer - *anchor;
                *anchor = pointer;
                Some((bone, delta))
            }
            Drag::Inactive => None,
        }
    }
}

/// Turns bone by pointer offset in pixels.
///
/// Horizontal motion yaws about Y, vertical motion pitches about X.
/// Screen Y grows downwards, so dragging up decreases X rotation.
pub fn apply_drag(rotation: &mut Euler, delta: na::Vector2<f32>, sensitivity: f32) {
    rotation.y += delta.x * sensitivity;
    rotation.x += delta.y * sensitivity;
}
