use type_map::TypeMap;

/// Type-keyed storage for state shared between systems.
pub struct Resources {
    map: TypeMap,
}

impl Resources {
    pub fn new() -> Self {
        Resources {
            map: TypeMap::new(),
        }
    }

    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.map.insert(value)
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.map.remove::<T>()
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map.get()
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.map.get_mut()
    }
}
