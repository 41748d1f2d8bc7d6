use arcstr::ArcStr;

/// Whether a [`Signal`] is exposed on its owning module's boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Port,
    Internal,
}

/// Signal direction, meaningful only for port-visibility signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
    InOut,
    None,
}

/// A scalar wire declared within a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub name: ArcStr,
    pub width: usize,
    pub visibility: Visibility,
    pub direction: Direction,
}

impl Signal {
    pub fn new(name: impl Into<ArcStr>, width: usize, visibility: Visibility, direction: Direction) -> Self {
        Self {
            name: name.into(),
            width,
            visibility,
            direction,
        }
    }

    /// A clone with a new name, used when materializing implicit nets and
    /// flattened bundle members from an existing port definition.
    pub fn renamed(&self, name: ArcStr) -> Self {
        Self {
            name,
            width: self.width,
            visibility: self.visibility,
            direction: self.direction,
        }
    }
}
