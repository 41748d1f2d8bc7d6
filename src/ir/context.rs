use arcstr::ArcStr;
use indexmap::IndexMap;

use super::param::Param;

/// An opaque value propagated to generator functions that declare they need
/// it. The elaborator never inspects its contents; it is pure passthrough,
/// reserved for future generator-side use.
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: IndexMap<ArcStr, Param>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<ArcStr>, value: Param) {
        self.data.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Param> {
        self.data.get(key)
    }
}
