use arcstr::ArcStr;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::context::Context;
use super::module::ModuleRef;
use super::param::Param;
use crate::error::Result;

/// Stable identity for a [`Generator`], comparable the way Python compares
/// function objects by identity. Two [`Generator`]s constructed separately
/// are never equal even with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneratorId(u64);

static NEXT_GENERATOR_ID: AtomicU64 = AtomicU64::new(0);

/// What a generator function may return: a concrete module, or another
/// pending generator call to unwind (chains are followed recursively by
/// [`crate::elaborate::generator_expansion`]).
pub enum GeneratorResult {
    Module(ModuleRef),
    GeneratorCall(GeneratorCall),
}

type GeneratorFn = dyn Fn(&Param, Option<&Context>) -> Result<GeneratorResult>;

/// A parameterized generator function, identified by [`GeneratorId`] rather
/// than by name (names may collide; identity must not).
#[derive(Clone)]
pub struct Generator {
    pub id: GeneratorId,
    pub name: ArcStr,
    func: Rc<GeneratorFn>,
}

impl Generator {
    pub fn new(
        name: impl Into<ArcStr>,
        func: impl Fn(&Param, Option<&Context>) -> Result<GeneratorResult> + 'static,
    ) -> Self {
        Self {
            id: GeneratorId(NEXT_GENERATOR_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            func: Rc::new(func),
        }
    }

    pub fn call(&self, arg: &Param, ctx: Option<&Context>) -> Result<GeneratorResult> {
        (self.func)(arg, ctx)
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator").field("name", &self.name).finish()
    }
}

/// A pending invocation of a [`Generator`], not yet expanded to a module.
#[derive(Debug, Clone)]
pub struct GeneratorCall {
    pub generator: Generator,
    pub arg: Param,
}

impl GeneratorCall {
    pub fn new(generator: Generator, arg: Param) -> Self {
        Self { generator, arg }
    }
}

/// Memoization key for generator-call results: value equality of
/// `(generator identity, argument)`, distinct from the module-identity
/// memoization used for plain visitation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeneratorCallKey(GeneratorId, Param);

impl GeneratorCallKey {
    pub fn new(call: &GeneratorCall) -> Self {
        Self(call.generator.id, call.arg.clone())
    }
}
