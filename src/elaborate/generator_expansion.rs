//! Expands [`GeneratorCall`] instance targets into concrete modules,
//! memoizing by `(generator identity, argument)` so equal calls resolve to
//! the same module object identity.

use std::collections::{HashMap, HashSet};

use crate::error::{ErrorContext, Result};
use crate::ir::{
    unique_name, Context, GeneratorCall, GeneratorCallKey, GeneratorResult, InstanceTarget, ModuleIdentity, ModuleRef,
};
use crate::log::trace;

use super::Elabable;

pub struct GeneratorExpansion<'a> {
    ctx: Option<&'a Context>,
    generator_calls: HashMap<GeneratorCallKey, ModuleRef>,
    visited: HashSet<ModuleIdentity>,
}

impl<'a> GeneratorExpansion<'a> {
    pub fn new(ctx: Option<&'a Context>) -> Self {
        Self {
            ctx,
            generator_calls: HashMap::new(),
            visited: HashSet::new(),
        }
    }

    pub fn run(&mut self, top: Elabable) -> Result<ModuleRef> {
        match top {
            Elabable::Module(m) => {
                self.elaborate_module(&m)?;
                Ok(m)
            }
            Elabable::Generator(call) => self.elaborate_generator_call(call),
        }
    }

    fn elaborate_generator_call(&mut self, call: GeneratorCall) -> Result<ModuleRef> {
        let key = GeneratorCallKey::new(&call);
        if let Some(module) = self.generator_calls.get(&key) {
            trace!("generator_expansion: memoized hit for `{}`", call.generator.name);
            return Ok(module.clone());
        }

        let name = call.generator.name.clone();
        let result = call
            .generator
            .call(&call.arg, self.ctx)
            .map_err(|e| e.context(ErrorContext::Generator(name.clone())))?;

        let module = match result {
            GeneratorResult::Module(m) => m,
            GeneratorResult::GeneratorCall(inner) => self.elaborate_generator_call(inner)?,
        };

        {
            let mut m = module.borrow_mut();
            if m.name.is_none() {
                m.name = Some(name.clone());
            }
            let base = m.name.clone().expect("just set above");
            let suffix = unique_name(&call.arg);
            m.name = Some(arcstr::ArcStr::from(format!("{base}({suffix})")));
        }

        self.generator_calls.insert(key, module.clone());
        self.elaborate_module(&module)?;
        Ok(module)
    }

    fn elaborate_module(&mut self, module: &ModuleRef) -> Result<()> {
        let id = ModuleIdentity::of(module);
        if !self.visited.insert(id) {
            return Ok(());
        }

        let module_name = module.borrow().name.clone();
        trace!("generator_expansion: visiting module {:?}", module_name);

        let inst_names: Vec<_> = module.borrow().instances.keys().cloned().collect();
        for inst_name in inst_names {
            let target = module.borrow().instances[&inst_name].target.clone();
            match target {
                InstanceTarget::Module(sub) => {
                    self.elaborate_module(&sub)
                        .map_err(|e| e.context(ErrorContext::Instance(inst_name.clone())))?;
                }
                InstanceTarget::Generator(call) => {
                    let resolved = self
                        .elaborate_generator_call(call)
                        .map_err(|e| e.context(ErrorContext::Instance(inst_name.clone())))?;
                    module
                        .borrow_mut()
                        .instances
                        .get_mut(&inst_name)
                        .expect("instance present, only target is replaced")
                        .target = InstanceTarget::Module(resolved);
                }
                InstanceTarget::Primitive(_) | InstanceTarget::External(_) => {}
            }
        }
        Ok(())
    }
}
