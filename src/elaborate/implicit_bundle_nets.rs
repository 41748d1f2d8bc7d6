//! Materializes unnamed interface nets implied when two instance ports of
//! interface type are wired together through a `PortRef`.

use std::collections::HashSet;

use crate::error::{Error, ErrorContext, ErrorKind, Result};
use crate::ir::{Connection, InstanceTarget, InterfaceInstance, ModuleIdentity, ModuleRef};
use crate::log::trace;

use super::visitor::{connected_components, flatname, PortRefKey};

pub struct ImplicitBundleNets {
    visited: HashSet<ModuleIdentity>,
}

impl ImplicitBundleNets {
    pub fn new() -> Self {
        Self { visited: HashSet::new() }
    }

    pub fn run(&mut self, top: ModuleRef) -> Result<ModuleRef> {
        self.elaborate_module(&top)?;
        Ok(top)
    }

    fn elaborate_module(&mut self, module: &ModuleRef) -> Result<()> {
        let id = ModuleIdentity::of(module);
        if !self.visited.insert(id) {
            return Ok(());
        }

        let inst_names: Vec<_> = module.borrow().instances.keys().cloned().collect();
        for inst_name in &inst_names {
            if let InstanceTarget::Module(sub) = module.borrow().instances[inst_name].target.clone() {
                self.elaborate_module(&sub)
                    .map_err(|e| e.context(ErrorContext::Instance(inst_name.clone())))?;
            }
        }

        let module_name = module.borrow().name.clone();
        trace!("implicit_bundle_nets: visiting module {:?}", module_name);

        // Collect (instance, port) <-> (instance, port) edges implied by
        // interface-typed PortRef connections.
        let mut edges: Vec<(PortRefKey, PortRefKey)> = Vec::new();
        {
            let m = module.borrow();
            for (inst_name, inst) in &m.instances {
                for (port, conn) in &inst.connections {
                    if let Connection::PortRef(pref) = conn {
                        let peer_is_interface = m
                            .instances
                            .get(&pref.instance)
                            .and_then(|peer| peer.resolved_module())
                            .map(|peer_mod| peer_mod.borrow().interfaces.contains_key(&pref.port))
                            .unwrap_or(false);
                        let own_is_interface = inst
                            .resolved_module()
                            .map(|own_mod| own_mod.borrow().interfaces.contains_key(port))
                            .unwrap_or(false);
                        if peer_is_interface || own_is_interface {
                            edges.push(((inst_name.clone(), port.clone()), (pref.instance.clone(), pref.port.clone())));
                        }
                    }
                }
            }
        }

        for component in connected_components(&edges) {
            self.resolve_component(module, component)?;
        }
        Ok(())
    }

    fn resolve_component(&self, module: &ModuleRef, component: Vec<PortRefKey>) -> Result<()> {
        let mut found: Option<crate::ir::InterfaceInstance> = None;
        let mut found_names: Vec<(arcstr::ArcStr, arcstr::ArcStr)> = Vec::new();
        let mut last_def: Option<InterfaceInstance> = None;

        for (inst_name, port) in &component {
            let m = module.borrow();
            let Some(inst) = m.instances.get(inst_name) else { continue };
            match inst.connections.get(port) {
                Some(Connection::InterfaceInstance(name)) => {
                    let existing = m.interfaces.get(name).cloned();
                    if let Some(existing) = existing {
                        if found.as_ref().map(|f| f.name != existing.name).unwrap_or(false) {
                            found_names.push((inst_name.clone(), port.clone()));
                        }
                        found = Some(existing);
                    }
                }
                _ => {
                    if let Some(target) = inst.resolved_module() {
                        if let Some(def) = target.borrow().interfaces.get(port) {
                            last_def = Some(def.clone());
                        }
                    }
                }
            }
        }

        if !found_names.is_empty() {
            return Err(Error::new(ErrorKind::Shorting(component)));
        }

        let chosen = if let Some(existing) = found {
            existing.name.clone()
        } else {
            let template = last_def.ok_or_else(|| {
                Error::new(ErrorKind::InvariantViolation(
                    "implicit bundle net component has no interface-typed port to clone".into(),
                ))
            })?;
            let namespace = module.borrow().namespace();
            let name = flatname(&["bundle"], &namespace, 511)?;
            let new_inst = template.renamed_internal(name.clone());
            module.borrow_mut().add_interface(new_inst);
            name
        };

        for (inst_name, port) in &component {
            let mut m = module.borrow_mut();
            if let Some(inst) = m.instances.get_mut(inst_name) {
                if matches!(inst.connections.get(port), Some(Connection::PortRef(_))) {
                    inst.connect(port.clone(), Connection::InterfaceInstance(chosen.clone()));
                }
            }
        }
        Ok(())
    }
}
