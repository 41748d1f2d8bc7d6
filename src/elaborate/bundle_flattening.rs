//! Rewrites each module so no `InterfaceInstance` remains: every bundle is
//! expanded into scalar signals, and connections referring to the bundle
//! (or a field of it) are rewritten to the corresponding scalars.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use arcstr::ArcStr;
use indexmap::IndexMap;

use crate::error::{Error, ErrorContext, ErrorKind, Result};
use crate::ir::{
    Connection, Direction, InstanceTarget, InterfaceDef, ModuleIdentity, ModuleRef, Signal, Visibility,
};
use crate::log::trace;

use super::visitor::flatname;

/// One scalar member of a flattened bundle, still carrying the role tags of
/// the interface-definition leaf it came from so direction can be derived
/// once the bundle's own role (if any) is known.
#[derive(Debug, Clone)]
pub struct FlatSignal {
    pub signal: Signal,
    pub src: Option<ArcStr>,
    pub dest: Option<ArcStr>,
}

/// The result of flattening one `InterfaceInstance`: its scalar members,
/// keyed by dotted path from the bundle root (`"s"`, `"inner.s"`, ...).
/// Nested-bundle `PortRef` rewiring only resolves single-level (top-level,
/// undotted) keys — the same acknowledged gap the algorithm this is
/// grounded on leaves open for hierarchical interfaces.
#[derive(Debug, Clone, Default)]
pub struct FlatBundle {
    pub inst_name: ArcStr,
    pub signals: IndexMap<ArcStr, FlatSignal>,
}

/// Recursively flattens an interface definition's direct and nested-field
/// signals into a dotted-path map, independent of any particular instance.
fn flatten_interface_def(def: &Rc<InterfaceDef>) -> IndexMap<ArcStr, FlatSignal> {
    let mut flat: IndexMap<ArcStr, FlatSignal> = IndexMap::new();

    for (name, sigdef) in &def.signals {
        flat.insert(
            name.clone(),
            FlatSignal {
                signal: Signal::new(name.clone(), sigdef.width, Visibility::Internal, Direction::None),
                src: sigdef.src.clone(),
                dest: sigdef.dest.clone(),
            },
        );
    }

    for (field_name, nested_def) in &def.interfaces {
        let nested_flat = flatten_interface_def(nested_def);
        let local_avoid: HashSet<ArcStr> = flat.values().map(|f| f.signal.name.clone()).collect();
        let mut avoid = local_avoid;
        for (orig_path, mut fsig) in nested_flat {
            let local_name = flatname(&[field_name.as_str(), orig_path.as_str()], &avoid, 511)
                .unwrap_or_else(|_| ArcStr::from(format!("{field_name}_{orig_path}")));
            avoid.insert(local_name.clone());
            fsig.signal.name = local_name;
            flat.insert(ArcStr::from(format!("{field_name}.{orig_path}")), fsig);
        }
    }

    flat
}

pub struct BundleFlattening {
    visited: HashSet<ModuleIdentity>,
    replacements: HashMap<ModuleIdentity, IndexMap<ArcStr, FlatBundle>>,
}

impl BundleFlattening {
    pub fn new() -> Self {
        Self {
            visited: HashSet::new(),
            replacements: HashMap::new(),
        }
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

        // Children first: their replacement tables must exist before we
        // can rewrite our own instance connections against them.
        let inst_names: Vec<_> = module.borrow().instances.keys().cloned().collect();
        for inst_name in &inst_names {
            if let InstanceTarget::Module(sub) = module.borrow().instances[inst_name].target.clone() {
                self.elaborate_module(&sub)
                    .map_err(|e| e.context(ErrorContext::Instance(inst_name.clone())))?;
            }
        }

        let module_name = module.borrow().name.clone();
        trace!("bundle_flattening: visiting module {:?}", module_name);

        self.flatten_own_interfaces(module)?;

        for inst_name in &inst_names {
            self.rewrite_instance_connections(module, inst_name)?;
        }
        Ok(())
    }

    fn flatten_own_interfaces(&mut self, module: &ModuleRef) -> Result<()> {
        let iface_names: Vec<_> = module.borrow().interfaces.keys().cloned().collect();
        let mut module_flat: IndexMap<ArcStr, FlatBundle> = IndexMap::new();

        for iname in iface_names {
            let inst = module
                .borrow_mut()
                .interfaces
                .shift_remove(&iname)
                .expect("name taken from this module's own interface map");

            let flat_by_path = flatten_interface_def(&inst.of);
            let mut bundle_signals: IndexMap<ArcStr, FlatSignal> = IndexMap::new();

            for (path, mut fsig) in flat_by_path {
                let namespace = module.borrow().namespace();
                let final_name = flatname(&[iname.as_str(), fsig.signal.name.as_str()], &namespace, 511)?;

                let (visibility, direction) = if inst.port {
                    let dir = match (&inst.role, &fsig.src, &fsig.dest) {
                        (Some(role), Some(src), _) if role == src => Direction::Output,
                        (Some(role), _, Some(dest)) if role == dest => Direction::Input,
                        _ => Direction::None,
                    };
                    (Visibility::Port, dir)
                } else {
                    (Visibility::Internal, Direction::None)
                };

                fsig.signal.name = final_name.clone();
                fsig.signal.visibility = visibility;
                fsig.signal.direction = direction;

                if inst.port {
                    module.borrow_mut().add_port(fsig.signal.clone());
                } else {
                    module.borrow_mut().add_signal(fsig.signal.clone());
                }
                bundle_signals.insert(path, fsig);
            }

            module_flat.insert(
                iname.clone(),
                FlatBundle {
                    inst_name: iname,
                    signals: bundle_signals,
                },
            );
        }

        self.replacements.insert(ModuleIdentity::of(module), module_flat);
        Ok(())
    }

    fn rewrite_instance_connections(&self, module: &ModuleRef, inst_name: &ArcStr) -> Result<()> {
        let child = match module.borrow().instances[inst_name].target.clone() {
            InstanceTarget::Module(sub) => Some(sub),
            _ => None,
        };
        let conn_keys: Vec<_> = module.borrow().instances[inst_name].connections.keys().cloned().collect();

        for key in conn_keys {
            let conn = module.borrow().instances[inst_name].connections[&key].clone();
            match conn {
                Connection::InterfaceInstance(local_iname) => {
                    self.rewrite_bundle_connection(module, inst_name, &key, &local_iname, child.as_ref())?;
                }
                Connection::PortRef(pref) => {
                    self.rewrite_portref_into_own_bundle(module, inst_name, &key, &pref)?;
                }
                Connection::Signal(_) => {}
            }
        }
        Ok(())
    }

    /// A connection whose value is one of *this* module's own interface
    /// instances, passed straight through to a child instance's same-shaped
    /// bundle port — expand into one scalar connection per field.
    fn rewrite_bundle_connection(
        &self,
        module: &ModuleRef,
        inst_name: &ArcStr,
        port: &ArcStr,
        local_iname: &ArcStr,
        child: Option<&ModuleRef>,
    ) -> Result<()> {
        let own_flat = self
            .replacements
            .get(&ModuleIdentity::of(module))
            .and_then(|m| m.get(local_iname))
            .cloned()
            .ok_or_else(|| {
                Error::new(ErrorKind::InvariantViolation(format!(
                    "no flattening recorded for interface instance `{local_iname}`"
                )))
            })?;

        let child = child.ok_or_else(|| {
            Error::new(ErrorKind::InvariantViolation(
                "bundle connection targets a non-module instance".into(),
            ))
        })?;
        let child_flat = self
            .replacements
            .get(&ModuleIdentity::of(child))
            .and_then(|m| m.get(port))
            .cloned()
            .ok_or_else(|| {
                Error::new(ErrorKind::UndefinedReference {
                    instance: inst_name.clone(),
                    port: port.clone(),
                })
            })?;

        module
            .borrow_mut()
            .instances
            .get_mut(inst_name)
            .expect("instance name came from this module")
            .connections
            .shift_remove(port);

        for (path, child_fsig) in &child_flat.signals {
            let our_fsig = own_flat.signals.get(path).ok_or_else(|| {
                Error::new(ErrorKind::UndefinedReference {
                    instance: inst_name.clone(),
                    port: port.clone(),
                })
            })?;
            module
                .borrow_mut()
                .instances
                .get_mut(inst_name)
                .expect("instance name came from this module")
                .connect(
                    child_fsig.signal.name.clone(),
                    Connection::Signal(our_fsig.signal.name.clone()),
                );
        }
        Ok(())
    }

    /// A connection whose value is a `PortRef` into one of this module's own
    /// (already-removed) interface instances: resolve by the bundle's
    /// original leaf-signal name. Only resolves top-level (undotted)
    /// signal names; `PortRef`s into nested fields are not rewritten here.
    fn rewrite_portref_into_own_bundle(
        &self,
        module: &ModuleRef,
        inst_name: &ArcStr,
        port: &ArcStr,
        pref: &crate::ir::PortRef,
    ) -> Result<()> {
        let Some(bundle) = self
            .replacements
            .get(&ModuleIdentity::of(module))
            .and_then(|m| m.get(&pref.instance))
        else {
            // Not a reference into one of our own bundles; leave for the
            // scalar implicit-net pass.
            return Ok(());
        };

        let Some(fsig) = bundle.signals.get(&pref.port) else {
            return Ok(());
        };

        module
            .borrow_mut()
            .instances
            .get_mut(inst_name)
            .expect("instance name came from this module")
            .connect(port.clone(), Connection::Signal(fsig.signal.name.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::InterfaceSignalDef;

    #[test]
    fn flatten_simple_interface_keeps_both_signals() {
        let mut def = InterfaceDef::new("Diff");
        def.add_signal(InterfaceSignalDef::new("p", 1).with_roles("A", "B"));
        def.add_signal(InterfaceSignalDef::new("n", 1).with_roles("A", "B"));
        let flat = flatten_interface_def(&Rc::new(def));
        assert_eq!(flat.len(), 2);
        assert!(flat.contains_key("p"));
        assert!(flat.contains_key("n"));
    }

    #[test]
    fn flatten_nested_interface_prefixes_field_name() {
        let mut inner = InterfaceDef::new("Inner");
        inner.add_signal(InterfaceSignalDef::new("s", 1));
        let mut outer = InterfaceDef::new("Outer");
        outer.add_interface("inner", Rc::new(inner));
        let flat = flatten_interface_def(&Rc::new(outer));
        assert_eq!(flat.len(), 1);
        let (_, fsig) = flat.iter().next().unwrap();
        assert!(fsig.signal.name.contains('s'));
    }
}
