use arcstr::ArcStr;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use super::instance::Instance;
use super::interface::InterfaceInstance;
use super::signal::Signal;

/// Shared, interior-mutable handle to a [`Module`]. Modules referenced by
/// more than one instance (the common case once generator expansion has
/// deduplicated calls) are multi-owner with no single longest-lived parent,
/// so plain ownership doesn't fit; elaboration passes mutate through this
/// handle in place.
pub type ModuleRef = Rc<RefCell<Module>>;

/// Reference identity of a [`ModuleRef`], used to memoize per-module work by
/// object identity rather than by structural equality (two modules with
/// identical contents but distinct identity are distinct modules).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleIdentity(usize);

impl ModuleIdentity {
    pub fn of(module: &ModuleRef) -> Self {
        ModuleIdentity(Rc::as_ptr(module) as usize)
    }
}

/// A named hardware block: ports, internal signals, sub-instances, and
/// (prior to bundle flattening) interface instances, each in declaration
/// order.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: Option<ArcStr>,
    pub ports: IndexMap<ArcStr, Signal>,
    pub signals: IndexMap<ArcStr, Signal>,
    pub instances: IndexMap<ArcStr, Instance>,
    pub interfaces: IndexMap<ArcStr, InterfaceInstance>,
}

impl Module {
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// An unnamed module, as generator functions are allowed to return;
    /// [`crate::elaborate::generator_expansion`] assigns a name to these.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn into_ref(self) -> ModuleRef {
        Rc::new(RefCell::new(self))
    }

    pub fn add_port(&mut self, sig: Signal) -> &mut Self {
        self.ports.insert(sig.name.clone(), sig);
        self
    }

    pub fn add_signal(&mut self, sig: Signal) -> &mut Self {
        self.signals.insert(sig.name.clone(), sig);
        self
    }

    pub fn add_instance(&mut self, inst: Instance) -> &mut Self {
        self.instances.insert(inst.name.clone(), inst);
        self
    }

    pub fn add_interface(&mut self, inst: InterfaceInstance) -> &mut Self {
        self.interfaces.insert(inst.name.clone(), inst);
        self
    }

    /// The union of every name declared directly in this module: ports,
    /// signals, instances, and interface instances. Used as the collision
    /// set for `flatname`.
    pub fn namespace(&self) -> HashSet<ArcStr> {
        let mut names = HashSet::with_capacity(
            self.ports.len() + self.signals.len() + self.instances.len() + self.interfaces.len(),
        );
        names.extend(self.ports.keys().cloned());
        names.extend(self.signals.keys().cloned());
        names.extend(self.instances.keys().cloned());
        names.extend(self.interfaces.keys().cloned());
        names
    }

    pub fn port(&self, name: &str) -> Option<&Signal> {
        self.ports.get(name)
    }

    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name).or_else(|| self.ports.get(name))
    }
}
