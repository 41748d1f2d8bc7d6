use arcstr::ArcStr;
use indexmap::IndexMap;
use std::rc::Rc;

/// One scalar field of an [`InterfaceDef`]. `src`/`dest` are arbitrary role
/// tags (e.g. `"A"`/`"B"` for a differential pair) used by
/// [`crate::elaborate::bundle_flattening`] to derive a direction once the
/// bundle is consumed at a known role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSignalDef {
    pub name: ArcStr,
    pub width: usize,
    pub src: Option<ArcStr>,
    pub dest: Option<ArcStr>,
}

impl InterfaceSignalDef {
    pub fn new(name: impl Into<ArcStr>, width: usize) -> Self {
        Self {
            name: name.into(),
            width,
            src: None,
            dest: None,
        }
    }

    pub fn with_roles(mut self, src: impl Into<ArcStr>, dest: impl Into<ArcStr>) -> Self {
        self.src = Some(src.into());
        self.dest = Some(dest.into());
        self
    }
}

/// A named bundle type: a flat set of scalar signals plus any nested
/// sub-bundles, each keyed by its field name in declaration order.
#[derive(Debug, Clone)]
pub struct InterfaceDef {
    pub name: ArcStr,
    pub signals: IndexMap<ArcStr, InterfaceSignalDef>,
    pub interfaces: IndexMap<ArcStr, Rc<InterfaceDef>>,
}

impl InterfaceDef {
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            signals: IndexMap::new(),
            interfaces: IndexMap::new(),
        }
    }

    pub fn add_signal(&mut self, sig: InterfaceSignalDef) -> &mut Self {
        self.signals.insert(sig.name.clone(), sig);
        self
    }

    pub fn add_interface(&mut self, field_name: impl Into<ArcStr>, def: Rc<InterfaceDef>) -> &mut Self {
        self.interfaces.insert(field_name.into(), def);
        self
    }
}

/// Use of an [`InterfaceDef`] inside a module, prior to
/// [`crate::elaborate::bundle_flattening`] replacing it with scalar signals.
#[derive(Debug, Clone)]
pub struct InterfaceInstance {
    pub name: ArcStr,
    pub of: Rc<InterfaceDef>,
    pub port: bool,
    pub role: Option<ArcStr>,
}

impl InterfaceInstance {
    pub fn new(name: impl Into<ArcStr>, of: Rc<InterfaceDef>) -> Self {
        Self {
            name: name.into(),
            of,
            port: false,
            role: None,
        }
    }

    pub fn as_port(mut self, role: impl Into<ArcStr>) -> Self {
        self.port = true;
        self.role = Some(role.into());
        self
    }

    /// A copy with `port`/`role` cleared, used when
    /// [`crate::elaborate::implicit_bundle_nets`] materializes an implicit
    /// net by cloning a connected instance's interface-port definition.
    pub fn renamed_internal(&self, name: ArcStr) -> Self {
        Self {
            name,
            of: self.of.clone(),
            port: false,
            role: None,
        }
    }
}
