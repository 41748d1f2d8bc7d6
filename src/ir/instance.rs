use arcstr::ArcStr;
use indexmap::IndexMap;

use super::generator::GeneratorCall;
use super::module::ModuleRef;

/// A leaf call into a circuit primitive (resistor, capacitor, source, ...).
/// Primitives never expand further; elaboration passes through them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveCall {
    pub name: ArcStr,
}

/// A reference to a module defined outside this IR (e.g. an imported
/// netlist subcircuit). Also passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalModuleCall {
    pub name: ArcStr,
}

/// What an [`Instance`] is an instance of.
#[derive(Debug, Clone)]
pub enum InstanceTarget {
    Module(ModuleRef),
    Primitive(PrimitiveCall),
    External(ExternalModuleCall),
    Generator(GeneratorCall),
}

/// A symbolic `instance.port` reference used as a connection value before
/// the referenced net has been materialized. This is a navigation token,
/// not an owning edge: `instance`/`port` are plain names resolved by lookup
/// against the enclosing module's own maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub instance: ArcStr,
    pub port: ArcStr,
}

impl PortRef {
    pub fn new(instance: impl Into<ArcStr>, port: impl Into<ArcStr>) -> Self {
        Self {
            instance: instance.into(),
            port: port.into(),
        }
    }
}

/// The value bound to one of an instance's ports.
#[derive(Debug, Clone)]
pub enum Connection {
    /// A declared scalar signal in the enclosing module's namespace.
    Signal(ArcStr),
    /// A declared interface instance in the enclosing module's namespace.
    InterfaceInstance(ArcStr),
    /// An unmaterialized `instance.port` alias, resolved by an implicit-net pass.
    PortRef(PortRef),
}

/// A use of a module, primitive, external module, or generator call inside
/// another module.
#[derive(Debug, Clone)]
pub struct Instance {
    pub name: ArcStr,
    pub target: InstanceTarget,
    pub connections: IndexMap<ArcStr, Connection>,
}

impl Instance {
    pub fn new(name: impl Into<ArcStr>, target: InstanceTarget) -> Self {
        Self {
            name: name.into(),
            target,
            connections: IndexMap::new(),
        }
    }

    pub fn connect(&mut self, port: impl Into<ArcStr>, conn: Connection) -> &mut Self {
        self.connections.insert(port.into(), conn);
        self
    }

    pub fn resolved_module(&self) -> Option<&ModuleRef> {
        match &self.target {
            InstanceTarget::Module(m) => Some(m),
            _ => None,
        }
    }
}
