//! The circuit intermediate representation: modules, signals, interfaces,
//! instances, and generator calls. Construction here is deliberately
//! minimal — direct constructors only, no builder DSL — since the sugar
//! layer that would normally sit in front of this is out of scope.

pub mod context;
pub mod generator;
pub mod instance;
pub mod interface;
pub mod module;
pub mod param;
pub mod signal;

pub use context::Context;
pub use generator::{Generator, GeneratorCall, GeneratorCallKey, GeneratorId, GeneratorResult};
pub use instance::{Connection, ExternalModuleCall, Instance, InstanceTarget, PortRef, PrimitiveCall};
pub use interface::{InterfaceDef, InterfaceInstance, InterfaceSignalDef};
pub use module::{Module, ModuleIdentity, ModuleRef};
pub use param::{unique_name, Param};
pub use signal::{Direction, Signal, Visibility};
