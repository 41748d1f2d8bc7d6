//! End-to-end scenarios against the public `elaborate`/`elaborate_all` entry
//! points. Construction-time sugar is out of scope for the library, so each
//! test builds its input IR directly against the plain constructors.

use std::rc::Rc;

use circuit_ir::elaborate::{ElabPass, Elabable, DEFAULT_PASSES};
use circuit_ir::ir::{
    Connection, Direction, ExternalModuleCall, Generator, GeneratorCall, GeneratorResult, Instance, InstanceTarget,
    InterfaceDef, InterfaceInstance, InterfaceSignalDef, Module, Param, PortRef, Signal, Visibility,
};

fn elaborate_module(m: Module) -> circuit_ir::Result<std::rc::Rc<std::cell::RefCell<Module>>> {
    circuit_ir::elaborate(Elabable::Module(m.into_ref()), None, &DEFAULT_PASSES)
}

#[test]
fn trivial_pass_through_preserves_identity() {
    let mut m = Module::new("M");
    m.add_port(Signal::new("vss", 1, Visibility::Port, Direction::InOut));
    let result = elaborate_module(m).expect("elaborates cleanly");
    let r = result.borrow();
    assert_eq!(r.ports.len(), 1);
    assert!(r.signals.is_empty());
    assert!(r.interfaces.is_empty());
    assert!(r.instances.is_empty());
}

#[test]
fn generator_memoization_distinguishes_arguments() {
    let generator = Generator::new("g", |arg, _ctx| {
        let mut m = Module::anonymous();
        m.add_port(Signal::new("a", 1, Visibility::Port, Direction::InOut));
        m.add_port(Signal::new("b", 1, Visibility::Port, Direction::InOut));
        let _ = arg;
        Ok(GeneratorResult::Module(m.into_ref()))
    });

    let mut p = Module::new("P");
    p.add_instance(Instance::new(
        "x1",
        InstanceTarget::Generator(GeneratorCall::new(generator.clone(), Param::Int(3))),
    ));
    p.add_instance(Instance::new(
        "x2",
        InstanceTarget::Generator(GeneratorCall::new(generator.clone(), Param::Int(3))),
    ));
    p.add_instance(Instance::new(
        "x3",
        InstanceTarget::Generator(GeneratorCall::new(generator, Param::Int(4))),
    ));

    let result = elaborate_module(p).expect("elaborates cleanly");
    let r = result.borrow();

    let resolved = |name: &str| r.instances[name].resolved_module().unwrap().clone();
    let m1 = resolved("x1");
    let m2 = resolved("x2");
    let m3 = resolved("x3");

    assert!(Rc::ptr_eq(&m1, &m2), "equal arguments must resolve to the same module identity");
    assert!(!Rc::ptr_eq(&m1, &m3), "distinct arguments must resolve to distinct modules");
    assert_eq!(m1.borrow().name.as_deref(), Some("g(3)"));
    assert_eq!(m3.borrow().name.as_deref(), Some("g(4)"));
}

#[test]
fn scalar_implicit_net_is_materialized() {
    let mut leaf_x = Module::new("X");
    leaf_x.add_port(Signal::new("p", 1, Visibility::Port, Direction::InOut));
    let mut leaf_y = Module::new("Y");
    leaf_y.add_port(Signal::new("q", 1, Visibility::Port, Direction::InOut));

    let mut p = Module::new("P");
    let mut x = Instance::new("x", InstanceTarget::Module(leaf_x.into_ref()));
    x.connect("p", Connection::PortRef(PortRef::new("y", "q")));
    let mut y = Instance::new("y", InstanceTarget::Module(leaf_y.into_ref()));
    y.connect("q", Connection::PortRef(PortRef::new("x", "p")));
    p.add_instance(x);
    p.add_instance(y);

    let result = elaborate_module(p).expect("elaborates cleanly");
    let r = result.borrow();
    assert_eq!(r.signals.len(), 1, "exactly one implicit net should be created");
    let sig = r.signals.values().next().unwrap();
    assert_eq!(sig.name.as_str(), "_x_p_y_q_");
    assert_eq!(sig.visibility, Visibility::Internal);
    assert_eq!(sig.direction, Direction::None);

    for inst_name in ["x", "y"] {
        let inst = &r.instances[inst_name];
        let conn = inst.connections.values().next().unwrap();
        match conn {
            Connection::Signal(name) => assert_eq!(name, &sig.name),
            other => panic!("expected a resolved signal connection, got {other:?}"),
        }
    }
}

// Shorting itself (two distinct pre-existing signals/interfaces landing in
// one discovered net) is exercised directly against the pass in
// `elaborate::implicit_scalar_nets`'s own unit tests: the single-valued
// per-port connection model means a minimal repro needs to feed a
// component straight to the resolver rather than contrive it from two
// plain instances wired only through `PortRef`s.

#[test]
fn bundle_port_directions_follow_role_vs_signal_roles() {
    let mut diff = InterfaceDef::new("Diff");
    diff.add_signal(InterfaceSignalDef::new("p", 1).with_roles("A", "B"));
    diff.add_signal(InterfaceSignalDef::new("n", 1).with_roles("A", "B"));
    let diff = Rc::new(diff);

    let mut m = Module::new("M");
    m.add_interface(InterfaceInstance::new("io", diff).as_port("A"));

    let result = elaborate_module(m).expect("elaborates cleanly");
    let r = result.borrow();
    assert!(r.interfaces.is_empty());
    assert_eq!(r.ports.len(), 2);
    for sig in r.ports.values() {
        assert_eq!(sig.visibility, Visibility::Port);
        assert_eq!(sig.direction, Direction::Output);
    }
}

#[test]
fn nested_bundle_flattens_to_one_internal_signal() {
    let mut inner = InterfaceDef::new("Inner");
    inner.add_signal(InterfaceSignalDef::new("s", 1));
    let mut outer = InterfaceDef::new("Outer");
    outer.add_interface("inner", Rc::new(inner));
    let outer = Rc::new(outer);

    let mut m = Module::new("M");
    m.add_interface(InterfaceInstance::new("b", outer));

    let result = elaborate_module(m).expect("elaborates cleanly");
    let r = result.borrow();
    assert!(r.interfaces.is_empty());
    assert_eq!(r.signals.len(), 1);
    let sig = r.signals.values().next().unwrap();
    assert_eq!(sig.visibility, Visibility::Internal);
    assert!(sig.name.contains('s'));
}

#[test]
fn external_module_instances_pass_through_untouched() {
    let mut m = Module::new("M");
    let mut inst = Instance::new(
        "x",
        InstanceTarget::External(ExternalModuleCall { name: "imported_cell".into() }),
    );
    inst.connect("a", Connection::Signal("vdd".into()));
    m.add_signal(Signal::new("vdd", 1, Visibility::Internal, Direction::None));
    m.add_instance(inst);

    let result = elaborate_module(m).expect("elaborates cleanly");
    let r = result.borrow();
    assert!(matches!(r.instances["x"].target, InstanceTarget::External(_)));
}
