//! Test to verify test infrastructure works correctly

mod common;

use common::builders::ChainBuilder;
use common::nodes::{event_log, events, FlakyNode, GainNode};
use std::sync::{Arc, Mutex};
use tickgraph::{AnyNode, ValueKind};

#[test]
fn test_infrastructure_setup() {
    // Test that builders work
    let log = event_log();
    let mut engine = common::test_engine();
    let ids = ChainBuilder::new(&log)
        .node("first")
        .node("second")
        .offset(0.5)
        .build(&mut engine);

    assert_eq!(ids.len(), 2);
    assert_eq!(engine.connections().len(), 1);
    assert!(events(&log).is_empty());
}

#[test]
fn test_helper_nodes_declare_ports() {
    let failing = Arc::new(Mutex::new(true));
    let flaky = AnyNode::processor(FlakyNode::new(&failing));
    assert_eq!(flaky.name(), "Flaky");
    assert!(flaky.inputs()[0].accepts.contains(ValueKind::Scalar));
    assert_eq!(flaky.outputs()[0].produces, ValueKind::Scalar);

    let gain = AnyNode::processor(GainNode { gain: 3.0 });
    assert_eq!(gain.name(), "Gain");
    assert!(gain.inputs()[0].accepts.contains(ValueKind::Image));
    assert!(!gain.inputs()[0].accepts.contains(ValueKind::Scalar));
    assert_eq!(gain.outputs()[0].produces, ValueKind::Image);
}

#[test]
fn test_flaky_node_toggles_failure() {
    let failing = Arc::new(Mutex::new(true));
    let mut engine = common::test_engine();
    let flaky = engine.add_node(AnyNode::processor(FlakyNode::new(&failing)));

    assert_eq!(engine.tick().failed.len(), 1);
    *failing.lock().unwrap() = false;
    assert_eq!(engine.tick().evaluated, vec![flaky]);
}
