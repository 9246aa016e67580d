use afcl_graph::compiler::{reference, scope};
use afcl_graph::dsl::builder::{Body, WorkflowBuilder};
use afcl_graph::dsl::Workflow;
use afcl_graph::error::CompileError;

fn nested_workflow() -> Workflow {
    WorkflowBuilder::new("wf")
        .data_in("input", "number", "input")
        .sequence("seq")
            .data_in("a", "number", "wf/input")
            .data_in("k", "number", "7")
            .data_in("loopy", "number", "seq/loopy")
            .function("f", "local")
                .data_in("x", "number", "seq/a")
                .data_out("out", "number")
                .build()
            .data_out("b", "number", "f/out")
            .build()
        .if_then_else("check")
            .data_in("v", "number", "seq/b")
            .condition("check/v", "0", "number", ">")
            .function("g", "local")
                .data_out("r", "number")
                .build()
            .else_branch()
            .function("h", "local")
                .data_out("r", "number")
                .build()
            .data_out("res", "number", "g/r,h/r")
            .build()
        .parallel_for("loop")
            .data_in("items", "number", "wf/input")
            .data_in("factor", "number", "seq/b")
            .iterator("items")
            .data_out("all", "collection", "f/out")
            .build()
        .data_out("result", "number", "seq/b")
        .build()
}

#[test]
fn test_workflow_reference_is_fixed_point() {
    let workflow = nested_workflow();
    assert_eq!(
        scope::resolve("wf/input", &workflow).expect("root reference"),
        "wf/input"
    );
}

#[test]
fn test_compound_ports_follow_their_sources() {
    let workflow = nested_workflow();

    // Input chains back to the workflow root
    assert_eq!(scope::resolve("seq/a", &workflow).expect("seq input"), "wf/input");
    // Output chains to the atomic producer
    assert_eq!(scope::resolve("seq/b", &workflow).expect("seq output"), "f/out");
    // Atomic outputs are canonical
    assert_eq!(scope::resolve("f/out", &workflow).expect("atomic output"), "f/out");
    // Conditional inputs recurse, outputs name the multiplexed node
    assert_eq!(scope::resolve("check/v", &workflow).expect("if input"), "f/out");
    assert_eq!(scope::resolve("check/res", &workflow).expect("if output"), "g/r,h/r");
}

#[test]
fn test_parallel_for_ports() {
    let workflow = nested_workflow();

    assert_eq!(scope::resolve("loop/items", &workflow).expect("iterator"), "loop/items");
    assert_eq!(scope::resolve("loop/factor", &workflow).expect("plain input"), "f/out");
    assert_eq!(scope::resolve("loop/all", &workflow).expect("aggregated"), "loop/all");
}

#[test]
fn test_count_iterator_port_follows_its_source() {
    let workflow = WorkflowBuilder::new("wf")
        .data_in("input", "number", "input")
        .parallel_for("loop")
            .data_in("n", "number", "4")
            .iterator("n")
            .data_out("all", "collection", "loop/n")
            .build()
        .parallel_for("counted")
            .data_in("times", "number", "wf/input")
            .iterator("wf/input")
            .data_out("all", "collection", "counted/times")
            .build()
        .build();

    assert_eq!(scope::resolve("loop/n", &workflow).expect("literal count"), "4");
    assert_eq!(scope::resolve("counted/times", &workflow).expect("plain input"), "wf/input");
}

#[test]
fn test_literal_bound_port_resolves_to_literal() {
    let workflow = nested_workflow();
    assert_eq!(scope::resolve("seq/k", &workflow).expect("literal"), "7");
}

#[test]
fn test_missing_declarations() {
    let workflow = nested_workflow();

    let err = scope::resolve("nowhere/x", &workflow).expect_err("unknown function");
    assert_eq!(err, CompileError::MissingDeclaration {
        scope: "wf".to_string(),
        name: "nowhere".to_string(),
    });

    let err = scope::resolve("f/missing", &workflow).expect_err("unknown output");
    assert_eq!(err.code(), "MISSING_DECLARATION");

    let err = scope::resolve("seq/missing", &workflow).expect_err("unknown port");
    assert_eq!(err.code(), "MISSING_DECLARATION");
}

#[test]
fn test_self_referencing_port_is_cyclic() {
    let workflow = nested_workflow();
    let err = scope::resolve("seq/loopy", &workflow).expect_err("cycle");
    assert_eq!(err.code(), "CYCLIC_REFERENCE");
}

#[test]
fn test_malformed_reference() {
    let workflow = nested_workflow();
    let err = scope::resolve("/broken", &workflow).expect_err("no producer");
    assert_eq!(err.code(), "MALFORMED_REFERENCE");
}

#[test]
fn test_reference_shapes() {
    assert!(reference::is_src_string("f/out"));
    assert!(reference::is_src_string("wf/a/b"));
    assert!(!reference::is_src_string("5"));
    assert!(!reference::is_src_string("/out"));
    assert!(!reference::is_src_string("f/"));

    assert_eq!(reference::split("f/a/b").expect("valid"), ("f", "a/b"));
    assert_eq!(reference::split_if_out("a/x, b/y"), Some(("a/x", "b/y")));
    assert_eq!(reference::split_if_out("a/x"), None);
    assert_eq!(reference::split_if_out("a/x,5"), None);
}
