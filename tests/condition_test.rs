use afcl_graph::compiler::core::Compiler;
use afcl_graph::dsl::builder::{Body, WorkflowBuilder};
use afcl_graph::dsl::Workflow;
use afcl_graph::error::CompileError;
use afcl_graph::graph::{
    DataFlowKind, DataRole, DataType, EdgeKind, FunctionKind, Operator, Summary, UtilityKind,
};
use serde_json::json;

fn branching_workflow() -> Workflow {
    WorkflowBuilder::new("W")
        .data_in("a", "number", "a")
        .if_then_else("check")
            .data_in("v", "number", "W/a")
            .condition("check/v", "5", "number", ">")
            .then_branch()
            .function("A", "local")
                .data_in("v", "number", "check/v")
                .data_out("r", "number")
                .build()
            .else_branch()
            .function("B", "local")
                .data_in("v", "number", "check/v")
                .data_out("r", "number")
                .build()
            .data_out("res", "number", "A/r,B/r")
            .build()
        .data_out("result", "number", "check/res")
        .build()
}

#[test]
fn test_conditional_expansion() {
    // 1. Compile
    let graph = Compiler::new()
        .compile(&branching_workflow())
        .expect("Compilation failed");

    // 2. Shape
    assert_eq!(graph.node_count(), 10);
    assert_eq!(graph.edge_count(), 13);
    assert!(graph.find("check/v").is_none());

    // 3. Condition node
    let condition = graph.find("check").expect("condition function");
    match graph.node(condition).as_function() {
        Some(FunctionKind::Utility(UtilityKind::Condition { conditions, summary })) => {
            assert_eq!(*summary, Summary::And);
            assert_eq!(conditions.len(), 1);
            assert_eq!(conditions[0].first, "W/a");
            assert_eq!(conditions[0].second, "check/5");
            assert_eq!(conditions[0].operator, Operator::Greater);
            assert!(!conditions[0].negation);
        }
        other => panic!("unexpected condition kind: {:?}", other),
    }
    let literal = graph.get("check/5").and_then(|n| n.as_data()).expect("literal operand");
    assert_eq!(literal.role, DataRole::Constant);
    assert_eq!(literal.content, Some(json!(5)));

    // 4. Decision guards both branches
    let decision = graph.find("check--decision").expect("decision");
    assert_eq!(
        graph.node(decision).as_data().map(|d| d.data_type),
        Some(DataType::Boolean)
    );
    let guards: Vec<(&str, EdgeKind)> = graph
        .out_edges(decision)
        .map(|e| (graph.node(e.target).id.as_str(), e.kind))
        .collect();
    assert_eq!(
        guards,
        vec![
            ("A", EdgeKind::ControlIf { activation: true }),
            ("B", EdgeKind::ControlIf { activation: false }),
            ("check--Multiplexer--res", EdgeKind::Data),
        ]
    );

    // 5. Multiplexer
    let mux = graph.find("check--Multiplexer--res").expect("multiplexer");
    assert_eq!(
        graph.node(mux).as_function(),
        Some(&FunctionKind::DataFlow(DataFlowKind::Multiplexer))
    );
    let inputs: Vec<(&str, &str)> = graph
        .in_edges(mux)
        .map(|e| (graph.node(e.source).id.as_str(), e.key.as_str()))
        .collect();
    assert_eq!(
        inputs,
        vec![("A/r", "then"), ("B/r", "else"), ("check--decision", "decision")]
    );

    let (_, leaf) = graph.leaves().next().expect("output");
    assert_eq!(leaf.id, "A/r,B/r");
}

#[test]
fn test_shared_operand_is_wired_once() {
    let workflow = WorkflowBuilder::new("W")
        .data_in("a", "number", "a")
        .if_then_else("check")
            .combined_with("or")
            .condition("W/a", "0", "number", "<")
            .negated_condition("W/a", "10", "number", "<=")
            .function("A", "local")
                .data_in("v", "number", "W/a")
                .data_out("r", "number")
                .build()
            .else_branch()
            .function("B", "local")
                .data_in("v", "number", "W/a")
                .data_out("r", "number")
                .build()
            .data_out("res", "number", "A/r,B/r")
            .build()
        .data_out("result", "number", "check/res")
        .build();

    let graph = Compiler::new().compile(&workflow).expect("Compilation failed");
    let condition = graph.find("check").expect("condition");
    let operands: Vec<&str> = graph
        .in_edges(condition)
        .map(|e| e.key.as_str())
        .collect();
    assert_eq!(operands, vec!["W/a", "check/0", "check/10"]);

    match graph.node(condition).as_function() {
        Some(FunctionKind::Utility(UtilityKind::Condition { conditions, summary })) => {
            assert_eq!(*summary, Summary::Or);
            assert!(conditions[1].negation);
            assert_eq!(conditions[1].operator, Operator::LessEqual);
        }
        other => panic!("unexpected condition kind: {:?}", other),
    }
}

#[test]
fn test_condition_errors() {
    let base = || {
        WorkflowBuilder::new("W")
            .data_in("a", "number", "a")
            .if_then_else("check")
    };

    // Empty condition list
    let workflow = base()
        .function("A", "local")
            .data_in("v", "number", "W/a")
            .data_out("r", "number")
            .build()
        .build()
        .build();
    let err = Compiler::new().compile(&workflow).expect_err("empty conditions");
    assert!(matches!(err, CompileError::ArgumentError { ref node, .. } if node == "check"));

    // Unknown combinator
    let workflow = base()
        .combined_with("xor")
        .condition("W/a", "1", "number", "==")
        .build()
        .build();
    let err = Compiler::new().compile(&workflow).expect_err("xor");
    assert_eq!(err.code(), "UNSUPPORTED_CONSTRUCT");

    // Unknown operator
    let workflow = base()
        .condition("W/a", "1", "number", "=~")
        .build()
        .build();
    let err = Compiler::new().compile(&workflow).expect_err("operator");
    assert_eq!(err.code(), "UNSUPPORTED_CONSTRUCT");
}

#[test]
fn test_multiplexer_source_errors() {
    let with_output = |source: &str| {
        WorkflowBuilder::new("W")
            .data_in("a", "number", "a")
            .if_then_else("check")
                .condition("W/a", "5", "number", ">")
                .function("A", "local")
                    .data_in("v", "number", "W/a")
                    .data_out("r", "number")
                    .build()
                .else_branch()
                .function("B", "local")
                    .data_in("v", "number", "W/a")
                    .data_out("r", "number")
                    .build()
                .data_out("res", "number", source)
                .build()
            .build()
    };

    let err = Compiler::new()
        .compile(&with_output("A/r"))
        .expect_err("single reference");
    assert_eq!(err.code(), "MALFORMED_REFERENCE");

    let err = Compiler::new()
        .compile(&with_output("A/r, 7"))
        .expect_err("literal candidate");
    assert_eq!(err.code(), "MALFORMED_REFERENCE");

    let err = Compiler::new()
        .compile(&with_output("A/r,B/missing"))
        .expect_err("undeclared output");
    assert_eq!(err.code(), "MISSING_DECLARATION");
}

#[test]
fn test_nested_conditional_guards_inner_functions() {
    let workflow = WorkflowBuilder::new("W")
        .data_in("a", "number", "a")
        .if_then_else("outer")
            .condition("W/a", "0", "number", ">")
            .if_then_else("inner")
                .condition("W/a", "10", "number", ">")
                .function("big", "local")
                    .data_in("v", "number", "W/a")
                    .data_out("r", "number")
                    .build()
                .else_branch()
                .function("small", "local")
                    .data_in("v", "number", "W/a")
                    .data_out("r", "number")
                    .build()
                .data_out("res", "number", "big/r,small/r")
                .build()
            .else_branch()
            .function("negative", "local")
                .data_in("v", "number", "W/a")
                .data_out("r", "number")
                .build()
            .data_out("res", "number", "inner/res,negative/r")
            .build()
        .data_out("result", "number", "outer/res")
        .build();

    let graph = Compiler::new().compile(&workflow).expect("Compilation failed");
    let outer_decision = graph.find("outer--decision").expect("outer decision");
    let guarded: Vec<&str> = graph
        .out_edges(outer_decision)
        .filter(|e| e.kind == EdgeKind::ControlIf { activation: true })
        .map(|e| graph.node(e.target).id.as_str())
        .collect();
    assert_eq!(
        guarded,
        vec!["inner", "big", "small", "inner--Multiplexer--res"]
    );

    let (_, leaf) = graph.leaves().next().expect("output");
    assert_eq!(leaf.id, "inner/res,negative/r");
    assert!(graph.find("big/r,small/r").is_some());
}
