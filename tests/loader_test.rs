use afcl_graph::compiler::core::Compiler;
use afcl_graph::compiler::loader;
use afcl_graph::dsl::builder::{Body, WorkflowBuilder};
use std::fs;

const WORKFLOW_YAML: &str = r#"
name: "W"
dataIns:
  - name: "a"
    type: "number"
    source: "a"
  - name: "coll"
    type: "collection"
    source: "coll"
workflowBody:
  - function:
      name: "F"
      type: "serverless"
      properties:
        - name: "resource"
          value: "python:https://example.org/f"
      dataIns:
        - name: "x"
          type: "number"
          source: "W/a"
        - name: "y"
          type: "number"
          source: 5
      dataOuts:
        - name: "out"
          type: "number"
  - if:
      name: "check"
      dataIns:
        - name: "v"
          type: "number"
          source: "F/out"
      condition:
        conditions:
          - data1: "check/v"
            data2: 10
            type: "number"
            operator: ">"
            negation: "true"
      thenBranch:
        - function:
            name: "A"
            type: "local"
            dataIns:
              - name: "v"
                type: "number"
                source: "check/v"
            dataOuts:
              - name: "r"
                type: "number"
      elseBranch:
        - function:
            name: "B"
            type: "local"
            dataIns:
              - name: "v"
                type: "number"
                source: "check/v"
            dataOuts:
              - name: "r"
                type: "number"
      dataOuts:
        - name: "res"
          type: "number"
          source: "A/r,B/r"
  - parallelFor:
      name: "loop"
      dataIns:
        - name: "items"
          type: "number"
          source: "W/coll"
      iterators: ["items"]
      loopBody:
        - function:
            name: "G"
            type: "local"
            dataIns:
              - name: "x"
                type: "number"
                source: "loop/items"
            dataOuts:
              - name: "z"
                type: "number"
      dataOuts:
        - name: "zs"
          type: "collection"
          source: "G/z"
dataOuts:
  - name: "result"
    type: "number"
    source: "check/res"
  - name: "all"
    type: "collection"
    source: "loop/zs"
"#;

#[test]
fn test_load_yaml_workflow() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("workflow.yaml");
    fs::write(&file_path, WORKFLOW_YAML).expect("Failed to write temp file");

    let loaded_workflow = loader::load_workflow_from_yaml(&file_path.to_string_lossy())
        .expect("Failed to load workflow from YAML");

    let expected_workflow = WorkflowBuilder::new("W")
        .data_in("a", "number", "a")
        .data_in("coll", "collection", "coll")
        .function("F", "serverless")
            .property("resource", "python:https://example.org/f")
            .data_in("x", "number", "W/a")
            .data_in("y", "number", "5")
            .data_out("out", "number")
            .build()
        .if_then_else("check")
            .data_in("v", "number", "F/out")
            .negated_condition("check/v", "10", "number", ">")
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
        .parallel_for("loop")
            .data_in("items", "number", "W/coll")
            .iterator("items")
            .function("G", "local")
                .data_in("x", "number", "loop/items")
                .data_out("z", "number")
                .build()
            .data_out("zs", "collection", "G/z")
            .build()
        .data_out("result", "number", "check/res")
        .data_out("all", "collection", "loop/zs")
        .build();

    assert_eq!(loaded_workflow, expected_workflow);

    // Cleanup
    temp_dir.close().expect("Failed to close temp dir");
}

#[test]
fn test_loaded_workflow_compiles() {
    let workflow = loader::load_workflow_from_str(WORKFLOW_YAML).expect("valid YAML");
    let graph = Compiler::new().compile(&workflow).expect("Compilation failed");

    assert_eq!(graph.node_count(), 20);
    let outputs: Vec<&str> = graph.leaves().map(|(_, n)| n.id.as_str()).collect();
    assert_eq!(outputs, vec!["A/r,B/r", "loop/zs"]);
}

#[test]
fn test_load_errors_carry_context() {
    let err = loader::load_workflow_from_yaml("/nonexistent/workflow.yaml")
        .expect_err("missing file");
    assert!(format!("{:#}", err).contains("Failed to read YAML file"));

    let err = loader::load_workflow_from_str("name: [unclosed").expect_err("bad YAML");
    assert!(format!("{:#}", err).contains("Failed to deserialize workflow YAML"));

    let invalid_negation = r#"
name: "W"
workflowBody:
  - if:
      name: "check"
      condition:
        conditions:
          - data1: "a/b"
            data2: 1
            type: "number"
            operator: "=="
            negation: "maybe"
"#;
    let err = loader::load_workflow_from_str(invalid_negation).expect_err("bad flag");
    assert!(format!("{:#}", err).contains("is not a boolean"));
}
