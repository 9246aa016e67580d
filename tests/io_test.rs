use afcl_graph::compiler::core::Compiler;
use afcl_graph::dsl::builder::{Body, WorkflowBuilder};
use afcl_graph::io::{
    bind_inputs, collect_outputs, InputDataProvider, InputDataProviderFile, OutputDataHandler,
    OutputDataPrinter,
};
use afcl_graph::EnactmentGraph;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fs;

fn compiled() -> EnactmentGraph {
    let workflow = WorkflowBuilder::new("W")
        .data_in("name", "string", "userName")
        .data_in("count", "number", "count")
        .function("greet", "local")
            .data_in("who", "string", "W/name")
            .data_in("times", "number", "W/count")
            .data_out("greeting", "string")
            .build()
        .data_out("message", "string", "greet/greeting")
        .build();
    Compiler::new().compile(&workflow).expect("Compilation failed")
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

#[test]
fn test_bind_inputs_by_boundary_key() {
    let graph = compiled();
    let input = object(json!({ "userName": "Ada", "count": 2, "unused": true }));

    let bound = bind_inputs(&graph, &input).expect("binding failed");

    assert_eq!(bound.len(), 2);
    let name = graph.find("W/name").expect("root");
    let count = graph.find("W/count").expect("root");
    assert_eq!(bound.get(&name), Some(&json!("Ada")));
    assert_eq!(bound.get(&count), Some(&json!(2)));
}

#[test]
fn test_bind_inputs_rejects_missing_and_mistyped() {
    let graph = compiled();

    let input = object(json!({ "userName": "Ada" }));
    let err = bind_inputs(&graph, &input).expect_err("count is missing");
    assert!(err.to_string().contains("count"));

    let input = object(json!({ "userName": 7, "count": 2 }));
    let err = bind_inputs(&graph, &input).expect_err("name is not a string");
    assert!(err.to_string().contains("must be string"));
}

#[test]
fn test_input_file_provider() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("input.json");
    fs::write(&file_path, r#"{ "userName": "Grace", "count": 3 }"#)
        .expect("Failed to write temp file");

    let provider = InputDataProviderFile::from_file(&file_path.to_string_lossy())
        .expect("Failed to read input file");
    assert_eq!(provider.input_data().len(), 2);

    let bound = bind_inputs(&compiled(), &provider).expect("binding failed");
    assert_eq!(bound.len(), 2);

    let err = InputDataProviderFile::from_json("[1, 2]").expect_err("not an object");
    assert!(err.to_string().contains("must be a JSON object"));

    temp_dir.close().expect("Failed to close temp dir");
}

#[test]
fn test_collect_outputs() {
    let graph = compiled();
    let leaf = graph.find("greet/greeting").expect("leaf");

    let mut values = BTreeMap::new();
    let err = collect_outputs(&graph, &values).expect_err("no value yet");
    assert!(err.to_string().contains("message"));

    values.insert(leaf, json!("hello Ada"));
    let output = collect_outputs(&graph, &values).expect("all leaves present");
    assert_eq!(Value::Object(output.clone()), json!({ "message": "hello Ada" }));

    let mut printer = OutputDataPrinter;
    printer.handle_output_data(&output).expect("printing never fails");
}

#[test]
fn test_collect_outputs_sharing_a_leaf() {
    let workflow = WorkflowBuilder::new("W")
        .data_in("name", "string", "userName")
        .function("greet", "local")
            .data_in("who", "string", "W/name")
            .data_out("greeting", "string")
            .build()
        .data_out("message", "string", "greet/greeting")
        .data_out("copy", "string", "greet/greeting")
        .data_out("name", "string", "W/name")
        .build();
    let graph = Compiler::new().compile(&workflow).expect("Compilation failed");

    let mut values = BTreeMap::new();
    values.insert(graph.find("W/name").expect("root"), json!("Ada"));
    values.insert(graph.find("greet/greeting").expect("leaf"), json!("hello Ada"));

    let output = collect_outputs(&graph, &values).expect("all leaves present");
    assert_eq!(
        Value::Object(output),
        json!({ "message": "hello Ada", "copy": "hello Ada", "name": "Ada" })
    );
}
