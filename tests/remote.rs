//! Remote `$ref` resolution through the process-wide cache.
use jsonbind::{reset_remote_cache, Compiler};
use mockito::mock;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

// The remote cache is process-wide; these tests take turns
static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[test]
fn remote_ref_is_fetched_once_and_cached() {
    let _guard = serial();
    reset_remote_cache();
    let endpoint = mock("GET", "/person.json")
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "type": "object",
                "required": ["name"],
                "properties": {"name": {"type": "string"}}
            })
            .to_string(),
        )
        .expect(1)
        .create();
    let schema = json!({"$ref": format!("{}/person.json", mockito::server_url())});
    let compiled = Arc::new(Compiler::new().compile_value(&schema).unwrap());

    // The first validation triggers the single fetch
    assert!(compiled.validate(&json!({"name": "x"})).is_ok());

    // Concurrent validators observe the cached document
    let mut handles = Vec::new();
    for _ in 0..4 {
        let compiled = Arc::clone(&compiled);
        handles.push(thread::spawn(move || {
            assert!(compiled.validate(&json!({"name": "y"})).is_ok());
            assert!(compiled.validate(&json!({})).is_err());
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    endpoint.assert();
}

#[test]
fn remote_ref_with_pointer_fragment() {
    let _guard = serial();
    reset_remote_cache();
    let _endpoint = mock("GET", "/defs.json")
        .with_body(
            json!({
                "$defs": {
                    "port": {"type": "integer", "minimum": 1, "maximum": 65535}
                }
            })
            .to_string(),
        )
        .create();
    let schema = json!({
        "type": "object",
        "properties": {
            "port": {"$ref": format!("{}/defs.json#/$defs/port", mockito::server_url())}
        }
    });
    let compiled = Compiler::new().compile_value(&schema).unwrap();
    assert!(compiled.validate(&json!({"port": 8080})).is_ok());
    let errors = compiled.validate(&json!({"port": 0})).unwrap_err();
    assert_eq!(errors.iter().next().unwrap().instance_path.to_string(), "/port");
}

#[test]
fn unreachable_remote_is_a_fetch_error() {
    let _guard = serial();
    reset_remote_cache();
    let schema = json!({"$ref": "http://127.0.0.1:1/missing.json"});
    let compiled = Compiler::new().compile_value(&schema).unwrap();
    let errors = compiled.validate(&json!({})).unwrap_err();
    let rendered = errors.to_string();
    assert!(rendered.contains("missing.json"), "got: {}", rendered);
}

#[test]
fn registered_documents_short_circuit_the_network() {
    let _guard = serial();
    reset_remote_cache();
    let compiler = Compiler::new();
    compiler
        .compile_value(&json!({
            "$id": "https://registry.invalid/user.json",
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "integer"}}
        }))
        .unwrap();
    let schema = json!({"$ref": "https://registry.invalid/user.json"});
    let compiled = compiler.compile_value(&schema).unwrap();
    assert!(compiled.validate(&json!({"id": 1})).is_ok());
    assert!(compiled.validate(&json!({})).is_err());
}
