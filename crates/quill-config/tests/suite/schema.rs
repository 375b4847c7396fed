#[test]
fn schema_describes_every_section() {
    let schema = serde_json::to_value(quill_config::json_schema()).unwrap();

    let properties = schema["properties"].as_object().expect("top-level properties");
    let mut keys: Vec<_> = properties.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["logging".to_string(), "resolve".to_string()]);
    assert_eq!(schema["additionalProperties"], serde_json::json!(false));

    let resolve = &schema["definitions"]["ResolveOptions"];
    assert_eq!(resolve["additionalProperties"], serde_json::json!(false));
    for key in ["varargs", "default_params", "named_args_as_leading_map"] {
        assert_eq!(resolve["properties"][key]["type"], "boolean", "{key}");
    }
}
