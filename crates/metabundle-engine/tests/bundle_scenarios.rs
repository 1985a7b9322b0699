//! End-to-end bundling scenarios

use std::collections::HashSet;
use std::fs;

use metabundle_engine::{
    create_bundle_index, DirectoryHost, FlatModuleOptions, MemoryHost, MetadataBundle,
    MetadataBundler, ModuleMetadata, PrivateMetadata,
};
use serde_json::{json, Value};
use tempfile::TempDir;

fn host(modules: &[(&str, Value)]) -> MemoryHost {
    let mut host = MemoryHost::new();
    for (name, value) in modules {
        let metadata: ModuleMetadata = serde_json::from_value(value.clone()).unwrap();
        host.insert(*name, metadata);
    }
    host
}

fn bundle(host: &MemoryHost) -> MetadataBundle {
    MetadataBundler::new("index", "lib", host)
        .get_metadata_bundle()
        .unwrap()
}

fn entries(bundle: &MetadataBundle) -> Value {
    serde_json::to_value(&bundle.metadata).unwrap()["metadata"].clone()
}

#[test]
fn test_reexported_class() {
    let host = host(&[
        (
            "./index",
            json!({ "version": 3, "metadata": {}, "exports": [{ "from": "./a", "export": ["Foo"] }] }),
        ),
        (
            "./a",
            json!({ "version": 3, "metadata": { "Foo": { "__symbolic": "class" } } }),
        ),
    ]);

    let bundle = bundle(&host);

    assert_eq!(entries(&bundle), json!({ "Foo": { "__symbolic": "class" } }));
    assert!(bundle.privates.is_empty());
}

#[test]
fn test_private_dependency_is_hoisted() {
    let host = host(&[
        (
            "./index",
            json!({ "version": 3, "metadata": {}, "exports": [{ "from": "./b", "export": ["Widget"] }] }),
        ),
        (
            "./a",
            json!({ "version": 3, "metadata": { "Helper": { "__symbolic": "class" } } }),
        ),
        (
            "./b",
            json!({
                "version": 3,
                "metadata": {
                    "Widget": {
                        "__symbolic": "class",
                        "members": {
                            "__ctor__": [{
                                "__symbolic": "constructor",
                                "parameters": [{ "__symbolic": "reference", "module": "./a", "name": "Helper" }]
                            }]
                        }
                    }
                }
            }),
        ),
    ]);

    let bundle = bundle(&host);

    assert_eq!(
        entries(&bundle),
        json!({
            "Widget": {
                "__symbolic": "class",
                "members": {
                    "__ctor__": [{
                        "__symbolic": "constructor",
                        "parameters": [{ "__symbolic": "reference", "name": "\u{0275}a" }]
                    }]
                }
            },
            "\u{0275}a": { "__symbolic": "class" }
        })
    );
    assert_eq!(
        bundle.privates,
        vec![PrivateMetadata {
            private_name: "\u{0275}a".to_string(),
            name: "Helper".to_string(),
            module: "./a".to_string(),
        }]
    );
    assert_eq!(
        serde_json::to_value(&bundle.privates).unwrap(),
        json!([{ "privateName": "\u{0275}a", "name": "Helper", "module": "./a" }])
    );
}

#[test]
fn test_module_reference_becomes_error_node() {
    let host = host(&[
        (
            "./index",
            json!({
                "version": 3,
                "metadata": {
                    "ROUTES": { "__symbolic": "reference", "module": "./routes" }
                }
            }),
        ),
        ("./routes", json!({ "version": 3, "metadata": { "home": "/" } })),
    ]);

    let bundle = bundle(&host);

    assert_eq!(
        entries(&bundle)["ROUTES"],
        json!({
            "__symbolic": "error",
            "message": "Unsupported bundled module reference",
            "context": { "module": "./routes" },
            "module": "./index"
        })
    );
}

#[test]
fn test_relative_default_import_becomes_error_node() {
    let host = host(&[(
        "./index",
        json!({
            "version": 3,
            "metadata": {
                "config": { "__symbolic": "reference", "module": "./config", "default": true }
            }
        }),
    )]);

    let bundle = bundle(&host);

    assert_eq!(
        entries(&bundle)["config"]["message"],
        json!("Unsupported bundled default import reference")
    );
}

#[test]
fn test_single_module_round_trip() {
    let metadata = json!({
        "TOKEN": { "__symbolic": "new", "expression": { "__symbolic": "reference", "module": "@angular/core", "name": "InjectionToken" }, "arguments": ["token"] },
        "Service": {
            "__symbolic": "class",
            "decorators": [{
                "__symbolic": "call",
                "expression": { "__symbolic": "reference", "module": "@angular/core", "name": "Injectable" }
            }],
            "members": {
                "__ctor__": [{
                    "__symbolic": "constructor",
                    "parameterDecorators": [[{
                        "__symbolic": "call",
                        "expression": { "__symbolic": "reference", "module": "@angular/core", "name": "Inject" },
                        "arguments": [{ "__symbolic": "reference", "name": "TOKEN" }]
                    }]],
                    "parameters": [{ "__symbolic": "reference", "name": "string" }]
                }],
                "ngOnInit": [{ "__symbolic": "method" }],
                "value": [{ "__symbolic": "property" }]
            },
            "statics": { "VERSION": "1.0.0" }
        },
        "create": {
            "__symbolic": "function",
            "parameters": ["value"],
            "value": {
                "__symbolic": "if",
                "condition": { "__symbolic": "reference", "name": "value" },
                "thenExpression": { "__symbolic": "binary", "operator": "+", "left": 1, "right": 2 },
                "elseExpression": { "__symbolic": "select", "expression": { "__symbolic": "reference", "name": "Math" }, "member": "PI" }
            }
        },
        "LIMITS": [1, 2.5, { "max": null, "strict": true }]
    });
    let host = host(&[("./index", json!({ "version": 3, "metadata": metadata }))]);

    let bundle = bundle(&host);

    assert_eq!(entries(&bundle), metadata);
    assert!(bundle.privates.is_empty());
}

#[test]
fn test_diamond_aliases_share_identity() {
    let host = host(&[
        (
            "./index",
            json!({
                "version": 3,
                "metadata": {
                    "Widget": {
                        "__symbolic": "class",
                        "decorators": [
                            { "__symbolic": "reference", "module": "./b", "name": "Foo" },
                            { "__symbolic": "reference", "module": "./c", "name": "Foo" }
                        ]
                    }
                },
                "exports": [{ "from": "./b" }]
            }),
        ),
        (
            "./a",
            json!({ "version": 3, "metadata": { "Foo": { "__symbolic": "class", "arity": 1 } } }),
        ),
        ("./b", json!({ "version": 3, "exports": [{ "from": "./a" }] })),
        ("./c", json!({ "version": 3, "exports": [{ "from": "./a", "export": ["Foo"] }] })),
    ]);

    let bundle = bundle(&host);

    let foo = json!({ "__symbolic": "reference", "name": "Foo" });
    assert_eq!(
        entries(&bundle),
        json!({
            "Widget": { "__symbolic": "class", "decorators": [foo, foo] },
            "Foo": { "__symbolic": "class", "arity": 1 }
        })
    );
    assert!(bundle.privates.is_empty());
}

#[test]
fn test_diamond_aliases_share_identity_when_internal_alias_comes_first() {
    let host = host(&[
        (
            "./index",
            json!({
                "version": 3,
                "metadata": {
                    "Widget": {
                        "__symbolic": "class",
                        "decorators": [
                            { "__symbolic": "reference", "module": "./c", "name": "Foo" },
                            { "__symbolic": "reference", "module": "./b", "name": "Foo" }
                        ]
                    }
                },
                "exports": [{ "from": "./c", "export": ["Other"] }, { "from": "./b" }]
            }),
        ),
        (
            "./a",
            json!({ "version": 3, "metadata": { "Foo": { "__symbolic": "class", "arity": 1 } } }),
        ),
        ("./b", json!({ "version": 3, "exports": [{ "from": "./a" }] })),
        (
            "./c",
            json!({
                "version": 3,
                "metadata": { "Other": 1 },
                "exports": [{ "from": "./a", "export": ["Foo"] }]
            }),
        ),
    ]);

    let bundle = bundle(&host);

    let foo = json!({ "__symbolic": "reference", "name": "Foo" });
    assert_eq!(
        entries(&bundle),
        json!({
            "Widget": { "__symbolic": "class", "decorators": [foo, foo] },
            "Other": 1,
            "Foo": { "__symbolic": "class", "arity": 1 }
        })
    );
    assert!(bundle.privates.is_empty());
}

#[test]
fn test_named_reexport_outside_root_uses_public_name() {
    let host = host(&[
        (
            "./index",
            json!({
                "version": 3,
                "metadata": {
                    "Widget": {
                        "__symbolic": "class",
                        "decorators": [{ "__symbolic": "reference", "module": "./c", "name": "Foo" }]
                    }
                },
                "exports": [{ "from": "./a", "export": ["Foo"] }]
            }),
        ),
        (
            "./a",
            json!({ "version": 3, "metadata": { "Foo": { "__symbolic": "class", "arity": 1 } } }),
        ),
        ("./c", json!({ "version": 3, "exports": [{ "from": "./a", "export": ["Foo"] }] })),
    ]);

    let bundle = bundle(&host);

    assert_eq!(
        entries(&bundle),
        json!({
            "Widget": {
                "__symbolic": "class",
                "decorators": [{ "__symbolic": "reference", "name": "Foo" }]
            },
            "Foo": { "__symbolic": "class", "arity": 1 }
        })
    );
    assert!(bundle.privates.is_empty());
}

#[test]
fn test_root_export_stays_public_behind_internal_alias() {
    let host = host(&[
        (
            "./index",
            json!({
                "version": 3,
                "metadata": {
                    "Widget": {
                        "__symbolic": "class",
                        "decorators": [{ "__symbolic": "reference", "module": "./a", "name": "Foo" }]
                    }
                },
                "exports": [
                    { "from": "./internal", "export": ["Other"] },
                    { "from": "./a", "export": ["Foo"] }
                ]
            }),
        ),
        (
            "./a",
            json!({ "version": 3, "metadata": { "Foo": { "__symbolic": "class", "arity": 1 } } }),
        ),
        (
            "./internal",
            json!({
                "version": 3,
                "metadata": { "Other": 1 },
                "exports": [{ "from": "./a", "export": ["Foo"] }]
            }),
        ),
    ]);

    let bundle = bundle(&host);

    assert_eq!(
        entries(&bundle),
        json!({
            "Widget": {
                "__symbolic": "class",
                "decorators": [{ "__symbolic": "reference", "name": "Foo" }]
            },
            "Other": 1,
            "Foo": { "__symbolic": "class", "arity": 1 }
        })
    );
    assert!(bundle.privates.is_empty());
}

#[test]
fn test_private_names_avoid_exported_names() {
    let host = host(&[
        (
            "./index",
            json!({
                "version": 3,
                "metadata": {
                    "\u{0275}a": { "__symbolic": "reference", "module": "./a", "name": "First" },
                    "Main": {
                        "__symbolic": "call",
                        "expression": { "__symbolic": "reference", "module": "./a", "name": "Second" },
                        "arguments": [{ "__symbolic": "reference", "module": "./a", "name": "Third" }]
                    }
                }
            }),
        ),
        (
            "./a",
            json!({ "version": 3, "metadata": { "First": 1, "Second": 2, "Third": 3 } }),
        ),
    ]);

    let bundle = bundle(&host);

    let names: Vec<&str> = bundle
        .privates
        .iter()
        .map(|entry| entry.private_name.as_str())
        .collect();
    assert_eq!(names, vec!["\u{0275}b", "\u{0275}c"]);

    let unique: HashSet<&str> = names.iter().copied().collect();
    assert_eq!(unique.len(), names.len());
    assert_eq!(entries(&bundle)["\u{0275}a"], json!(1));
    assert_eq!(entries(&bundle)["\u{0275}b"], json!(2));
    assert_eq!(entries(&bundle)["\u{0275}c"], json!(3));
}

#[test]
fn test_each_public_name_exported_once() {
    let host = host(&[
        (
            "./index",
            json!({
                "version": 3,
                "metadata": { "Local": 0 },
                "exports": [
                    { "from": "./a" },
                    { "from": "./b", "export": ["A", { "name": "B", "as": "Renamed" }] },
                    { "from": "./b" }
                ]
            }),
        ),
        ("./a", json!({ "version": 3, "metadata": { "A": 1 } })),
        ("./b", json!({ "version": 3, "metadata": { "A": 10, "B": 2 } })),
    ]);

    let bundle = bundle(&host);

    let keys: Vec<&String> = bundle.metadata.metadata.keys().collect();
    assert_eq!(keys, vec!["Local", "A", "Renamed", "B"]);
    assert_eq!(entries(&bundle)["A"], json!(1));
    assert_eq!(entries(&bundle)["Renamed"], json!(2));
    assert_eq!(entries(&bundle)["B"], json!(2));
}

#[test]
fn test_external_reexport_references_original_module() {
    let host = host(&[
        (
            "./index",
            json!({
                "version": 3,
                "metadata": {
                    "Widget": {
                        "__symbolic": "class",
                        "extends": { "__symbolic": "reference", "module": "./base", "name": "Base" }
                    }
                }
            }),
        ),
        (
            "./base",
            json!({
                "version": 3,
                "metadata": {
                    "Base": { "__symbolic": "reference", "module": "@angular/core", "name": "Directive" }
                }
            }),
        ),
    ]);

    let bundle = bundle(&host);

    assert_eq!(
        entries(&bundle)["Widget"]["extends"],
        json!({ "__symbolic": "reference", "module": "@angular/core", "name": "Directive" })
    );
    assert!(bundle.privates.is_empty());
}

#[test]
fn test_bundle_index_from_directory() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    fs::create_dir_all(src.join("lib")).unwrap();
    fs::write(
        src.join("public_api.metadata.json"),
        json!({
            "__symbolic": "module",
            "version": 3,
            "metadata": {},
            "exports": [{ "from": "./lib/widget" }]
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        src.join("lib/widget.metadata.json"),
        json!({
            "__symbolic": "module",
            "version": 3,
            "metadata": {
                "Widget": {
                    "__symbolic": "class",
                    "decorators": [{ "__symbolic": "reference", "module": "./util", "name": "helper" }]
                }
            }
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        src.join("lib/util.metadata.json"),
        json!({
            "__symbolic": "module",
            "version": 3,
            "metadata": { "helper": { "__symbolic": "function", "parameters": [], "value": true } }
        })
        .to_string(),
    )
    .unwrap();

    let options = FlatModuleOptions {
        flat_module_out_file: "index.js".to_string(),
        flat_module_id: "@scope/widgets".to_string(),
    };
    let host = DirectoryHost::new(temp_dir.path());
    let index = create_bundle_index(&options, &["src/public_api.ts".to_string()], &host).unwrap();

    assert_eq!(index.index_name, "src/index.ts");
    assert_eq!(index.metadata_name, "src/index.metadata.json");
    assert_eq!(index.library_index, "./public_api");
    assert_eq!(
        index.bundle.privates,
        vec![PrivateMetadata {
            private_name: "\u{0275}a".to_string(),
            name: "helper".to_string(),
            module: "./lib/util".to_string(),
        }]
    );
    assert!(index
        .index_source
        .ends_with("export {helper as \u{0275}a} from './lib/util';"));
    assert_eq!(
        entries(&index.bundle)["Widget"]["decorators"],
        json!([{ "__symbolic": "reference", "name": "\u{0275}a" }])
    );
}
