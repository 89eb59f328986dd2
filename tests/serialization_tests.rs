//! Integration tests for save/restore round trips.

use std::sync::Arc;

use templar::prelude::*;
use templar::registry::{SavedInstance, SavedValue};
use templar::{SerializationError, save, to_json};

fn setup() -> (TemplateRef, TemplateRegistry) {
    let a = TemplateBuilder::new("A")
        .param_with_default("x", ParamKind::Str, "default")
        .field("y")
        .build()
        .expect("template A should build");
    let mut registry = TemplateRegistry::new();
    registry.register(&a).expect("A should register");
    (a, registry)
}

#[test]
fn test_instantiation_round_trip_is_identity() {
    let (a, registry) = setup();
    let inst = a.instantiate(Args::positional(["b"])).unwrap();

    let json = to_json(&Value::Instantiation(Arc::clone(&inst))).unwrap();
    let restored = Restorer::new(&registry).restore_json(&json).unwrap();

    assert_eq!(restored, Value::Instantiation(Arc::clone(&inst)));
    assert!(Arc::ptr_eq(restored.as_instantiation().unwrap(), &inst));
}

#[test]
fn test_instance_round_trip() {
    let (a, registry) = setup();
    let obj = Value::from(
        a.instantiate(Args::positional(["b"]))
            .unwrap()
            .call(&[Value::from(5)])
            .unwrap(),
    );

    let restored = Restorer::new(&registry).restore(&save(&obj)).unwrap();
    assert_eq!(restored, obj);
    assert_eq!(parent(&restored), parent(&obj));
}

#[test]
fn test_template_reference_round_trip() {
    let (a, registry) = setup();
    let saved = save(&Value::Template(Arc::clone(&a)));
    let restored = Restorer::new(&registry).restore(&saved).unwrap();
    assert!(Arc::ptr_eq(restored.as_template().unwrap(), &a));
}

#[test]
fn test_nested_instantiation_parameters() {
    let (a, mut registry) = setup();
    let wrapper = TemplateBuilder::new("Wrapper")
        .param("inner", ParamKind::Instantiation)
        .build()
        .unwrap();
    registry.register(&wrapper).unwrap();

    let cache = InstantiationCache::new();
    let inner = a.instantiate_in(&cache, Args::positional(["deep"])).unwrap();
    let outer = wrapper
        .instantiate_in(&cache, Args::positional([Value::Instantiation(inner)]))
        .unwrap();

    let json = to_json(&Value::Instantiation(Arc::clone(&outer))).unwrap();
    let restored = Restorer::with_cache(&registry, &cache).restore_json(&json).unwrap();
    assert!(Arc::ptr_eq(restored.as_instantiation().unwrap(), &outer));
}

#[test]
fn test_saved_form_is_plain_data() {
    let (a, _) = setup();
    let obj = a
        .instantiate(Args::positional(["b"]))
        .unwrap()
        .call(&[Value::from(5)])
        .unwrap();

    let saved = SavedInstance::from(&obj);
    assert_eq!(saved.parent.template.name, "A");
    assert_eq!(saved.parent.params, vec![SavedValue::Str("b".into())]);
    assert_eq!(saved.fields.get("y"), Some(&SavedValue::Int(5)));
}

#[test]
fn test_unregistered_template_fails() {
    let (a, _) = setup();
    let inst = Value::Instantiation(a.instantiate(Args::new()).unwrap());
    let err = Restorer::new(&TemplateRegistry::new())
        .restore(&save(&inst))
        .unwrap_err();
    assert_eq!(
        err,
        TemplarError::Serialization(SerializationError::UnresolvedTemplate("A".into()))
    );
}
