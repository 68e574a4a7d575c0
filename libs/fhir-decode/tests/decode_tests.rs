//! End-to-end decode behavior against a purpose-built registry

use lunte_decode::{Decoder, DecoderConfig, ErrorKind, Scalar};
use lunte_schema::{FieldDef, PrimitiveClass, RegistryBuilder, TypeDef, TypeRegistry};
use serde_json::json;
use std::sync::Arc;

/// Small schema with a recursive composite, a choice field, and repeated
/// primitives: enough surface for every decode rule.
fn registry() -> Arc<TypeRegistry> {
    let registry = RegistryBuilder::new()
        .define(TypeDef::primitive("string", PrimitiveClass::Text))
        .define(TypeDef::primitive("dateTime", PrimitiveClass::Text))
        .define(TypeDef::primitive("boolean", PrimitiveClass::Boolean))
        .define(TypeDef::primitive("integer", PrimitiveClass::Integer))
        .define(TypeDef::primitive("decimal", PrimitiveClass::Decimal))
        .define(TypeDef::complex(
            "Extension",
            vec![
                FieldDef::plain("url", "string"),
                FieldDef::choice("value", ["boolean", "integer", "string", "Period"]),
            ],
        ))
        .define(TypeDef::complex(
            "Element",
            vec![
                FieldDef::plain("id", "string"),
                FieldDef::repeated("extension", "Extension"),
            ],
        ))
        .define(
            TypeDef::complex(
                "Period",
                vec![
                    FieldDef::plain("start", "dateTime"),
                    FieldDef::plain("end", "dateTime"),
                ],
            )
            .with_base("Element"),
        )
        .define(
            TypeDef::complex(
                "Part",
                vec![
                    FieldDef::repeated("note", "string"),
                    FieldDef::plain("when", "Period"),
                    FieldDef::repeated("child", "Part"),
                ],
            )
            .with_base("Element"),
        )
        .define(
            TypeDef::resource(
                "Record",
                vec![
                    FieldDef::plain("id", "string"),
                    FieldDef::plain("active", "boolean"),
                    FieldDef::plain("amount", "decimal"),
                    FieldDef::choice("effective", ["dateTime", "Period"]),
                    FieldDef::repeated("part", "Part"),
                ],
            ),
        )
        .define(TypeDef::resource(
            "Marker",
            vec![FieldDef::plain("id", "string")],
        ))
        .build()
        .unwrap();
    Arc::new(registry)
}

fn strict_decoder() -> Decoder {
    Decoder::from_config(&DecoderConfig::defaults(), registry()).unwrap()
}

fn lenient_decoder() -> Decoder {
    Decoder::from_config(&DecoderConfig::lenient(), registry()).unwrap()
}

// ----------------------------------------------------------------------
// Strict vs lenient
// ----------------------------------------------------------------------

#[test]
fn recognized_fields_never_trip_strict_mode() {
    let doc = json!({
        "resourceType": "Record",
        "id": "r1",
        "active": true,
        "effectiveDateTime": "2020-06-01T00:00:00Z",
        "_effectiveDateTime": { "id": "e1" },
        "part": [ { "note": ["a"], "when": { "start": "2020-01-01" } } ]
    });

    let resource = strict_decoder().decode(&doc).unwrap();
    assert_eq!(resource.kind, "Record");
}

#[test]
fn unknown_key_rejected_in_strict_accepted_in_lenient() {
    let doc = json!({ "resourceType": "Record", "id": "r1", "bogus": 1 });

    let err = strict_decoder().decode(&doc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnrecognizedElement);
    assert!(err.message.contains("bogus"));
    assert_eq!(err.path, "Record.bogus");

    let resource = lenient_decoder().decode(&doc).unwrap();
    assert!(resource.body.field("bogus").is_none());
}

#[test]
fn unknown_key_in_nested_composite_names_full_path() {
    let doc = json!({
        "resourceType": "Record",
        "part": [ { "when": { "start": "2020-01-01", "middle": "2020-02-01" } } ]
    });

    let err = strict_decoder().decode(&doc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnrecognizedElement);
    assert_eq!(err.path, "Record.part[0].when.middle");
}

// ----------------------------------------------------------------------
// Choice fields
// ----------------------------------------------------------------------

#[test]
fn choice_with_both_candidates_is_ambiguous() {
    let doc = json!({
        "resourceType": "Record",
        "effectiveDateTime": "2020-06-01",
        "effectivePeriod": { "start": "2020-01-01" }
    });

    let err = strict_decoder().decode(&doc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::AmbiguousChoice);
    assert_eq!(err.path, "Record.effective");
}

#[test]
fn choice_with_neither_candidate_is_missing() {
    let doc = json!({ "resourceType": "Record", "id": "r1" });
    let resource = strict_decoder().decode(&doc).unwrap();
    assert!(resource.body.field("effective").is_none());
}

#[test]
fn choice_result_is_tagged_with_the_resolved_candidate() {
    let decoder = strict_decoder();

    let doc = json!({ "resourceType": "Record", "effectiveDateTime": "2020-06-01" });
    let resource = decoder.decode(&doc).unwrap();
    let effective = resource.body.field("effective").unwrap().as_primitive().unwrap();
    assert_eq!(effective.type_name, "dateTime");

    let doc = json!({ "resourceType": "Record", "effectivePeriod": { "start": "2020-01-01" } });
    let resource = decoder.decode(&doc).unwrap();
    let effective = resource.body.field("effective").unwrap().as_composite().unwrap();
    assert_eq!(effective.type_name, "Period");
}

#[test]
fn choice_value_and_carrier_of_different_candidates_is_inconsistent() {
    let doc = json!({
        "resourceType": "Record",
        "effectivePeriod": { "start": "2020-01-01" },
        "_effectiveDateTime": { "id": "x" }
    });

    let err = strict_decoder().decode(&doc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InconsistentChoice);
    assert_eq!(err.path, "Record.effective");
}

#[test]
fn choice_carrier_alone_carries_extension_only_primitive() {
    let doc = json!({
        "resourceType": "Record",
        "_effectiveDateTime": { "id": "only-ext" }
    });

    let resource = strict_decoder().decode(&doc).unwrap();
    let effective = resource.body.field("effective").unwrap().as_primitive().unwrap();
    assert_eq!(effective.type_name, "dateTime");
    assert!(effective.value.is_none());
    assert!(effective.element.is_some());
}

#[test]
fn carrier_key_for_a_composite_candidate_is_not_a_carrier() {
    let doc = json!({
        "resourceType": "Record",
        "_effectiveDateTime": { "id": "a" },
        "effectivePeriod": { "start": "2020-01-01" },
        "_effectivePeriod": { "id": "b" }
    });

    // _effectivePeriod is not a carrier key (Period is composite), so this
    // reads as value=Period, carrier=dateTime: inconsistent, not ambiguous.
    // Strict mode flags _effectivePeriod first as unrecognized.
    let err = strict_decoder().decode(&doc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnrecognizedElement);

    let err = lenient_decoder().decode(&doc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InconsistentChoice);
}

#[test]
fn two_primitive_extension_carriers_are_ambiguous() {
    let doc = json!({
        "url": "u",
        "_valueBoolean": { "id": "a" },
        "_valueString": { "id": "b" }
    });

    let err = strict_decoder().decode_as("Extension", &doc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::AmbiguousChoice);
    assert_eq!(err.path, "Extension.value");
}

// ----------------------------------------------------------------------
// Repeated primitives & sparse arrays
// ----------------------------------------------------------------------

#[test]
fn extension_data_attaches_to_the_correct_index() {
    let doc = json!({
        "resourceType": "Record",
        "part": [ {
            "note": ["a", null, "c"],
            "_note": [ null, { "id": "middle" }, null ]
        } ]
    });

    let resource = strict_decoder().decode(&doc).unwrap();
    let part = resource.body.field("part").unwrap().as_list().unwrap();
    let notes = part[0]
        .as_composite()
        .unwrap()
        .field("note")
        .unwrap()
        .as_list()
        .unwrap();
    assert_eq!(notes.len(), 3);

    let first = notes[0].as_primitive().unwrap();
    assert_eq!(first.value, Some(Scalar::Text("a".to_string())));
    assert!(first.element.is_none());

    let middle = notes[1].as_primitive().unwrap();
    assert!(middle.value.is_none());
    let id = middle.element.as_ref().unwrap().field("id").unwrap();
    assert_eq!(
        id.as_primitive().unwrap().value,
        Some(Scalar::Text("middle".to_string()))
    );

    let last = notes[2].as_primitive().unwrap();
    assert_eq!(last.value, Some(Scalar::Text("c".to_string())));
    assert!(last.element.is_none());
}

#[test]
fn carrier_array_without_value_array_is_the_sparse_case() {
    let doc = json!({
        "resourceType": "Record",
        "part": [ { "_note": [ { "id": "x" }, null ] } ]
    });

    let resource = strict_decoder().decode(&doc).unwrap();
    let part = resource.body.field("part").unwrap().as_list().unwrap();
    let notes = part[0]
        .as_composite()
        .unwrap()
        .field("note")
        .unwrap()
        .as_list()
        .unwrap();

    assert_eq!(notes.len(), 2);
    assert!(notes[0].as_primitive().unwrap().element.is_some());
    assert!(notes[1].as_primitive().unwrap().is_empty());
}

#[test]
fn carrier_array_longer_than_value_array_is_rejected() {
    let doc = json!({
        "resourceType": "Record",
        "part": [ {
            "note": ["a"],
            "_note": [ null, { "id": "x" } ]
        } ]
    });

    let err = strict_decoder().decode(&doc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(err.path, "Record.part[0].note");
}

#[test]
fn carrier_array_shorter_than_value_array_pads_with_empty_extensions() {
    let doc = json!({
        "resourceType": "Record",
        "part": [ {
            "note": ["a", "b", "c"],
            "_note": [ { "id": "first" } ]
        } ]
    });

    let resource = strict_decoder().decode(&doc).unwrap();
    let part = resource.body.field("part").unwrap().as_list().unwrap();
    let notes = part[0]
        .as_composite()
        .unwrap()
        .field("note")
        .unwrap()
        .as_list()
        .unwrap();

    assert_eq!(notes.len(), 3);
    assert!(notes[0].as_primitive().unwrap().element.is_some());
    assert!(notes[1].as_primitive().unwrap().element.is_none());
    assert!(notes[2].as_primitive().unwrap().element.is_none());
}

// ----------------------------------------------------------------------
// Null handling
// ----------------------------------------------------------------------

#[test]
fn null_scalar_outside_an_array_is_a_type_mismatch() {
    let doc = json!({ "resourceType": "Record", "id": null });
    let err = strict_decoder().decode(&doc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(err.path, "Record.id");
}

#[test]
fn null_composite_is_treated_as_absent() {
    let doc = json!({
        "resourceType": "Record",
        "part": [ { "when": null } ]
    });
    let resource = strict_decoder().decode(&doc).unwrap();
    let part = resource.body.field("part").unwrap().as_list().unwrap();
    assert!(part[0].as_composite().unwrap().field("when").is_none());
}

#[test]
fn null_inside_a_composite_array_is_a_type_mismatch() {
    let doc = json!({
        "resourceType": "Record",
        "part": [ { "note": ["a"] }, null ]
    });
    let err = strict_decoder().decode(&doc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(err.path, "Record.part[1]");
}

// ----------------------------------------------------------------------
// Numeric policy
// ----------------------------------------------------------------------

#[test]
fn fractional_number_does_not_truncate_into_integer() {
    let decoder = strict_decoder();

    let doc = json!({ "url": "u", "valueInteger": 3.5 });
    let err = decoder.decode_as("Extension", &doc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(err.path, "Extension.valueInteger");

    let doc = json!({ "url": "u", "valueInteger": 3 });
    let value = decoder.decode_as("Extension", &doc).unwrap();
    let ext = value.as_composite().unwrap();
    let bound = ext.field("value").unwrap().as_primitive().unwrap();
    assert_eq!(bound.value, Some(Scalar::Integer(3)));
}

#[test]
fn decimal_keeps_its_fraction() {
    let doc = json!({ "resourceType": "Record", "amount": 12.50 });
    let resource = strict_decoder().decode(&doc).unwrap();
    let amount = resource.body.field("amount").unwrap().as_primitive().unwrap();
    let Some(Scalar::Decimal(d)) = &amount.value else {
        panic!("expected a decimal scalar");
    };
    assert_eq!(d.to_string(), "12.5");
}

// ----------------------------------------------------------------------
// Dispatch
// ----------------------------------------------------------------------

#[test]
fn allow_list_narrows_dispatch() {
    let config = DecoderConfig::builder()
        .supported_resource_kinds(["Marker"])
        .build();
    let decoder = Decoder::from_config(&config, registry()).unwrap();

    let ok = decoder.decode(&json!({ "resourceType": "Marker", "id": "m" })).unwrap();
    assert_eq!(ok.kind, "Marker");

    let err = decoder.decode(&json!({ "resourceType": "Record" })).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnsupportedResourceKind);
    assert!(err.message.contains("Record"));
}

#[test]
fn missing_discriminator_is_reported() {
    let err = strict_decoder().decode(&json!({ "id": "x" })).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownResourceKind);
    assert_eq!(err.path, "resourceType");
}

#[test]
fn non_object_root_is_a_type_mismatch() {
    let err = strict_decoder().decode(&json!([1, 2])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(err.path, "$");
}

#[test]
fn batch_decoding_preserves_per_document_outcomes() {
    let docs = vec![
        json!({ "resourceType": "Marker", "id": "ok" }),
        json!({ "resourceType": "Nope" }),
    ];
    let results = strict_decoder().decode_batch(&docs);
    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap_err().kind, ErrorKind::UnknownResourceKind);
}

// ----------------------------------------------------------------------
// Recursion
// ----------------------------------------------------------------------

#[test]
fn recursive_composites_decode_within_the_depth_budget() {
    let doc = json!({
        "resourceType": "Record",
        "part": [ { "child": [ { "child": [ { "note": ["deep"] } ] } ] } ]
    });
    assert!(strict_decoder().decode(&doc).is_ok());
}

#[test]
fn nesting_beyond_the_budget_fails_with_depth_exceeded() {
    let config = DecoderConfig::builder().max_recursion_depth(5).build();
    let decoder = Decoder::from_config(&config, registry()).unwrap();

    let mut part = json!({ "note": ["leaf"] });
    for _ in 0..10 {
        part = json!({ "child": [part] });
    }
    let doc = json!({ "resourceType": "Record", "part": [part] });

    let err = decoder.decode(&doc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DepthExceeded);
}

// ----------------------------------------------------------------------
// Determinism & fail-fast
// ----------------------------------------------------------------------

#[test]
fn repeated_decodes_are_structurally_equal() {
    let doc = json!({
        "resourceType": "Record",
        "id": "r1",
        "active": false,
        "effectivePeriod": { "start": "2020-01-01", "end": "2021-01-01" },
        "part": [
            { "note": ["x", "y"], "_note": [ { "id": "nx" }, null ] },
            { "when": { "start": "2022-02-02" } }
        ]
    });

    let decoder = strict_decoder();
    assert_eq!(decoder.decode(&doc).unwrap(), decoder.decode(&doc).unwrap());
}

#[test]
fn first_structural_error_wins() {
    // both `active` and `amount` are invalid; the walker reads fields in
    // schema order, so `active` is reported
    let doc = json!({
        "resourceType": "Record",
        "active": "yes",
        "amount": "lots"
    });

    let err = strict_decoder().decode(&doc).unwrap_err();
    assert_eq!(err.path, "Record.active");
}

#[test]
fn strict_mode_checks_extension_carrier_bodies_too() {
    let doc = json!({
        "resourceType": "Record",
        "id": "r1",
        "_id": { "id": "inner", "unexpected": true }
    });

    let err = strict_decoder().decode(&doc).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnrecognizedElement);
    assert_eq!(err.path, "Record.id.unexpected");
}

#[test]
fn entry_point_decode_supports_plain_composites() {
    let doc = json!({ "start": "2020-01-01", "end": "2020-12-31" });
    let value = strict_decoder().decode_as("Period", &doc).unwrap();
    let period = value.as_composite().unwrap();
    assert_eq!(period.len(), 2);

    match strict_decoder().decode_as("NoSuchType", &doc) {
        Err(err) => assert_eq!(err.kind, ErrorKind::UnknownResourceKind),
        Ok(_) => panic!("unknown entry point must not decode"),
    }
}
