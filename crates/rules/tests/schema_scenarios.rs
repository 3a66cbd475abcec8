//! End-to-end validation of nested input through the schema builders.

use nebula_rules::prelude::*;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn catalog() -> PredicateCatalog {
    PredicateCatalog::builtin()
}

fn messages(schema: &Schema, input: Value) -> Value {
    schema.call(&input).messages().to_json()
}

// ============================================================================
// FORM PARAMS
// ============================================================================

#[rstest]
fn params_report_each_failed_key(catalog: PredicateCatalog) {
    let schema = Schema::params(&catalog, |s| {
        s.required("email", |v| v.filled()).required("age", |v| {
            v.filled_as(ValueType::Integer)
                .pred_with("gt?", vec![Arg::from(18)])
        })
    })
    .unwrap();

    assert_eq!(
        messages(&schema, json!({"email": "", "age": "18"})),
        json!({"email": ["must be filled"], "age": ["must be greater than 18"]})
    );
    assert_eq!(messages(&schema, json!({"email": "jane@doe.org", "age": "19"})), json!({}));
}

#[rstest]
fn params_keep_values_that_do_not_coerce(catalog: PredicateCatalog) {
    let schema = Schema::params(&catalog, |s| s.required("age", |v| v.filled_as(ValueType::Integer))).unwrap();

    let result = schema.call(&json!({"age": "eighteen"}));
    assert_eq!(result.output(), &json!({"age": "eighteen"}));
    assert_eq!(result.messages().to_json(), json!({"age": ["must be an integer"]}));

    let blank = schema.call(&json!({"age": ""}));
    assert_eq!(blank.output(), &json!({"age": null}));
    assert_eq!(blank.messages().to_json(), json!({"age": ["must be filled"]}));
}

// ============================================================================
// NESTED SCHEMAS
// ============================================================================

fn meta_schema(catalog: &PredicateCatalog) -> Schema {
    Schema::define(catalog, |s| {
        s.required("meta", |v| {
            v.schema(|s| {
                s.required("info", |v| {
                    v.schema(|s| {
                        s.required("details", |v| v.filled_as(ValueType::String))
                            .required("meta", |v| v.filled_as(ValueType::String))
                    })
                })
            })
        })
    })
    .unwrap()
}

#[rstest]
#[case::missing_root(json!({}), json!({"meta": ["is missing"]}))]
#[case::missing_leaves(
    json!({"meta": {"info": {}}}),
    json!({"meta": {"info": {"details": ["is missing"], "meta": ["is missing"]}}})
)]
#[case::missing_middle(json!({"meta": {}}), json!({"meta": {"info": ["is missing"]}}))]
#[case::wrong_parent_type(json!({"meta": "oops"}), json!({"meta": ["must be a hash"]}))]
#[case::wrong_middle_type(json!({"meta": {"info": []}}), json!({"meta": {"info": ["must be a hash"]}}))]
#[case::filled_leaf_types(
    json!({"meta": {"info": {"details": "", "meta": 1}}}),
    json!({"meta": {"info": {"details": ["must be filled"], "meta": ["must be a string"]}}})
)]
#[case::valid(json!({"meta": {"info": {"details": "x", "meta": "y"}}}), json!({}))]
fn nested_schema_reports(catalog: PredicateCatalog, #[case] input: Value, #[case] expected: Value) {
    assert_eq!(messages(&meta_schema(&catalog), input), expected);
}

#[rstest]
fn missing_parent_reports_once(catalog: PredicateCatalog) {
    let result = meta_schema(&catalog).call(&json!({}));
    assert_eq!(result.failures().len(), 1);
    assert_eq!(result.messages().flatten().len(), 1);
}

// ============================================================================
// SEQUENCES
// ============================================================================

fn data_schema(catalog: &PredicateCatalog) -> Schema {
    Schema::define(catalog, |s| {
        s.required("data", |v| {
            v.each(|e| {
                e.schema(|s| {
                    s.required("info", |v| v.schema(|s| s.required("name", |v| v.filled_as(ValueType::String))))
                })
            })
        })
    })
    .unwrap()
}

#[rstest]
#[case::element_missing_key(json!({"data": [{}]}), json!({"data": {"0": {"info": ["is missing"]}}}))]
#[case::second_element(
    json!({"data": [{"info": {"name": "a"}}, {"info": {"name": ""}}]}),
    json!({"data": {"1": {"info": {"name": ["must be filled"]}}}})
)]
#[case::element_wrong_type(json!({"data": ["x"]}), json!({"data": {"0": ["must be a hash"]}}))]
#[case::not_a_sequence(json!({"data": {"info": {}}}), json!({"data": ["must be an array"]}))]
#[case::empty_sequence(json!({"data": []}), json!({}))]
fn each_reports_by_index(catalog: PredicateCatalog, #[case] input: Value, #[case] expected: Value) {
    assert_eq!(messages(&data_schema(&catalog), input), expected);
}

#[rstest]
fn each_of_scalars(catalog: PredicateCatalog) {
    let schema = Schema::define(&catalog, |s| {
        s.required("tags", |v| v.value(ValueType::Array).each(|e| e.filled_as(ValueType::String)))
    })
    .unwrap();
    assert_eq!(
        messages(&schema, json!({"tags": ["a", "", 3]})),
        json!({"tags": {"1": ["must be filled"], "2": ["must be a string"]}})
    );
    assert_eq!(messages(&schema, json!({"tags": "a"})), json!({"tags": ["must be an array"]}));
}

// ============================================================================
// REUSED SCHEMAS
// ============================================================================

#[rstest]
fn reused_schema_validates_as_nested(catalog: PredicateCatalog) {
    let location = Schema::define(&catalog, |s| {
        s.required("lat", |v| v.filled_as(ValueType::Float))
            .required("lng", |v| v.filled_as(ValueType::Float))
    })
    .unwrap();
    let schema = Schema::define(&catalog, |s| s.required("location", |v| v.schema_from(&location))).unwrap();

    assert_eq!(
        messages(&schema, json!({"location": {"lat": null, "lng": "45.6"}})),
        json!({"location": {"lat": ["must be filled"], "lng": ["must be a float"]}})
    );
    assert_eq!(messages(&schema, json!({"location": {"lat": 1.5, "lng": 45.6}})), json!({}));

    // The reused schema is unaffected.
    assert_eq!(
        messages(&location, json!({"lat": 1.5})),
        json!({"lng": ["is missing"]})
    );
}

#[rstest]
fn reused_params_schema_carries_its_coercion(catalog: PredicateCatalog) {
    let location = Schema::params(&catalog, |s| s.required("lat", |v| v.filled_as(ValueType::Float))).unwrap();
    let schema = Schema::params(&catalog, |s| s.required("location", |v| v.schema_from(&location))).unwrap();

    let result = schema.call(&json!({"location": {"lat": "45.6"}}));
    assert!(result.is_success());
    assert_eq!(result.output(), &json!({"location": {"lat": 45.6}}));
}

// ============================================================================
// OPTIONAL KEYS AND LOGIC
// ============================================================================

#[rstest]
fn optional_keys_validate_only_when_present(catalog: PredicateCatalog) {
    let schema = Schema::define(&catalog, |s| {
        s.required("name", |v| v.filled())
            .optional("nickname", |v| v.filled_as(ValueType::String))
    })
    .unwrap();
    assert_eq!(messages(&schema, json!({"name": "Jane"})), json!({}));
    assert_eq!(
        messages(&schema, json!({"name": "Jane", "nickname": ""})),
        json!({"nickname": ["must be filled"]})
    );
}

#[rstest]
fn disjunction_joins_messages(catalog: PredicateCatalog) {
    let either = RuleNode::predicate(&catalog, "nil?", vec![])
        .unwrap()
        .or(RuleNode::predicate(&catalog, "int?", vec![]).unwrap());
    let schema = Schema::define(&catalog, |s| s.required("age", |v| v.rule(either))).unwrap();
    assert_eq!(
        messages(&schema, json!({"age": "x"})),
        json!({"age": ["cannot be defined or must be an integer"]})
    );
    assert!(schema.call(&json!({"age": null})).is_success());
}

#[rstest]
fn negated_predicates_use_the_not_namespace(catalog: PredicateCatalog) {
    let schema = Schema::define(&catalog, |s| s.required("note", |v| v.not("empty?"))).unwrap();
    assert_eq!(messages(&schema, json!({"note": ""})), json!({"note": ["cannot be empty"]}));
    assert!(schema.call(&json!({"note": "x"})).is_success());
}

#[rstest]
fn ranges_and_lists_interpolate(catalog: PredicateCatalog) {
    let schema = Schema::define(&catalog, |s| {
        s.required("code", |v| v.pred_with("size?", vec![Arg::range(2, 3)]))
            .required("role", |v| v.pred_with("included_in?", vec![Arg::list(["admin", "user"])]))
    })
    .unwrap();
    assert_eq!(
        messages(&schema, json!({"code": "abcd", "role": "root"})),
        json!({
            "code": ["length must be within 2 - 3"],
            "role": ["must be one of: admin, user"]
        })
    );
}

#[rstest]
fn custom_rules_are_named_by_the_applier(catalog: PredicateCatalog) {
    let adult = RuleNode::key(
        "age",
        RuleNode::predicate(&catalog, "gteq?", vec![Arg::from(18)]).unwrap(),
    );
    let schema = Schema::define(&catalog, |s| {
        s.required("age", |v| v.value(ValueType::Integer)).rule("adult", adult)
    })
    .unwrap();

    let result = schema.call(&json!({"age": 12}));
    assert!(result.has_error("adult"));
    assert_eq!(result.messages().to_json(), json!({"age": ["must be greater than or equal to 18"]}));
    assert!(schema.call(&json!({"age": 30})).is_success());
}

#[rstest]
fn rules_named_after_failed_keys_are_skipped(catalog: PredicateCatalog) {
    let rules = vec![
        NamedRule::new(
            "age",
            RuleNode::key("age", RuleNode::predicate(&catalog, "int?", vec![]).unwrap()),
        ),
        NamedRule::new(
            "adult",
            RuleNode::key("age", RuleNode::predicate(&catalog, "gteq?", vec![Arg::from(18)]).unwrap()),
        ),
    ];
    let applier = RuleApplier::new(rules).unwrap();

    let mut input = ValidationInput::new(json!({"age": "12"}));
    input = applier.apply(input);
    assert_eq!(input.failures().len(), 2);

    // A second pass keeps the recorded failures and runs nothing new.
    let again = applier.apply(input.clone());
    assert_eq!(again.failures(), input.failures());
}

#[rstest]
fn unknown_predicates_fail_at_build(catalog: PredicateCatalog) {
    let err = Schema::define(&catalog, |s| s.required("x", |v| v.pred("shiny?"))).unwrap_err();
    assert_eq!(err, SchemaError::unknown_predicate("shiny?"));
    assert_eq!(err.predicate(), Some("shiny?"));
}
