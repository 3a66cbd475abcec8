//! Validating form parameters
//!
//! Run with `cargo run -p nebula-rules --example form`.

use std::sync::Arc;

use nebula_rules::prelude::*;
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = PredicateCatalog::builtin();

    let address = Schema::define(&catalog, |s| {
        s.required("street", |v| v.filled_as(ValueType::String))
            .required("city", |v| v.filled_as(ValueType::String))
            .optional("zip", |v| v.value(ValueType::Integer))
    })?;

    let user = Schema::params(&catalog, |s| {
        s.required("email", |v| v.filled())
            .required("age", |v| {
                v.filled_as(ValueType::Integer)
                    .pred_with("gt?", vec![Arg::from(18)])
            })
            .optional("address", |v| v.schema_from(&address))
            .optional("roles", |v| {
                v.each(|e| e.pred_with("included_in?", vec![Arg::list(["admin", "editor", "viewer"])]))
            })
    })?;

    let input = json!({
        "email": "",
        "age": "18",
        "address": {"street": "Main St 1", "city": ""},
        "roles": ["admin", "root"]
    });

    let result = user.call(&input);
    println!("coerced input: {}", result.output());
    println!("errors:\n{}", result.messages());

    let polish = TemplateTree::from_yaml_str(
        r#"
pl:
  errors:
    filled?: "musi być wypełnione"
    gt?: "musi być większe niż %{num}"
"#,
    )?;
    let compiler = MessageCompiler::new(Arc::new(StaticMessages::builtin().merge(polish)))
        .with_locale("pl")
        .with_full_messages();
    println!("errors (pl):\n{}", serde_json::to_string_pretty(&result.messages_with(&compiler))?);

    Ok(())
}
