//! Disablement cascades through the full resolver

use anyhow::Result;
use serde_json::json;

use crate::common::{inputs, resolver};
use scaffold_resolver::ErrorClass;
use scaffold_resolver::macros::{CoalesceConfig, GeneratedSymbol, MacroKind};
use scaffold_resolver::parameters::{DataSource, EvaluatedPrecedence, ParameterDefinition, PrecedenceRule};

fn chain() -> Vec<ParameterDefinition> {
    vec![
        ParameterDefinition::new("Framework", PrecedenceRule::optional()).with_default(json!("net8")),
        ParameterDefinition::new("UseAuth", PrecedenceRule::conditionally_disabled("Framework != 'net6'"))
            .with_data_type("bool"),
        ParameterDefinition::new("AuthProvider", PrecedenceRule::conditionally_disabled("UseAuth")),
        ParameterDefinition::new(
            "TenantId",
            PrecedenceRule::conditionally_disabled("AuthProvider == 'entra'").with_required_flag(true),
        ),
    ]
}

#[test]
fn test_enabled_chain_keeps_every_value() -> Result<()> {
    let resolved = resolver().resolve(
        &chain(),
        &inputs(&[
            ("UseAuth", json!(true)),
            ("AuthProvider", json!("entra")),
            ("TenantId", json!("contoso")),
        ]),
        vec![],
    )?;

    assert!(resolved.disabled_parameters().is_empty());
    assert_eq!(resolved.parameter("TenantId").unwrap().evaluated_precedence, EvaluatedPrecedence::Required);
    assert_eq!(resolved.parameter("Framework").unwrap().data_source, DataSource::Default);
    Ok(())
}

#[test]
fn test_disabling_the_root_withdraws_the_whole_chain() -> Result<()> {
    let resolved = resolver().resolve(
        &chain(),
        &inputs(&[
            ("Framework", json!("net6")),
            ("UseAuth", json!(true)),
            ("AuthProvider", json!("entra")),
            ("TenantId", json!("contoso")),
        ]),
        vec![],
    )?;

    assert_eq!(resolved.disabled_parameters(), vec!["UseAuth", "AuthProvider", "TenantId"]);
    for name in ["UseAuth", "AuthProvider", "TenantId"] {
        assert!(resolved.value(name).is_none(), "{name} should be withdrawn");
    }
    assert_eq!(resolved.value("Framework"), Some(&json!("net6")));
    Ok(())
}

#[test]
fn test_required_parameter_missing_only_when_enabled() {
    let err = resolver()
        .resolve(
            &chain(),
            &inputs(&[("UseAuth", json!(true)), ("AuthProvider", json!("entra"))]),
            vec![],
        )
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::InvalidInput);
    assert!(err.to_string().contains("TenantId"));

    let resolved = resolver()
        .resolve(
            &chain(),
            &inputs(&[("UseAuth", json!(false)), ("AuthProvider", json!("entra"))]),
            vec![],
        )
        .unwrap();
    assert_eq!(resolved.disabled_parameters(), vec!["AuthProvider", "TenantId"]);
}

#[test]
fn test_symbols_fall_back_when_source_is_disabled() -> Result<()> {
    let definitions = vec![
        ParameterDefinition::new("Custom", PrecedenceRule::optional()),
        ParameterDefinition::new("Name", PrecedenceRule::conditionally_disabled("Custom")),
        ParameterDefinition::new("DefaultName", PrecedenceRule::implicit()).with_default(json!("app")),
    ];
    let name = GeneratedSymbol::new(
        "effectiveName",
        MacroKind::Coalesce(CoalesceConfig {
            source_variable_name: "Name".into(),
            fallback_variable_name: "DefaultName".into(),
            default_value: None,
        }),
    );

    let resolved = resolver().resolve(
        &definitions,
        &inputs(&[("Custom", json!(false)), ("Name", json!("mine"))]),
        vec![name.clone()],
    )?;
    assert_eq!(resolved.value("effectiveName"), Some(&json!("app")));

    let resolved = resolver().resolve(
        &definitions,
        &inputs(&[("Custom", json!(true)), ("Name", json!("mine"))]),
        vec![name],
    )?;
    assert_eq!(resolved.value("effectiveName"), Some(&json!("mine")));
    Ok(())
}

#[test]
fn test_resolution_is_idempotent() -> Result<()> {
    let supplied = inputs(&[("Framework", json!("net6")), ("AuthProvider", json!("entra"))]);
    let first = resolver().resolve(&chain(), &supplied, vec![])?;
    let second = resolver().resolve(&chain(), &supplied, vec![])?;
    assert_eq!(first, second);
    Ok(())
}
