//! Reference scenarios for parameter conditions and generated symbols

use anyhow::Result;
use serde_json::json;

use crate::common::{inputs, resolver};
use scaffold_resolver::ResolverError;
use scaffold_resolver::macros::{
    EvaluateConfig, GeneratedSymbol, JoinConfig, JoinSymbol, MacroKind, RegexConfig, RegexStep,
};
use scaffold_resolver::parameters::{EvaluatedPrecedence, ParameterDefinition, PrecedenceRule};
use scaffold_resolver::resolver::ParameterInputs;

/// B is disabled because its condition does not hold for A's value.
#[test]
fn test_condition_disables_parameter() -> Result<()> {
    scaffold_resolver::test_utils::init_test_logging(None);

    let definitions = vec![
        ParameterDefinition::new("A", PrecedenceRule::optional()),
        ParameterDefinition::new("B", PrecedenceRule::conditionally_disabled("A == 'x'")),
    ];
    let resolved =
        resolver().resolve(&definitions, &inputs(&[("A", json!("y")), ("B", json!("b"))]), vec![])?;

    let b = resolved.parameter("B").unwrap();
    assert_eq!(b.evaluated_precedence, EvaluatedPrecedence::Disabled);
    assert!(resolved.value("B").is_none());
    assert_eq!(resolved.value("A"), Some(&json!("y")));
    Ok(())
}

/// B's requirement condition is evaluated after A has been withdrawn.
#[test]
fn test_requirement_uses_post_cascade_values() -> Result<()> {
    let definitions = vec![
        ParameterDefinition::new("Flag", PrecedenceRule::optional()),
        ParameterDefinition::new("A", PrecedenceRule::conditionally_disabled("Flag")),
        ParameterDefinition::new("B", PrecedenceRule::conditionally_required("A == 'present'")),
    ];
    let resolved = resolver().resolve(
        &definitions,
        &inputs(&[("Flag", json!(false)), ("A", json!("present"))]),
        vec![],
    )?;

    assert_eq!(resolved.parameter("A").unwrap().evaluated_precedence, EvaluatedPrecedence::Disabled);
    // With A visible, B would be required and missing.
    assert_eq!(resolved.parameter("B").unwrap().evaluated_precedence, EvaluatedPrecedence::Optional);
    Ok(())
}

/// S1 joins S2, which must therefore be computed first.
#[test]
fn test_symbols_evaluate_in_dependency_order() -> Result<()> {
    let s1 = GeneratedSymbol::new(
        "S1",
        MacroKind::Join(JoinConfig {
            symbols: vec![JoinSymbol::constant("-"), JoinSymbol::reference("S2")],
            separator: String::new(),
            remove_empty_values: false,
        }),
    );
    let s2 = GeneratedSymbol::new(
        "S2",
        MacroKind::Regex(RegexConfig {
            source: "P".into(),
            steps: vec![RegexStep {
                regex: "\\s+".into(),
                replacement: "_".into(),
            }],
        }),
    );
    let definitions = vec![ParameterDefinition::new("P", PrecedenceRule::optional())];
    let resolved = resolver().resolve(&definitions, &inputs(&[("P", json!("my app"))]), vec![s1, s2])?;

    assert_eq!(resolved.symbol_order(), vec!["S2", "S1"]);
    assert_eq!(resolved.value("S2"), Some(&json!("my_app")));
    assert_eq!(resolved.value("S1"), Some(&json!("-my_app")));
    Ok(())
}

/// Two symbols whose conditions read each other cannot be ordered.
#[test]
fn test_symbol_cycle_is_an_authoring_error() {
    let evaluate = |name: &str, other: &str| {
        GeneratedSymbol::new(
            name,
            MacroKind::Evaluate(EvaluateConfig {
                condition: format!("{other} == 'on'"),
            }),
        )
    };
    let err = resolver()
        .resolve(&[], &ParameterInputs::new(), vec![evaluate("M1", "M2"), evaluate("M2", "M1")])
        .unwrap_err();

    assert!(err.is_template_authoring());
    let ResolverError::SymbolCircle {
        mut names,
    } = err
    else {
        panic!("expected a symbol circle");
    };
    names.sort();
    assert_eq!(names, vec!["M1", "M2"]);
}

/// Unconditional rules map to the same precedence whatever other values are.
#[test]
fn test_unconditional_precedence_ignores_other_values() -> Result<()> {
    let definitions = vec![
        ParameterDefinition::new("Req", PrecedenceRule::required()),
        ParameterDefinition::new("Opt", PrecedenceRule::optional()),
        ParameterDefinition::new("Imp", PrecedenceRule::implicit()),
        ParameterDefinition::new("Off", PrecedenceRule::disabled()),
    ];
    for other in [json!("a"), json!(false), json!(null)] {
        let resolved =
            resolver().resolve(&definitions, &inputs(&[("Req", json!("v")), ("Opt", other)]), vec![])?;
        let precedences: Vec<_> =
            resolved.parameters.iter().map(|p| p.evaluated_precedence).collect();
        assert_eq!(
            precedences,
            vec![
                EvaluatedPrecedence::Required,
                EvaluatedPrecedence::Optional,
                EvaluatedPrecedence::Implicit,
                EvaluatedPrecedence::Disabled,
            ]
        );
    }
    Ok(())
}
