//! Template manifests loaded from disk

use anyhow::Result;
use serde_json::json;

use crate::common::{TestTemplate, inputs, resolver};
use scaffold_resolver::config::{ResolverSettings, TemplateManifest, parse_config};
use scaffold_resolver::core::{ErrorClass, user_friendly_error};
use scaffold_resolver::parameters::EvaluatedPrecedence;

const WEB_TEMPLATE_JSON: &str = r#"{
  "parameters": [
    { "name": "name", "isRequired": true },
    { "name": "Framework", "defaultValue": "net8", "choices": ["net6", "net8"] },
    { "name": "UseHttps", "dataType": "bool", "isEnabled": "Framework != 'net6'" },
    { "name": "HttpsPort", "dataType": "int", "isEnabled": "UseHttps", "isRequired": "UseHttps == true" }
  ],
  "symbols": [
    { "name": "safeName", "generator": "processValueForm", "source": "name", "form": "safeName" },
    { "name": "lowerName", "generator": "casing", "source": "safeName" },
    { "name": "httpsLabel", "generator": "switch", "cases": [
        { "condition": "UseHttps", "value": "secure" },
        { "value": "plain" }
    ]},
    { "name": "isWeb", "generator": "regexMatch", "source": "name", "pattern": "(?i)web" },
    { "name": "projectId", "generator": "guid" }
  ]
}"#;

const WEB_TEMPLATE_TOML: &str = r#"
[[parameters]]
name = "name"
isRequired = true

[[parameters]]
name = "Framework"
defaultValue = "net8"

[[symbols]]
name = "kebab"
generator = "processValueForm"
source = "name"
form = "kebabCase"

[[symbols]]
name = "title"
generator = "join"
separator = " "
symbols = [
  { type = "ref", value = "kebab" },
  { type = "const", value = "for" },
  { type = "ref", value = "Framework" },
]
"#;

#[test]
fn test_load_json_manifest_and_resolve() -> Result<()> {
    scaffold_resolver::test_utils::init_test_logging(None);

    let template = TestTemplate::new()?;
    let path = template.write("template.json", WEB_TEMPLATE_JSON)?;
    let manifest = TemplateManifest::load(&path)?;
    assert_eq!(manifest.parameters.len(), 4);
    assert_eq!(manifest.symbols.len(), 5);

    let resolved = resolver().resolve_manifest(
        &manifest,
        &inputs(&[("name", json!("My Web.App")), ("UseHttps", json!(true)), ("HttpsPort", json!(7001))]),
    )?;

    assert_eq!(resolved.value("safeName"), Some(&json!("My_Web_App")));
    assert_eq!(resolved.value("lowerName"), Some(&json!("my_web_app")));
    assert_eq!(resolved.value("httpsLabel"), Some(&json!("secure")));
    assert_eq!(resolved.value("isWeb"), Some(&json!(true)));
    assert_eq!(resolved.value("projectId").and_then(|v| v.as_str()).map(str::len), Some(36));
    assert_eq!(
        resolved.parameter("HttpsPort").unwrap().evaluated_precedence,
        EvaluatedPrecedence::Required
    );

    let order = resolved.symbol_order();
    let position = |name: &str| order.iter().position(|n| *n == name).unwrap();
    assert!(position("safeName") < position("lowerName"));
    Ok(())
}

#[test]
fn test_json_manifest_with_disabled_branch() -> Result<()> {
    let manifest = TemplateManifest::from_json_str(WEB_TEMPLATE_JSON)?;
    let resolved = resolver().resolve_manifest(
        &manifest,
        &inputs(&[("name", json!("api")), ("Framework", json!("net6")), ("UseHttps", json!(true))]),
    )?;

    assert_eq!(resolved.disabled_parameters(), vec!["UseHttps", "HttpsPort"]);
    assert_eq!(resolved.value("httpsLabel"), Some(&json!("plain")));
    Ok(())
}

#[test]
fn test_load_toml_manifest() -> Result<()> {
    let template = TestTemplate::new()?;
    let path = template.write("template.toml", WEB_TEMPLATE_TOML)?;
    let manifest = TemplateManifest::load(&path)?;

    let resolved = resolver().resolve_manifest(&manifest, &inputs(&[("name", json!("MyService"))]))?;
    assert_eq!(resolved.value("title"), Some(&json!("my-service for net8")));
    assert_eq!(resolved.symbol_order(), vec!["kebab", "title"]);
    Ok(())
}

#[test]
fn test_missing_required_name() -> Result<()> {
    let manifest = TemplateManifest::from_toml_str(WEB_TEMPLATE_TOML)?;
    let err = resolver().resolve_manifest(&manifest, &inputs(&[])).unwrap_err();
    assert_eq!(err.class(), ErrorClass::InvalidInput);
    Ok(())
}

#[test]
fn test_invalid_manifest_reports_file() -> Result<()> {
    let template = TestTemplate::new()?;
    let path = template.write("broken.json", r#"{ "parameters": [ { "name": 5 } ] }"#)?;

    let err = TemplateManifest::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.json"));

    let context = user_friendly_error(err);
    assert_eq!(context.error.class(), ErrorClass::Configuration);
    Ok(())
}

#[test]
fn test_settings_file() -> Result<()> {
    let template = TestTemplate::new()?;
    let path = template.write(
        "resolver.toml",
        r#"
        strictConsistency = false
        portRangeLow = 20000
        portRangeHigh = 20100
        "#,
    )?;

    let settings: ResolverSettings = parse_config(&path)?;
    assert!(!settings.strict_consistency);
    assert_eq!(settings.port_range_low, 20000);
    assert_eq!(settings.port_range_high, 20100);
    assert_eq!(settings.port_attempts, ResolverSettings::default().port_attempts);
    Ok(())
}
