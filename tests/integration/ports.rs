//! Port symbols allocated through a shared registry

use anyhow::Result;
use std::collections::HashSet;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use crate::common::EVALUATOR;
use scaffold_resolver::config::ResolverSettings;
use scaffold_resolver::macros::{GeneratedSymbol, MacroKind, PortConfig, PortRegistry};
use scaffold_resolver::resolver::{ParameterInputs, TemplateResolver};

fn port_symbol(name: &str, low: u16, high: u16) -> GeneratedSymbol {
    GeneratedSymbol::new(
        name,
        MacroKind::Port(PortConfig {
            low: Some(low),
            high: Some(high),
            fallback: None,
        }),
    )
}

#[test]
fn test_ports_are_unique_across_concurrent_resolutions() -> Result<()> {
    let ports = Arc::new(PortRegistry::new());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let ports = Arc::clone(&ports);
            thread::spawn(move || {
                let resolver = TemplateResolver::new(&EVALUATOR, ports, ResolverSettings::default());
                let symbols = vec![
                    port_symbol(&format!("http{i}"), 30000, 39999),
                    port_symbol(&format!("https{i}"), 30000, 39999),
                ];
                resolver.resolve(&[], &ParameterInputs::new(), symbols)
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        let resolved = handle.join().expect("resolver thread panicked")?;
        for (_, value) in resolved.variables.iter() {
            let port = value.as_u64().unwrap();
            assert!((30000..=39999).contains(&port));
            assert!(seen.insert(port), "port {port} handed out twice");
        }
    }
    assert_eq!(seen.len(), 8);
    assert_eq!(ports.claimed().len(), 8);
    Ok(())
}

#[test]
fn test_port_in_use_falls_back() -> Result<()> {
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    let busy = listener.local_addr()?.port();

    let resolver = TemplateResolver::new(&EVALUATOR, Arc::new(PortRegistry::new()), ResolverSettings::default());
    let symbol = GeneratedSymbol::new(
        "debugPort",
        MacroKind::Port(PortConfig {
            low: Some(busy),
            high: Some(busy),
            fallback: Some(5005),
        }),
    );
    let resolved = resolver.resolve(&[], &ParameterInputs::new(), vec![symbol])?;
    assert_eq!(resolved.value("debugPort"), Some(&serde_json::json!(5005)));

    let err = resolver
        .resolve(&[], &ParameterInputs::new(), vec![port_symbol("debugPort", busy, busy)])
        .unwrap_err();
    assert!(err.is_template_authoring());
    Ok(())
}
