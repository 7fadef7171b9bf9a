//! Computation of generated symbol values.

use chrono::{Local, Utc};
use rand::Rng;
use regex::Regex;
use serde_json::{Number, Value};
use std::fmt::Write as _;
use std::sync::Arc;
use uuid::Uuid;

use super::forms::apply_form;
use super::port::PortRegistry;
use super::{
    CasingConfig, CoalesceConfig, GeneratedSymbol, GuidConfig, JoinConfig, JoinSymbolKind,
    MacroKind, NowConfig, PortConfig, RandomConfig, RegexConfig, SwitchConfig,
};
use crate::config::ResolverSettings;
use crate::core::{ResolverError, Result};
use crate::expression::{ConditionAdapter, ExpressionEvaluator, VariableMap};

/// Evaluates generated symbols against a variable snapshot.
pub struct MacroEvaluator<'a> {
    adapter: ConditionAdapter<'a>,
    ports: Arc<PortRegistry>,
    settings: ResolverSettings,
}

impl<'a> MacroEvaluator<'a> {
    pub fn new(
        evaluator: &'a dyn ExpressionEvaluator,
        ports: Arc<PortRegistry>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            adapter: ConditionAdapter::new(evaluator),
            ports,
            settings,
        }
    }

    /// Evaluate `ordered` in sequence, adding each value to `variables`
    /// before the next symbol runs.
    ///
    /// # Errors
    ///
    /// Stops at the first symbol that fails with
    /// [`ResolverError::MacroEvaluation`].
    pub fn evaluate_all(&self, ordered: &[GeneratedSymbol], variables: &mut VariableMap) -> Result<()> {
        for symbol in ordered {
            let value = self.evaluate(symbol, variables)?;
            tracing::trace!("Symbol '{}' = {}", symbol.name, value);
            variables.insert(symbol.name.clone(), value);
        }
        Ok(())
    }

    /// Compute one symbol's value and coerce it to the declared data type.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::MacroEvaluation`] for invalid configuration
    /// (bad regex, unknown form or format, empty random range), failed
    /// conditions, and ports that could not be allocated.
    pub fn evaluate(&self, symbol: &GeneratedSymbol, variables: &VariableMap) -> Result<Value> {
        let fail = |reason: String| ResolverError::MacroEvaluation {
            symbol: symbol.name.clone(),
            reason,
        };

        let value = match &symbol.kind {
            MacroKind::Constant(config) => config.value.clone(),
            MacroKind::Switch(config) => self.switch(config, variables).map_err(fail)?,
            MacroKind::Coalesce(config) => coalesce(config, variables),
            MacroKind::Casing(config) => casing(config, variables),
            MacroKind::Join(config) => join(config, variables),
            MacroKind::Regex(config) => regex_replace(config, variables).map_err(fail)?,
            MacroKind::RegexMatch(config) => {
                let regex = compile(&config.pattern).map_err(fail)?;
                let source = variables.get_string(&config.source).unwrap_or_default();
                Value::Bool(regex.is_match(&source))
            }
            MacroKind::Guid(config) => guid(config).map_err(fail)?,
            MacroKind::Now(config) => now(config).map_err(fail)?,
            MacroKind::Random(config) => random(config).map_err(fail)?,
            MacroKind::Port(config) => self.port(&symbol.name, config).map_err(fail)?,
            MacroKind::ProcessValueForm(config) => {
                let source = variables.get_string(&config.source).unwrap_or_default();
                let output = apply_form(&config.form, &source)
                    .ok_or_else(|| fail(format!("unknown value form '{}'", config.form)))?;
                Value::String(output)
            }
            MacroKind::Evaluate(config) => {
                let outcome = self
                    .adapter
                    .evaluate_condition(&config.condition, variables)
                    .map_err(|e| fail(e.message))?;
                Value::Bool(outcome.result)
            }
        };

        match symbol.data_type.as_deref() {
            Some(data_type) => coerce(value, data_type).map_err(fail),
            None => Ok(value),
        }
    }

    fn switch(&self, config: &SwitchConfig, variables: &VariableMap) -> std::result::Result<Value, String> {
        for case in &config.cases {
            let matched = match case.condition.as_deref().map(str::trim) {
                None | Some("") => true,
                Some(condition) => {
                    self.adapter
                        .evaluate_condition(condition, variables)
                        .map_err(|e| format!("case '{condition}': {}", e.message))?
                        .result
                }
            };
            if matched {
                return Ok(case.value.clone());
            }
        }
        Ok(Value::Null)
    }

    fn port(&self, name: &str, config: &PortConfig) -> std::result::Result<Value, String> {
        let low = config.low.unwrap_or(self.settings.port_range_low);
        let high = config.high.unwrap_or(self.settings.port_range_high);
        if let Some(port) = self.ports.allocate(low, high, self.settings.port_attempts) {
            return Ok(Value::from(port));
        }
        match config.fallback {
            Some(fallback) => {
                tracing::warn!(
                    "No free port in {}-{} for symbol '{}', using fallback {}",
                    low,
                    high,
                    name,
                    fallback
                );
                Ok(Value::from(fallback))
            }
            None => Err(format!("no free port in {low}-{high} and no fallback configured")),
        }
    }
}

fn coalesce(config: &CoalesceConfig, variables: &VariableMap) -> Value {
    let usable = variables.get(&config.source_variable_name).filter(|value| {
        !value.is_null()
            && value.as_str() != Some("")
            && config.default_value.as_ref() != Some(*value)
    });
    match usable {
        Some(value) => value.clone(),
        None => variables.get(&config.fallback_variable_name).cloned().unwrap_or(Value::Null),
    }
}

fn casing(config: &CasingConfig, variables: &VariableMap) -> Value {
    let source = variables.get_string(&config.source).unwrap_or_default();
    Value::String(if config.to_lower {
        source.to_lowercase()
    } else {
        source.to_uppercase()
    })
}

fn join(config: &JoinConfig, variables: &VariableMap) -> Value {
    let parts: Vec<String> = config
        .symbols
        .iter()
        .map(|s| match s.kind {
            JoinSymbolKind::Const => s.value.clone(),
            JoinSymbolKind::Ref => variables.get_string(&s.value).unwrap_or_default(),
        })
        .filter(|part| !config.remove_empty_values || !part.is_empty())
        .collect();
    Value::String(parts.join(&config.separator))
}

fn compile(pattern: &str) -> std::result::Result<Regex, String> {
    Regex::new(pattern).map_err(|e| format!("invalid regex '{pattern}': {e}"))
}

fn regex_replace(config: &RegexConfig, variables: &VariableMap) -> std::result::Result<Value, String> {
    let mut value = variables.get_string(&config.source).unwrap_or_default();
    for step in &config.steps {
        let regex = compile(&step.regex)?;
        value = regex.replace_all(&value, step.replacement.as_str()).into_owned();
    }
    Ok(Value::String(value))
}

fn guid(config: &GuidConfig) -> std::result::Result<Value, String> {
    let format = config.format.as_deref().unwrap_or("d");
    let mut chars = format.chars();
    let (Some(letter), None) = (chars.next(), chars.next()) else {
        return Err(format!("invalid guid format '{format}'"));
    };

    let id = Uuid::new_v4();
    let text = match letter.to_ascii_uppercase() {
        'N' => id.simple().to_string(),
        'D' => id.hyphenated().to_string(),
        'B' => id.braced().to_string(),
        'P' => format!("({})", id.hyphenated()),
        _ => return Err(format!("invalid guid format '{format}'")),
    };
    Ok(Value::String(if letter.is_ascii_uppercase() {
        text.to_uppercase()
    } else {
        text
    }))
}

fn now(config: &NowConfig) -> std::result::Result<Value, String> {
    let Some(format) = config.format.as_deref() else {
        return Ok(Value::String(if config.utc {
            Utc::now().to_rfc3339()
        } else {
            Local::now().to_rfc3339()
        }));
    };

    let mut text = String::new();
    let written = if config.utc {
        write!(text, "{}", Utc::now().format(format))
    } else {
        write!(text, "{}", Local::now().format(format))
    };
    written.map_err(|_| format!("invalid date format '{format}'"))?;
    Ok(Value::String(text))
}

fn random(config: &RandomConfig) -> std::result::Result<Value, String> {
    let high = config.high.unwrap_or(i64::from(i32::MAX));
    if config.low >= high {
        return Err(format!("empty random range {}..{}", config.low, high));
    }
    Ok(Value::from(rand::rng().random_range(config.low..high)))
}

/// Convert a computed value to the symbol's declared data type.
pub fn coerce(value: Value, data_type: &str) -> std::result::Result<Value, String> {
    let invalid = |value: &Value| format!("cannot convert {value} to {data_type}");
    match data_type.to_ascii_lowercase().as_str() {
        "bool" | "boolean" => match &value {
            Value::Bool(_) => Ok(value),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            _ => Err(invalid(&value)),
        },
        "int" | "integer" => match &value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value),
            Value::String(s) => s.trim().parse::<i64>().map(Value::from).map_err(|_| invalid(&value)),
            _ => Err(invalid(&value)),
        },
        "float" => match &value {
            Value::Number(_) => Ok(value),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| invalid(&value)),
            _ => Err(invalid(&value)),
        },
        _ => Ok(value),
    }
}
