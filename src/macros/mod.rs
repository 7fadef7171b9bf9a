//! Generated symbols ("macros") computed from parameters and other symbols.
//!
//! A [`GeneratedSymbol`] pairs a name and optional data type with a
//! [`MacroKind`], the closed set of transformations a template can declare.
//! Several kinds read other variables by name; [`GeneratedSymbol::referenced_names`]
//! lists those reads so [`sorter::sort_generated_symbols`] can order evaluation,
//! and [`evaluate::MacroEvaluator`] then computes the values in that order.
//!
//! Symbols deserialize from manifest entries such as:
//!
//! ```json
//! { "name": "ns", "generator": "regex", "source": "name",
//!   "steps": [{ "regex": "\\W", "replacement": "_" }] }
//! ```

pub mod evaluate;
pub mod forms;
pub mod port;
pub mod sorter;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::expression::{ConditionAdapter, VariableScope};

pub use evaluate::MacroEvaluator;
pub use port::PortRegistry;
pub use sorter::sort_generated_symbols;

/// One computed variable declared by a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSymbol {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(flatten)]
    pub kind: MacroKind,
    /// Names of known symbols and parameters this symbol reads. Filled in by
    /// the sorter.
    #[serde(skip)]
    pub dependencies: BTreeSet<String>,
}

impl GeneratedSymbol {
    pub fn new(name: impl Into<String>, kind: MacroKind) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            kind,
            dependencies: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    /// Every variable name this symbol may read.
    ///
    /// Conditions (`switch` cases, `evaluate`) are traced by evaluating them
    /// against `universe`; only the names read on the path actually taken are
    /// reported.
    pub fn referenced_names(
        &self,
        adapter: &ConditionAdapter<'_>,
        universe: &dyn VariableScope,
    ) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        match &self.kind {
            MacroKind::Coalesce(config) => {
                names.insert(config.source_variable_name.clone());
                names.insert(config.fallback_variable_name.clone());
            }
            MacroKind::Join(config) => {
                names.extend(
                    config
                        .symbols
                        .iter()
                        .filter(|s| s.kind == JoinSymbolKind::Ref)
                        .map(|s| s.value.clone()),
                );
            }
            MacroKind::Switch(config) => {
                for condition in config.cases.iter().filter_map(|c| c.condition.as_deref()) {
                    if !condition.trim().is_empty() {
                        names.extend(adapter.trace_references(condition, universe));
                    }
                }
            }
            MacroKind::Evaluate(config) => {
                names.extend(adapter.trace_references(&config.condition, universe));
            }
            MacroKind::Regex(RegexConfig {
                source,
                ..
            })
            | MacroKind::RegexMatch(RegexMatchConfig {
                source,
                ..
            })
            | MacroKind::Casing(CasingConfig {
                source,
                ..
            })
            | MacroKind::ProcessValueForm(ProcessValueFormConfig {
                source,
                ..
            }) => {
                names.insert(source.clone());
            }
            MacroKind::Constant(_)
            | MacroKind::Guid(_)
            | MacroKind::Now(_)
            | MacroKind::Random(_)
            | MacroKind::Port(_) => {}
        }
        names.retain(|name| !name.is_empty());
        names
    }
}

/// The transformation a generated symbol applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "generator", rename_all = "camelCase")]
pub enum MacroKind {
    Switch(SwitchConfig),
    Coalesce(CoalesceConfig),
    Casing(CasingConfig),
    Constant(ConstantConfig),
    Join(JoinConfig),
    Regex(RegexConfig),
    RegexMatch(RegexMatchConfig),
    Guid(GuidConfig),
    Now(NowConfig),
    Random(RandomConfig),
    Port(PortConfig),
    ProcessValueForm(ProcessValueFormConfig),
    Evaluate(EvaluateConfig),
}

impl MacroKind {
    /// Manifest name of the kind.
    pub const fn generator_name(&self) -> &'static str {
        match self {
            MacroKind::Switch(_) => "switch",
            MacroKind::Coalesce(_) => "coalesce",
            MacroKind::Casing(_) => "casing",
            MacroKind::Constant(_) => "constant",
            MacroKind::Join(_) => "join",
            MacroKind::Regex(_) => "regex",
            MacroKind::RegexMatch(_) => "regexMatch",
            MacroKind::Guid(_) => "guid",
            MacroKind::Now(_) => "now",
            MacroKind::Random(_) => "random",
            MacroKind::Port(_) => "port",
            MacroKind::ProcessValueForm(_) => "processValueForm",
            MacroKind::Evaluate(_) => "evaluate",
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchCase {
    /// Missing or empty condition marks the default case.
    #[serde(default)]
    pub condition: Option<String>,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchConfig {
    pub cases: Vec<SwitchCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoalesceConfig {
    pub source_variable_name: String,
    pub fallback_variable_name: String,
    /// A source equal to this value counts as missing.
    #[serde(default)]
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasingConfig {
    pub source: String,
    #[serde(default = "default_true")]
    pub to_lower: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantConfig {
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinSymbolKind {
    Const,
    Ref,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSymbol {
    #[serde(rename = "type")]
    pub kind: JoinSymbolKind,
    pub value: String,
}

impl JoinSymbol {
    pub fn constant(value: impl Into<String>) -> Self {
        Self {
            kind: JoinSymbolKind::Const,
            value: value.into(),
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            kind: JoinSymbolKind::Ref,
            value: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinConfig {
    pub symbols: Vec<JoinSymbol>,
    #[serde(default)]
    pub separator: String,
    #[serde(default)]
    pub remove_empty_values: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexStep {
    pub regex: String,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexConfig {
    pub source: String,
    pub steps: Vec<RegexStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexMatchConfig {
    pub source: String,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidConfig {
    /// One of `N`, `D`, `B`, `P`; a lowercase letter yields lowercase digits.
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NowConfig {
    /// strftime-style format; RFC 3339 when absent.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub utc: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomConfig {
    #[serde(default)]
    pub low: i64,
    /// Exclusive upper bound, `i32::MAX` when absent.
    #[serde(default)]
    pub high: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortConfig {
    #[serde(default)]
    pub low: Option<u16>,
    #[serde(default)]
    pub high: Option<u16>,
    #[serde(default)]
    pub fallback: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessValueFormConfig {
    pub source: String,
    pub form: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateConfig {
    pub condition: String,
}
