//! Named value forms applied by `processValueForm` symbols.
//!
//! Form names match case-insensitively.

/// Every form name understood by [`apply_form`].
pub const KNOWN_FORMS: &[&str] = &[
    "identity",
    "lowerCase",
    "upperCase",
    "firstLowerCase",
    "firstUpperCase",
    "kebabCase",
    "titleCase",
    "safeName",
    "safeNamespace",
    "xmlEncode",
    "jsonEncode",
];

/// Apply the named form. Returns `None` for an unknown form.
pub fn apply_form(form: &str, input: &str) -> Option<String> {
    let output = match form.to_ascii_lowercase().as_str() {
        "identity" => input.to_string(),
        "lowercase" => input.to_lowercase(),
        "uppercase" => input.to_uppercase(),
        "firstlowercase" => map_first(input, |c| c.to_lowercase().collect()),
        "firstuppercase" => map_first(input, |c| c.to_uppercase().collect()),
        "kebabcase" => kebab_case(input),
        "titlecase" => title_case(input),
        "safename" => safe_name(input),
        "safenamespace" => safe_namespace(input),
        "xmlencode" => xml_encode(input),
        "jsonencode" => serde_json::to_string(input).ok()?,
        _ => return None,
    };
    Some(output)
}

fn map_first(input: &str, f: impl Fn(char) -> String) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => f(first) + chars.as_str(),
        None => String::new(),
    }
}

/// `MyHTTPServer_v2` becomes `my-http-server-v2`.
fn kebab_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words.join("-")
}

fn title_case(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut at_word_start = true;
    for c in input.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            output.push(c);
        } else if at_word_start {
            output.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            output.push(c);
        }
    }
    output
}

/// Identifier-safe text: invalid characters become `_`, and a leading digit
/// gets a `_` prefix.
fn safe_name(input: &str) -> String {
    let mut output: String =
        input.chars().map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' }).collect();
    if output.starts_with(|c: char| c.is_ascii_digit()) {
        output.insert(0, '_');
    }
    output
}

fn safe_namespace(input: &str) -> String {
    input.split('.').map(safe_name).collect::<Vec<_>>().join(".")
}

fn xml_encode(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&apos;"),
            other => output.push(other),
        }
    }
    output
}
