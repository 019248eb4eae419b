//! Heuristic checks for generated Bicep code.
//!
//! This is not a parser: it counts declarations and checks that braces and
//! brackets balance.

use std::sync::OnceLock;

use regex::Regex;

use bsb_core::Dialect;

use crate::result::ValidationResult;

struct DeclarationPatterns {
    param: Regex,
    var: Regex,
    output: Regex,
    resource: Regex,
    module: Regex,
}

fn patterns() -> &'static DeclarationPatterns {
    static PATTERNS: OnceLock<DeclarationPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| DeclarationPatterns {
        param: declaration("param"),
        var: declaration("var"),
        output: declaration("output"),
        resource: declaration("resource"),
        module: declaration("module"),
    })
}

fn declaration(keyword: &str) -> Regex {
    Regex::new(&format!(r"(?m)^\s*{}\s+[A-Za-z_][A-Za-z0-9_]*", keyword))
        .expect("declaration pattern is valid")
}

/// Validate generated Bicep text.
pub fn validate_bicep(code: &str) -> ValidationResult {
    let mut result = ValidationResult::for_dialect(Dialect::Bicep);
    let patterns = patterns();
    let code = strip_line_comments(code);

    let resources = patterns.resource.find_iter(&code).count();
    let modules = patterns.module.find_iter(&code).count();
    if resources == 0 && modules == 0 {
        result.add_warning("No resources found in template");
    }

    for (label, count) in [
        ("parameter", patterns.param.find_iter(&code).count()),
        ("variable", patterns.var.find_iter(&code).count()),
        ("output", patterns.output.find_iter(&code).count()),
        ("resource", resources),
        ("module", modules),
    ] {
        if count > 0 {
            result.add_info(format!("Found {} {}(s)", count, label));
        }
    }

    check_balance(&code, '{', '}', "braces", &mut result);
    check_balance(&code, '[', ']', "brackets", &mut result);

    result
}

fn check_balance(code: &str, open: char, close: char, label: &str, result: &mut ValidationResult) {
    let opening = code.matches(open).count();
    let closing = code.matches(close).count();
    if opening != closing {
        result.add_error(format!(
            "Mismatched {}: {} opening, {} closing",
            label, opening, closing
        ));
    }
}

/// Drop `//` comments so commented-out code does not count.
fn strip_line_comments(code: &str) -> String {
    code.lines()
        .map(|line| match line.find("//") {
            Some(index) if !inside_string(&line[..index]) => &line[..index],
            _ => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn inside_string(prefix: &str) -> bool {
    prefix.matches('\'').count() % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_declarations() {
        let code = r#"
param location string = resourceGroup().location
param name string
var formatted = toLower(name)
resource sa 'Microsoft.Storage/storageAccounts@2022-05-01' = {
  name: formatted
  location: location
}
output id string = sa.id
"#;
        let result = validate_bicep(code);
        assert!(result.is_valid());
        assert!(result.info().iter().any(|i| i == "Found 2 parameter(s)"));
        assert!(result.info().iter().any(|i| i == "Found 1 variable(s)"));
        assert!(result.info().iter().any(|i| i == "Found 1 output(s)"));
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_mismatched_braces() {
        let result = validate_bicep("resource x 'A.B/c@2020-01-01' = {\n  name: 'x'\n");
        assert!(!result.is_valid());
        assert!(result.errors()[0].contains("Mismatched braces"));
    }

    #[test]
    fn test_no_resources_warning() {
        let result = validate_bicep("param x string\n// resource y 'A.B/c@1' = {\n");
        assert!(result.is_valid());
        assert_eq!(result.warnings(), ["No resources found in template".to_string()]);
    }

    #[test]
    fn test_comment_marker_inside_string_is_kept() {
        let result = validate_bicep("resource x 'A.B/c@1' = {\n  uri: 'https://example.com/{'\n}\n");
        assert!(!result.is_valid());
    }
}
