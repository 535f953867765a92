use minijinja::Environment;
use std::collections::HashMap;

/// Renders `template` with `variables` as its context.
///
/// Undefined names render as the empty string.
pub(crate) fn render(
  template: &str,
  variables: &HashMap<String, String>,
) -> Result<String, minijinja::Error> {
  Environment::new().render_str(template, variables)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_undefined_names_render_empty() {
    let variables = HashMap::from([("name".to_string(), "World".to_string())]);
    assert_eq!(render("Hello {{ name }}{{ missing }}!", &variables).unwrap(), "Hello World!");
  }

  #[test]
  fn test_syntax_errors_are_reported() {
    let err = render("a {{ open", &HashMap::new()).unwrap_err();
    assert_eq!(err.kind(), minijinja::ErrorKind::SyntaxError);
  }
}
