use crate::context::Params;
use crate::error::{Error, HttpError, Result};
use crate::handler::BoxedHook;
use crate::response::Response;
use crate::view::ViewFn;

use http::Method;
use std::collections::HashMap;

/// A URL rule: a path pattern with `<name>` placeholders plus routing options.
#[derive(Debug, Clone)]
pub struct Rule {
  path: String,
  endpoint: Option<String>,
  methods: Option<Vec<Method>>,
  defaults: Params,
}

impl Rule {
  pub fn new(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      endpoint: None,
      methods: None,
      defaults: Params::new(),
    }
  }

  /// Names the endpoint. Defaults to the path itself.
  pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
    self.endpoint = Some(endpoint.into());
    self
  }

  /// Overrides the methods declared by the view.
  pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
    self.methods = Some(methods.into_iter().collect());
    self
  }

  /// Adds a value passed to the view when the path does not supply it.
  pub fn default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.defaults.insert(name, value);
    self
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  pub(crate) fn endpoint_name(&self) -> String {
    self.endpoint.clone().unwrap_or_else(|| self.path.clone())
  }

  pub(crate) fn with_prefix(mut self, prefix: &str, blueprint: &str) -> Self {
    let endpoint = self.endpoint_name();
    let prefix = prefix.trim_end_matches('/');
    self.path = format!("{}{}", prefix, self.path);
    self.endpoint = Some(format!("{}.{}", blueprint, endpoint));
    self
  }
}

/// Translates a rule path into `matchit` syntax: `<name>` segments become
/// `{name}`, literal braces are escaped.
fn to_route(path: &str) -> Result<String> {
  let invalid = |reason: &str| Error::InvalidRule {
    rule: path.to_string(),
    reason: reason.to_string(),
  };
  if !path.starts_with('/') {
    return Err(invalid("rules must start with '/'"));
  }

  let segments = path
    .split('/')
    .map(|segment| match segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
      Some("") => Err(invalid("empty placeholder")),
      Some(name) => Ok(format!("{{{}}}", name)),
      None => Ok(segment.replace('{', "{{").replace('}', "}}")),
    })
    .collect::<Result<Vec<_>>>()?;
  Ok(segments.join("/"))
}

#[derive(Clone)]
pub(crate) enum Target {
  View(ViewFn),
  Websocket(BoxedHook<Option<Response>>),
}

#[derive(Clone)]
struct Route {
  path: String,
  endpoint: String,
  methods: Vec<Method>,
  defaults: Params,
  blueprint: Option<String>,
  websocket: bool,
}

/// The outcome of matching a path against the routing table.
pub(crate) struct Matched {
  pub(crate) endpoint: String,
  pub(crate) blueprint: Option<String>,
  pub(crate) params: Params,
  pub(crate) target: Target,
}

/// The routing table.
///
/// `matchit` maps a path to the group of routes sharing its pattern; the
/// group is then filtered by connection kind and method.
#[derive(Clone)]
pub(crate) struct Router {
  matcher: matchit::Router<usize>,
  groups: Vec<Vec<usize>>,
  patterns: HashMap<String, usize>,
  routes: Vec<Route>,
  targets: HashMap<String, Target>,
}

impl Default for Router {
  fn default() -> Self {
    Self {
      matcher: matchit::Router::new(),
      groups: Vec::new(),
      patterns: HashMap::new(),
      routes: Vec::new(),
      targets: HashMap::new(),
    }
  }
}

impl Router {
  /// Adds `rule`, registering `target` under its endpoint. Without a target
  /// the rule must name an endpoint that already has one. Nothing is changed
  /// when an error is returned.
  ///
  /// Methods default to the ones declared by the endpoint's view.
  pub(crate) fn add(
    &mut self,
    rule: Rule,
    target: Option<Target>,
    blueprint: Option<String>,
  ) -> Result<String> {
    let route_path = to_route(&rule.path)?;
    let endpoint = rule.endpoint_name();

    let existing = self.targets.get(&endpoint);
    let (websocket, view_methods) = match (&target, existing) {
      (Some(_), Some(_)) => return Err(Error::DuplicateEndpoint(endpoint)),
      (None, None) => return Err(Error::UnknownEndpoint(endpoint)),
      (Some(target), None) | (None, Some(target)) => match target {
        Target::View(view) => (false, view.meta().methods().to_vec()),
        Target::Websocket(_) => (true, Vec::new()),
      },
    };

    let group = match self.patterns.get(&route_path) {
      Some(&group) => group,
      None => {
        let group = self.groups.len();
        self
          .matcher
          .insert(route_path.clone(), group)
          .map_err(|error| Error::InvalidRule {
            rule: rule.path.clone(),
            reason: error.to_string(),
          })?;
        self.groups.push(Vec::new());
        self.patterns.insert(route_path, group);
        group
      }
    };

    if let Some(target) = target {
      self.targets.insert(endpoint.clone(), target);
    }
    self.groups[group].push(self.routes.len());
    self.routes.push(Route {
      path: rule.path,
      endpoint: endpoint.clone(),
      methods: rule.methods.unwrap_or(view_methods),
      defaults: rule.defaults,
      blueprint,
      websocket,
    });
    Ok(endpoint)
  }

  pub(crate) fn paths(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .routes
      .iter()
      .map(|r| (r.path.as_str(), r.endpoint.as_str()))
  }

  /// Finds the route for `path`. A path that exists for other methods only is
  /// a 405, an unknown path a 404.
  pub(crate) fn lookup(
    &self,
    method: Option<&Method>,
    path: &str,
  ) -> std::result::Result<Matched, HttpError> {
    let found = self.matcher.at(path).map_err(|_| HttpError::not_found())?;

    let mut method_mismatch = false;
    for &index in &self.groups[*found.value] {
      let route = &self.routes[index];
      if route.websocket != method.is_none() {
        continue;
      }
      if let Some(method) = method {
        if !route.methods.contains(method) {
          method_mismatch = true;
          continue;
        }
      }
      let Some(target) = self.targets.get(&route.endpoint) else {
        continue;
      };
      let mut params: Params = found.params.iter().collect();
      params.merge_defaults(&route.defaults);
      return Ok(Matched {
        endpoint: route.endpoint.clone(),
        blueprint: route.blueprint.clone(),
        params,
        target: target.clone(),
      });
    }

    if method_mismatch {
      Err(HttpError::method_not_allowed())
    } else {
      Err(HttpError::not_found())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use crate::view::ViewMeta;
  use futures_util::future::BoxFuture;
  use std::sync::Arc;

  fn target() -> Target {
    let call: BoxedHook<Response> = Arc::new(
      |_ctx: crate::context::RequestContext| -> BoxFuture<'static, std::result::Result<Response, crate::error::HandlerError>> {
        Box::pin(async { Ok(Response::ok("ok")) })
      },
    );
    Target::View(ViewFn::new(ViewMeta::new("view"), call))
  }

  fn router(rules: &[&str]) -> Router {
    let mut router = Router::default();
    for rule in rules {
      router.add(Rule::new(*rule), Some(target()), None).unwrap();
    }
    router
  }

  #[test]
  fn test_placeholders_are_extracted() {
    let router = router(&["/users/<id>/posts/<post>"]);
    let matched = router.lookup(Some(&Method::GET), "/users/7/posts/hello").ok().unwrap();
    assert_eq!(matched.params.get("id"), Some("7"));
    assert_eq!(matched.params.get("post"), Some("hello"));
    assert!(router.lookup(Some(&Method::GET), "/users/7").is_err());
    assert!(router.lookup(Some(&Method::GET), "/people/7/posts/hello").is_err());
  }

  #[test]
  fn test_empty_segments_do_not_match() {
    let router = router(&["/users/<id>"]);
    assert!(router.lookup(Some(&Method::GET), "/users/7").is_ok());
    let err = router.lookup(Some(&Method::GET), "//users///7").err().unwrap();
    assert_eq!(err.status, http::StatusCode::NOT_FOUND);
  }

  #[test]
  fn test_static_segments_win_over_placeholders() {
    let mut router = Router::default();
    router
      .add(Rule::new("/<name>").endpoint("by_name"), Some(target()), None)
      .unwrap();
    router
      .add(Rule::new("/about").endpoint("about"), Some(target()), None)
      .unwrap();
    let about = router.lookup(Some(&Method::GET), "/about").ok().unwrap();
    let other = router.lookup(Some(&Method::GET), "/alice").ok().unwrap();
    assert_eq!(about.endpoint, "about");
    assert_eq!(other.endpoint, "by_name");
  }

  #[test]
  fn test_invalid_rules() {
    assert!(matches!(to_route("users"), Err(Error::InvalidRule { .. })));
    assert!(matches!(to_route("/<>"), Err(Error::InvalidRule { .. })));
    assert_eq!(to_route("/a/<b>/{c}").unwrap(), "/a/{b}/{{c}}");
  }

  #[test]
  fn test_failed_add_leaves_the_table_untouched() {
    let mut router = router(&["/a"]);
    let err = router.add(Rule::new("/a"), Some(target()), None).unwrap_err();
    assert!(matches!(err, Error::DuplicateEndpoint(_)));
    let err = router
      .add(Rule::new("/<x>").endpoint("x"), Some(target()), None)
      .and_then(|_| router.add(Rule::new("/<y>").endpoint("y"), Some(target()), None))
      .unwrap_err();
    assert!(matches!(err, Error::InvalidRule { .. }));
    assert!(!router.targets.contains_key("y"));
  }

  #[test]
  fn test_prefixed_rule() {
    let rule = Rule::new("/items").with_prefix("/shop/", "shop");
    assert_eq!(rule.path(), "/shop/items");
    assert_eq!(rule.endpoint_name(), "shop./items");

    let named = Rule::new("/items").endpoint("items").with_prefix("/shop", "shop");
    assert_eq!(named.endpoint_name(), "shop.items");
  }
}
