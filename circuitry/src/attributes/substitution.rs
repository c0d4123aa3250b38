//! `{{KEY}}` placeholder resolution against layered attribute scopes.
//!
//! A placeholder either names a plain key (`{{RESISTANCE}}`), which is looked
//! up in the innermost scope and, if allowed, in its parents, or a key
//! qualified with the namespace of a scope (`{{PRJ::AUTHOR}}`). Values found
//! are expanded again in the scope they came from, down to [`MAX_DEPTH`].
//! A key is never expanded inside its own value, and at most
//! [`MAX_EXPANSIONS`] placeholders are replaced per call. Placeholders which
//! cannot be resolved, or are cut off by these limits, are kept as they are.

use super::attribute::AttributeList;

pub const MAX_DEPTH: usize = 8;
pub const MAX_EXPANSIONS: usize = 1024;

pub trait AttributeProvider {
    /// Namespace used in qualified placeholders, e.g. `CMP` or `PRJ`.
    fn namespace(&self) -> &'static str;

    /// Raw, unexpanded value of `key` in this scope only.
    fn attribute_value(&self, key: &str) -> Option<String>;

    fn parent(&self) -> Option<&dyn AttributeProvider> {
        None
    }
}

/// Placeholders being expanded, outermost first.
struct Expansion {
    active: Vec<(&'static str, String)>,
    remaining: usize,
}

/// Expand all placeholders in `text`.
///
/// With `pass_to_parents` unset, unqualified keys are only searched in
/// `scope` itself.
pub fn substitute(text: &str, scope: &dyn AttributeProvider, pass_to_parents: bool) -> String {
    let mut state = Expansion {
        active: Vec::new(),
        remaining: MAX_EXPANSIONS,
    };
    expand(text, scope, pass_to_parents, &mut state)
}

fn expand(text: &str, scope: &dyn AttributeProvider, pass_to_parents: bool, state: &mut Expansion) -> String {
    if state.active.len() >= MAX_DEPTH {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        out.push_str(&rest[..start]);
        let literal = &rest[start..start + end + 4];
        let placeholder = after[..end].trim();
        let key = placeholder.split_once("::").map_or(placeholder, |(_, key)| key);
        match lookup(placeholder, scope, pass_to_parents) {
            Some((value, owner))
                if state.remaining > 0
                    && !state
                        .active
                        .iter()
                        .any(|(namespace, active)| *namespace == owner.namespace() && active == key) =>
            {
                state.remaining -= 1;
                state.active.push((owner.namespace(), key.to_string()));
                out.push_str(&expand(&value, owner, pass_to_parents, state));
                state.active.pop();
            }
            _ => out.push_str(literal),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

fn lookup<'a>(
    placeholder: &str,
    scope: &'a dyn AttributeProvider,
    pass_to_parents: bool,
) -> Option<(String, &'a dyn AttributeProvider)> {
    let mut current = Some(scope);
    if let Some((namespace, key)) = placeholder.split_once("::") {
        while let Some(provider) = current {
            if provider.namespace() == namespace {
                return provider.attribute_value(key).map(|value| (value, provider));
            }
            current = provider.parent();
        }
        return None;
    }
    while let Some(provider) = current {
        if let Some(value) = provider.attribute_value(placeholder) {
            return Some((value, provider));
        }
        if !pass_to_parents {
            break;
        }
        current = provider.parent();
    }
    None
}

/// Project level scope: the project name and user defined project attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectScope {
    pub name: String,
    pub attributes: AttributeList,
}

impl ProjectScope {
    pub fn new(name: &str, attributes: AttributeList) -> Self {
        Self {
            name: name.to_string(),
            attributes,
        }
    }
}

impl AttributeProvider for ProjectScope {
    fn namespace(&self) -> &'static str {
        "PRJ"
    }

    fn attribute_value(&self, key: &str) -> Option<String> {
        if key == "PROJECT" {
            return Some(self.name.clone());
        }
        self.attributes
            .find(&key.to_string())
            .map(|attr| attr.value_with_unit())
    }
}

/// Component instance scope, chained to the project scope.
pub struct ComponentScope<'a> {
    pub name: &'a str,
    pub value: &'a str,
    pub attributes: &'a AttributeList,
    pub parent: &'a dyn AttributeProvider,
}

impl AttributeProvider for ComponentScope<'_> {
    fn namespace(&self) -> &'static str {
        "CMP"
    }

    fn attribute_value(&self, key: &str) -> Option<String> {
        match key {
            "NAME" => Some(self.name.to_string()),
            "VALUE" => Some(self.value.to_string()),
            _ => self
                .attributes
                .find(&key.to_string())
                .map(|attr| attr.value_with_unit()),
        }
    }

    fn parent(&self) -> Option<&dyn AttributeProvider> {
        Some(self.parent)
    }
}
