//! Asset references and render attributes as extracted from templates.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Attribute that returns the bare URL instead of a tag.
pub const RAW_ATTR: &str = "raw";
/// Attribute that moves the image source into a lazy-load attribute.
pub const LAZY_ATTR: &str = "lazy";
/// Source attribute used when `lazy` is `true`.
pub const DEFAULT_LAZY_SRC: &str = "data-src";

/// One asset or an ordered group published as a single artifact.
///
/// Serialized as a string or an array of strings, matching the template
/// marker syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetReference {
    Single(String),
    Bundle(Vec<String>),
}

impl AssetReference {
    /// Build a reference: one path becomes `Single`, more become `Bundle`.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        if paths.len() == 1 {
            Self::Single(paths.remove(0))
        } else {
            Self::Bundle(paths)
        }
    }

    /// Source paths in declaration order.
    pub fn paths(&self) -> &[String] {
        match self {
            Self::Single(path) => std::slice::from_ref(path),
            Self::Bundle(paths) => paths,
        }
    }

    pub const fn is_bundle(&self) -> bool {
        matches!(self, Self::Bundle(_))
    }
}

impl fmt::Display for AssetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(path) => f.write_str(path),
            Self::Bundle(paths) => write!(f, "[{}]", paths.join(", ")),
        }
    }
}

/// Attribute value from a marker object literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Text(String),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Attributes passed alongside an asset reference.
///
/// `raw` and `lazy` are reserved and never rendered as HTML attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderAttributes(BTreeMap<String, AttrValue>);

impl RenderAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `raw: true` bypasses tag generation.
    pub fn is_raw(&self) -> bool {
        matches!(self.0.get(RAW_ATTR), Some(AttrValue::Bool(true)))
    }

    /// Source attribute name requested by the lazy-load flag.
    pub fn lazy_source(&self) -> Option<&str> {
        match self.0.get(LAZY_ATTR)? {
            AttrValue::Bool(true) => Some(DEFAULT_LAZY_SRC),
            AttrValue::Bool(false) => None,
            AttrValue::Text(name) if name.is_empty() => None,
            AttrValue::Text(name) => Some(name),
        }
    }

    /// Renderable attributes: reserved keys dropped, `true` flags rendered
    /// as `name="name"`, `false` flags omitted.
    pub fn html_attributes(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .filter(|(name, _)| !matches!(name.as_str(), RAW_ATTR | LAZY_ATTR))
            .filter_map(|(name, value)| match value {
                AttrValue::Text(text) => Some((name.clone(), text.clone())),
                AttrValue::Bool(true) => Some((name.clone(), name.clone())),
                AttrValue::Bool(false) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paths() {
        assert_eq!(
            AssetReference::from_paths(["/css/site.css"]),
            AssetReference::Single("/css/site.css".into())
        );
        assert!(AssetReference::from_paths(["/js/a.js", "/js/b.js"]).is_bundle());
    }

    #[test]
    fn test_serde_shape() {
        let refs = vec![
            AssetReference::Bundle(vec!["/js/a.js".into(), "/js/b.js".into()]),
            AssetReference::Single("/css/site.css".into()),
        ];
        let json = serde_json::to_string(&refs).unwrap();
        assert_eq!(json, r#"[["/js/a.js","/js/b.js"],"/css/site.css"]"#);
        let back: Vec<AssetReference> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, refs);
    }

    #[test]
    fn test_reserved_attributes() {
        let attrs = RenderAttributes::new()
            .with("raw", true)
            .with("lazy", true)
            .with("alt", "logo")
            .with("async", true)
            .with("defer", false);

        assert!(attrs.is_raw());
        assert_eq!(attrs.lazy_source(), Some(DEFAULT_LAZY_SRC));

        let html = attrs.html_attributes();
        assert_eq!(html.len(), 2);
        assert_eq!(html["alt"], "logo");
        assert_eq!(html["async"], "async");
    }

    #[test]
    fn test_lazy_source_custom_name() {
        let attrs = RenderAttributes::new().with("lazy", "data-original");
        assert_eq!(attrs.lazy_source(), Some("data-original"));
        assert!(!attrs.is_raw());
        assert!(!RenderAttributes::new().with("raw", "true").is_raw());
    }
}
