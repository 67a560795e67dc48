//! HTML tags for asset references.
//!
//! ```text
//! production   <script src="https://cdn.example.com/a.js%2Bb.js?cache=1700000000000" …></script>
//! development  <script src="/js/a.js?v=1712345678901" …></script>
//!              <script src="/js/b.js?v=1712345678901" …></script>
//! ```
//!
//! Production URLs carry the fingerprint computed by the resolver, so they
//! only change when a source file does. Development URLs use the clock and
//! list bundle members one by one.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::asset::resolve::url_path;
use crate::asset::{AssetReference, AssetType, RenderAttributes, artifact_name, resolve};
use crate::error::{CdnError, Result};
use crate::utils::date::now_millis;
use crate::utils::html::render_attributes;
use crate::utils::mime;
use crate::utils::path::strip_leading_slash;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    #[default]
    Https,
    /// Protocol-relative `//domain`
    Relative,
}

impl Protocol {
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Http => "http://",
            Self::Https => "https://",
            Self::Relative => "//",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Relative => "relative",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub production: bool,
    /// CDN host, e.g. `cdn.example.com`.
    pub domain: String,
    pub protocol: Protocol,
    pub public_root: PathBuf,
}

impl RenderOptions {
    pub fn base_url(&self) -> String {
        let domain = self.domain.trim_end_matches('/');
        format!("{}{}", self.protocol.prefix(), domain)
    }
}

/// Render the tag(s) for `reference`.
///
/// Production mode stats the source files for the fingerprint; development
/// mode stamps URLs with the current time.
pub fn render_tag(
    options: &RenderOptions,
    reference: &AssetReference,
    attributes: &RenderAttributes,
) -> Result<String> {
    if options.production {
        let asset = resolve(reference, &options.public_root)?;
        render_production(options, reference, attributes, asset.fingerprint)
    } else {
        render_development(reference, attributes, now_millis())
    }
}

/// CDN URL for a reference at a given fingerprint.
pub fn production_url(options: &RenderOptions, reference: &AssetReference, fingerprint: u64) -> String {
    let name = artifact_name(reference);
    format!("{}/{}?cache={fingerprint}", options.base_url(), url_path(&name))
}

pub fn render_production(
    options: &RenderOptions,
    reference: &AssetReference,
    attributes: &RenderAttributes,
    fingerprint: u64,
) -> Result<String> {
    let url = production_url(options, reference, fingerprint);
    let first = reference.paths().first().ok_or(CdnError::EmptyBundle)?;
    let mime = mime::from_path(Path::new(first));
    if attributes.is_raw() {
        return Ok(url);
    }
    Ok(tag(reference, mime, &url, attributes)? + "\n")
}

/// One tag per member, served from the local public root.
pub fn render_development(
    reference: &AssetReference,
    attributes: &RenderAttributes,
    stamp: u64,
) -> Result<String> {
    let mut out = Vec::with_capacity(reference.paths().len());
    for path in reference.paths() {
        let url = format!("/{}?v={stamp}", strip_leading_slash(path));
        if attributes.is_raw() {
            out.push(url);
        } else {
            let mime = mime::from_path(Path::new(path));
            out.push(tag(reference, mime, &url, attributes)?);
        }
    }

    let mut rendered = out.join("\n");
    if !attributes.is_raw() {
        rendered.push('\n');
    }
    Ok(rendered)
}

fn tag(
    reference: &AssetReference,
    mime: &'static str,
    url: &str,
    attributes: &RenderAttributes,
) -> Result<String> {
    let with_defaults = |defaults: &[(&str, &str)]| {
        let mut attrs: BTreeMap<String, String> = defaults
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        attrs.extend(attributes.html_attributes());
        attrs
    };

    let rendered = match AssetType::from_mime(mime) {
        AssetType::Script => {
            let mut attrs = with_defaults(&[("type", "text/javascript")]);
            attrs.insert("src".to_string(), url.to_string());
            format!("<script {}></script>", render_attributes(&attrs))
        }
        AssetType::Stylesheet => {
            let mut attrs = with_defaults(&[("rel", "stylesheet")]);
            attrs.insert("href".to_string(), url.to_string());
            format!("<link {} />", render_attributes(&attrs))
        }
        AssetType::Png | AssetType::Jpeg | AssetType::Gif | AssetType::Webp | AssetType::Svg => {
            let mut attrs = with_defaults(&[]);
            let source = attributes.lazy_source().unwrap_or("src");
            attrs.insert(source.to_string(), url.to_string());
            format!("<img {} />", render_attributes(&attrs))
        }
        AssetType::Icon => {
            let mut attrs = with_defaults(&[("rel", "shortcut icon")]);
            attrs.insert("href".to_string(), url.to_string());
            format!("<link {} />", render_attributes(&attrs))
        }
        AssetType::Font | AssetType::Other => {
            return Err(CdnError::UnknownAssetType {
                asset: reference.to_string(),
                mime,
            });
        }
    };
    Ok(rendered)
}
