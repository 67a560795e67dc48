//! Asset references, classification, resolution and minification.

mod kind;
pub mod minify;
mod reference;
pub mod resolve;

// Types
pub use kind::{AssetType, TransformKind};
pub use reference::{AssetReference, AttrValue, RenderAttributes};

// Resolution (pure, filesystem reads only)
pub use resolve::{ResolvedAsset, artifact_name, resolve};
