//! Configuration section definitions.
//!
//! Each module corresponds to a section in `cdnify.toml`:
//!
//! | Module     | TOML Section             | Purpose                           |
//! |------------|--------------------------|-----------------------------------|
//! | `paths`    | `[paths]`, `[views]`     | Public root, templates, manifest  |
//! | `cdn`      | `[cdn]`                  | Domain and protocol for tags      |
//! | `storage`  | `[storage]`              | Bucket endpoint and ACL           |
//! | `publish`  | `[publish]`, `[tools]`   | Upload tuning, raster optimizers  |

mod cdn;
mod paths;
mod publish;
mod storage;

pub use cdn::CdnConfig;
pub use paths::{PathsConfig, ViewsConfig};
pub use publish::{PublishConfig, ToolsConfig};
pub use storage::StorageConfig;
