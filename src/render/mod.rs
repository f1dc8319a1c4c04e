//! Export of the atom store: JSON dump and YAML coordinate map.

mod json;
mod options;
mod yaml;

pub use json::{to_json, write_json, JsonFormat};
pub use options::{SlugCollision, YamlOptions, MAX_SLUG_LEN};
pub use yaml::{slugify, to_yaml, to_yaml_mapping, write_yaml, Slugger};
