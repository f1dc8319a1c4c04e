//! Export options and configuration.

/// Default maximum slug length in characters.
pub const MAX_SLUG_LEN: usize = 60;

/// Options for the YAML coordinate export.
#[derive(Debug, Clone)]
pub struct YamlOptions {
    /// What to do when two spans on a page share a slug
    pub collision: SlugCollision,

    /// Slugs are truncated to this many characters
    pub max_slug_len: usize,
}

impl YamlOptions {
    /// Create new YAML options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slug collision policy.
    pub fn with_collision(mut self, collision: SlugCollision) -> Self {
        self.collision = collision;
        self
    }

    /// Set the maximum slug length (at least 1).
    pub fn with_max_slug_len(mut self, len: usize) -> Self {
        self.max_slug_len = len.max(1);
        self
    }
}

impl Default for YamlOptions {
    fn default() -> Self {
        Self {
            collision: SlugCollision::Suffix,
            max_slug_len: MAX_SLUG_LEN,
        }
    }
}

/// Policy for spans whose slugs collide on the same page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlugCollision {
    /// Keep every span: `name`, `name_2`, `name_3`, ...
    #[default]
    Suffix,
    /// Last span wins, keeping the first span's position in the mapping
    Overwrite,
}

impl std::str::FromStr for SlugCollision {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "suffix" => Ok(SlugCollision::Suffix),
            "overwrite" => Ok(SlugCollision::Overwrite),
            _ => Err(format!("Unknown slug collision policy: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_options_builder() {
        let options = YamlOptions::new()
            .with_collision(SlugCollision::Overwrite)
            .with_max_slug_len(0);
        assert_eq!(options.collision, SlugCollision::Overwrite);
        assert_eq!(options.max_slug_len, 1);
        assert_eq!(YamlOptions::default().max_slug_len, 60);
    }

    #[test]
    fn test_collision_from_str() {
        assert_eq!("Suffix".parse::<SlugCollision>(), Ok(SlugCollision::Suffix));
        assert_eq!("overwrite".parse::<SlugCollision>(), Ok(SlugCollision::Overwrite));
        assert!("merge".parse::<SlugCollision>().is_err());
    }
}
