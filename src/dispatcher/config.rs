//! Filter property containers.

use crate::caps::ImplDescription;
use crate::caps::matcher::{self, FilterProperty};
use crate::caps::schema;
use crate::error::Result;
use crate::variant::Variant;

/// Identifies a config within the loader that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigId {
    pub(crate) loader: u64,
    pub(crate) index: usize,
}

impl ConfigId {
    /// Id of the owning loader.
    pub fn loader_id(&self) -> u64 {
        self.loader
    }
}

/// An ordered set of filter properties.
///
/// All properties of a config, and all configs of a loader, must hold for a
/// descriptor to match. An empty config accepts every descriptor.
#[derive(Debug, Clone, Default)]
pub struct Config {
    properties: Vec<FilterProperty>,
}

impl Config {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property.
    ///
    /// The path must name a schema leaf and `value` must have the leaf's
    /// kind. Values outside what any implementation offers are accepted and
    /// simply never match.
    pub fn set_filter_property(&mut self, path: &str, value: impl Into<Variant>) -> Result<()> {
        let value = value.into();
        let leaf = schema::resolve_typed(path, value.kind())?;
        tracing::debug!(path, %value, "filter property set");
        self.properties.push(FilterProperty::new(leaf, value));
        Ok(())
    }

    /// Properties in insertion order.
    pub fn properties(&self) -> &[FilterProperty] {
        &self.properties
    }

    /// Whether no property was set.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Whether `desc` satisfies every property.
    pub fn matches(&self, desc: &ImplDescription) -> bool {
        matcher::matches(desc, &self.properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SoftwareBackend;
    use crate::error::Error;
    use crate::format::codec;

    #[test]
    fn test_set_and_match() {
        let desc = SoftwareBackend::description();
        let mut config = Config::new();
        assert!(config.is_empty());
        assert!(config.matches(&desc));

        config
            .set_filter_property("ImplDescription.Impl", 1u32)
            .unwrap();
        config
            .set_filter_property("ImplDescription.EncoderDescription.encoder.CodecID", codec::HEVC)
            .unwrap();
        assert_eq!(config.properties().len(), 2);
        assert!(config.matches(&desc));

        config
            .set_filter_property("ImplDescription.EncoderDescription.encoder.CodecID", codec::VP9)
            .unwrap();
        assert!(!config.matches(&desc));
    }

    #[test]
    fn test_rejected_properties_are_not_recorded() {
        let mut config = Config::new();
        assert!(matches!(
            config.set_filter_property("ImplDescription", 1u32),
            Err(Error::UnknownProperty(_))
        ));
        assert!(matches!(
            config.set_filter_property("ImplDescription.Impl", 1u8),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(config.is_empty());
    }
}
