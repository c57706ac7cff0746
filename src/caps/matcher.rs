//! Filter evaluation against capability descriptors.

use super::ImplDescription;
use super::schema::{LeafValues, SchemaLeaf};
use crate::variant::Variant;

/// A resolved filter constraint.
///
/// The leaf is resolved and type-checked when the property is set, so
/// matching never fails. It only accepts or rejects.
#[derive(Debug, Clone)]
pub struct FilterProperty {
    leaf: &'static SchemaLeaf,
    value: Variant,
}

impl FilterProperty {
    pub(crate) fn new(leaf: &'static SchemaLeaf, value: Variant) -> Self {
        Self { leaf, value }
    }

    /// Property path.
    pub fn path(&self) -> &'static str {
        self.leaf.path
    }

    /// Required value.
    pub fn value(&self) -> &Variant {
        &self.value
    }

    /// Whether `desc` satisfies this property.
    ///
    /// Scalars need equality. Array leaves need at least one equal element.
    pub fn is_satisfied_by(&self, desc: &ImplDescription, scratch: &mut LeafValues) -> bool {
        scratch.clear();
        self.leaf.collect(desc, scratch);
        scratch.iter().any(|v| *v == self.value)
    }
}

/// Whether `desc` satisfies every property (logical AND).
///
/// An empty property set accepts every descriptor.
pub fn matches<'a>(
    desc: &ImplDescription,
    properties: impl IntoIterator<Item = &'a FilterProperty>,
) -> bool {
    let mut scratch = LeafValues::new();
    for property in properties {
        if !property.is_satisfied_by(desc, &mut scratch) {
            tracing::trace!(
                impl_name = %desc.impl_name,
                path = property.path(),
                value = %property.value(),
                "descriptor rejected"
            );
            return false;
        }
    }
    true
}
