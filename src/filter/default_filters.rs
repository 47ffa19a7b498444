// Copyright © 2024 Pathway

use super::{ColumnSource, Predicate, SpecialFilterStrategy};
use crate::metadata::MetaDataInfo;

/// Composes `filter` with the special-column policy and then with `invert`.
///
/// Inversion negates the composed predicate. Where the answer is known, the inverted
/// selection is the exact complement of the plain one; unknown answers stay unknown and
/// are selected by neither.
pub fn add_default_filters<'a, S: ColumnSource>(
    source: &'a S,
    strategy: SpecialFilterStrategy,
    invert: bool,
    filter: Predicate<'a>,
) -> Predicate<'a> {
    let composed: Predicate<'a> = match strategy {
        SpecialFilterStrategy::KeepSpecial => Box::new(move |name: &str| {
            if source.is_special(name) {
                MetaDataInfo::Yes
            } else {
                filter(name)
            }
        }),
        SpecialFilterStrategy::RemoveSpecial => Box::new(move |name: &str| {
            if source.is_special(name) {
                MetaDataInfo::No
            } else {
                filter(name)
            }
        }),
        SpecialFilterStrategy::FilterSpecial => filter,
    };
    if invert {
        Box::new(move |name: &str| !composed(name))
    } else {
        composed
    }
}
