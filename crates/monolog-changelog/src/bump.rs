//! Version bump calculation
//!
//! A package's bump is the highest severity among its descriptors, where a
//! breaking descriptor always counts as major. Any change at all warrants at
//! least a patch release.

use semver::Version;

use monolog_core::BumpSeverity;

use crate::types::{AttributedChange, ChangeDescriptor, TagPosition};

/// Severity of a single descriptor with the breaking override applied
pub fn descriptor_severity(descriptor: &ChangeDescriptor) -> BumpSeverity {
    if descriptor.breaking {
        BumpSeverity::Major
    } else {
        descriptor.bump.unwrap_or_default()
    }
}

/// Aggregate severity of a list of descriptors
pub fn calculate<'a, I>(descriptors: I) -> BumpSeverity
where
    I: IntoIterator<Item = &'a ChangeDescriptor>,
{
    let mut any = false;
    let mut severity = BumpSeverity::None;

    for descriptor in descriptors {
        any = true;
        severity = severity.max(descriptor_severity(descriptor));
    }

    if any {
        severity.max(BumpSeverity::Patch)
    } else {
        BumpSeverity::None
    }
}

/// Aggregate severity of the changes made after `since`.
///
/// With no tag every change counts.
pub fn calculate_since(changes: &[AttributedChange], since: Option<&TagPosition>) -> BumpSeverity {
    calculate(
        changes
            .iter()
            .filter(|c| since.map_or(true, |tag| c.sequence > tag.sequence))
            .map(|c| &c.descriptor),
    )
}

/// Next version after applying the aggregate severity of `descriptors`
pub fn next_version<'a, I>(current: &Version, descriptors: I) -> Version
where
    I: IntoIterator<Item = &'a ChangeDescriptor>,
{
    calculate(descriptors).apply(current)
}
