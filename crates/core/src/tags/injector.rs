//! Encoder argument injection for tags.

use crate::codec::TagOptions;

use super::types::{TagField, TagSet};

/// Placeholder replaced by the tag value inside a flag template.
pub const SUBSTITUTION_MARKER: &str = "%s";

/// Turns a tag set into encoder arguments using a format's tag options.
///
/// Tag arguments are spliced directly after the program name. Many encoders
/// stop parsing flags once they see a positional argument such as `-`.
#[derive(Debug, Clone, Copy)]
pub struct TagInjector<'a> {
    options: &'a TagOptions,
}

impl<'a> TagInjector<'a> {
    pub fn new(options: &'a TagOptions) -> Self {
        Self { options }
    }

    /// Builds the tag arguments for fields present in both the tag set and
    /// the options, in fixed field order.
    pub fn arguments(&self, tags: &TagSet) -> Vec<String> {
        let mut args = Vec::new();

        for field in TagField::ALL {
            let (Some(value), Some(template)) = (tags.get(field), self.options.get(&field)) else {
                continue;
            };
            let value = value.to_string();

            if template.contains(SUBSTITUTION_MARKER) {
                args.push(template.replace(SUBSTITUTION_MARKER, &value));
            } else {
                args.push(template.clone());
                args.push(value);
            }
        }

        args
    }

    /// Returns `template` with the tag arguments inserted at position one.
    pub fn inject(&self, template: &[String], tags: Option<&TagSet>) -> Vec<String> {
        let tag_args = tags.map(|t| self.arguments(t)).unwrap_or_default();

        let mut args = Vec::with_capacity(template.len() + tag_args.len());
        let mut rest = template.iter();
        if let Some(program) = rest.next() {
            args.push(program.clone());
        }
        args.extend(tag_args);
        args.extend(rest.cloned());
        args
    }
}
