// Copyright 2022 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{error::Error, fmt};

use crate::{consts, styling::PropertyType};

/// How a data-driven property binds to vertex attributes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinderMode {
    /// Per-feature, zoom-independent.
    Source,
    /// Per-feature min/max pair interpolated by zoom at draw time.
    Composite,
}

impl fmt::Display for BinderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Composite => f.write_str("composite"),
        }
    }
}

/// Fatal resolver failure: the (type, mode) pair has no packed-float layout.
///
/// Reaching this means the style schema and the binding core disagree about a
/// property, which must not be papered over.
#[derive(Debug, Eq, PartialEq)]
pub enum LayoutError {
    UnsupportedLayout {
        property: String,
        ty: PropertyType,
        mode: BinderMode,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedLayout { property, ty, mode } => write!(
                f,
                "no attribute layout for `{property}` ({ty} value, {mode} binding)"
            ),
        }
    }
}

impl Error for LayoutError {}

// Properties whose shader attribute name is not a mechanical transform of the
// property name.
const NAME_EXCEPTIONS: &[(&str, &[&str])] = &[
    ("text-opacity", &["opacity"]),
    ("icon-opacity", &["opacity"]),
    ("text-color", &["fill_color"]),
    ("icon-color", &["fill_color"]),
    ("text-halo-color", &["halo_color"]),
    ("icon-halo-color", &["halo_color"]),
    ("text-halo-blur", &["halo_blur"]),
    ("icon-halo-blur", &["halo_blur"]),
    ("text-halo-width", &["halo_width"]),
    ("icon-halo-width", &["halo_width"]),
    ("line-gap-width", &["gapwidth"]),
    ("line-pattern", &["pattern_to", "pattern_from"]),
    ("fill-pattern", &["pattern_to", "pattern_from"]),
    ("fill-extrusion-pattern", &["pattern_to", "pattern_from"]),
];

fn is_pattern_property(property: &str) -> bool {
    matches!(
        property,
        "line-pattern" | "fill-pattern" | "fill-extrusion-pattern"
    )
}

/// Shader attribute base names for a paint property.
///
/// Pattern properties expand to two attributes (`pattern_to`, `pattern_from`);
/// everything else gets one name, derived by stripping the layer-kind prefix
/// and turning dashes into underscores unless the exception table says
/// otherwise.
pub fn paint_attribute_names(property: &str, layer_kind: &str) -> Vec<String> {
    if let Some((_, names)) = NAME_EXCEPTIONS.iter().find(|(name, _)| *name == property) {
        return names.iter().map(|name| (*name).to_owned()).collect();
    }

    let base = property
        .strip_prefix(layer_kind)
        .and_then(|rest| rest.strip_prefix('-'))
        .unwrap_or(property);

    vec![base.replace('-', "_")]
}

/// Packed-float component width for one attribute of a data-driven property.
pub fn attribute_layout(
    property: &str,
    ty: PropertyType,
    mode: BinderMode,
) -> Result<u32, LayoutError> {
    // Pattern attributes carry a tl/br rectangle whatever the declared type.
    if is_pattern_property(property) {
        return Ok(consts::PATTERN_COMPONENTS);
    }

    match (ty, mode) {
        (PropertyType::Color, BinderMode::Source) => Ok(2),
        (PropertyType::Color, BinderMode::Composite) => Ok(4),
        (PropertyType::Number, BinderMode::Source) => Ok(1),
        (PropertyType::Number, BinderMode::Composite) => Ok(2),
        (ty, mode) => Err(LayoutError::UnsupportedLayout {
            property: property.to_owned(),
            ty,
            mode,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mechanical_name_transform() {
        assert_eq!(paint_attribute_names("line-width", "line"), vec!["width"]);
        assert_eq!(
            paint_attribute_names("fill-extrusion-base", "fill-extrusion"),
            vec!["base"]
        );
        assert_eq!(
            paint_attribute_names("circle-stroke-color", "circle"),
            vec!["stroke_color"]
        );
    }

    #[test]
    fn exception_names() {
        assert_eq!(paint_attribute_names("text-color", "text"), vec!["fill_color"]);
        assert_eq!(
            paint_attribute_names("line-gap-width", "line"),
            vec!["gapwidth"]
        );
    }

    #[test]
    fn pattern_properties_get_two_names() {
        assert_eq!(
            paint_attribute_names("line-pattern", "line"),
            vec!["pattern_to", "pattern_from"]
        );
    }

    #[test]
    fn layout_widths() {
        assert_eq!(
            attribute_layout("line-color", PropertyType::Color, BinderMode::Source),
            Ok(2)
        );
        assert_eq!(
            attribute_layout("line-color", PropertyType::Color, BinderMode::Composite),
            Ok(4)
        );
        assert_eq!(
            attribute_layout("line-width", PropertyType::Number, BinderMode::Source),
            Ok(1)
        );
        assert_eq!(
            attribute_layout("line-width", PropertyType::Number, BinderMode::Composite),
            Ok(2)
        );
    }

    #[test]
    fn pattern_layout_overrides_type() {
        assert_eq!(
            attribute_layout("fill-pattern", PropertyType::Pattern, BinderMode::Source),
            Ok(4)
        );
        assert_eq!(
            attribute_layout(
                "fill-extrusion-pattern",
                PropertyType::Pattern,
                BinderMode::Composite
            ),
            Ok(4)
        );
    }

    #[test]
    fn unknown_pair_is_fatal() {
        let result = attribute_layout("line-dasharray", PropertyType::Pattern, BinderMode::Source);

        assert_eq!(
            result,
            Err(LayoutError::UnsupportedLayout {
                property: "line-dasharray".to_owned(),
                ty: PropertyType::Pattern,
                mode: BinderMode::Source,
            })
        );
    }
}
