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

use std::fmt;

use crate::expression::DataDrivenExpression;

/// Straight-alpha RGBA color with components in `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        }
    }
}

/// Combines two 8-bit channel values into a single float that survives the
/// trip through a 32-bit vertex attribute.
///
/// Inputs outside `[0, 255]` are clamped.
pub fn pack_uint8_pair(a: f32, b: f32) -> f32 {
    let a = a.floor().clamp(0.0, 255.0);
    let b = b.floor().clamp(0.0, 255.0);

    256.0 * a + b
}

/// Packs a color into two floats, one per 8-bit channel pair.
pub fn pack_color(color: Color) -> [f32; 2] {
    [
        pack_uint8_pair(255.0 * color.r, 255.0 * color.g),
        pack_uint8_pair(255.0 * color.b, 255.0 * color.a),
    ]
}

/// The result of evaluating a paint property for one feature.
#[derive(Clone, Debug, PartialEq)]
pub enum PaintValue {
    Number(f32),
    Color(Color),
    /// A pattern name, resolved through the image atlas.
    Pattern(String),
}

impl PaintValue {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(color) => Some(*color),
            _ => None,
        }
    }

    pub fn pattern_name(&self) -> Option<&str> {
        match self {
            Self::Pattern(name) => Some(name),
            _ => None,
        }
    }
}

impl From<f32> for PaintValue {
    fn from(value: f32) -> Self {
        Self::Number(value)
    }
}

impl From<Color> for PaintValue {
    fn from(color: Color) -> Self {
        Self::Color(color)
    }
}

/// Value type of a paint property, as declared by the style schema.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PropertyType {
    Color,
    Number,
    Pattern,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color => f.write_str("color"),
            Self::Number => f.write_str("number"),
            Self::Pattern => f.write_str("pattern"),
        }
    }
}

/// How a paint property's value is produced.
#[derive(Clone, Debug)]
pub enum PropertyValue {
    /// One value for the whole layer.
    Constant(PaintValue),
    /// Per-feature, zoom-independent.
    Source(DataDrivenExpression),
    /// Per-feature and zoom-dependent; sampled at two zoom levels and
    /// interpolated at draw time.
    Composite(DataDrivenExpression),
}

impl PropertyValue {
    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    pub fn expression(&self) -> Option<&DataDrivenExpression> {
        match self {
            Self::Constant(_) => None,
            Self::Source(expression) | Self::Composite(expression) => Some(expression),
        }
    }
}

/// A single declarative paint property of a style layer.
///
/// Read-only input to the binding core; owned by the [`StyleLayer`].
///
/// [`StyleLayer`]: crate::StyleLayer
#[derive(Clone, Debug)]
pub struct PaintProperty {
    pub name: String,
    pub ty: PropertyType,
    pub value: PropertyValue,
    /// Pattern properties cross-fade between two images during zoom
    /// transitions and bind through the dedicated cross-faded strategies.
    pub cross_faded: bool,
    /// Floors the draw-time zoom before computing the composite
    /// interpolation factor.
    pub use_integer_zoom: bool,
    /// Properties that the schema forbids from carrying expressions never
    /// receive a binder.
    pub data_driven_capable: bool,
}

impl PaintProperty {
    pub fn constant(name: impl Into<String>, ty: PropertyType, value: PaintValue) -> Self {
        Self::new(name, ty, PropertyValue::Constant(value))
    }

    pub fn source(
        name: impl Into<String>,
        ty: PropertyType,
        expression: DataDrivenExpression,
    ) -> Self {
        Self::new(name, ty, PropertyValue::Source(expression))
    }

    pub fn composite(
        name: impl Into<String>,
        ty: PropertyType,
        expression: DataDrivenExpression,
    ) -> Self {
        Self::new(name, ty, PropertyValue::Composite(expression))
    }

    fn new(name: impl Into<String>, ty: PropertyType, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            ty,
            value,
            cross_faded: false,
            use_integer_zoom: false,
            data_driven_capable: true,
        }
    }

    pub fn with_cross_fade(mut self) -> Self {
        self.cross_faded = true;
        self
    }

    pub fn with_integer_zoom(mut self) -> Self {
        self.use_integer_zoom = true;
        self
    }

    pub fn with_data_driven_capable(mut self, data_driven_capable: bool) -> Self {
        self.data_driven_capable = data_driven_capable;
        self
    }
}

/// Draw-time description of an in-progress pattern cross-fade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrossfadeParameters {
    /// Scale of the image being faded from; `2.0` when fading from the
    /// coarser zoom level.
    pub from_scale: f32,
    pub to_scale: f32,
    /// Blend position in `[0.0, 1.0]`.
    pub t: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_pair_is_reversible() {
        let packed = pack_uint8_pair(17.0, 250.0);

        assert_eq!((packed / 256.0).floor(), 17.0);
        assert_eq!(packed % 256.0, 250.0);
    }

    #[test]
    fn packed_pair_clamps() {
        assert_eq!(pack_uint8_pair(-1.0, 300.0), 255.0);
        assert_eq!(pack_uint8_pair(256.0, 0.0), 255.0 * 256.0);
    }

    #[test]
    fn packed_color_channel_pairs() {
        let color = Color::new(1.0, 0.0, 0.0, 1.0);
        let packed = pack_color(color);

        assert_eq!(packed[0], 255.0 * 256.0);
        assert_eq!(packed[1], 255.0);
    }
}
