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

use crate::styling::PaintProperty;

/// A style layer's identity and declarative paint properties.
///
/// The binding core reads layers; it never mutates them. During feature-state
/// updates the live layer is consulted again so that binders pick up style
/// changes that happened since population.
///
/// # Examples
///
/// ```
/// use tinge::prelude::*;
///
/// let layer = StyleLayer::new("roads", "line").with_property(PaintProperty::constant(
///     "line-color",
///     PropertyType::Color,
///     PaintValue::Color(Color::new(1.0, 0.0, 0.0, 1.0)),
/// ));
///
/// assert!(layer.property("line-color").is_some());
/// ```
#[derive(Clone, Debug)]
pub struct StyleLayer {
    id: String,
    kind: String,
    properties: Vec<PaintProperty>,
}

impl StyleLayer {
    /// `kind` is the layer type prefix shared by its property names, e.g.
    /// `"line"` for `line-width` and `line-color`.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: PaintProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn properties(&self) -> &[PaintProperty] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PaintProperty> {
        self.properties.iter().find(|property| property.name == name)
    }
}
