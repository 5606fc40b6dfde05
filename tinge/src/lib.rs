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

#![doc(test(attr(deny(warnings))))]

//! tinge translates a map layer's declarative paint properties into the two
//! forms a GPU pipeline consumes: shader uniform values, or per-vertex
//! attribute buffers.
//!
//! Each property may be a fixed value, a per-feature data-driven value, or a
//! zoom-interpolated composite value; a [`ProgramConfiguration`] picks the
//! right binding strategy per property, grows feature-indexed paint buffers
//! while a tile is parsed, and later re-populates just the slices of features
//! whose state changed.
//!
//! ## Example
//!
//! ```
//! use tinge::prelude::*;
//!
//! let layer = StyleLayer::new("roads", "line")
//!     // A constant property binds as a uniform.
//!     .with_property(PaintProperty::constant(
//!         "line-color",
//!         PropertyType::Color,
//!         PaintValue::Color(Color::new(0.9, 0.4, 0.1, 1.0)),
//!     ))
//!     // A data-driven property binds as a vertex attribute.
//!     .with_property(PaintProperty::source(
//!         "line-width",
//!         PropertyType::Number,
//!         DataDrivenExpression::new(|_, feature, _| {
//!             PaintValue::Number(
//!                 feature
//!                     .property("lanes")
//!                     .and_then(|lanes| lanes.as_number())
//!                     .unwrap_or(1.0) as f32,
//!             )
//!         }),
//!     ));
//!
//! let mut configuration = ProgramConfiguration::new_dynamic(&layer, 14.0, |_| true)?;
//!
//! // Tile parsing drives population once per feature.
//! let image_positions = ImagePositions::default();
//! for (index, lanes) in [1.0, 3.0].into_iter().enumerate() {
//!     let feature = Feature::new(Some(index as u64)).with_property("lanes", lanes);
//!     configuration.populate_paint_arrays(index as u32 + 1, &feature, index as u32, &image_positions);
//! }
//!
//! // The cache key and defines select the matching shader variant.
//! assert_eq!(configuration.cache_key(), "/a_line-width/u_line-color");
//! assert_eq!(configuration.defines(), vec!["HAS_UNIFORM_u_color"]);
//!
//! // The constant stays a uniform; the data-driven property produced
//! // per-vertex data.
//! let widths = configuration.binder("line-width").unwrap().vertex_data().unwrap();
//! assert_eq!(widths.as_slice(), &[1.0, 3.0]);
//! # Ok::<(), tinge::LayoutError>(())
//! ```
//!
//! Population may run on a worker thread; see
//! [`ProgramConfiguration::into_transferable`] for the hand-off, and the
//! `gpu` feature (on by default) for buffer realization through
//! [`gpu::Context`].

pub mod atlas;
mod attribute;
mod binder;
pub mod consts;
mod expression;
mod feature;
#[cfg(feature = "gpu")]
pub mod gpu;
mod layer;
mod paint_array;
mod program;
pub mod styling;
mod tile;
mod uniform;

pub use self::{
    attribute::{attribute_layout, paint_attribute_names, BinderMode, LayoutError},
    binder::{
        Binder, BinderStatistics, CompositeExpressionBinder, ConstantBinder,
        CrossFadedCompositeBinder, CrossFadedConstantBinder, CrossfadeDirection, PaintTransfer,
        SourceExpressionBinder,
    },
    expression::{DataDrivenExpression, EvaluationParams, FeatureState},
    feature::{Feature, FeatureSource, FeatureStates, Value},
    layer::StyleLayer,
    paint_array::PaintVertexArray,
    program::{
        FeaturePosition, FeaturePositionMap, ProgramConfiguration, ProgramConfigurationSet,
        ProgramConfigurationTransfer,
    },
    tile::TileIdentity,
    uniform::{UniformSink, UniformValue, UniformValues},
};

pub mod prelude {
    pub use crate::{
        atlas::{ImagePosition, ImagePositions, PatternAtlas},
        styling::{
            pack_color, pack_uint8_pair, Color, CrossfadeParameters, PaintProperty, PaintValue,
            PropertyType, PropertyValue,
        },
        DataDrivenExpression, EvaluationParams, Feature, FeatureSource, FeatureState,
        FeatureStates, ProgramConfiguration, ProgramConfigurationSet, StyleLayer, TileIdentity,
        UniformSink, UniformValue, UniformValues, Value,
    };
}
