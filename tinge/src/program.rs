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

use rustc_hash::FxHashMap;
#[cfg(feature = "gpu")]
use tracing::debug;

use crate::{
    atlas::{ImagePosition, ImagePositions},
    attribute::{attribute_layout, paint_attribute_names, BinderMode, LayoutError},
    binder::{Binder, PaintTransfer},
    feature::{Feature, FeatureSource, FeatureStates},
    layer::StyleLayer,
    styling::{CrossfadeParameters, PaintValue, PropertyValue},
    tile::TileIdentity,
    uniform::UniformSink,
};

#[cfg(feature = "gpu")]
use crate::gpu::{Context, PaintVertexBuffer};

/// One contiguous vertex-array slice written for a feature.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FeaturePosition {
    pub feature_index: u32,
    pub start: u32,
    pub end: u32,
}

/// Arena of per-feature buffer ranges with a feature-id secondary index.
///
/// Built during population, consulted during feature-state updates. Features
/// without stable ids never enter the map and therefore can never be
/// partially re-populated.
#[derive(Clone, Debug, Default)]
pub struct FeaturePositionMap {
    positions: Vec<FeaturePosition>,
    index: FxHashMap<u64, Vec<u32>>,
}

impl FeaturePositionMap {
    pub fn add(&mut self, id: u64, feature_index: u32, start: u32, end: u32) {
        let slot = self.positions.len() as u32;
        self.positions.push(FeaturePosition {
            feature_index,
            start,
            end,
        });
        self.index.entry(id).or_default().push(slot);
    }

    pub fn positions_for(&self, id: u64) -> impl Iterator<Item = &FeaturePosition> + '_ {
        self.index
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&slot| &self.positions[slot as usize])
    }

    pub fn contains(&self, id: u64) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// The subset of a configuration's state that crosses the worker boundary.
///
/// Produced by [`ProgramConfiguration::into_transferable`] on the population
/// side and consumed by [`ProgramConfiguration::from_transferable`] on the
/// render side, which rebinds live expressions from the layer.
#[derive(Debug)]
pub struct ProgramConfigurationTransfer {
    cache_key: String,
    binders: Vec<(String, PaintTransfer)>,
    feature_map: FeaturePositionMap,
    buffer_offset: u32,
}

/// Per-layer aggregate of paint-property binders for one tile at one zoom.
///
/// # Examples
///
/// ```
/// use tinge::prelude::*;
///
/// let layer = StyleLayer::new("roads", "line").with_property(PaintProperty::source(
///     "line-width",
///     PropertyType::Number,
///     DataDrivenExpression::new(|_, _, _| PaintValue::Number(2.0)),
/// ));
///
/// let mut configuration = ProgramConfiguration::new_dynamic(&layer, 14.0, |_| true).unwrap();
///
/// let feature = Feature::new(Some(7));
/// configuration.populate_paint_arrays(4, &feature, 0, &ImagePositions::default());
///
/// assert_eq!(configuration.cache_key(), "/a_line-width");
/// ```
#[derive(Debug)]
pub struct ProgramConfiguration {
    binders: Vec<(String, Binder)>,
    cache_key: String,
    feature_map: FeaturePositionMap,
    buffer_offset: u32,
}

impl ProgramConfiguration {
    /// Builds the binder set for `layer` at `zoom`.
    ///
    /// Every data-driven-capable paint property passing `filter` receives a
    /// binder; the variant follows from the cross-fade flag and the shape of
    /// the property's value. The cache key summarizes the outcome so the
    /// matching shader variant can be selected.
    pub fn new_dynamic(
        layer: &StyleLayer,
        zoom: f32,
        filter: impl Fn(&str) -> bool,
    ) -> Result<Self, LayoutError> {
        let mut binders = Vec::new();
        let mut key_fragments = Vec::new();

        for property in layer.properties() {
            if !property.data_driven_capable || !filter(&property.name) {
                continue;
            }

            let names = paint_attribute_names(&property.name, layer.kind());

            let binder = match &property.value {
                PropertyValue::Constant(value) => {
                    key_fragments.push(format!("/u_{}", property.name));

                    if property.cross_faded {
                        Binder::cross_faded_constant(value.clone(), &names)
                    } else {
                        Binder::constant(value.clone(), &names)
                    }
                }
                PropertyValue::Source(expression) => {
                    key_fragments.push(format!("/a_{}", property.name));

                    let layout =
                        attribute_layout(&property.name, property.ty, BinderMode::Source)?;
                    let components = names.len() as u32 * layout;

                    if property.cross_faded {
                        Binder::cross_faded_composite(expression.clone(), zoom, names, components)
                    } else {
                        Binder::source(expression.clone(), property.ty, names, components)
                    }
                }
                PropertyValue::Composite(expression) => {
                    key_fragments.push(format!("/z_{}", property.name));

                    let layout =
                        attribute_layout(&property.name, property.ty, BinderMode::Composite)?;
                    let components = names.len() as u32 * layout;

                    if property.cross_faded {
                        Binder::cross_faded_composite(expression.clone(), zoom, names, components)
                    } else {
                        Binder::composite(
                            expression.clone(),
                            property.ty,
                            names,
                            components,
                            property.use_integer_zoom,
                            zoom,
                        )
                    }
                }
            };

            binders.push((property.name.clone(), binder));
        }

        key_fragments.sort();

        Ok(Self {
            binders,
            cache_key: key_fragments.concat(),
            feature_map: FeaturePositionMap::default(),
            buffer_offset: 0,
        })
    }

    /// Deterministic summary of which properties bind as uniforms vs.
    /// attributes vs. zoom-interpolated attributes; invariant under property
    /// declaration order.
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    pub fn binder(&self, property: &str) -> Option<&Binder> {
        self.binders
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, binder)| binder)
    }

    pub fn binder_mut(&mut self, property: &str) -> Option<&mut Binder> {
        self.binders
            .iter_mut()
            .find(|(name, _)| name == property)
            .map(|(_, binder)| binder)
    }

    /// Appends paint values for `feature` to every binder until the arrays
    /// hold `new_length` vertices, and records the written range for later
    /// state-driven updates when the feature has a stable id.
    pub fn populate_paint_arrays(
        &mut self,
        new_length: u32,
        feature: &Feature,
        index: u32,
        image_positions: &ImagePositions,
    ) {
        for (_, binder) in &mut self.binders {
            binder.populate_paint_array(new_length, feature, image_positions);
        }

        if let Some(id) = feature.id {
            self.feature_map.add(id, index, self.buffer_offset, new_length);
        }

        self.buffer_offset = new_length;
    }

    /// Re-populates the recorded ranges of every state-dependent binder for
    /// the changed features, refreshing expressions from the live `layer`.
    ///
    /// Returns whether any binder was touched. Ids without recorded ranges
    /// are skipped.
    pub fn update_paint_arrays(
        &mut self,
        feature_states: &FeatureStates,
        source: &dyn FeatureSource,
        layer: &StyleLayer,
        image_positions: &ImagePositions,
    ) -> bool {
        let mut dirty = false;

        for (&id, state) in feature_states {
            for position in self.feature_map.positions_for(id) {
                let Some(feature) = source.feature_by_index(position.feature_index) else {
                    continue;
                };

                for (name, binder) in &mut self.binders {
                    if !binder.is_state_dependent() {
                        continue;
                    }

                    if let Some(expression) = layer
                        .property(name)
                        .and_then(|property| property.value.expression())
                    {
                        binder.set_expression(expression.clone());
                    }

                    binder.update_paint_array(
                        position.start,
                        position.end,
                        &feature,
                        state,
                        image_positions,
                    );
                    dirty = true;
                }
            }
        }

        dirty
    }

    /// Shader compile-time flags across all binders.
    pub fn defines(&self) -> Vec<String> {
        self.binders
            .iter()
            .flat_map(|(_, binder)| binder.defines())
            .collect()
    }

    pub fn set_uniforms(&self, sink: &mut dyn UniformSink, current_zoom: f32) {
        for (_, binder) in &self.binders {
            binder.set_uniforms(sink, current_zoom);
        }
    }

    pub fn set_tile_specific_uniforms(
        &self,
        sink: &mut dyn UniformSink,
        tile: &TileIdentity,
        crossfade: Option<&CrossfadeParameters>,
    ) {
        for (_, binder) in &self.binders {
            binder.set_tile_specific_uniforms(sink, tile, crossfade);
        }
    }

    /// Points every cross-faded binder at whichever of its parallel buffers
    /// matches the current cross-fade direction.
    pub fn update_pattern_paint_buffers(&mut self, crossfade: &CrossfadeParameters) {
        for (_, binder) in &mut self.binders {
            binder.update_pattern_buffers(crossfade);
        }
    }

    pub fn set_constant_pattern_positions(
        &mut self,
        property: &str,
        to: ImagePosition,
        from: ImagePosition,
    ) {
        if let Some(binder) = self.binder_mut(property) {
            binder.set_constant_pattern_positions(to, from);
        }
    }

    pub fn set_constant_override(&mut self, property: &str, value: Option<PaintValue>) {
        if let Some(binder) = self.binder_mut(property) {
            binder.set_constant_override(value);
        }
    }

    /// Largest numeric value evaluated for `property`, `0.0` when the
    /// property is not bound or not numeric.
    pub fn max_value(&self, property: &str) -> f32 {
        self.binder(property).map_or(0.0, Binder::max_value)
    }

    pub fn feature_map(&self) -> &FeaturePositionMap {
        &self.feature_map
    }

    /// Extracts the worker-boundary state, consuming the configuration.
    pub fn into_transferable(mut self) -> ProgramConfigurationTransfer {
        let binders = self
            .binders
            .iter_mut()
            .map(|(name, binder)| (name.clone(), binder.export_paint_data()))
            .collect();

        ProgramConfigurationTransfer {
            cache_key: self.cache_key,
            binders,
            feature_map: self.feature_map,
            buffer_offset: self.buffer_offset,
        }
    }

    /// Rebuilds a configuration on the receiving side of a worker handoff,
    /// rebinding live expressions from `layer` and adopting the transferred
    /// paint data.
    pub fn from_transferable(
        layer: &StyleLayer,
        zoom: f32,
        filter: impl Fn(&str) -> bool,
        transfer: ProgramConfigurationTransfer,
    ) -> Result<Self, LayoutError> {
        let mut configuration = Self::new_dynamic(layer, zoom, filter)?;
        debug_assert_eq!(configuration.cache_key, transfer.cache_key);

        for (name, paint) in transfer.binders {
            if let Some(binder) = configuration.binder_mut(&name) {
                binder.import_paint_data(paint);
            }
        }

        configuration.feature_map = transfer.feature_map;
        configuration.buffer_offset = transfer.buffer_offset;

        Ok(configuration)
    }

    /// Materializes GPU buffers for all binders.
    #[cfg(feature = "gpu")]
    pub fn upload(&mut self, context: &Context<'_>) {
        for (_, binder) in &mut self.binders {
            binder.upload(context);
        }
    }

    /// Releases all binder buffers; each at most once.
    #[cfg(feature = "gpu")]
    pub fn destroy(&mut self) {
        for (_, binder) in &mut self.binders {
            binder.destroy();
        }
    }

    /// The resident vertex buffers a draw call binds, in binder order.
    /// Constant-family binders contribute none.
    #[cfg(feature = "gpu")]
    pub fn paint_vertex_buffers(&self) -> Vec<&PaintVertexBuffer> {
        self.binders
            .iter()
            .filter_map(|(_, binder)| binder.paint_vertex_buffer())
            .collect()
    }
}

/// Per-layer-group aggregate keyed by layer id, coalescing upload scheduling
/// across the layers sharing a tile.
#[derive(Debug)]
pub struct ProgramConfigurationSet {
    configurations: FxHashMap<String, ProgramConfiguration>,
    needs_upload: bool,
}

impl ProgramConfigurationSet {
    pub fn new<'l>(
        layers: impl IntoIterator<Item = &'l StyleLayer>,
        zoom: f32,
        filter: impl Fn(&str) -> bool,
    ) -> Result<Self, LayoutError> {
        let mut configurations = FxHashMap::default();

        for layer in layers {
            configurations.insert(
                layer.id().to_owned(),
                ProgramConfiguration::new_dynamic(layer, zoom, &filter)?,
            );
        }

        Ok(Self {
            configurations,
            needs_upload: false,
        })
    }

    pub fn get(&self, layer_id: &str) -> Option<&ProgramConfiguration> {
        self.configurations.get(layer_id)
    }

    pub fn get_mut(&mut self, layer_id: &str) -> Option<&mut ProgramConfiguration> {
        self.configurations.get_mut(layer_id)
    }

    pub fn populate_paint_arrays(
        &mut self,
        new_length: u32,
        feature: &Feature,
        index: u32,
        image_positions: &ImagePositions,
    ) {
        for configuration in self.configurations.values_mut() {
            configuration.populate_paint_arrays(new_length, feature, index, image_positions);
        }

        self.needs_upload = true;
    }

    pub fn update_paint_arrays(
        &mut self,
        feature_states: &FeatureStates,
        source: &dyn FeatureSource,
        layers: &[StyleLayer],
        image_positions: &ImagePositions,
    ) -> bool {
        let mut dirty = false;

        for layer in layers {
            if let Some(configuration) = self.configurations.get_mut(layer.id()) {
                if configuration.update_paint_arrays(
                    feature_states,
                    source,
                    layer,
                    image_positions,
                ) {
                    self.needs_upload = true;
                    dirty = true;
                }
            }
        }

        dirty
    }

    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }

    /// Uploads every member configuration in one pass; a no-op unless some
    /// member was touched since the last upload.
    #[cfg(feature = "gpu")]
    pub fn upload(&mut self, context: &Context<'_>) {
        if !self.needs_upload {
            return;
        }

        debug!(
            configurations = self.configurations.len(),
            "uploading dirty paint buffers"
        );

        for configuration in self.configurations.values_mut() {
            configuration.upload(context);
        }

        self.needs_upload = false;
    }

    #[cfg(feature = "gpu")]
    pub fn destroy(&mut self) {
        for configuration in self.configurations.values_mut() {
            configuration.destroy();
        }
    }
}
