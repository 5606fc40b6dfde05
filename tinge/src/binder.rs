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

use std::mem;

use tracing::trace;

use crate::{
    atlas::{ImagePosition, ImagePositions},
    expression::{DataDrivenExpression, EvaluationParams, FeatureState},
    feature::Feature,
    paint_array::PaintVertexArray,
    styling::{pack_color, CrossfadeParameters, PaintValue, PropertyType},
    tile::TileIdentity,
    uniform::{UniformSink, UniformValue},
};

#[cfg(feature = "gpu")]
use crate::gpu::{self, Context, PaintVertexBuffer};

/// Running aggregate over every numeric value a binder has evaluated, used
/// downstream for normalization (e.g. the widest line in a tile).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BinderStatistics {
    pub max: f32,
}

impl Default for BinderStatistics {
    fn default() -> Self {
        Self {
            max: f32::NEG_INFINITY,
        }
    }
}

impl BinderStatistics {
    fn fold(&mut self, value: f32) {
        self.max = self.max.max(value);
    }
}

/// Which of the two parallel pattern buffers a draw call reads.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CrossfadeDirection {
    ZoomIn,
    #[default]
    ZoomOut,
}

impl CrossfadeDirection {
    #[allow(clippy::float_cmp)]
    pub fn from_parameters(crossfade: &CrossfadeParameters) -> Self {
        if crossfade.from_scale == 2.0 {
            Self::ZoomIn
        } else {
            Self::ZoomOut
        }
    }
}

/// The binder state that crosses the worker boundary when a populated
/// configuration is handed to the render thread.
///
/// Realized GPU buffers never cross; they are created at upload time on the
/// receiving side.
#[derive(Debug)]
pub enum PaintTransfer {
    /// Constant-family binders: nothing crosses.
    Uniform,
    Array {
        data: PaintVertexArray,
        statistics: BinderStatistics,
    },
    ArrayPair {
        zoom_in: PaintVertexArray,
        zoom_out: PaintVertexArray,
    },
}

#[derive(Debug)]
pub struct ConstantBinder {
    value: PaintValue,
    override_value: Option<PaintValue>,
    uniform_names: Vec<String>,
}

impl ConstantBinder {
    fn set_uniforms(&self, sink: &mut dyn UniformSink) {
        let value = self.override_value.as_ref().unwrap_or(&self.value);
        let encoded = match value {
            PaintValue::Color(color) => UniformValue::Quad(color.to_array()),
            PaintValue::Number(number) => UniformValue::Scalar(*number),
            PaintValue::Pattern(name) => {
                trace!(pattern = %name, "constant pattern value has no plain uniform encoding");
                return;
            }
        };

        for name in &self.uniform_names {
            sink.set(name, encoded);
        }
    }
}

#[derive(Debug)]
pub struct CrossFadedConstantBinder {
    value: PaintValue,
    uniform_names: Vec<String>,
    pattern_to: Option<ImagePosition>,
    pattern_from: Option<ImagePosition>,
}

impl CrossFadedConstantBinder {
    /// Stores the atlas placements of the `{to, from}` pattern pair resolved
    /// for the layer's constant pattern value.
    fn set_pattern_positions(&mut self, to: ImagePosition, from: ImagePosition) {
        self.pattern_to = Some(to);
        self.pattern_from = Some(from);
    }

    fn set_uniforms(&self, sink: &mut dyn UniformSink) {
        if let Some(to) = &self.pattern_to {
            sink.set("u_pattern_to", UniformValue::Quad(to.quad()));
            sink.set("u_pixel_ratio_to", UniformValue::Scalar(to.pixel_ratio));
        }
        if let Some(from) = &self.pattern_from {
            sink.set("u_pattern_from", UniformValue::Quad(from.quad()));
            sink.set("u_pixel_ratio_from", UniformValue::Scalar(from.pixel_ratio));
        }
    }
}

#[derive(Debug)]
pub struct SourceExpressionBinder {
    expression: DataDrivenExpression,
    ty: PropertyType,
    attribute_names: Vec<String>,
    statistics: BinderStatistics,
    paint_array: PaintVertexArray,
    #[cfg(feature = "gpu")]
    buffer: Option<PaintVertexBuffer>,
}

impl SourceExpressionBinder {
    fn encode(&mut self, feature: &Feature, state: Option<&FeatureState>) -> Vec<f32> {
        // Source expressions are zoom-independent; zoom 0 by convention.
        let value = self
            .expression
            .evaluate(&EvaluationParams::new(0.0), feature, state);

        encode_plain(
            self.ty,
            &value,
            self.paint_array.components(),
            &mut self.statistics,
        )
    }
}

#[derive(Debug)]
pub struct CompositeExpressionBinder {
    expression: DataDrivenExpression,
    ty: PropertyType,
    attribute_names: Vec<String>,
    use_integer_zoom: bool,
    zoom: f32,
    statistics: BinderStatistics,
    paint_array: PaintVertexArray,
    #[cfg(feature = "gpu")]
    buffer: Option<PaintVertexBuffer>,
}

impl CompositeExpressionBinder {
    fn encode(&mut self, feature: &Feature, state: Option<&FeatureState>) -> Vec<f32> {
        let min = self
            .expression
            .evaluate(&EvaluationParams::new(self.zoom), feature, state);
        let max = self
            .expression
            .evaluate(&EvaluationParams::new(self.zoom + 1.0), feature, state);

        match (self.ty, min, max) {
            (PropertyType::Number, PaintValue::Number(min), PaintValue::Number(max)) => {
                self.statistics.fold(min);
                self.statistics.fold(max);

                vec![min, max]
            }
            (PropertyType::Color, PaintValue::Color(min), PaintValue::Color(max)) => {
                let min = pack_color(min);
                let max = pack_color(max);

                vec![min[0], min[1], max[0], max[1]]
            }
            (ty, min, max) => {
                trace!(?ty, ?min, ?max, "composite evaluation does not match property type");

                vec![0.0; self.paint_array.components() as usize]
            }
        }
    }

    /// Blend position between the stored zoom-Z and zoom-Z+1 samples.
    pub fn interpolation_factor(&self, current_zoom: f32) -> f32 {
        let current_zoom = if self.use_integer_zoom {
            current_zoom.floor()
        } else {
            current_zoom
        };

        (current_zoom - self.zoom).clamp(0.0, 1.0)
    }
}

#[derive(Debug)]
pub struct CrossFadedCompositeBinder {
    expression: DataDrivenExpression,
    zoom: f32,
    attribute_names: Vec<String>,
    zoom_in: PaintVertexArray,
    zoom_out: PaintVertexArray,
    direction: CrossfadeDirection,
    #[cfg(feature = "gpu")]
    zoom_in_buffer: Option<PaintVertexBuffer>,
    #[cfg(feature = "gpu")]
    zoom_out_buffer: Option<PaintVertexBuffer>,
}

impl CrossFadedCompositeBinder {
    /// Writes both parallel buffers for `[start, end)`.
    ///
    /// The cross-fade direction is unknown at population time, so the
    /// zoom-in pairing (mid, min) and the zoom-out pairing (mid, max) are
    /// both materialized; the draw call picks one.
    ///
    /// If any of the three resolved pattern images is missing from the
    /// atlas, the whole range is left untouched.
    fn set_paint_values(
        &mut self,
        start: u32,
        end: u32,
        feature: &Feature,
        state: Option<&FeatureState>,
        image_positions: &ImagePositions,
    ) {
        let resolve = |zoom: f32| -> Option<ImagePosition> {
            let value = self
                .expression
                .evaluate(&EvaluationParams::new(zoom), feature, state);
            let name = value.pattern_name()?;

            image_positions.get(name).copied()
        };

        let (Some(min), Some(mid), Some(max)) = (
            resolve(self.zoom - 1.0),
            resolve(self.zoom),
            resolve(self.zoom + 1.0),
        ) else {
            trace!(
                feature = ?feature.id,
                "missing atlas position for a resolved pattern; skipping range"
            );
            return;
        };

        let zoom_in_vertex = concat_quads(mid.quad(), min.quad());
        let zoom_out_vertex = concat_quads(mid.quad(), max.quad());

        for index in start..end {
            self.zoom_in.write(index, &zoom_in_vertex);
            self.zoom_out.write(index, &zoom_out_vertex);
        }
    }

    pub fn selected_array(&self) -> &PaintVertexArray {
        match self.direction {
            CrossfadeDirection::ZoomIn => &self.zoom_in,
            CrossfadeDirection::ZoomOut => &self.zoom_out,
        }
    }

    #[cfg(feature = "gpu")]
    fn selected_buffer(&self) -> Option<&PaintVertexBuffer> {
        match self.direction {
            CrossfadeDirection::ZoomIn => self.zoom_in_buffer.as_ref(),
            CrossfadeDirection::ZoomOut => self.zoom_out_buffer.as_ref(),
        }
    }
}

fn concat_quads(to: [f32; 4], from: [f32; 4]) -> [f32; 8] {
    [
        to[0], to[1], to[2], to[3], from[0], from[1], from[2], from[3],
    ]
}

fn encode_plain(
    ty: PropertyType,
    value: &PaintValue,
    components: u32,
    statistics: &mut BinderStatistics,
) -> Vec<f32> {
    match (ty, value) {
        (PropertyType::Number, PaintValue::Number(number)) => {
            statistics.fold(*number);

            vec![*number]
        }
        (PropertyType::Color, PaintValue::Color(color)) => pack_color(*color).to_vec(),
        (ty, value) => {
            trace!(?ty, ?value, "evaluation does not match property type");

            vec![0.0; components as usize]
        }
    }
}

fn pixel_coord_uniforms(sink: &mut dyn UniformSink, tile: &TileIdentity) {
    let (pixel_x, pixel_y) = tile.pixel_coord();

    // Split into 16-bit halves; shader float precision cannot hold full
    // world-pixel coordinates at high zooms.
    sink.set(
        "u_pixel_coord_upper",
        UniformValue::Pair([(pixel_x >> 16) as f32, (pixel_y >> 16) as f32]),
    );
    sink.set(
        "u_pixel_coord_lower",
        UniformValue::Pair([(pixel_x & 0xFFFF) as f32, (pixel_y & 0xFFFF) as f32]),
    );
}

fn crossfade_uniforms(sink: &mut dyn UniformSink, crossfade: Option<&CrossfadeParameters>) {
    if let Some(crossfade) = crossfade {
        sink.set(
            "u_scale",
            UniformValue::Pair([crossfade.from_scale, crossfade.to_scale]),
        );
        sink.set("u_fade", UniformValue::Scalar(crossfade.t));
    }
}

/// Per-property strategy for getting paint values onto the GPU.
///
/// Each variant owns zero or more vertex arrays and knows how to populate,
/// partially update, upload, and destroy them, and which uniforms and shader
/// defines it contributes. All operations are part of the common contract;
/// a no-op is a valid implementation.
#[derive(Debug)]
pub enum Binder {
    Constant(ConstantBinder),
    CrossFadedConstant(CrossFadedConstantBinder),
    Source(SourceExpressionBinder),
    Composite(CompositeExpressionBinder),
    CrossFadedComposite(CrossFadedCompositeBinder),
}

impl Binder {
    pub(crate) fn constant(value: PaintValue, attribute_names: &[String]) -> Self {
        Self::Constant(ConstantBinder {
            value,
            override_value: None,
            uniform_names: uniform_names(attribute_names),
        })
    }

    pub(crate) fn cross_faded_constant(value: PaintValue, attribute_names: &[String]) -> Self {
        Self::CrossFadedConstant(CrossFadedConstantBinder {
            value,
            uniform_names: uniform_names(attribute_names),
            pattern_to: None,
            pattern_from: None,
        })
    }

    pub(crate) fn source(
        expression: DataDrivenExpression,
        ty: PropertyType,
        attribute_names: Vec<String>,
        components: u32,
    ) -> Self {
        Self::Source(SourceExpressionBinder {
            expression,
            ty,
            attribute_names,
            statistics: BinderStatistics::default(),
            paint_array: PaintVertexArray::new(components),
            #[cfg(feature = "gpu")]
            buffer: None,
        })
    }

    pub(crate) fn composite(
        expression: DataDrivenExpression,
        ty: PropertyType,
        attribute_names: Vec<String>,
        components: u32,
        use_integer_zoom: bool,
        zoom: f32,
    ) -> Self {
        Self::Composite(CompositeExpressionBinder {
            expression,
            ty,
            attribute_names,
            use_integer_zoom,
            zoom,
            statistics: BinderStatistics::default(),
            paint_array: PaintVertexArray::new(components),
            #[cfg(feature = "gpu")]
            buffer: None,
        })
    }

    pub(crate) fn cross_faded_composite(
        expression: DataDrivenExpression,
        zoom: f32,
        attribute_names: Vec<String>,
        components: u32,
    ) -> Self {
        Self::CrossFadedComposite(CrossFadedCompositeBinder {
            expression,
            zoom,
            attribute_names,
            zoom_in: PaintVertexArray::new(components),
            zoom_out: PaintVertexArray::new(components),
            direction: CrossfadeDirection::default(),
            #[cfg(feature = "gpu")]
            zoom_in_buffer: None,
            #[cfg(feature = "gpu")]
            zoom_out_buffer: None,
        })
    }

    /// Evaluates the property for `feature` and appends encoded values until
    /// the paint array holds `target_length` vertices.
    pub fn populate_paint_array(
        &mut self,
        target_length: u32,
        feature: &Feature,
        image_positions: &ImagePositions,
    ) {
        match self {
            Self::Constant(_) | Self::CrossFadedConstant(_) => {}
            Self::Source(binder) => {
                let vertex = binder.encode(feature, None);
                binder.paint_array.extend_to(target_length, &vertex);
            }
            Self::Composite(binder) => {
                let vertex = binder.encode(feature, None);
                binder.paint_array.extend_to(target_length, &vertex);
            }
            Self::CrossFadedComposite(binder) => {
                let start = binder.zoom_in.vertex_count();
                binder.zoom_in.resize_to(target_length);
                binder.zoom_out.resize_to(target_length);
                binder.set_paint_values(start, target_length, feature, None, image_positions);
            }
        }
    }

    /// Re-evaluates with feature state and overwrites `[start, end)` in
    /// place. Only data-driven variants respond.
    pub fn update_paint_array(
        &mut self,
        start: u32,
        end: u32,
        feature: &Feature,
        state: &FeatureState,
        image_positions: &ImagePositions,
    ) {
        match self {
            Self::Constant(_) | Self::CrossFadedConstant(_) => {}
            Self::Source(binder) => {
                let vertex = binder.encode(feature, Some(state));
                binder.paint_array.overwrite(start, end, &vertex);
            }
            Self::Composite(binder) => {
                let vertex = binder.encode(feature, Some(state));
                binder.paint_array.overwrite(start, end, &vertex);
            }
            Self::CrossFadedComposite(binder) => {
                binder.set_paint_values(start, end, feature, Some(state), image_positions);
            }
        }
    }

    /// Shader compile-time flags for uniform-bound properties, letting the
    /// shader variant skip the corresponding attribute reads.
    pub fn defines(&self) -> Vec<String> {
        let names = match self {
            Self::Constant(binder) => &binder.uniform_names,
            Self::CrossFadedConstant(binder) => &binder.uniform_names,
            _ => return Vec::new(),
        };

        names
            .iter()
            .map(|name| format!("HAS_UNIFORM_{name}"))
            .collect()
    }

    pub fn set_uniforms(&self, sink: &mut dyn UniformSink, current_zoom: f32) {
        match self {
            Self::Constant(binder) => binder.set_uniforms(sink),
            Self::CrossFadedConstant(binder) => binder.set_uniforms(sink),
            Self::Source(_) | Self::CrossFadedComposite(_) => {}
            Self::Composite(binder) => {
                let name = format!("u_{}_t", binder.attribute_names[0]);
                sink.set(
                    &name,
                    UniformValue::Scalar(binder.interpolation_factor(current_zoom)),
                );
            }
        }
    }

    /// Per-draw-call uniforms that depend on the tile being drawn; only
    /// pattern binders contribute.
    pub fn set_tile_specific_uniforms(
        &self,
        sink: &mut dyn UniformSink,
        tile: &TileIdentity,
        crossfade: Option<&CrossfadeParameters>,
    ) {
        match self {
            Self::CrossFadedConstant(_) | Self::CrossFadedComposite(_) => {
                pixel_coord_uniforms(sink, tile);
                crossfade_uniforms(sink, crossfade);
            }
            _ => {}
        }
    }

    /// Whether feature-state changes can alter this binder's output.
    pub fn is_state_dependent(&self) -> bool {
        match self {
            Self::Constant(_) | Self::CrossFadedConstant(_) => false,
            Self::Source(binder) => binder.expression.is_state_dependent(),
            Self::Composite(binder) => binder.expression.is_state_dependent(),
            Self::CrossFadedComposite(binder) => binder.expression.is_state_dependent(),
        }
    }

    /// Refreshes the expression from the live layer so that updates pick up
    /// style changes made since population.
    pub fn set_expression(&mut self, expression: DataDrivenExpression) {
        match self {
            Self::Constant(_) | Self::CrossFadedConstant(_) => {}
            Self::Source(binder) => binder.expression = expression,
            Self::Composite(binder) => binder.expression = expression,
            Self::CrossFadedComposite(binder) => binder.expression = expression,
        }
    }

    /// The effective constant value of a uniform-bound binder; the pattern
    /// name here is what the caller resolves through the atlas before calling
    /// [`set_constant_pattern_positions`](Self::set_constant_pattern_positions).
    pub fn constant_value(&self) -> Option<&PaintValue> {
        match self {
            Self::Constant(binder) => {
                Some(binder.override_value.as_ref().unwrap_or(&binder.value))
            }
            Self::CrossFadedConstant(binder) => Some(&binder.value),
            _ => None,
        }
    }

    pub fn set_constant_override(&mut self, value: Option<PaintValue>) {
        if let Self::Constant(binder) = self {
            binder.override_value = value;
        }
    }

    pub fn set_constant_pattern_positions(&mut self, to: ImagePosition, from: ImagePosition) {
        if let Self::CrossFadedConstant(binder) = self {
            binder.set_pattern_positions(to, from);
        }
    }

    pub fn update_pattern_buffers(&mut self, crossfade: &CrossfadeParameters) {
        if let Self::CrossFadedComposite(binder) = self {
            binder.direction = CrossfadeDirection::from_parameters(crossfade);
        }
    }

    /// Largest numeric value evaluated so far; `0.0` for variants that never
    /// evaluate numbers.
    pub fn max_value(&self) -> f32 {
        match self {
            Self::Source(binder) => binder.statistics.max,
            Self::Composite(binder) => binder.statistics.max,
            _ => 0.0,
        }
    }

    /// The vertex data a draw call would read: `None` for uniform-bound
    /// variants, the cross-fade-selected array for pattern composites.
    pub fn vertex_data(&self) -> Option<&PaintVertexArray> {
        match self {
            Self::Constant(_) | Self::CrossFadedConstant(_) => None,
            Self::Source(binder) => Some(&binder.paint_array),
            Self::Composite(binder) => Some(&binder.paint_array),
            Self::CrossFadedComposite(binder) => Some(binder.selected_array()),
        }
    }

    pub fn attribute_names(&self) -> &[String] {
        match self {
            Self::Constant(_) | Self::CrossFadedConstant(_) => &[],
            Self::Source(binder) => &binder.attribute_names,
            Self::Composite(binder) => &binder.attribute_names,
            Self::CrossFadedComposite(binder) => &binder.attribute_names,
        }
    }

    /// Extracts the state that crosses the worker boundary, leaving this
    /// binder drained.
    pub fn export_paint_data(&mut self) -> PaintTransfer {
        match self {
            Self::Constant(_) | Self::CrossFadedConstant(_) => PaintTransfer::Uniform,
            Self::Source(binder) => PaintTransfer::Array {
                data: mem::take(&mut binder.paint_array),
                statistics: binder.statistics,
            },
            Self::Composite(binder) => PaintTransfer::Array {
                data: mem::take(&mut binder.paint_array),
                statistics: binder.statistics,
            },
            Self::CrossFadedComposite(binder) => PaintTransfer::ArrayPair {
                zoom_in: mem::take(&mut binder.zoom_in),
                zoom_out: mem::take(&mut binder.zoom_out),
            },
        }
    }

    pub fn import_paint_data(&mut self, transfer: PaintTransfer) {
        match (self, transfer) {
            (Self::Source(binder), PaintTransfer::Array { data, statistics }) => {
                binder.paint_array = data;
                binder.statistics = statistics;
            }
            (Self::Composite(binder), PaintTransfer::Array { data, statistics }) => {
                binder.paint_array = data;
                binder.statistics = statistics;
            }
            (Self::CrossFadedComposite(binder), PaintTransfer::ArrayPair { zoom_in, zoom_out }) => {
                binder.zoom_in = zoom_in;
                binder.zoom_out = zoom_out;
            }
            (Self::Constant(_) | Self::CrossFadedConstant(_), PaintTransfer::Uniform) => {}
            _ => tracing::warn!("paint transfer shape does not match binder variant"),
        }
    }

    /// Realizes GPU buffers from the accumulated arrays, re-using resident
    /// buffers when the size is unchanged.
    #[cfg(feature = "gpu")]
    pub fn upload(&mut self, context: &Context<'_>) {
        match self {
            Self::Constant(_) | Self::CrossFadedConstant(_) => {}
            Self::Source(binder) => {
                let label = binder.attribute_names[0].clone();
                gpu::upload_paint_array(context, &binder.paint_array, &mut binder.buffer, &label);
            }
            Self::Composite(binder) => {
                let label = binder.attribute_names[0].clone();
                gpu::upload_paint_array(context, &binder.paint_array, &mut binder.buffer, &label);
            }
            Self::CrossFadedComposite(binder) => {
                gpu::upload_paint_array(
                    context,
                    &binder.zoom_in,
                    &mut binder.zoom_in_buffer,
                    "pattern_zoom_in",
                );
                gpu::upload_paint_array(
                    context,
                    &binder.zoom_out,
                    &mut binder.zoom_out_buffer,
                    "pattern_zoom_out",
                );
            }
        }
    }

    /// Releases GPU buffers; absent buffers are a no-op.
    #[cfg(feature = "gpu")]
    pub fn destroy(&mut self) {
        match self {
            Self::Constant(_) | Self::CrossFadedConstant(_) => {}
            Self::Source(binder) => {
                if let Some(buffer) = binder.buffer.take() {
                    buffer.destroy();
                }
            }
            Self::Composite(binder) => {
                if let Some(buffer) = binder.buffer.take() {
                    buffer.destroy();
                }
            }
            Self::CrossFadedComposite(binder) => {
                if let Some(buffer) = binder.zoom_in_buffer.take() {
                    buffer.destroy();
                }
                if let Some(buffer) = binder.zoom_out_buffer.take() {
                    buffer.destroy();
                }
            }
        }
    }

    /// The resident buffer a draw call binds, if one has been uploaded.
    ///
    /// For cross-faded composites this is whichever of the zoom-in/zoom-out
    /// buffers [`update_pattern_buffers`](Self::update_pattern_buffers) last
    /// selected.
    #[cfg(feature = "gpu")]
    pub fn paint_vertex_buffer(&self) -> Option<&PaintVertexBuffer> {
        match self {
            Self::Constant(_) | Self::CrossFadedConstant(_) => None,
            Self::Source(binder) => binder.buffer.as_ref(),
            Self::Composite(binder) => binder.buffer.as_ref(),
            Self::CrossFadedComposite(binder) => binder.selected_buffer(),
        }
    }
}

fn uniform_names(attribute_names: &[String]) -> Vec<String> {
    attribute_names
        .iter()
        .map(|name| format!("u_{name}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{styling::Color, uniform::UniformValues};

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    fn width_expression() -> DataDrivenExpression {
        DataDrivenExpression::new(|_, feature, _| {
            PaintValue::Number(
                feature
                    .property("width")
                    .and_then(|value| value.as_number())
                    .unwrap_or(1.0) as f32,
            )
        })
    }

    fn position(offset: f32) -> ImagePosition {
        ImagePosition {
            tl: [offset, offset],
            br: [offset + 16.0, offset + 16.0],
            pixel_ratio: 1.0,
        }
    }

    #[test]
    fn constant_binder_defines_and_no_vertex_data() {
        let binder = Binder::constant(
            PaintValue::Color(Color::default()),
            &names(&["fill_color"]),
        );

        assert_eq!(binder.defines(), vec!["HAS_UNIFORM_u_fill_color"]);
        assert!(binder.vertex_data().is_none());
    }

    #[test]
    fn constant_binder_override_wins() {
        let mut binder = Binder::constant(PaintValue::Number(1.0), &names(&["opacity"]));
        binder.set_constant_override(Some(PaintValue::Number(0.25)));

        let mut sink = UniformValues::new();
        binder.set_uniforms(&mut sink, 0.0);

        assert_eq!(sink.get("u_opacity"), Some(UniformValue::Scalar(0.25)));
    }

    #[test]
    fn source_binder_array_grows_per_feature() {
        let mut binder =
            Binder::source(width_expression(), PropertyType::Number, names(&["width"]), 1);
        let positions = ImagePositions::default();

        for (index, width) in [2.0, 5.0, 3.0].into_iter().enumerate() {
            let feature = Feature::new(None).with_property("width", width);
            binder.populate_paint_array(index as u32 + 1, &feature, &positions);
        }

        let array = binder.vertex_data().unwrap();
        assert_eq!(array.vertex_count(), 3);
        assert_eq!(array.as_slice(), &[2.0, 5.0, 3.0]);
        assert_eq!(binder.max_value(), 5.0);
    }

    #[test]
    fn source_binder_packs_colors_into_two_floats() {
        let expression = DataDrivenExpression::new(|_, _, _| {
            PaintValue::Color(Color::new(1.0, 0.0, 0.0, 1.0))
        });
        let mut binder = Binder::source(expression, PropertyType::Color, names(&["color"]), 2);

        binder.populate_paint_array(2, &Feature::default(), &ImagePositions::default());

        let array = binder.vertex_data().unwrap();
        assert_eq!(array.components(), 2);
        assert_eq!(array.vertex(0), &[255.0 * 256.0, 255.0]);
    }

    #[test]
    fn composite_binder_stores_min_max_pairs() {
        let expression =
            DataDrivenExpression::new(|params, _, _| PaintValue::Number(params.zoom));
        let mut binder = Binder::composite(
            expression,
            PropertyType::Number,
            names(&["width"]),
            2,
            false,
            5.0,
        );

        binder.populate_paint_array(1, &Feature::default(), &ImagePositions::default());

        assert_eq!(binder.vertex_data().unwrap().vertex(0), &[5.0, 6.0]);
    }

    #[test]
    fn composite_interpolation_factor() {
        let binder = CompositeExpressionBinder {
            expression: width_expression(),
            ty: PropertyType::Number,
            attribute_names: names(&["width"]),
            use_integer_zoom: false,
            zoom: 5.0,
            statistics: BinderStatistics::default(),
            paint_array: PaintVertexArray::new(2),
            #[cfg(feature = "gpu")]
            buffer: None,
        };

        assert_eq!(binder.interpolation_factor(5.5), 0.5);
        assert_eq!(binder.interpolation_factor(4.0), 0.0);
        assert_eq!(binder.interpolation_factor(7.0), 1.0);
    }

    #[test]
    fn composite_interpolation_factor_integer_zoom() {
        let binder = CompositeExpressionBinder {
            expression: width_expression(),
            ty: PropertyType::Number,
            attribute_names: names(&["width"]),
            use_integer_zoom: true,
            zoom: 5.0,
            statistics: BinderStatistics::default(),
            paint_array: PaintVertexArray::new(2),
            #[cfg(feature = "gpu")]
            buffer: None,
        };

        assert_eq!(binder.interpolation_factor(5.5), 0.0);
        assert_eq!(binder.interpolation_factor(6.5), 1.0);
    }

    #[test]
    fn composite_uniform_is_the_interpolation_factor() {
        let expression =
            DataDrivenExpression::new(|params, _, _| PaintValue::Number(params.zoom));
        let binder = Binder::composite(
            expression,
            PropertyType::Number,
            names(&["width"]),
            2,
            false,
            5.0,
        );

        let mut sink = UniformValues::new();
        binder.set_uniforms(&mut sink, 5.25);

        assert_eq!(sink.get("u_width_t"), Some(UniformValue::Scalar(0.25)));
    }

    fn pattern_expression() -> DataDrivenExpression {
        DataDrivenExpression::new(|_, _, _| PaintValue::Pattern("stripes".to_owned()))
    }

    fn pattern_binder() -> Binder {
        Binder::cross_faded_composite(
            pattern_expression(),
            5.0,
            names(&["pattern_to", "pattern_from"]),
            8,
        )
    }

    #[test]
    fn cross_faded_composite_builds_both_pairings() {
        let mut binder = pattern_binder();
        let mut positions = ImagePositions::default();
        positions.insert("stripes".to_owned(), position(32.0));

        binder.populate_paint_array(2, &Feature::default(), &positions);

        let quad = position(32.0).quad();
        let expected = concat_quads(quad, quad);

        let Binder::CrossFadedComposite(inner) = &binder else {
            unreachable!();
        };
        assert_eq!(inner.zoom_in.vertex_count(), 2);
        assert_eq!(inner.zoom_in.vertex(0), &expected);
        assert_eq!(inner.zoom_out.vertex(1), &expected);
    }

    #[test]
    fn cross_faded_composite_missing_position_leaves_zeros() {
        let mut binder = pattern_binder();

        binder.populate_paint_array(1, &Feature::default(), &ImagePositions::default());

        let Binder::CrossFadedComposite(inner) = &binder else {
            unreachable!();
        };
        assert_eq!(inner.zoom_in.vertex_count(), 1);
        assert_eq!(inner.zoom_in.vertex(0), &[0.0; 8]);
        assert_eq!(inner.zoom_out.vertex(0), &[0.0; 8]);
    }

    #[test]
    fn crossfade_selects_zoom_in_when_fading_from_double_scale() {
        let mut binder = pattern_binder();
        let mut positions = ImagePositions::default();
        positions.insert("stripes".to_owned(), position(16.0));
        binder.populate_paint_array(1, &Feature::default(), &positions);

        binder.update_pattern_buffers(&CrossfadeParameters {
            from_scale: 2.0,
            to_scale: 1.0,
            t: 0.5,
        });
        let Binder::CrossFadedComposite(inner) = &binder else {
            unreachable!();
        };
        assert_eq!(inner.direction, CrossfadeDirection::ZoomIn);
        assert!(std::ptr::eq(inner.selected_array(), &inner.zoom_in));

        let mut binder = pattern_binder();
        binder.update_pattern_buffers(&CrossfadeParameters {
            from_scale: 0.5,
            to_scale: 1.0,
            t: 0.5,
        });
        let Binder::CrossFadedComposite(inner) = &binder else {
            unreachable!();
        };
        assert_eq!(inner.direction, CrossfadeDirection::ZoomOut);
    }

    #[test]
    fn cross_faded_constant_tile_uniforms() {
        let binder = Binder::cross_faded_constant(
            PaintValue::Pattern("stripes".to_owned()),
            &names(&["pattern_to", "pattern_from"]),
        );

        let tile = TileIdentity::new(2.0, 3, 1, 2);
        let crossfade = CrossfadeParameters {
            from_scale: 1.0,
            to_scale: 2.0,
            t: 0.75,
        };

        let mut sink = UniformValues::new();
        binder.set_tile_specific_uniforms(&mut sink, &tile, Some(&crossfade));

        // 3 * 512 = 1536 world pixels: upper half 0, lower half 1536.
        assert_eq!(
            sink.get("u_pixel_coord_upper"),
            Some(UniformValue::Pair([0.0, 0.0]))
        );
        assert_eq!(
            sink.get("u_pixel_coord_lower"),
            Some(UniformValue::Pair([1536.0, 512.0]))
        );
        assert_eq!(sink.get("u_fade"), Some(UniformValue::Scalar(0.75)));
        assert_eq!(sink.get("u_scale"), Some(UniformValue::Pair([1.0, 2.0])));
    }

    #[test]
    fn cross_faded_constant_pattern_uniforms() {
        let mut binder = Binder::cross_faded_constant(
            PaintValue::Pattern("stripes".to_owned()),
            &names(&["pattern_to", "pattern_from"]),
        );
        binder.set_constant_pattern_positions(position(0.0), position(64.0));

        let mut sink = UniformValues::new();
        binder.set_uniforms(&mut sink, 0.0);

        assert_eq!(
            sink.get("u_pattern_to"),
            Some(UniformValue::Quad([0.0, 0.0, 16.0, 16.0]))
        );
        assert_eq!(
            sink.get("u_pattern_from"),
            Some(UniformValue::Quad([64.0, 64.0, 80.0, 80.0]))
        );
        assert_eq!(sink.get("u_pixel_ratio_to"), Some(UniformValue::Scalar(1.0)));
    }

    #[test]
    fn update_overwrites_only_the_range() {
        let expression = DataDrivenExpression::new(|_, feature, state| {
            let base = feature
                .property("width")
                .and_then(|value| value.as_number())
                .unwrap_or(0.0) as f32;
            let boost = state
                .and_then(|state| state.get("hover"))
                .and_then(|value| value.as_bool())
                .map_or(0.0, |hovered| if hovered { 10.0 } else { 0.0 });

            PaintValue::Number(base + boost)
        })
        .state_dependent();

        let mut binder = Binder::source(expression, PropertyType::Number, names(&["width"]), 1);
        let positions = ImagePositions::default();

        for index in 0..3u32 {
            let feature = Feature::new(Some(index as u64)).with_property("width", 1.0);
            binder.populate_paint_array(index + 1, &feature, &positions);
        }

        let mut state = FeatureState::default();
        state.insert("hover".to_owned(), true.into());
        let feature = Feature::new(Some(1)).with_property("width", 1.0);
        binder.update_paint_array(1, 2, &feature, &state, &positions);

        assert_eq!(binder.vertex_data().unwrap().as_slice(), &[1.0, 11.0, 1.0]);
    }

    #[test]
    fn transfer_round_trip() {
        let mut binder =
            Binder::source(width_expression(), PropertyType::Number, names(&["width"]), 1);
        let feature = Feature::new(None).with_property("width", 4.0);
        binder.populate_paint_array(1, &feature, &ImagePositions::default());

        let transfer = binder.export_paint_data();
        assert!(binder.vertex_data().unwrap().is_empty());

        let mut receiver =
            Binder::source(width_expression(), PropertyType::Number, names(&["width"]), 1);
        receiver.import_paint_data(transfer);

        assert_eq!(receiver.vertex_data().unwrap().as_slice(), &[4.0]);
        assert_eq!(receiver.max_value(), 4.0);
    }
}
