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

/// A single uniform value, ready for upload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Scalar(f32),
    Pair([f32; 2]),
    Quad([f32; 4]),
}

/// The uniform-upload seam of the graphics context.
///
/// Binders write draw-call uniforms through this trait; how the values reach
/// the shader (uniform buffer, push constants, GL uniforms) is the
/// implementor's concern.
pub trait UniformSink {
    fn set(&mut self, name: &str, value: UniformValue);
}

/// Ordered collector of uniform values.
///
/// Suitable as a staging area before an implementor-specific upload, and as
/// the inspection point in tests.
#[derive(Clone, Debug, Default)]
pub struct UniformValues {
    values: Vec<(String, UniformValue)>,
}

impl UniformValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, UniformValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl UniformSink for UniformValues {
    fn set(&mut self, name: &str, value: UniformValue) {
        self.values.push((name.to_owned(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_sets_win() {
        let mut values = UniformValues::new();
        values.set("u_opacity", UniformValue::Scalar(0.5));
        values.set("u_opacity", UniformValue::Scalar(1.0));

        assert_eq!(values.get("u_opacity"), Some(UniformValue::Scalar(1.0)));
    }
}
