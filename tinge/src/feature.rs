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

use crate::expression::FeatureState;

/// A feature property or state value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// One vector-tile feature, as handed to the binding core during tile
/// parsing.
///
/// Only features carrying a stable [`id`](Self::id) can receive later
/// state-driven updates; features without ids are populated once and never
/// revisited.
#[derive(Clone, Debug, Default)]
pub struct Feature {
    pub id: Option<u64>,
    pub properties: FxHashMap<String, Value>,
}

impl Feature {
    pub fn new(id: Option<u64>) -> Self {
        Self {
            id,
            properties: FxHashMap::default(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Random access into a parsed tile layer's features, used to re-fetch a
/// feature by its population-time index during state updates.
pub trait FeatureSource {
    fn feature_by_index(&self, index: u32) -> Option<Feature>;
}

impl FeatureSource for [Feature] {
    fn feature_by_index(&self, index: u32) -> Option<Feature> {
        self.get(index as usize).cloned()
    }
}

impl FeatureSource for Vec<Feature> {
    fn feature_by_index(&self, index: u32) -> Option<Feature> {
        self.as_slice().feature_by_index(index)
    }
}

/// Changed feature states, keyed by feature id.
pub type FeatureStates = FxHashMap<u64, FeatureState>;
