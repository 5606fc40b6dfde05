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

use std::{fmt, sync::Arc};

use rustc_hash::FxHashMap;

use crate::{
    feature::{Feature, Value},
    styling::PaintValue,
};

/// Global parameters an expression is evaluated against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvaluationParams {
    pub zoom: f32,
}

impl EvaluationParams {
    pub const fn new(zoom: f32) -> Self {
        Self { zoom }
    }
}

/// Externally managed per-feature state (hover, selection, ...), keyed by
/// state name. Diffing is the store's concern; this core only ever sees the
/// states of changed features.
pub type FeatureState = FxHashMap<String, Value>;

type EvalFn = dyn Fn(&EvaluationParams, &Feature, Option<&FeatureState>) -> PaintValue
    + Send
    + Sync;

/// The expression-evaluator seam.
///
/// Evaluation semantics (interpolation curves, feature property coercion,
/// defaults) live entirely behind this closure; the binding core only decides
/// *when* to evaluate and where the result lands.
///
/// Cloning is cheap and shares the underlying closure, which is what lets a
/// binder refresh its expression from the live layer during a feature-state
/// update.
#[derive(Clone)]
pub struct DataDrivenExpression {
    eval: Arc<EvalFn>,
    is_state_dependent: bool,
}

impl DataDrivenExpression {
    pub fn new(
        eval: impl Fn(&EvaluationParams, &Feature, Option<&FeatureState>) -> PaintValue
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            eval: Arc::new(eval),
            is_state_dependent: false,
        }
    }

    /// Marks the expression as consulting feature state, making its binder
    /// eligible for partial re-population on state changes.
    pub fn state_dependent(mut self) -> Self {
        self.is_state_dependent = true;
        self
    }

    pub fn evaluate(
        &self,
        params: &EvaluationParams,
        feature: &Feature,
        state: Option<&FeatureState>,
    ) -> PaintValue {
        (self.eval)(params, feature, state)
    }

    pub fn is_state_dependent(&self) -> bool {
        self.is_state_dependent
    }
}

impl fmt::Debug for DataDrivenExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataDrivenExpression")
            .field("is_state_dependent", &self.is_state_dependent)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_dependence_flag() {
        let expression = DataDrivenExpression::new(|_, _, _| PaintValue::Number(1.0));
        assert!(!expression.is_state_dependent());

        let expression = expression.state_dependent();
        assert!(expression.is_state_dependent());
    }

    #[test]
    fn clones_share_the_closure() {
        let expression =
            DataDrivenExpression::new(|params, _, _| PaintValue::Number(params.zoom * 2.0));
        let clone = expression.clone();

        let feature = Feature::default();
        let params = EvaluationParams::new(3.0);

        assert_eq!(
            expression.evaluate(&params, &feature, None),
            clone.evaluate(&params, &feature, None),
        );
    }
}
