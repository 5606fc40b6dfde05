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

/// Side length of the pattern atlas, in pixels.
pub const ATLAS_SIZE: u32 = 4_096;

/// Packed-float components per pattern attribute (a `tl`/`br` rectangle).
pub const PATTERN_COMPONENTS: u32 = 4;

/// Default tile extent in pixels, used when computing pixel-space pattern
/// uniforms.
pub const DEFAULT_TILE_SIZE: u32 = 512;
