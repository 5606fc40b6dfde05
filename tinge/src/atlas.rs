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

use etagere::AtlasAllocator;
use rustc_hash::FxHashMap;

use crate::consts;

/// Placement of one pattern image inside the atlas texture, in atlas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImagePosition {
    pub tl: [f32; 2],
    pub br: [f32; 2],
    pub pixel_ratio: f32,
}

impl ImagePosition {
    /// The position as the `[tl.x, tl.y, br.x, br.y]` quad pattern binders
    /// encode.
    pub fn quad(&self) -> [f32; 4] {
        [self.tl[0], self.tl[1], self.br[0], self.br[1]]
    }

    pub fn width(&self) -> f32 {
        self.br[0] - self.tl[0]
    }

    pub fn height(&self) -> f32 {
        self.br[1] - self.tl[1]
    }
}

/// Resolved pattern placements, keyed by pattern name.
pub type ImagePositions = FxHashMap<String, ImagePosition>;

/// Shelf-packs named pattern images and hands out the [`ImagePositions`]
/// binders resolve against.
///
/// Uploading pixels into the atlas texture is the renderer's concern; this
/// type only owns the geometry.
pub struct PatternAtlas {
    allocator: AtlasAllocator,
    positions: ImagePositions,
}

impl PatternAtlas {
    pub fn new() -> Self {
        Self::with_size(consts::ATLAS_SIZE, consts::ATLAS_SIZE)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            allocator: AtlasAllocator::new(etagere::size2(width as i32, height as i32)),
            positions: ImagePositions::default(),
        }
    }

    /// Allocates space for a pattern image and records its position.
    ///
    /// Returns `None` when the atlas is full. Adding a name twice returns the
    /// already-recorded position.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        width: u32,
        height: u32,
        pixel_ratio: f32,
    ) -> Option<ImagePosition> {
        let name = name.into();
        if let Some(position) = self.positions.get(&name) {
            return Some(*position);
        }

        let allocation = self
            .allocator
            .allocate(etagere::size2(width as i32, height as i32))?;

        let min = allocation.rectangle.min;
        let position = ImagePosition {
            tl: [min.x as f32, min.y as f32],
            // Allocations may be padded; the image extent is authoritative.
            br: [min.x as f32 + width as f32, min.y as f32 + height as f32],
            pixel_ratio,
        };

        self.positions.insert(name, position);

        Some(position)
    }

    pub fn position(&self, name: &str) -> Option<&ImagePosition> {
        self.positions.get(name)
    }

    pub fn positions(&self) -> &ImagePositions {
        &self.positions
    }
}

impl Default for PatternAtlas {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PatternAtlas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternAtlas")
            .field("positions", &self.positions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_do_not_overlap() {
        let mut atlas = PatternAtlas::with_size(128, 128);

        let a = atlas.add("stripes", 32, 32, 1.0).unwrap();
        let b = atlas.add("dots", 32, 32, 1.0).unwrap();

        let disjoint_x = a.br[0] <= b.tl[0] || b.br[0] <= a.tl[0];
        let disjoint_y = a.br[1] <= b.tl[1] || b.br[1] <= a.tl[1];
        assert!(disjoint_x || disjoint_y);
    }

    #[test]
    fn adding_twice_reuses_the_allocation() {
        let mut atlas = PatternAtlas::with_size(128, 128);

        let first = atlas.add("stripes", 32, 32, 2.0).unwrap();
        let second = atlas.add("stripes", 32, 32, 2.0).unwrap();

        assert_eq!(first, second);
        assert_eq!(atlas.positions().len(), 1);
    }

    #[test]
    fn full_atlas_returns_none() {
        let mut atlas = PatternAtlas::with_size(16, 16);

        assert!(atlas.add("too-big", 64, 64, 1.0).is_none());
    }
}
