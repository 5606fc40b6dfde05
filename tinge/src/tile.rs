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

use crate::consts;

/// Identity of the tile a draw call targets, consumed only when computing
/// pixel-space pattern uniforms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileIdentity {
    /// Zoom the map is currently rendered at.
    pub zoom: f32,
    pub canonical_x: u32,
    pub canonical_y: u32,
    pub canonical_z: u8,
    /// World copy offset for wrapped (antimeridian-crossing) tiles.
    pub wrap: i32,
    pub tile_size: u32,
}

impl TileIdentity {
    pub fn new(zoom: f32, canonical_x: u32, canonical_y: u32, canonical_z: u8) -> Self {
        Self {
            zoom,
            canonical_x,
            canonical_y,
            canonical_z,
            wrap: 0,
            tile_size: consts::DEFAULT_TILE_SIZE,
        }
    }

    pub fn with_wrap(mut self, wrap: i32) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Position of the tile's top-left corner in world pixels at the nearest
    /// integer zoom.
    pub fn pixel_coord(&self) -> (i64, i64) {
        let zoom_diff = self.zoom.floor() as i32 - i32::from(self.canonical_z);
        let tile_size_at_zoom = f64::from(self.tile_size) * f64::from(zoom_diff).exp2();

        let world_x = f64::from(self.canonical_x)
            + f64::from(self.wrap) * f64::from(self.canonical_z).exp2();
        let pixel_x = (tile_size_at_zoom * world_x) as i64;
        let pixel_y = (tile_size_at_zoom * f64::from(self.canonical_y)) as i64;

        (pixel_x, pixel_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_coord_at_tile_zoom() {
        let tile = TileIdentity::new(2.0, 3, 1, 2);

        assert_eq!(tile.pixel_coord(), (3 * 512, 512));
    }

    #[test]
    fn pixel_coord_overzoomed() {
        // Rendering a z2 tile at zoom 3 doubles its pixel extent.
        let tile = TileIdentity::new(3.0, 1, 0, 2);

        assert_eq!(tile.pixel_coord(), (1024, 0));
    }

    #[test]
    fn pixel_coord_wrapped() {
        let tile = TileIdentity::new(1.0, 0, 0, 1).with_wrap(-1);

        assert_eq!(tile.pixel_coord(), (-1024, 0));
    }
}
