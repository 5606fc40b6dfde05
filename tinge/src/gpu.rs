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

use tracing::debug;
use wgpu::util::DeviceExt;

use crate::paint_array::PaintVertexArray;

/// The slice of the graphics context this crate touches: buffer creation and
/// in-place updates. Must only be used on the thread holding the device.
#[derive(Clone, Copy, Debug)]
pub struct Context<'c> {
    pub device: &'c wgpu::Device,
    pub queue: &'c wgpu::Queue,
}

/// A realized paint vertex buffer.
#[derive(Debug)]
pub struct PaintVertexBuffer {
    buffer: wgpu::Buffer,
    len: u32,
}

impl PaintVertexBuffer {
    fn new(context: &Context<'_>, data: &[f32], label: &str) -> Self {
        let buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });

        Self {
            buffer,
            len: data.len() as u32,
        }
    }

    fn update(&self, context: &Context<'_>, data: &[f32]) {
        context
            .queue
            .write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Float count.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn destroy(self) {
        self.buffer.destroy();
    }
}

/// Realizes `array` into `slot`, writing in place when the resident buffer
/// has the same size and recreating it otherwise. Empty arrays release the
/// slot.
pub(crate) fn upload_paint_array(
    context: &Context<'_>,
    array: &PaintVertexArray,
    slot: &mut Option<PaintVertexBuffer>,
    label: &str,
) {
    match slot {
        Some(buffer) if buffer.len as usize == array.len() => {
            buffer.update(context, array.as_slice());
        }
        _ => {
            if let Some(stale) = slot.take() {
                stale.destroy();
            }

            if !array.is_empty() {
                debug!(label, floats = array.len(), "creating paint vertex buffer");
                *slot = Some(PaintVertexBuffer::new(context, array.as_slice(), label));
            }
        }
    }
}
