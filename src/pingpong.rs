//! Double-buffer swap protocol for the cell state.
//!
//! A compute dispatch over the whole grid cannot safely read and write the
//! same buffer (neighbor lookups would race with writes), so generations
//! alternate between two storage buffers. Both binding combinations are
//! precomputed once and addressed by step parity; nothing is ever swapped in
//! place.

use wgpu::util::DeviceExt;

/// Buffer read by the step with this parity.
pub fn input_slot(step: u64) -> usize {
    (step % 2) as usize
}

/// Buffer written by the step with this parity. Always the other one.
pub fn output_slot(step: u64) -> usize {
    ((step + 1) % 2) as usize
}

/// Slot whose bind group the render pass should use given the step counter
/// *after* any compute this frame: the parity of the most recently executed
/// step. Before the first step both buffers hold the seed pattern, so slot 0
/// is as good as either.
pub fn render_slot(step: u64) -> usize {
    input_slot(step.saturating_sub(1))
}

/// The two cell-state storage buffers plus the two precomputed bind groups
/// that wire them to the shared layout. Group 0 reads buffer 0 and writes
/// buffer 1; group 1 is the reverse.
pub struct CellBuffers {
    #[allow(dead_code)] // bound through the bind groups; owned here
    buffers: [wgpu::Buffer; 2],
    bind_groups: [wgpu::BindGroup; 2],
}

impl CellBuffers {
    /// Allocates both storage buffers, uploads the same seed pattern into
    /// each, and builds the two parity bind groups against `layout`.
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        seed_words: &[u32],
    ) -> Self {
        let buffers = [
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Cell State A"),
                contents: bytemuck::cast_slice(seed_words),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            }),
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Cell State B"),
                contents: bytemuck::cast_slice(seed_words),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            }),
        ];

        let bind_groups = [0u64, 1].map(|parity| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(if parity == 0 {
                    "Cell Bind Group A"
                } else {
                    "Cell Bind Group B"
                }),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: buffers[input_slot(parity)].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffers[output_slot(parity)].as_entire_binding(),
                    },
                ],
            })
        });

        Self {
            buffers,
            bind_groups,
        }
    }

    /// Bind group for the compute dispatch at `step`.
    pub fn select(&self, step: u64) -> &wgpu::BindGroup {
        &self.bind_groups[input_slot(step)]
    }

    /// Bind group the render pass should draw with, given the post-compute
    /// step counter.
    pub fn select_rendered(&self, step: u64) -> &wgpu::BindGroup {
        &self.bind_groups[render_slot(step)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_self_aliasing_for_any_parity() {
        for step in 0..16u64 {
            assert_ne!(input_slot(step), output_slot(step));
        }
    }

    #[test]
    fn ping_pong_invariant_holds_for_consecutive_steps() {
        // The buffer written at step n is the buffer read at step n + 1, and
        // vice versa.
        for step in 0..64u64 {
            assert_eq!(output_slot(step), input_slot(step + 1));
            assert_eq!(input_slot(step), output_slot(step + 1));
        }
    }

    #[test]
    fn slots_cover_both_buffers() {
        assert_eq!(input_slot(0), 0);
        assert_eq!(output_slot(0), 1);
        assert_eq!(input_slot(1), 1);
        assert_eq!(output_slot(1), 0);
    }

    #[test]
    fn render_follows_most_recent_step() {
        // Before any step the seed in slot 0 is shown.
        assert_eq!(render_slot(0), 0);
        // After step n executes (counter already incremented to n + 1) the
        // render pass uses the same bind group that step n dispatched with.
        for step in 0..64u64 {
            assert_eq!(render_slot(step + 1), input_slot(step));
        }
    }

    #[test]
    fn render_selection_is_stable_between_steps() {
        // Frames where the pacer declines reuse the previous selection.
        let after_step_3 = render_slot(4);
        assert_eq!(after_step_3, render_slot(4));
        assert_eq!(after_step_3, input_slot(3));
    }
}
