//! Compute pass encoding for the GPU backend

use strata_core::brush::BrushStamp;
use strata_core::grid::Slot;
use strata_core::rule::RuleParams;

use super::config::{BrushParams, StepParams};
use super::GpuBackend;

impl GpuBackend {
    /// Queue one generation step. Returns once the pass is submitted.
    pub(super) fn dispatch_step(&self, from: Slot, to: Slot, rule: &RuleParams) {
        let params = StepParams::new(&self.shape, from, to, rule);
        self.queue
            .write_buffer(&self.buffers.step_params, 0, bytemuck::bytes_of(&params));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Step Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Step"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.step);
            pass.set_bind_group(0, &self.bind_groups.step[from.buffer.index()], &[]);
            pass.dispatch_workgroups(self.workgroups, 1, 1);
        }
        self.queue.submit(Some(encoder.finish()));

        tracing::trace!(
            "🎮 Step {:?}[{}] -> {:?}[{}] ({} workgroups of {})",
            from.buffer,
            from.layer,
            to.buffer,
            to.layer,
            self.workgroups,
            self.workgroup_size
        );
    }

    /// Queue one brush stamp into `slot`
    pub(super) fn dispatch_stamp(&self, slot: Slot, stamp: &BrushStamp) {
        let params = BrushParams::new(&self.shape, slot, stamp);
        self.queue
            .write_buffer(&self.buffers.brush_params, 0, bytemuck::bytes_of(&params));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Brush Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Brush"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.brush);
            pass.set_bind_group(0, &self.bind_groups.brush[slot.buffer.index()], &[]);
            pass.dispatch_workgroups(self.workgroups, 1, 1);
        }
        self.queue.submit(Some(encoder.finish()));
    }
}
