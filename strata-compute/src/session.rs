//! # Session - One Run of the Automaton
//!
//! A session owns the backend (and through it both generation buffers) plus
//! the run state. Every command goes through `&mut self`, so commands are a
//! strict sequence and a step is never observed half done.
//!
//! The session decides which slot a command may touch:
//! - painting and seeding write only the current generation's slot
//! - a step reads the current slot and writes the next one (other buffer)
//! - rendering and readback accept any generation up to the current one

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use strata_core::brush::{self, BrushStamp};
use strata_core::cell;
use strata_core::config::StrataConfig;
use strata_core::error::{StrataError, StrataResult};
use strata_core::frame::Frame;
use strata_core::grid::{GridShape, Slot};
use strata_core::rule::RuleParams;
use strata_core::run::RunState;
use strata_core::traits::{BackendStats, GenerationBackend};

use crate::backend::GpuBackend;

/// A run over a boxed backend chosen at runtime
pub type DynSession = Session<Box<dyn GenerationBackend>>;

pub struct Session<B: GenerationBackend> {
    backend: B,
    shape: GridShape,
    rule: RuleParams,
    state: RunState,
}

impl<B: GenerationBackend> Session<B> {
    /// Start a run at generation 0 on a freshly allocated backend
    pub fn new(backend: B, config: &StrataConfig) -> StrataResult<Self> {
        config.validate()?;
        let shape = config.shape()?;
        if backend.shape() != shape {
            return Err(StrataError::config(format!(
                "backend allocated {:?}, config asks for {:?}",
                backend.shape(),
                shape
            )));
        }

        tracing::info!(
            "🌱 Session: {}x{} grid, {} generations of history on {}",
            shape.width,
            shape.height,
            shape.capacity(),
            backend.name()
        );

        Ok(Self {
            backend,
            shape,
            rule: config.rule(),
            state: RunState::new(config.brush.radius)?,
        })
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn current_generation(&self) -> u32 {
        self.state.current_generation()
    }

    pub fn viewed_generation(&self) -> u32 {
        self.state.viewed_generation()
    }

    pub fn rule(&self) -> RuleParams {
        self.rule
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Storage slot of generation `g`
    pub fn address_of(&self, generation: u32) -> StrataResult<Slot> {
        self.shape.address_of(generation)
    }

    fn current_slot(&self) -> StrataResult<Slot> {
        self.shape.address_of(self.state.current_generation())
    }

    // ---- Painting ----

    /// Stamp a circle at a normalized position into the current generation
    pub fn stamp(&mut self, x: f32, y: f32, radius: f32) -> StrataResult<()> {
        let Some(stamp) = BrushStamp::from_normalized(&self.shape, x, y, radius)? else {
            return Ok(());
        };
        let slot = self.current_slot()?;
        self.backend.stamp(slot, &stamp)
    }

    /// Start a stroke: set the brush radius and stamp once
    pub fn begin_stroke(&mut self, x: f32, y: f32, radius: f32) -> StrataResult<()> {
        brush::check_radius(radius)?;
        self.stamp(x, y, radius)?;
        self.state.set_brush_radius(radius)?;
        self.state.set_last_pointer(Some((x, y)));
        Ok(())
    }

    /// Extend the stroke to `(x, y)`, filling the gap from the last position
    pub fn continue_stroke(&mut self, x: f32, y: f32) -> StrataResult<()> {
        let radius = self.state.brush_radius();
        match self.state.last_pointer() {
            None => self.stamp(x, y, radius)?,
            Some(from) => {
                for (px, py) in brush::stroke_points(&self.shape, from, (x, y), radius) {
                    self.stamp(px, py, radius)?;
                }
            }
        }
        self.state.set_last_pointer(Some((x, y)));
        Ok(())
    }

    pub fn end_stroke(&mut self) {
        self.state.set_last_pointer(None);
    }

    /// Radius used by the next `continue_stroke`
    pub fn set_brush_radius(&mut self, radius: f32) -> StrataResult<()> {
        self.state.set_brush_radius(radius)
    }

    // ---- Seeding ----

    /// Overwrite the current generation. Nonzero bytes become alive.
    pub fn seed(&mut self, cells: &[u8]) -> StrataResult<()> {
        if cells.len() != self.shape.cells_per_layer() {
            return Err(StrataError::config(format!(
                "seed needs {} cells, got {}",
                self.shape.cells_per_layer(),
                cells.len()
            )));
        }
        let normalized: Vec<u8> = cells.iter().map(|&v| cell::canonical(v)).collect();
        let slot = self.current_slot()?;
        self.backend.write_layer(slot, &normalized)
    }

    /// Overwrite the current generation with a reproducible random soup
    pub fn seed_random(&mut self, density: f64, seed: u64) -> StrataResult<()> {
        if !(0.0..=1.0).contains(&density) {
            return Err(StrataError::config(format!(
                "density must lie in [0, 1], got {}",
                density
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let cells: Vec<u8> = (0..self.shape.cells_per_layer())
            .map(|_| if rng.gen_bool(density) { cell::ALIVE } else { cell::DEAD })
            .collect();
        self.seed(&cells)
    }

    // ---- Stepping ----

    /// Compute the next generation and make it current.
    ///
    /// Returns the new current generation. At the last slot this fails with
    /// `CapacityExceeded` before anything is written.
    pub fn step(&mut self) -> StrataResult<u32> {
        let current = self.state.current_generation();
        if current >= self.shape.last_generation() {
            return Err(StrataError::CapacityExceeded {
                generation: current + 1,
                capacity: self.shape.capacity(),
            });
        }

        let from = self.shape.address_of(current)?;
        let to = self.shape.address_of(current + 1)?;
        self.backend.step(from, to, &self.rule)?;
        self.state.advance();

        tracing::debug!(
            "🌱 Generation {} -> {} ({:?}[{}] -> {:?}[{}])",
            current,
            current + 1,
            from.buffer,
            from.layer,
            to.buffer,
            to.layer
        );
        Ok(current + 1)
    }

    // ---- Viewing ----

    pub fn set_viewed_generation(&mut self, generation: u32) -> StrataResult<()> {
        self.state.set_viewed_generation(generation)
    }

    /// Composite the viewed generation into `frame`
    pub fn render(&mut self, frame: &mut Frame) -> StrataResult<()> {
        self.render_generation(self.state.viewed_generation(), frame)
    }

    /// Composite any computed generation into `frame`
    pub fn render_generation(&mut self, generation: u32, frame: &mut Frame) -> StrataResult<()> {
        self.state.check_generation(generation)?;
        let slot = self.shape.address_of(generation)?;
        self.backend.composite(slot, frame)
    }

    // ---- Readback ----

    /// Host copy of one computed generation (`W*H` bytes)
    pub fn read_layer(&mut self, generation: u32) -> StrataResult<Vec<u8>> {
        self.state.check_generation(generation)?;
        let slot = self.shape.address_of(generation)?;
        self.backend.read_layer(slot)
    }

    /// Every generation `0..=current`, generation-major then row-major
    pub fn export_all(&mut self) -> StrataResult<Vec<u8>> {
        let slots = (0..=self.state.current_generation())
            .map(|g| self.shape.address_of(g))
            .collect::<StrataResult<Vec<_>>>()?;
        self.backend.read_layers(&slots)
    }

    /// Alive cells in a computed generation
    pub fn population(&mut self, generation: u32) -> StrataResult<usize> {
        let cells = self.read_layer(generation)?;
        Ok(cell::population(&cells, self.rule.threshold))
    }

    pub fn stats(&self) -> BackendStats {
        self.backend.stats()
    }

    pub fn sync(&mut self) -> StrataResult<()> {
        self.backend.sync()
    }
}

impl Session<GpuBackend> {
    /// Draw the viewed generation straight into a `width x height` surface texture
    pub fn render_to_view(
        &mut self,
        view: &wgpu::TextureView,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> StrataResult<()> {
        let slot = self.shape.address_of(self.state.viewed_generation())?;
        self.backend.render_to_view(slot, view, format, width, height)
    }
}
