//! Rail descriptors and voltage programming.
//!
//! A rail is one regulator output of the PMIC: an optional quantized
//! setpoint register plus an enable bit somewhere in an output-control
//! register. The descriptors themselves live in [`crate::axp803`]; this
//! module holds the quantization math and the programming operations.
//!
//! Quantization is floor-rounding: a request lands on the nearest
//! achievable voltage at or below the target, and out-of-range requests
//! clamp rather than fail.

use crate::error::RailError;
use crate::hw::Mmio;
use crate::session::PmicSession;
use tracing::trace;

/// A rail's voltage setpoint register and its linear code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Setpoint {
    pub reg: u8,
    pub min_mv: u32,
    pub max_mv: u32,
    pub step_mv: u32,
}

/// Static description of one rail. Compiled in, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RailDescriptor {
    pub name: &'static str,
    /// `None` for switch-type rails that only gate another supply.
    pub setpoint: Option<Setpoint>,
    pub enable_reg: u8,
    pub enable_bit: u8,
}

/// A request to bring one rail to a target voltage. Zero millivolts means
/// "switch the rail off".
#[derive(Debug, Clone, Copy)]
pub struct RailRequest {
    pub rail: &'static RailDescriptor,
    pub millivolts: u32,
}

/// Quantize a millivolt target into a register code, clamping into
/// `[min, max]` and rounding down to the step below.
pub fn millivolts_to_code(mv: u32, min_mv: u32, max_mv: u32, step_mv: u32) -> u8 {
    let clamped = mv.clamp(min_mv, max_mv);
    ((clamped - min_mv) / step_mv) as u8
}

/// Inverse of [`millivolts_to_code`] for diagnostics. Exact only at step
/// boundaries.
pub fn code_to_millivolts(code: u8, min_mv: u32, step_mv: u32) -> u32 {
    min_mv + code as u32 * step_mv
}

impl Setpoint {
    pub fn code_for(&self, mv: u32) -> u8 {
        millivolts_to_code(mv, self.min_mv, self.max_mv, self.step_mv)
    }

    pub fn millivolts_for(&self, code: u8) -> u32 {
        code_to_millivolts(code, self.min_mv, self.step_mv)
    }
}

impl<M: Mmio> PmicSession<'_, M> {
    /// Write a rail's setpoint register without touching its enable bit.
    /// Used when a board sequence needs voltage programmed first and the
    /// enable staged later.
    pub fn program_rail(&mut self, request: RailRequest) -> Result<(), RailError> {
        let Some(sp) = request.rail.setpoint else {
            return Ok(());
        };
        let code = sp.code_for(request.millivolts);
        trace!(rail = request.rail.name, mv = sp.millivolts_for(code), code, "program");
        self.write(sp.reg, code)?;
        Ok(())
    }

    /// Program a rail to the requested voltage and enable it. A zero
    /// target clears the enable bit and never writes the setpoint.
    pub fn set_rail(&mut self, request: RailRequest) -> Result<(), RailError> {
        if request.millivolts == 0 {
            return self.disable_rail(request.rail);
        }
        self.program_rail(request)?;
        self.enable_rail(request.rail)
    }

    /// Idempotent [`set_rail`](Self::set_rail): the setpoint is read first
    /// and rewritten only if it differs, and the enable bit only set when
    /// clear. Required for rails that are already live; rewriting an
    /// active regulator's setpoint can glitch the output.
    pub fn ensure_rail(&mut self, request: RailRequest) -> Result<(), RailError> {
        if request.millivolts == 0 {
            return self.disable_rail(request.rail);
        }
        if let Some(sp) = request.rail.setpoint {
            let code = sp.code_for(request.millivolts);
            let current = self.read(sp.reg)?;
            if current != code {
                trace!(rail = request.rail.name, current, code, "correcting setpoint");
                self.write(sp.reg, code)?;
            } else {
                trace!(rail = request.rail.name, code, "setpoint already correct");
            }
        }
        self.enable_rail(request.rail)
    }

    /// Set the rail's enable bit if it is not already set.
    pub fn enable_rail(&mut self, rail: &RailDescriptor) -> Result<(), RailError> {
        let current = self.read(rail.enable_reg)?;
        if current & rail.enable_bit == 0 {
            self.write(rail.enable_reg, current | rail.enable_bit)?;
        }
        Ok(())
    }

    /// Clear the rail's enable bit, preserving the other bits.
    pub fn disable_rail(&mut self, rail: &RailDescriptor) -> Result<(), RailError> {
        self.clear_bits(rail.enable_reg, rail.enable_bit)?;
        Ok(())
    }
}
