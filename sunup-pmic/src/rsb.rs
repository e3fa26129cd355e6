//! Reduced Serial Bus (RSB) controller driver.
//!
//! The RSB is the A64's single-master, addressed serial bus to the PMIC.
//! The controller lives in the always-on power domain together with the
//! R_PRCM clock/reset unit and the R_PIO pad controller; its two signals
//! share pins PL0/PL1 with an s_twi (I2C) controller, so bringing the bus
//! up starts with taking those pads over.
//!
//! Register layout and command opcodes follow the A64 user manual, section
//! "RSB". Each transaction is programmed into the controller registers,
//! started by setting the CTRL start bit, and completed by polling that bit
//! clear and reading STAT.

use crate::error::BusError;
use crate::hw::Mmio;
use bitflags::bitflags;
use tracing::{debug, trace};

/// RSB controller register block.
pub const RSB_BASE: usize = 0x01f0_3400;
/// Clock/reset unit for the always-on domain.
pub const R_PRCM_BASE: usize = 0x01f0_1400;
/// Pad controller for the PL port.
pub const R_PIO_BASE: usize = 0x01f0_2c00;

/// Register offsets from [`RSB_BASE`].
pub mod regs {
    pub const CTRL: usize = 0x00;
    pub const CCR: usize = 0x04;
    pub const INTE: usize = 0x08;
    pub const STAT: usize = 0x0c;
    pub const DADDR0: usize = 0x10;
    pub const DLEN: usize = 0x18;
    pub const DATA0: usize = 0x1c;
    pub const LCR: usize = 0x24;
    pub const PMCR: usize = 0x28;
    pub const CMD: usize = 0x2c;
    pub const SADDR: usize = 0x30;
}

/// Transaction command opcodes for the CMD register.
pub mod cmds {
    /// Set a device's runtime address.
    pub const SRTA: u8 = 0xe8;
    pub const RD8: u8 = 0x8b;
    pub const RD16: u8 = 0x9c;
    pub const RD32: u8 = 0xa6;
    pub const WR8: u8 = 0x4e;
    pub const WR16: u8 = 0x59;
    pub const WR32: u8 = 0x63;
}

/// CCR divisor words for the two clock rates this platform uses.
pub mod clock {
    /// 400 kHz, safe while the PMIC is still in TWI-compatible mode.
    pub const TAKEOVER_400KHZ: u32 = 0x11d;
    /// 3 MHz, the AXP803's RSB operating rate.
    pub const AXP803_3MHZ: u32 = 0x103;
}

bitflags! {
    /// CTRL register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ctrl: u32 {
        const SOFT_RESET = 1 << 0;
        const GLOBAL_INT_ENB = 1 << 1;
        const ABORT_TRANS = 1 << 6;
        const START_TRANS = 1 << 7;
    }
}

/// STAT register values. Read as a whole word after a transaction; exactly
/// `TRANS_OVER` means success, anything else is an error code.
pub mod stat {
    pub const TRANS_OVER: u32 = 0x01;
    pub const TRANS_ERR: u32 = 0x02;
    pub const LOAD_BSY: u32 = 0x04;
}

/// PMCR fields for the device-mode broadcast: data byte 0x00 to register
/// 0x3e, preceded by the 0x7c init sequence, started by bit 31.
mod pmcr {
    pub const DEVICE_MODE_DATA: u32 = 0x00;
    pub const DEVICE_MODE_REG: u32 = 0x3e << 8;
    pub const INIT_SEQUENCE: u32 = 0x7c << 16;
    pub const START: u32 = 1 << 31;
}

/// R_PRCM offsets and bits.
mod prcm {
    pub const APB0_GATE: usize = 0x28;
    pub const GATE_PIO: u32 = 1 << 0;
    pub const GATE_RSB: u32 = 1 << 3;
    pub const APB0_RESET: usize = 0xb0;
    pub const RESET_RSB: u32 = 1 << 3;
}

/// R_PIO offsets and the PL0/PL1 function values that matter here.
mod pio {
    pub const PL_CFG0: usize = 0x00;
    pub const PL_DRV0: usize = 0x14;
    pub const PL_PULL0: usize = 0x1c;
    /// PL0/PL1 muxed to s_twi.
    pub const FUNC_S_TWI: u32 = 0x33;
    /// PL0/PL1 muxed to s_rsb.
    pub const FUNC_S_RSB: u32 = 0x22;
    /// Drive strength level 2 for both pins.
    pub const DRIVE_LEVEL2: u32 = 0xa;
    /// Pull-up on both pins.
    pub const PULL_UP: u32 = 0x5;
}

/// Outcome of a successful bus takeover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Takeover {
    /// Pads were reconfigured and the controller reset.
    Fresh,
    /// Pads were already in s_rsb mode; nothing was touched. An earlier
    /// boot stage owns the configuration, so re-entry skips it.
    AlreadyOurs,
}

/// Limit on busy-wait loops. `Unbounded` reproduces the hardware's native
/// behavior (a dead controller hangs the boot); `Spins` turns a dead wait
/// into [`BusError::Stalled`], which is what tests use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollBudget {
    Unbounded,
    Spins(u32),
}

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Transfer width. Only `W8` is exercised on this platform; the AXP803's
/// register file is byte-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W8,
    W16,
    W32,
}

impl Width {
    fn bytes(self) -> u32 {
        match self {
            Width::W8 => 1,
            Width::W16 => 2,
            Width::W32 => 4,
        }
    }

    fn mask(self) -> u32 {
        match self {
            Width::W8 => 0xff,
            Width::W16 => 0xffff,
            Width::W32 => 0xffff_ffff,
        }
    }
}

/// One bus transaction. Built, executed and discarded per call.
#[derive(Debug, Clone, Copy)]
pub struct Transaction {
    pub direction: Direction,
    pub width: Width,
    pub register: u8,
    pub value: u32,
}

impl Transaction {
    pub fn read8(register: u8) -> Self {
        Self { direction: Direction::Read, width: Width::W8, register, value: 0 }
    }

    pub fn write8(register: u8, value: u8) -> Self {
        Self { direction: Direction::Write, width: Width::W8, register, value: value as u32 }
    }

    fn opcode(&self) -> u8 {
        match (self.direction, self.width) {
            (Direction::Read, Width::W8) => cmds::RD8,
            (Direction::Read, Width::W16) => cmds::RD16,
            (Direction::Read, Width::W32) => cmds::RD32,
            (Direction::Write, Width::W8) => cmds::WR8,
            (Direction::Write, Width::W16) => cmds::WR16,
            (Direction::Write, Width::W32) => cmds::WR32,
        }
    }

    /// DLEN word: byte count minus one, with bit 4 flagging a read.
    fn dlen(&self) -> u32 {
        let len = self.width.bytes() - 1;
        match self.direction {
            Direction::Read => len | 0x10,
            Direction::Write => len,
        }
    }
}

/// Controller state as derivable from CTRL and STAT. Diagnostics only;
/// [`RsbBus::execute`] already guarantees Complete-or-Error before it
/// returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusStatus {
    Idle,
    InProgress,
    Complete,
    Error(u32),
}

/// The RSB controller. Owns the MMIO handle; all access to the register
/// block goes through here.
pub struct RsbBus<M: Mmio> {
    mmio: M,
    budget: PollBudget,
}

impl<M: Mmio> RsbBus<M> {
    /// The budget is taken explicitly so production callers state
    /// `Unbounded` deliberately rather than inherit it.
    pub fn new(mmio: M, budget: PollBudget) -> Self {
        Self { mmio, budget }
    }

    fn reg(&self, offset: usize) -> usize {
        RSB_BASE + offset
    }

    /// Poll `addr` until `mask` reads clear, within the budget.
    fn wait_clear(&self, addr: usize, mask: u32, wait: &'static str) -> Result<(), BusError> {
        match self.budget {
            PollBudget::Unbounded => {
                while self.mmio.read32(addr) & mask != 0 {
                    core::hint::spin_loop();
                }
                Ok(())
            }
            PollBudget::Spins(limit) => {
                for _ in 0..limit {
                    if self.mmio.read32(addr) & mask == 0 {
                        return Ok(());
                    }
                    core::hint::spin_loop();
                }
                Err(BusError::Stalled { wait })
            }
        }
    }

    /// Take the PL0/PL1 pads and reset the controller.
    ///
    /// If the pads are already muxed to s_rsb the whole sequence is skipped
    /// and `AlreadyOurs` is returned; callers must treat that as success.
    /// Pads muxed to s_twi mean another driver owns the bus.
    pub fn takeover(&mut self) -> Result<Takeover, BusError> {
        self.mmio
            .modify32(R_PRCM_BASE + prcm::APB0_GATE, |v| v | prcm::GATE_PIO);

        let cfg = self.mmio.read32(R_PIO_BASE + pio::PL_CFG0);
        match cfg & 0xff {
            pio::FUNC_S_TWI => {
                debug!("PL0/PL1 muxed to s_twi, bus not ours");
                return Err(BusError::Busy);
            }
            pio::FUNC_S_RSB => {
                debug!("PL0/PL1 already muxed to s_rsb");
                return Ok(Takeover::AlreadyOurs);
            }
            _ => {}
        }

        self.mmio
            .write32(R_PIO_BASE + pio::PL_CFG0, (cfg & !0xff) | pio::FUNC_S_RSB);
        self.mmio
            .modify32(R_PIO_BASE + pio::PL_DRV0, |v| (v & !0x0f) | pio::DRIVE_LEVEL2);
        self.mmio
            .modify32(R_PIO_BASE + pio::PL_PULL0, |v| (v & !0x0f) | pio::PULL_UP);

        // Pulse the controller reset, then feed it a clock.
        self.mmio
            .modify32(R_PRCM_BASE + prcm::APB0_RESET, |v| v & !prcm::RESET_RSB);
        self.mmio
            .modify32(R_PRCM_BASE + prcm::APB0_RESET, |v| v | prcm::RESET_RSB);
        self.mmio
            .modify32(R_PRCM_BASE + prcm::APB0_GATE, |v| v | prcm::GATE_RSB);

        self.mmio.write32(self.reg(regs::CTRL), Ctrl::SOFT_RESET.bits());
        self.mmio.write32(self.reg(regs::CCR), clock::TAKEOVER_400KHZ);
        self.wait_clear(self.reg(regs::CTRL), Ctrl::SOFT_RESET.bits(), "soft reset")?;

        debug!("RSB controller reset, clocked at 400 kHz");
        Ok(Takeover::Fresh)
    }

    /// Execute one transaction and block until it completes.
    pub fn execute(&mut self, txn: Transaction) -> Result<u32, BusError> {
        self.mmio.write32(self.reg(regs::DLEN), txn.dlen());
        self.mmio.write32(self.reg(regs::CMD), txn.opcode() as u32);
        self.mmio.write32(self.reg(regs::DADDR0), txn.register as u32);
        if txn.direction == Direction::Write {
            self.mmio
                .write32(self.reg(regs::DATA0), txn.value & txn.width.mask());
        }

        self.mmio.write32(self.reg(regs::CTRL), Ctrl::START_TRANS.bits());
        self.wait_clear(self.reg(regs::CTRL), Ctrl::START_TRANS.bits(), "transaction")?;

        let status = self.mmio.read32(self.reg(regs::STAT));
        if status != stat::TRANS_OVER {
            trace!(status, register = txn.register, "transaction failed");
            return Err(BusError::Protocol { status });
        }

        match txn.direction {
            Direction::Read => Ok(self.mmio.read32(self.reg(regs::DATA0)) & txn.width.mask()),
            Direction::Write => Ok(0),
        }
    }

    /// Broadcast the mode-switch sequence that moves the PMIC from
    /// TWI-compatible mode onto the RSB.
    pub fn enter_device_mode(&mut self) -> Result<(), BusError> {
        self.mmio.write32(
            self.reg(regs::PMCR),
            pmcr::DEVICE_MODE_DATA | pmcr::DEVICE_MODE_REG | pmcr::INIT_SEQUENCE | pmcr::START,
        );
        self.wait_clear(self.reg(regs::PMCR), pmcr::START, "device mode switch")
    }

    /// Program the bus clock divisor.
    pub fn set_clock(&mut self, divisor: u32) {
        self.mmio.write32(self.reg(regs::CCR), divisor);
    }

    /// Issue SRTA, binding `runtime_addr` to the device at `hardware_addr`.
    ///
    /// Returns the raw completion status rather than judging it; some
    /// controller revisions report a spurious failure here, so the caller
    /// decides how strict to be.
    pub fn assign_runtime_address(
        &mut self,
        hardware_addr: u16,
        runtime_addr: u8,
    ) -> Result<u32, BusError> {
        self.mmio.write32(
            self.reg(regs::SADDR),
            hardware_addr as u32 | (runtime_addr as u32) << 16,
        );
        self.mmio.write32(self.reg(regs::CMD), cmds::SRTA as u32);
        self.mmio.write32(self.reg(regs::CTRL), Ctrl::START_TRANS.bits());
        self.wait_clear(self.reg(regs::CTRL), Ctrl::START_TRANS.bits(), "SRTA")?;
        Ok(self.mmio.read32(self.reg(regs::STAT)))
    }

    /// Re-arm the address filter so subsequent transactions target the
    /// device at `runtime_addr`.
    pub fn select_device(&mut self, runtime_addr: u8) {
        self.mmio
            .write32(self.reg(regs::SADDR), (runtime_addr as u32) << 16);
    }

    /// Snapshot the controller state for diagnostics.
    pub fn status(&self) -> BusStatus {
        let ctrl = Ctrl::from_bits_truncate(self.mmio.read32(self.reg(regs::CTRL)));
        if ctrl.contains(Ctrl::START_TRANS) {
            return BusStatus::InProgress;
        }
        match self.mmio.read32(self.reg(regs::STAT)) {
            0 => BusStatus::Idle,
            stat::TRANS_OVER => BusStatus::Complete,
            other => BusStatus::Error(other),
        }
    }

    /// Spin for at least `micros` microseconds.
    pub fn delay_us(&self, micros: u32) {
        self.mmio.udelay(micros);
    }
}
