//! Test doubles: a modeled SoC register file with an AXP803 behind the
//! RSB controller.
//!
//! The model executes transactions instantly at the moment the start bit
//! is written, which is exactly what the polling drivers expect to
//! observe. Failure modes (dead controller, bad completion status, wrong
//! chip id, pre-claimed pads) are switchable per test.

use crate::axp803;
use crate::hw::Mmio;
use crate::rsb::{cmds, regs, stat, RSB_BASE, R_PIO_BASE};
use std::cell::RefCell;
use std::collections::HashMap;

const CTRL_SOFT_RESET: u32 = 1 << 0;
const CTRL_START_TRANS: u32 = 1 << 7;
const PMCR_START: u32 = 1 << 31;

/// Reset-default PL pad configuration (all pins disabled).
const PL_CFG_RESET: u32 = 0x7777_7777;

struct Axp803Model {
    page: u8,
    page0: [u8; 256],
    page1: [u8; 256],
}

impl Axp803Model {
    fn new() -> Self {
        let mut page0 = [0u8; 256];
        page0[axp803::regs::CHIP_ID as usize] = axp803::CHIP_ID_AXP803;
        Self { page: 0, page0, page1: [0u8; 256] }
    }

    fn read(&self, reg: u8) -> u8 {
        if reg == axp803::regs::PAGE_SELECT {
            self.page
        } else if self.page == 1 {
            self.page1[reg as usize]
        } else {
            self.page0[reg as usize]
        }
    }

    fn write(&mut self, reg: u8, value: u8) {
        if reg == axp803::regs::PAGE_SELECT {
            self.page = value;
        } else if self.page == 1 {
            self.page1[reg as usize] = value;
        } else {
            self.page0[reg as usize] = value;
        }
    }
}

struct State {
    regs: HashMap<usize, u32>,
    pmic: Axp803Model,
    device_mode_broadcasts: usize,
    assigned_runtime: Option<u8>,
    srta_status: u32,
    fail_reg: Option<(u8, u32)>,
    dead: bool,
    udelay_us: u32,
    write_counts: HashMap<u8, usize>,
}

impl State {
    fn reg(&self, addr: usize) -> u32 {
        self.regs.get(&addr).copied().unwrap_or(0)
    }

    fn run_transaction(&mut self) {
        let cmd = (self.reg(RSB_BASE + regs::CMD) & 0xff) as u8;
        let status = match cmd {
            cmds::SRTA => {
                let saddr = self.reg(RSB_BASE + regs::SADDR);
                self.assigned_runtime = Some(((saddr >> 16) & 0xff) as u8);
                self.srta_status
            }
            cmds::RD8 => {
                let reg = (self.reg(RSB_BASE + regs::DADDR0) & 0xff) as u8;
                match self.fail_reg {
                    Some((failing, status)) if failing == reg => status,
                    _ => {
                        let value = self.pmic.read(reg);
                        self.regs.insert(RSB_BASE + regs::DATA0, value as u32);
                        stat::TRANS_OVER
                    }
                }
            }
            cmds::WR8 => {
                let reg = (self.reg(RSB_BASE + regs::DADDR0) & 0xff) as u8;
                match self.fail_reg {
                    Some((failing, status)) if failing == reg => status,
                    _ => {
                        let value = (self.reg(RSB_BASE + regs::DATA0) & 0xff) as u8;
                        self.pmic.write(reg, value);
                        *self.write_counts.entry(reg).or_insert(0) += 1;
                        stat::TRANS_OVER
                    }
                }
            }
            _ => stat::TRANS_ERR,
        };
        self.regs.insert(RSB_BASE + regs::STAT, status);
    }
}

/// The modeled SoC. Implements [`Mmio`] through a shared reference so a
/// test can keep inspecting it while the bus owns one.
pub struct FakeSoc {
    state: RefCell<State>,
}

impl FakeSoc {
    pub fn new() -> Self {
        let mut regs = HashMap::new();
        regs.insert(R_PIO_BASE, PL_CFG_RESET);
        Self {
            state: RefCell::new(State {
                regs,
                pmic: Axp803Model::new(),
                device_mode_broadcasts: 0,
                assigned_runtime: None,
                srta_status: stat::TRANS_OVER,
                fail_reg: None,
                dead: false,
                udelay_us: 0,
                write_counts: HashMap::new(),
            }),
        }
    }

    /// Raw peek at an SoC register, bypassing the bus.
    pub fn read(&self, addr: usize) -> u32 {
        self.state.borrow().reg(addr)
    }

    /// Force the PL0/PL1 pad function nibbles (0x33 = s_twi, 0x22 = s_rsb).
    pub fn set_pl_function(&self, func: u32) {
        let mut state = self.state.borrow_mut();
        let cfg = state.reg(R_PIO_BASE);
        state.regs.insert(R_PIO_BASE, (cfg & !0xff) | (func & 0xff));
    }

    pub fn pmic_reg(&self, reg: u8) -> u8 {
        self.state.borrow().pmic.page0[reg as usize]
    }

    pub fn set_pmic_reg(&self, reg: u8, value: u8) {
        self.state.borrow_mut().pmic.page0[reg as usize] = value;
    }

    /// Currently selected PMIC register page.
    pub fn pmic_page(&self) -> u8 {
        self.state.borrow().pmic.page
    }

    pub fn set_sid(&self, sid: [u8; axp803::page1::SID_LEN]) {
        let mut state = self.state.borrow_mut();
        let base = axp803::page1::SID_BASE as usize;
        state.pmic.page1[base..base + sid.len()].copy_from_slice(&sid);
    }

    /// Count of successful bus writes to a PMIC register.
    pub fn pmic_writes(&self, reg: u8) -> usize {
        self.state.borrow().write_counts.get(&reg).copied().unwrap_or(0)
    }

    /// Complete any transaction touching `reg` with `status` instead of
    /// executing it.
    pub fn fail_pmic_reg(&self, reg: u8, status: u32) {
        self.state.borrow_mut().fail_reg = Some((reg, status));
    }

    /// Completion status the next SRTA reports.
    pub fn set_srta_status(&self, status: u32) {
        self.state.borrow_mut().srta_status = status;
    }

    /// Stop completing transactions; started bits stay set forever.
    pub fn play_dead(&self) {
        self.state.borrow_mut().dead = true;
    }

    pub fn device_mode_broadcasts(&self) -> usize {
        self.state.borrow().device_mode_broadcasts
    }

    pub fn assigned_runtime_addr(&self) -> Option<u8> {
        self.state.borrow().assigned_runtime
    }

    pub fn total_udelay_us(&self) -> u32 {
        self.state.borrow().udelay_us
    }
}

impl Mmio for &FakeSoc {
    fn read32(&self, addr: usize) -> u32 {
        self.state.borrow().reg(addr)
    }

    fn write32(&self, addr: usize, value: u32) {
        let mut state = self.state.borrow_mut();
        state.regs.insert(addr, value);

        if addr == RSB_BASE + regs::CTRL {
            if state.dead {
                return;
            }
            if value & CTRL_SOFT_RESET != 0 {
                let cleared = state.reg(addr) & !CTRL_SOFT_RESET;
                state.regs.insert(addr, cleared);
            }
            if value & CTRL_START_TRANS != 0 {
                state.run_transaction();
                let cleared = state.reg(addr) & !CTRL_START_TRANS;
                state.regs.insert(addr, cleared);
            }
        } else if addr == RSB_BASE + regs::PMCR && value & PMCR_START != 0 {
            state.device_mode_broadcasts += 1;
            if !state.dead {
                state.regs.insert(addr, value & !PMCR_START);
            }
        }
    }

    fn udelay(&self, micros: u32) {
        self.state.borrow_mut().udelay_us += micros;
    }
}
