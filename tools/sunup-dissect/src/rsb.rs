//! RSB transaction assembly.
//!
//! Replays a stream of register accesses against shadow copies of the
//! controller registers and emits one logical operation per started
//! transaction, pairing it with the completion status and (for reads) the
//! payload observed afterwards.

use crate::capture::MmioAccess;
use sunup_pmic::rsb::{cmds, regs};

const CTRL_START_TRANS: u32 = 1 << 7;
const PMCR_START: u32 = 1 << 31;

/// A logical bus operation reconstructed from the trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RsbOp {
    /// PMCR device-mode broadcast.
    DeviceMode,
    /// CCR reprogramming.
    ClockRate { divisor: u32 },
    /// Runtime address assignment.
    Srta { hardware_addr: u16, runtime_addr: u8 },
    Read8 { register: u8, value: Option<u8> },
    Write8 { register: u8, value: u8 },
    /// A width/opcode this platform doesn't normally use.
    Other { opcode: u8, register: u8 },
}

/// An operation plus its observed completion status, if the trace
/// contained the STAT readback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsbOperation {
    pub timestamp: f64,
    pub op: RsbOp,
    pub status: Option<u32>,
}

impl RsbOperation {
    /// Whether the completion status was seen and reads success.
    pub fn completed_ok(&self) -> Option<bool> {
        self.status.map(|status| status == 0x01)
    }
}

#[derive(Default)]
struct Shadow {
    cmd: u32,
    daddr0: u32,
    data0: u32,
    saddr: u32,
}

/// Streaming assembler; feed it accesses in trace order.
pub struct RsbAssembler {
    shadow: Shadow,
    pending: Option<RsbOperation>,
    ops: Vec<RsbOperation>,
}

impl RsbAssembler {
    pub fn new() -> Self {
        Self { shadow: Shadow::default(), pending: None, ops: Vec::new() }
    }

    fn flush(&mut self) {
        if let Some(op) = self.pending.take() {
            self.ops.push(op);
        }
    }

    fn start_transaction(&mut self, timestamp: f64) {
        self.flush();
        let register = (self.shadow.daddr0 & 0xff) as u8;
        let op = match (self.shadow.cmd & 0xff) as u8 {
            cmds::SRTA => RsbOp::Srta {
                hardware_addr: (self.shadow.saddr & 0xffff) as u16,
                runtime_addr: ((self.shadow.saddr >> 16) & 0xff) as u8,
            },
            cmds::RD8 => RsbOp::Read8 { register, value: None },
            cmds::WR8 => RsbOp::Write8 { register, value: (self.shadow.data0 & 0xff) as u8 },
            opcode => RsbOp::Other { opcode, register },
        };
        self.pending = Some(RsbOperation { timestamp, op, status: None });
    }

    pub fn process(&mut self, access: &MmioAccess) {
        let offset = access.offset as usize;
        if access.write {
            match offset {
                regs::CMD => self.shadow.cmd = access.value,
                regs::DADDR0 => self.shadow.daddr0 = access.value,
                regs::DATA0 => self.shadow.data0 = access.value,
                regs::SADDR => self.shadow.saddr = access.value,
                regs::CTRL if access.value & CTRL_START_TRANS != 0 => {
                    self.start_transaction(access.timestamp);
                }
                regs::CCR => {
                    self.flush();
                    self.ops.push(RsbOperation {
                        timestamp: access.timestamp,
                        op: RsbOp::ClockRate { divisor: access.value },
                        status: None,
                    });
                }
                regs::PMCR if access.value & PMCR_START != 0 => {
                    self.flush();
                    self.ops.push(RsbOperation {
                        timestamp: access.timestamp,
                        op: RsbOp::DeviceMode,
                        status: None,
                    });
                }
                _ => {}
            }
        } else {
            match offset {
                regs::STAT => {
                    if let Some(pending) = &mut self.pending {
                        pending.status = Some(access.value);
                    }
                }
                regs::DATA0 => {
                    if let Some(RsbOperation {
                        op: RsbOp::Read8 { value: value @ None, .. },
                        ..
                    }) = &mut self.pending
                    {
                        *value = Some((access.value & 0xff) as u8);
                    }
                }
                _ => {}
            }
        }
    }

    pub fn finish(mut self) -> Vec<RsbOperation> {
        self.flush();
        self.ops
    }
}

/// Assemble a whole capture in one call.
pub fn assemble(accesses: &[MmioAccess]) -> Vec<RsbOperation> {
    let mut assembler = RsbAssembler::new();
    for access in accesses {
        assembler.process(access);
    }
    assembler.finish()
}
