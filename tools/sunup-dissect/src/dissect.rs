//! Rendering of assembled operations.
//!
//! Annotates register numbers with their AXP803 meaning and decodes rail
//! setpoint writes back to millivolts, reusing the library's tables so
//! the tool can never drift from the driver.

use crate::rsb::{RsbOp, RsbOperation};
use colored::Colorize;
use sunup_pmic::axp803::{self, regs};
use sunup_pmic::rail::code_to_millivolts;

/// Name for registers that are not rail setpoints.
fn reg_name(register: u8) -> Option<&'static str> {
    match register {
        regs::CHIP_ID => Some("CHIP_ID"),
        regs::OUTPUT_CTRL1 => Some("OUTPUT_CTRL1"),
        regs::OUTPUT_CTRL2 => Some("OUTPUT_CTRL2"),
        regs::OUTPUT_CTRL3 => Some("OUTPUT_CTRL3"),
        regs::VBUS_CTRL => Some("VBUS_CTRL"),
        regs::GPIO0_CTRL => Some("GPIO0_CTRL"),
        regs::GPIO0_LDO_VOLT => Some("GPIO0_LDO"),
        regs::PAGE_SELECT => Some("PAGE_SELECT"),
        _ => None,
    }
}

/// Describe a PMIC register and, for setpoint registers, decode a value
/// written to or read from it.
fn describe_register(register: u8, value: Option<u8>) -> String {
    if let Some(rail) = axp803::rail_for_setpoint_reg(register) {
        let decoded = value.and_then(|code| {
            if register == regs::DCDC5_VOLT {
                Some(axp803::dcdc5_code_to_millivolts(code))
            } else {
                rail.setpoint
                    .map(|sp| code_to_millivolts(code, sp.min_mv, sp.step_mv))
            }
        });
        match decoded {
            Some(mv) => format!("{} [{} mV]", rail.name, mv),
            None => rail.name.to_string(),
        }
    } else {
        reg_name(register).unwrap_or("?").to_string()
    }
}

fn describe_op(op: &RsbOp) -> String {
    match *op {
        RsbOp::DeviceMode => "device-mode broadcast".to_string(),
        RsbOp::ClockRate { divisor } => format!("clock divisor = {divisor:#05x}"),
        RsbOp::Srta { hardware_addr, runtime_addr } => {
            format!("SRTA hw {hardware_addr:#05x} -> rt {runtime_addr:#04x}")
        }
        RsbOp::Read8 { register, value } => {
            let annotation = describe_register(register, value);
            match value {
                Some(value) => format!("RD8  reg {register:#04x} ({annotation}) -> {value:#04x}"),
                None => format!("RD8  reg {register:#04x} ({annotation}) -> ?"),
            }
        }
        RsbOp::Write8 { register, value } => {
            let annotation = describe_register(register, Some(value));
            format!("WR8  reg {register:#04x} ({annotation}) = {value:#04x}")
        }
        RsbOp::Other { opcode, register } => {
            format!("opcode {opcode:#04x} reg {register:#04x}")
        }
    }
}

/// One human-readable line per operation, completion marked in color.
pub fn render(operation: &RsbOperation) -> String {
    let status = match operation.completed_ok() {
        Some(true) => format!("  {}", "OK".green()),
        Some(false) => format!(
            "  {}",
            format!("ERR {:#04x}", operation.status.unwrap_or(0)).red()
        ),
        None => String::new(),
    };
    format!(
        "{:>12.6}  {}{}",
        operation.timestamp,
        describe_op(&operation.op),
        status
    )
}
