//! X-Powers AXP803 register map and rail table.
//!
//! Register numbers and rail voltage ranges follow the AXP803 datasheet
//! (v1.0). Ranges are restricted to the linear segment each rail is
//! actually programmed in on this platform, so the single-step descriptor
//! model holds.

use crate::rail::{RailDescriptor, Setpoint};

/// Fixed hardware address of the AXP803 on the RSB.
pub const HARDWARE_ADDR: u16 = 0x3a3;
/// Runtime address assigned to it during session open.
pub const RUNTIME_ADDR: u8 = 0x2d;

/// Mask selecting the family bits of the chip-id register.
pub const CHIP_ID_MASK: u8 = 0xcf;
/// Expected masked chip-id value for the AXP803 family.
pub const CHIP_ID_AXP803: u8 = 0x41;

/// Page 0 registers.
pub mod regs {
    pub const CHIP_ID: u8 = 0x03;
    /// DCDC1..DCDC6 enable bits.
    pub const OUTPUT_CTRL1: u8 = 0x10;
    /// ELDO1..3, DLDO1..4 and DC1SW enable bits.
    pub const OUTPUT_CTRL2: u8 = 0x12;
    /// FLDO1/FLDO2 enable bits, among others.
    pub const OUTPUT_CTRL3: u8 = 0x13;
    pub const DLDO1_VOLT: u8 = 0x15;
    pub const DLDO2_VOLT: u8 = 0x16;
    pub const DLDO3_VOLT: u8 = 0x17;
    pub const DLDO4_VOLT: u8 = 0x18;
    pub const FLDO1_VOLT: u8 = 0x1c;
    pub const DCDC1_VOLT: u8 = 0x20;
    pub const DCDC2_VOLT: u8 = 0x21;
    pub const DCDC5_VOLT: u8 = 0x24;
    /// VBUS path control; bit 2 enables the USB power path.
    pub const VBUS_CTRL: u8 = 0x30;
    /// GPIO0 function select; 0x3 turns the pin into an LDO output.
    pub const GPIO0_CTRL: u8 = 0x90;
    pub const GPIO0_LDO_VOLT: u8 = 0x91;
    /// Selects the register page for subsequent transactions.
    pub const PAGE_SELECT: u8 = 0xff;
}

/// Page 1 registers, reached through [`regs::PAGE_SELECT`].
pub mod page1 {
    /// First byte of the 16-byte security ID.
    pub const SID_BASE: u8 = 0x20;
    pub const SID_LEN: usize = 16;
}

/// GPIO0 function select values.
pub mod gpio0 {
    pub const FUNC_LDO_ON: u8 = 0x3;
    pub const FUNC_LDO_OFF: u8 = 0x7;
}

/// VBUS path enable bit in [`regs::VBUS_CTRL`].
pub const VBUS_PATH_ENABLE: u8 = 1 << 2;

/// DCDC5 voltage-bits mask; the register's top bit is unrelated.
pub const DCDC5_CODE_MASK: u8 = 0x7f;

/// Main 3.3 V supply (VCC-3V3).
pub static DCDC1: RailDescriptor = RailDescriptor {
    name: "DCDC1",
    setpoint: Some(Setpoint { reg: regs::DCDC1_VOLT, min_mv: 1600, max_mv: 3400, step_mv: 100 }),
    enable_reg: regs::OUTPUT_CTRL1,
    enable_bit: 1 << 0,
};

/// CPU supply (VDD-CPUX). Programmed in the 10 mV segment only.
pub static DCDC2: RailDescriptor = RailDescriptor {
    name: "DCDC2",
    setpoint: Some(Setpoint { reg: regs::DCDC2_VOLT, min_mv: 500, max_mv: 1180, step_mv: 10 }),
    enable_reg: regs::OUTPUT_CTRL1,
    enable_bit: 1 << 1,
};

/// DRAM supply (VCC-DRAM). Only the lower 10 mV segment is described
/// here; codes above the segment breakpoint are handled through the raw
/// register value and [`dcdc5_code_to_millivolts`].
pub static DCDC5: RailDescriptor = RailDescriptor {
    name: "DCDC5",
    setpoint: Some(Setpoint { reg: regs::DCDC5_VOLT, min_mv: 800, max_mv: 1120, step_mv: 10 }),
    enable_reg: regs::OUTPUT_CTRL1,
    enable_bit: 1 << 4,
};

/// Switched tap of DCDC1 powering the Ethernet PHY. No setpoint; it
/// follows DCDC1 and only has an enable bit.
pub static DC1SW: RailDescriptor = RailDescriptor {
    name: "DC1SW",
    setpoint: None,
    enable_reg: regs::OUTPUT_CTRL2,
    enable_bit: 1 << 7,
};

/// HDMI supply (VCC3V3-HDMI).
pub static DLDO1: RailDescriptor = RailDescriptor {
    name: "DLDO1",
    setpoint: Some(Setpoint { reg: regs::DLDO1_VOLT, min_mv: 700, max_mv: 3300, step_mv: 100 }),
    enable_reg: regs::OUTPUT_CTRL2,
    enable_bit: 1 << 3,
};

/// Display supply (VCC-MIPI / VCC-EDP-2V5 depending on board).
pub static DLDO2: RailDescriptor = RailDescriptor {
    name: "DLDO2",
    setpoint: Some(Setpoint { reg: regs::DLDO2_VOLT, min_mv: 700, max_mv: 3300, step_mv: 100 }),
    enable_reg: regs::OUTPUT_CTRL2,
    enable_bit: 1 << 4,
};

/// Secondary display supply (VCC-EDP-1V2 on the TERES I).
pub static DLDO3: RailDescriptor = RailDescriptor {
    name: "DLDO3",
    setpoint: Some(Setpoint { reg: regs::DLDO3_VOLT, min_mv: 700, max_mv: 3300, step_mv: 100 }),
    enable_reg: regs::OUTPUT_CTRL2,
    enable_bit: 1 << 5,
};

/// WiFi supply (VCC-WIFI). Left at its reset voltage, only enabled.
pub static DLDO4: RailDescriptor = RailDescriptor {
    name: "DLDO4",
    setpoint: Some(Setpoint { reg: regs::DLDO4_VOLT, min_mv: 700, max_mv: 3300, step_mv: 100 }),
    enable_reg: regs::OUTPUT_CTRL2,
    enable_bit: 1 << 6,
};

/// HSIC / eDP bridge supply (VCC1V2-EDP).
pub static FLDO1: RailDescriptor = RailDescriptor {
    name: "FLDO1",
    setpoint: Some(Setpoint { reg: regs::FLDO1_VOLT, min_mv: 700, max_mv: 1450, step_mv: 50 }),
    enable_reg: regs::OUTPUT_CTRL3,
    enable_bit: 1 << 2,
};

/// Decode a DCDC5 register code to millivolts.
///
/// The rail steps 10 mV per code up to 1.12 V and 20 mV per code above,
/// so the scale is two-piece linear with the breakpoint at code 0x20.
/// Reporting only; control decisions compare raw codes.
pub fn dcdc5_code_to_millivolts(code: u8) -> u32 {
    let code = (code & DCDC5_CODE_MASK) as u32;
    if code <= 0x20 {
        800 + code * 10
    } else {
        1120 + (code - 0x20) * 20
    }
}

/// Voltage register → rail name, for trace decoding.
pub fn rail_for_setpoint_reg(reg: u8) -> Option<&'static RailDescriptor> {
    [&DCDC1, &DCDC2, &DCDC5, &DLDO1, &DLDO2, &DLDO3, &DLDO4, &FLDO1]
        .into_iter()
        .find(|rail| rail.setpoint.as_ref().is_some_and(|sp| sp.reg == reg))
}
