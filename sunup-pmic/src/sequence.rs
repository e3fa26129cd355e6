//! The boot-time rail sequence.
//!
//! [`run_sequence`] is the single entry point the platform bring-up driver
//! calls after clock setup. It takes the bus, opens (or resumes) the PMIC
//! session and walks the fixed rail order; any hard failure aborts the
//! rest of the sequence and propagates.
//!
//! The caller owns the [`PmicIdentity`] slot. The first successful run
//! fills it; passing it back in on a later call resumes the session
//! without repeating the mode broadcast.

use crate::axp803::{self, regs};
use crate::board::Board;
use crate::error::RailError;
use crate::hw::Mmio;
use crate::rail::{millivolts_to_code, RailDescriptor, RailRequest};
use crate::rsb::{RsbBus, Takeover};
use crate::session::{PmicIdentity, PmicSession};
use tracing::{debug, info};

/// DCDC5 code a mis-strapped Pine64+ resets to (1.24 V).
const DRAM_CODE_MISWIRED: u8 = 0x26;
/// DCDC5 code its DDR3L chips actually need (1.36 V).
const DRAM_CODE_DDR3L: u8 = 0x2c;

/// Settle time between the TERES I display LDO enables.
const TERES_DISPLAY_SETTLE_US: u32 = 1000;

/// Rails every board gets, applied unconditionally at the end of the
/// sequence.
const PROFILE: &[(&RailDescriptor, u32)] = &[
    (&axp803::DLDO1, 3300), // VCC3V3-HDMI
    (&axp803::DCDC2, 1100), // VDD-CPUX
    (&axp803::DLDO2, 2500), // VCC2V5-EDP
    (&axp803::FLDO1, 1200), // VCC1V2-EDP bridge / HSIC
];

/// Bring up the PMIC rails for the board named `board_id`.
pub fn run_sequence<M: Mmio>(
    bus: &mut RsbBus<M>,
    identity: &mut Option<PmicIdentity>,
    board_id: &str,
) -> Result<(), RailError> {
    let board = Board::from_dt_name(board_id);
    info!(board_id, ?board, "configuring AXP803 rails");

    match bus.takeover()? {
        Takeover::Fresh => {}
        Takeover::AlreadyOurs => debug!("bus already taken over, continuing"),
    }

    let mut session = match *identity {
        Some(id) => PmicSession::resume(bus, id),
        None => {
            let session =
                PmicSession::open(bus, axp803::HARDWARE_ADDR, axp803::RUNTIME_ADDR)?;
            *identity = Some(session.identity());
            session
        }
    };

    // DCDC1 is live (it powers this very boot path on some boards), so it
    // gets the glitch-free idempotent write.
    session.ensure_rail(RailRequest { rail: &axp803::DCDC1, millivolts: 3300 })?;

    // Peripheral enable group: PHY switch, WiFi, HDMI.
    session.enable_rail(&axp803::DC1SW)?;
    session.enable_rail(&axp803::DLDO4)?;
    session.enable_rail(&axp803::DLDO1)?;

    apply_dram_rail(&mut session, board)?;
    apply_display_power(&mut session, board)?;

    for &(rail, millivolts) in PROFILE {
        session.set_rail(RailRequest { rail, millivolts })?;
    }

    // GPIO0 doubles as an LDO output; it enables by function select, not
    // by an output-control bit.
    let code = millivolts_to_code(3300, 700, 3300, 100);
    session.write(regs::GPIO0_LDO_VOLT, code)?;
    session.write(regs::GPIO0_CTRL, axp803::gpio0::FUNC_LDO_ON)?;

    session.set_bits(regs::VBUS_CTRL, axp803::VBUS_PATH_ENABLE)?;

    info!("PMIC rail sequence complete");
    Ok(())
}

/// Check the DRAM supply and report its voltage. The Pine64+ straps the
/// AXP803 so DCDC5 resets to 1.24 V, which its DDR3L chips cannot run at;
/// that one board gets the value rewritten.
fn apply_dram_rail<M: Mmio>(
    session: &mut PmicSession<'_, M>,
    board: Option<Board>,
) -> Result<(), RailError> {
    let mut code = session.read(regs::DCDC5_VOLT)? & axp803::DCDC5_CODE_MASK;
    if board == Some(Board::Pine64Plus) && code == DRAM_CODE_MISWIRED {
        info!("fixing Pine64+ DRAM voltage from 1.24V to 1.36V");
        session.write(regs::DCDC5_VOLT, DRAM_CODE_DDR3L)?;
        code = DRAM_CODE_DDR3L;
    }
    info!(
        millivolts = axp803::dcdc5_code_to_millivolts(code),
        "DRAM rail voltage"
    );
    Ok(())
}

/// Enable the display power planes early on laptop boards so the panel
/// comes up before the OS.
fn apply_display_power<M: Mmio>(
    session: &mut PmicSession<'_, M>,
    board: Option<Board>,
) -> Result<(), RailError> {
    match board {
        Some(Board::Pinebook) => {
            session.set_rail(RailRequest { rail: &axp803::DLDO2, millivolts: 2500 })?;
            session.set_rail(RailRequest { rail: &axp803::FLDO1, millivolts: 1200 })?;
            info!("enabled Pinebook display power");
        }
        Some(Board::TeresI) => {
            // Voltages first, then staggered enables: the panel wants the
            // 2.5 V plane settled before the 1.2 V plane comes up.
            session.program_rail(RailRequest { rail: &axp803::DLDO2, millivolts: 2500 })?;
            session.program_rail(RailRequest { rail: &axp803::DLDO3, millivolts: 1200 })?;
            session.enable_rail(&axp803::DLDO2)?;
            session.settle(TERES_DISPLAY_SETTLE_US);
            session.enable_rail(&axp803::DLDO3)?;
            info!("enabled TERES I display power");
        }
        _ => {}
    }
    Ok(())
}
