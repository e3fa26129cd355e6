//! Early-boot power bring-up for Allwinner A64 boards.
//!
//! This crate drives the A64's Reduced Serial Bus (RSB) controller to reach
//! the X-Powers AXP803 PMIC and program its voltage rails before DRAM is
//! trained. It runs on the primary boot core with no OS, no heap and no
//! interrupts: every wait is a busy-poll on a controller status register.
//!
//! The layers, bottom up:
//!
//! - [`hw`]: volatile MMIO access, behind a trait so tests can model the SoC.
//! - [`rsb`]: the RSB controller itself — pad takeover, clocking, and
//!   single blocking transactions.
//! - [`session`]: an addressed connection to the AXP803 (mode switch,
//!   runtime address assignment, chip-id verification).
//! - [`rail`] and [`sequence`]: voltage quantization and the board-specific
//!   bring-up order, entered through [`sequence::run_sequence`].
//!
//! The boot stage calls `run_sequence` exactly once after clock setup. No
//! state lives outside the hardware registers except the caller-owned
//! [`session::PmicIdentity`] slot.

#![cfg_attr(not(test), no_std)]

pub mod axp803;
pub mod board;
pub mod error;
pub mod hw;
pub mod rail;
pub mod rsb;
pub mod sequence;
pub mod session;

#[cfg(test)]
mod fake;
