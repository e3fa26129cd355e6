//! Volatile MMIO access.
//!
//! Everything in this crate reaches hardware through the [`Mmio`] trait, so
//! the rest of the stack can be driven against a modeled SoC in tests. The
//! production implementation is raw volatile pointer access plus a
//! generic-timer delay, compiled only for aarch64.
//!
//! # Safety
//!
//! An [`Mmio`] implementor must only be handed physical addresses that are
//! mapped device memory. In the boot stage this crate runs in, the MMU is
//! either off or identity-maps the peripherals, so the register block
//! addresses in [`crate::rsb`] are used directly.

/// 32-bit register access at physical addresses, plus a microsecond delay.
pub trait Mmio {
    fn read32(&self, addr: usize) -> u32;
    fn write32(&self, addr: usize, value: u32);

    /// Read-modify-write a register.
    fn modify32(&self, addr: usize, f: impl FnOnce(u32) -> u32) {
        let value = self.read32(addr);
        self.write32(addr, f(value));
    }

    /// Spin for at least `micros` microseconds.
    fn udelay(&self, micros: u32);
}

#[cfg(target_arch = "aarch64")]
pub use a64::A64Mmio;

#[cfg(target_arch = "aarch64")]
mod a64 {
    use super::Mmio;
    use aarch64_cpu::registers::{CNTFRQ_EL0, CNTPCT_EL0};
    use core::ptr::{read_volatile, write_volatile};
    use tock_registers::interfaces::Readable;

    /// Direct MMIO on the A64. Zero-sized; the addresses passed in are the
    /// physical peripheral addresses.
    #[derive(Clone, Copy, Default)]
    pub struct A64Mmio;

    impl Mmio for A64Mmio {
        #[inline]
        fn read32(&self, addr: usize) -> u32 {
            unsafe { read_volatile(addr as *const u32) }
        }

        #[inline]
        fn write32(&self, addr: usize, value: u32) {
            unsafe { write_volatile(addr as *mut u32, value) }
        }

        fn udelay(&self, micros: u32) {
            let freq = CNTFRQ_EL0.get();
            let ticks = (freq * micros as u64).div_ceil(1_000_000);
            let deadline = CNTPCT_EL0.get() + ticks;
            while CNTPCT_EL0.get() < deadline {
                core::hint::spin_loop();
            }
        }
    }
}
