//! DS1302 real-time clock driver — register codec over a three-wire bus.
//!
//! The chip exposes BCD calendar registers on a bit-banged serial bus
//! (CLK / IO / RST).  This module splits cleanly:
//!
//! - [`Ds1302Bus`] — the electrical transfer (one byte out / in per register
//!   access).  The ESP-IDF implementation bit-bangs GPIOs; tests use an
//!   array-backed bus.
//! - [`Ds1302`] — the register protocol: BCD encode/decode, field masks,
//!   the clock-halt flag, and write-protect handling.
//!
//! Bit 7 of the seconds register is the **clock-halt** flag: when set the
//! oscillator is stopped and every read is unreliable — reported as
//! [`ClockError::Halted`], never guessed around.  The weekday register is
//! written for completeness but ignored on read; the weekday is derived
//! from the civil date instead.

use log::info;

use crate::clock::{weekday_from_date, CalendarTime};
use crate::error::ClockError;

// ── Register map (write address; read address = write | 1) ────

pub const REG_SECONDS: u8 = 0x80;
pub const REG_MINUTES: u8 = 0x82;
pub const REG_HOURS: u8 = 0x84;
pub const REG_DAY: u8 = 0x86;
pub const REG_MONTH: u8 = 0x88;
pub const REG_WEEKDAY: u8 = 0x8A;
pub const REG_YEAR: u8 = 0x8C;
pub const REG_WRITE_PROTECT: u8 = 0x8E;

/// Clock-halt flag in the seconds register.
pub const CLOCK_HALT_BIT: u8 = 0x80;

// ── BCD codec ─────────────────────────────────────────────────

pub fn bcd_to_dec(val: u8) -> u8 {
    (val >> 4) * 10 + (val & 0x0F)
}

pub fn dec_to_bcd(val: u8) -> u8 {
    (val / 10) << 4 | (val % 10)
}

// ── Bus trait ─────────────────────────────────────────────────

/// One register access on the three-wire bus.  `reg` is always the *write*
/// address; implementations set the read bit themselves.
pub trait Ds1302Bus {
    fn write_reg(&mut self, reg: u8, value: u8);
    fn read_reg(&mut self, reg: u8) -> u8;
}

// ── Register-block decode (pure, fuzzable) ────────────────────

/// The seven calendar registers in read order:
/// seconds, minutes, hours, day, month, weekday, year.
pub type RegisterBlock = [u8; 7];

/// Decode a raw register block into calendar time.
///
/// Applies the datasheet field masks, rejects a set halt flag, and
/// range-checks every decoded field — arbitrary register contents must
/// never produce an out-of-range [`CalendarTime`].
pub fn decode_registers(regs: &RegisterBlock) -> Result<CalendarTime, ClockError> {
    if regs[0] & CLOCK_HALT_BIT != 0 {
        return Err(ClockError::Halted);
    }

    let second = bcd_to_dec(regs[0] & 0x7F);
    let minute = bcd_to_dec(regs[1] & 0x7F);
    let hour = bcd_to_dec(regs[2] & 0x3F);
    let day = bcd_to_dec(regs[3] & 0x3F);
    let month = bcd_to_dec(regs[4] & 0x1F);
    // regs[5] is the chip's weekday — ignored, derived from the date.
    let year = 2000 + u16::from(bcd_to_dec(regs[6]));

    CalendarTime::new(year, month, day, hour, minute, second)
}

/// Encode calendar time as the register block for a full write.
/// The seconds register carries a cleared halt bit, restarting the
/// oscillator.
pub fn encode_registers(t: &CalendarTime) -> RegisterBlock {
    [
        dec_to_bcd(t.second) & 0x7F,
        dec_to_bcd(t.minute),
        dec_to_bcd(t.hour),
        dec_to_bcd(t.day),
        dec_to_bcd(t.month),
        dec_to_bcd(weekday_from_date(t.year, t.month, t.day)),
        dec_to_bcd((t.year - 2000) as u8),
    ]
}

// ── Driver ────────────────────────────────────────────────────

/// The protocol layer over any [`Ds1302Bus`].
pub struct Ds1302<B: Ds1302Bus> {
    bus: B,
}

const CALENDAR_REGS: [u8; 7] = [
    REG_SECONDS,
    REG_MINUTES,
    REG_HOURS,
    REG_DAY,
    REG_MONTH,
    REG_WEEKDAY,
    REG_YEAR,
];

impl<B: Ds1302Bus> Ds1302<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Read the calendar registers and decode them.
    pub fn read_time(&mut self) -> Result<CalendarTime, ClockError> {
        let mut regs = [0u8; 7];
        for (slot, reg) in regs.iter_mut().zip(CALENDAR_REGS) {
            *slot = self.bus.read_reg(reg);
        }
        decode_registers(&regs)
    }

    /// Whether the oscillator is currently halted.
    pub fn is_halted(&mut self) -> bool {
        self.bus.read_reg(REG_SECONDS) & CLOCK_HALT_BIT != 0
    }

    /// Write a full calendar time: unlock write-protect, write all seven
    /// registers (halt bit cleared), re-lock.
    pub fn set_time(&mut self, t: &CalendarTime) {
        info!(
            "rtc: setting {} {}",
            t.date_string().as_str(),
            t.time_string().as_str()
        );
        self.bus.write_reg(REG_WRITE_PROTECT, 0x00);
        let regs = encode_registers(t);
        for (reg, value) in CALENDAR_REGS.iter().zip(regs) {
            self.bus.write_reg(*reg, value);
        }
        self.bus.write_reg(REG_WRITE_PROTECT, 0x80);
    }
}

// ── ESP-IDF bit-bang bus ──────────────────────────────────────

/// Bit-banged three-wire bus on the pins from [`crate::pins`].
/// LSB-first transfers with ~10 µs clock half-periods per the datasheet.
#[cfg(target_os = "espidf")]
pub struct BitBangBus {
    clk: i32,
    io: i32,
    rst: i32,
}

#[cfg(target_os = "espidf")]
impl BitBangBus {
    const HALF_PERIOD_US: u32 = 10;

    pub fn new(clk: i32, io: i32, rst: i32) -> Self {
        Self { clk, io, rst }
    }

    fn write_byte(&mut self, value: u8) {
        use crate::drivers::hw_init;
        hw_init::gpio_set_output(self.io);
        for i in 0..8 {
            hw_init::gpio_write(self.io, (value >> i) & 1 != 0);
            hw_init::gpio_write(self.clk, true);
            hw_init::delay_us(Self::HALF_PERIOD_US);
            hw_init::gpio_write(self.clk, false);
            hw_init::delay_us(Self::HALF_PERIOD_US);
        }
    }

    fn read_byte(&mut self) -> u8 {
        use crate::drivers::hw_init;
        hw_init::gpio_set_input(self.io);
        let mut value = 0u8;
        for i in 0..8 {
            if hw_init::gpio_read(self.io) {
                value |= 1 << i;
            }
            hw_init::gpio_write(self.clk, true);
            hw_init::delay_us(Self::HALF_PERIOD_US);
            hw_init::gpio_write(self.clk, false);
            hw_init::delay_us(Self::HALF_PERIOD_US);
        }
        value
    }
}

#[cfg(target_os = "espidf")]
impl Ds1302Bus for BitBangBus {
    fn write_reg(&mut self, reg: u8, value: u8) {
        use crate::drivers::hw_init;
        hw_init::gpio_write(self.rst, true);
        hw_init::delay_us(Self::HALF_PERIOD_US);
        self.write_byte(reg & 0xFE);
        self.write_byte(value);
        hw_init::delay_us(Self::HALF_PERIOD_US);
        hw_init::gpio_write(self.rst, false);
    }

    fn read_reg(&mut self, reg: u8) -> u8 {
        use crate::drivers::hw_init;
        hw_init::gpio_write(self.rst, true);
        hw_init::delay_us(Self::HALF_PERIOD_US);
        self.write_byte(reg | 1);
        let value = self.read_byte();
        hw_init::delay_us(Self::HALF_PERIOD_US);
        hw_init::gpio_write(self.rst, false);
        value
    }
}

// ── Host simulation bus ───────────────────────────────────────

/// Array-backed bus for host tests: registers behave like chip RAM, with
/// write-protect honoured.
#[cfg(not(target_os = "espidf"))]
pub struct SimBus {
    regs: [u8; 256],
    write_protected: bool,
}

#[cfg(not(target_os = "espidf"))]
impl SimBus {
    /// A bus whose clock powered up halted (factory-fresh chip).
    pub fn halted() -> Self {
        let mut regs = [0u8; 256];
        regs[REG_SECONDS as usize] = CLOCK_HALT_BIT;
        Self {
            regs,
            write_protected: true,
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Ds1302Bus for SimBus {
    fn write_reg(&mut self, reg: u8, value: u8) {
        if reg == REG_WRITE_PROTECT {
            self.write_protected = value & 0x80 != 0;
            return;
        }
        if !self.write_protected {
            self.regs[(reg & 0xFE) as usize] = value;
        }
    }

    fn read_reg(&mut self, reg: u8) -> u8 {
        self.regs[(reg & 0xFE) as usize]
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd_codec() {
        assert_eq!(bcd_to_dec(0x59), 59);
        assert_eq!(bcd_to_dec(0x00), 0);
        assert_eq!(dec_to_bcd(59), 0x59);
        assert_eq!(dec_to_bcd(7), 0x07);
        for v in 0..=99u8 {
            assert_eq!(bcd_to_dec(dec_to_bcd(v)), v);
        }
    }

    #[test]
    fn decode_respects_halt_flag() {
        let mut regs: RegisterBlock = [0x30, 0x15, 0x07, 0x30, 0x08, 0x01, 0x26];
        assert!(decode_registers(&regs).is_ok());
        regs[0] |= CLOCK_HALT_BIT;
        assert_eq!(decode_registers(&regs), Err(ClockError::Halted));
    }

    #[test]
    fn decode_known_block() {
        // 2026-08-30 07:15:30
        let regs: RegisterBlock = [0x30, 0x15, 0x07, 0x30, 0x08, 0x07, 0x26];
        let t = decode_registers(&regs).unwrap();
        assert_eq!((t.year, t.month, t.day), (2026, 8, 30));
        assert_eq!((t.hour, t.minute, t.second), (7, 15, 30));
        assert_eq!(t.weekday, 7); // derived: that date is a Sunday
    }

    #[test]
    fn decode_rejects_garbage_fields() {
        // month BCD 0x13 = 19 after the 0x1F mask — out of range.
        let regs: RegisterBlock = [0x00, 0x00, 0x00, 0x01, 0x13, 0x01, 0x26];
        assert_eq!(decode_registers(&regs), Err(ClockError::OutOfRange));
        // day 0 is not a valid day-of-month.
        let regs: RegisterBlock = [0x00, 0x00, 0x00, 0x00, 0x08, 0x01, 0x26];
        assert_eq!(decode_registers(&regs), Err(ClockError::OutOfRange));
    }

    #[test]
    fn set_time_clears_halt_and_round_trips() {
        let mut rtc = Ds1302::new(SimBus::halted());
        assert!(rtc.is_halted());
        assert_eq!(rtc.read_time(), Err(ClockError::Halted));

        let t = CalendarTime::new(2026, 8, 30, 7, 15, 30).unwrap();
        rtc.set_time(&t);

        assert!(!rtc.is_halted());
        assert_eq!(rtc.read_time(), Ok(t));
    }

    #[test]
    fn write_protect_blocks_stray_register_writes() {
        let mut bus = SimBus::halted();
        // Protected by default: the write must not land.
        bus.write_reg(REG_MINUTES, 0x59);
        assert_eq!(bus.read_reg(REG_MINUTES), 0x00);

        bus.write_reg(REG_WRITE_PROTECT, 0x00);
        bus.write_reg(REG_MINUTES, 0x59);
        assert_eq!(bus.read_reg(REG_MINUTES), 0x59);
    }
}
