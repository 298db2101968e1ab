//! Virtual character LCD for lock emulation.
//!
//! This module provides a virtual HD44780-style display that accepts the
//! same instruction and data bytes the lock firmware sends to the real
//! module. It keeps display data RAM for each line, tracks the address
//! counter and the entry/display/function modes, and records the values
//! driven onto the display port in a bounded trace.
//!
//! # Addressing
//!
//! Each line owns 40 bytes of display RAM. Line 1 starts at address `0x00`
//! and line 2 at `0x40`; only the first `columns` bytes of each line are
//! visible. A set-cursor instruction is `0x80 | address`, so `0xC1` places
//! the cursor on line 2, column 1.
//!
//! # Bus Framing
//!
//! The module is wired in 4-bit mode: every byte goes out as two nibbles,
//! high nibble first, each latched by pulsing the enable line (`0x08`).
//! Data bytes also raise register select (`0x04`). A data write of `'1'`
//! therefore appears on the port as `0x3C 0x34 0x1C 0x14`.
//!
//! # Examples
//!
//! ```
//! use elock_emulator::VirtualLcd;
//! use elock_hardware::CharacterDisplay;
//!
//! let mut lcd = VirtualLcd::new(2, 16);
//! lcd.initialization();
//!
//! assert_eq!(lcd.get_line(0).unwrap(), "0000            ");
//! assert_eq!(lcd.get_line(1).unwrap().trim(), "Enter PW");
//! assert_eq!(lcd.cursor(), (0, 0));
//! ```
//!
//! ## Builder Pattern
//!
//! ```
//! use elock_emulator::VirtualLcd;
//! use elock_hardware::CharacterDisplay;
//!
//! let mut lcd = VirtualLcd::builder()
//!     .with_size(2, 20)
//!     .with_trace_capacity(4)
//!     .build();
//! lcd.command(0x80);
//!
//! assert_eq!(lcd.columns(), 20);
//! assert_eq!(lcd.take_port_writes(), vec![0x88, 0x80, 0x08, 0x00]);
//! ```

use std::collections::VecDeque;

use elock_core::constants::{
    DEFAULT_LCD_COLUMNS, DEFAULT_LCD_LINES, DEFAULT_LCD_TRACE_CAPACITY, LCD_LINE2_ADDRESS,
};
use elock_core::{Error, Result};
use elock_hardware::CharacterDisplay;

/// Display RAM bytes per line.
const DDRAM_LINE_WIDTH: usize = 0x28;

/// Most lines the controller can address.
const MAX_LINES: usize = 2;

/// Port bit wired to the enable strobe.
const BUS_ENABLE: u8 = 0x08;

/// Port bit wired to register select (set for data, clear for instructions).
const BUS_REGISTER_SELECT: u8 = 0x04;

/// Port value while the bus idles before reset.
const BUS_IDLE: u8 = 0xFF;

/// Wake-up nibbles sent during reset, before the controller is in 4-bit mode.
const RESET_NIBBLES: [u8; 4] = [0x30, 0x30, 0x30, 0x20];

/// Register targeted by a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Register {
    Instruction,
    Data,
}

/// Port values for one byte on the 4-bit bus: the high nibble with enable
/// raised, the high nibble latched, then the same pair for the low nibble.
fn frames(register: Register, value: u8) -> [u8; 4] {
    let rs = match register {
        Register::Instruction => 0,
        Register::Data => BUS_REGISTER_SELECT,
    };
    let high = value & 0xF0;
    let low = (value & 0x0F) << 4;
    [
        high | BUS_ENABLE | rs,
        high | rs,
        low | BUS_ENABLE | rs,
        low | rs,
    ]
}

/// Virtual two-line character LCD.
///
/// Not thread-safe; the lock runtime owns it exclusively.
#[derive(Debug, Clone)]
pub struct VirtualLcd {
    lines: usize,
    columns: usize,
    ddram: Vec<[u8; DDRAM_LINE_WIDTH]>,

    /// Address counter, as set by `0x80 | address`.
    address: u8,

    increment: bool,
    display_on: bool,
    cursor_visible: bool,
    cursor_blink: bool,
    four_bit: bool,
    two_line: bool,

    /// Port writes, oldest first.
    trace: VecDeque<u8>,
    trace_capacity: usize,
}

impl VirtualLcd {
    /// Create a display with the given visible size.
    ///
    /// `lines` is clamped to 1-2 and `columns` to 1-40.
    pub fn new(lines: usize, columns: usize) -> Self {
        Self::with_capacity(lines, columns, DEFAULT_LCD_TRACE_CAPACITY)
    }

    fn with_capacity(lines: usize, columns: usize, trace_capacity: usize) -> Self {
        let lines = lines.clamp(1, MAX_LINES);
        let columns = columns.clamp(1, DDRAM_LINE_WIDTH);
        Self {
            lines,
            columns,
            ddram: vec![[b' '; DDRAM_LINE_WIDTH]; lines],
            address: 0,
            increment: true,
            display_on: false,
            cursor_visible: false,
            cursor_blink: false,
            four_bit: false,
            two_line: false,
            trace: VecDeque::with_capacity(trace_capacity.min(DEFAULT_LCD_TRACE_CAPACITY)),
            trace_capacity,
        }
    }

    /// Create a builder for a display with custom size or trace capacity.
    pub fn builder() -> VirtualLcdBuilder {
        VirtualLcdBuilder::default()
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Visible text of one line, padded with spaces to the column count.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLine` if `line` is out of range.
    pub fn get_line(&self, line: usize) -> Result<String> {
        let row = self.ddram.get(line).ok_or(Error::InvalidLine {
            line,
            max: self.lines - 1,
        })?;
        Ok(row[..self.columns].iter().map(|&b| char::from(b)).collect())
    }

    /// Visible text of every line.
    pub fn get_all_lines(&self) -> Vec<String> {
        (0..self.lines)
            .filter_map(|line| self.get_line(line).ok())
            .collect()
    }

    /// Character at a visible position.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLine` if the position is off the display.
    pub fn char_at(&self, line: usize, column: usize) -> Result<char> {
        let row = self
            .ddram
            .get(line)
            .filter(|_| column < self.columns)
            .ok_or(Error::InvalidLine {
                line,
                max: self.lines - 1,
            })?;
        Ok(char::from(row[column]))
    }

    /// Cursor position as (line, column), derived from the address counter.
    pub fn cursor(&self) -> (usize, usize) {
        Self::locate(self.address).unwrap_or((0, 0))
    }

    /// Raw address counter.
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn is_display_on(&self) -> bool {
        self.display_on
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    pub fn is_cursor_blinking(&self) -> bool {
        self.cursor_blink
    }

    /// Returns `true` once the controller has been switched to the 4-bit bus.
    pub fn is_four_bit(&self) -> bool {
        self.four_bit
    }

    pub fn is_two_line(&self) -> bool {
        self.two_line
    }

    /// Drain the port writes recorded since the last call, oldest first.
    pub fn take_port_writes(&mut self) -> Vec<u8> {
        self.trace.drain(..).collect()
    }

    /// Map a DDRAM address to (line, column).
    fn locate(address: u8) -> Option<(usize, usize)> {
        let address = usize::from(address);
        let line2 = usize::from(LCD_LINE2_ADDRESS);
        if address < DDRAM_LINE_WIDTH {
            Some((0, address))
        } else if (line2..line2 + DDRAM_LINE_WIDTH).contains(&address) {
            Some((1, address - line2))
        } else {
            None
        }
    }

    fn drive(&mut self, port: u8) {
        if self.trace_capacity == 0 {
            return;
        }
        if self.trace.len() == self.trace_capacity {
            self.trace.pop_front();
        }
        self.trace.push_back(port);
    }

    fn record(&mut self, register: Register, value: u8) {
        for port in frames(register, value) {
            self.drive(port);
        }
    }

    fn clear_ddram(&mut self) {
        for row in &mut self.ddram {
            row.fill(b' ');
        }
    }

    /// Move the address counter one step, wrapping line 1's end onto line 2
    /// and line 2's end back onto line 1.
    fn step_address(&mut self, forward: bool) {
        let last1 = (DDRAM_LINE_WIDTH - 1) as u8;
        let last2 = LCD_LINE2_ADDRESS + last1;
        self.address = match (forward, self.address) {
            (true, a) if a == last1 => LCD_LINE2_ADDRESS,
            (true, a) if a == last2 => 0,
            (true, a) => a.wrapping_add(1),
            (false, 0) => last2,
            (false, a) if a == LCD_LINE2_ADDRESS => last1,
            (false, a) => a.wrapping_sub(1),
        };
    }
}

impl Default for VirtualLcd {
    fn default() -> Self {
        Self::new(DEFAULT_LCD_LINES, DEFAULT_LCD_COLUMNS)
    }
}

impl CharacterDisplay for VirtualLcd {
    fn reset(&mut self) {
        self.drive(BUS_IDLE);
        for nibble in RESET_NIBBLES {
            self.drive(nibble | BUS_ENABLE);
            self.drive(nibble);
        }
        self.clear_ddram();
        self.address = 0;
        self.increment = true;
        self.display_on = false;
        self.cursor_visible = false;
        self.cursor_blink = false;
        self.four_bit = true;
    }

    fn command(&mut self, instruction: u8) {
        self.record(Register::Instruction, instruction);
        match instruction {
            0x00 => {}
            0x01 => {
                self.clear_ddram();
                self.address = 0;
                self.increment = true;
            }
            0x02..=0x03 => self.address = 0,
            0x04..=0x07 => self.increment = instruction & 0x02 != 0,
            0x08..=0x0F => {
                self.display_on = instruction & 0x04 != 0;
                self.cursor_visible = instruction & 0x02 != 0;
                self.cursor_blink = instruction & 0x01 != 0;
            }
            // Cursor shift; display shift is not modelled.
            0x10..=0x1F => {
                if instruction & 0x08 == 0 {
                    self.step_address(instruction & 0x04 != 0);
                }
            }
            0x20..=0x3F => {
                self.four_bit = instruction & 0x10 == 0;
                self.two_line = instruction & 0x08 != 0;
            }
            // CGRAM addressing is accepted and ignored.
            0x40..=0x7F => {}
            _ => self.address = instruction & 0x7F,
        }
    }

    fn write_data(&mut self, byte: u8) {
        self.record(Register::Data, byte);
        if let Some((line, column)) = Self::locate(self.address)
            && let Some(row) = self.ddram.get_mut(line)
        {
            row[column] = byte;
        }
        self.step_address(self.increment);
    }
}

/// Builder for [`VirtualLcd`].
#[derive(Debug, Clone)]
pub struct VirtualLcdBuilder {
    lines: usize,
    columns: usize,
    trace_capacity: usize,
}

impl Default for VirtualLcdBuilder {
    fn default() -> Self {
        Self {
            lines: DEFAULT_LCD_LINES,
            columns: DEFAULT_LCD_COLUMNS,
            trace_capacity: DEFAULT_LCD_TRACE_CAPACITY,
        }
    }
}

impl VirtualLcdBuilder {
    pub fn with_size(mut self, lines: usize, columns: usize) -> Self {
        self.lines = lines;
        self.columns = columns;
        self
    }

    /// Number of port writes to keep; 0 disables the trace.
    pub fn with_trace_capacity(mut self, capacity: usize) -> Self {
        self.trace_capacity = capacity;
        self
    }

    pub fn build(self) -> VirtualLcd {
        VirtualLcd::with_capacity(self.lines, self.columns, self.trace_capacity)
    }
}
