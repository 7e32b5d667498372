//! The GSU (Graphics Support Unit) core: register file, cache, and fetch/decode/execute loop

mod codecache;
mod instructions;

use crate::superfx::gsu::codecache::CodeCache;
use crate::superfx::gsu::instructions::plot::PlotState;
use bincode::{Decode, Encode};
use jgenesis_common::num::{GetBit, U16Ext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum BusAccess {
    Snes,
    Gsu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum ClockSpeed {
    #[default]
    Slow,
    Fast,
}

impl ClockSpeed {
    pub fn memory_access_cycles(self) -> u8 {
        match self {
            Self::Slow => 5,
            Self::Fast => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum MultiplierSpeed {
    #[default]
    Standard,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum ScreenHeight {
    #[default]
    Bg128Pixel,
    Bg160Pixel,
    Bg192Pixel,
    ObjMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum ColorGradient {
    #[default]
    FourColor,
    SixteenColor,
    TwoFiftySixColor,
}

impl ColorGradient {
    pub fn bitplanes(self) -> u32 {
        match self {
            Self::FourColor => 2,
            Self::SixteenColor => 4,
            Self::TwoFiftySixColor => 8,
        }
    }

    pub fn tile_size(self) -> u32 {
        8 * self.bitplanes()
    }

    pub fn color_mask(self) -> u8 {
        match self {
            Self::FourColor => 0x03,
            Self::SixteenColor => 0x0F,
            Self::TwoFiftySixColor => 0xFF,
        }
    }

    fn from_scmr(scmr: u8) -> Self {
        match scmr & 0x03 {
            0x00 => Self::FourColor,
            0x01 => Self::SixteenColor,
            _ => Self::TwoFiftySixColor,
        }
    }
}

#[derive(Debug, Clone, Encode, Decode)]
pub(super) struct GsuState {
    pub(super) opcode_buffer: u8,
    pub(super) ram_address_buffer: u16,
    pub(super) ram_buffer_wait_cycles: u8,
    pub(super) ram_buffer_written: bool,
    pub(super) rom_buffer: u8,
    pub(super) rom_buffer_wait_cycles: u8,
    pub(super) just_jumped: bool,
}

impl GsuState {
    fn new() -> Self {
        Self {
            opcode_buffer: 0,
            ram_address_buffer: 0,
            ram_buffer_wait_cycles: 0,
            ram_buffer_written: false,
            rom_buffer: 0,
            rom_buffer_wait_cycles: 0,
            just_jumped: false,
        }
    }
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct GraphicsSupportUnit {
    pub(super) r: [u16; 16],
    pub(super) sreg: u8,
    pub(super) dreg: u8,
    pub(super) b: bool,
    pub(super) alt1: bool,
    pub(super) alt2: bool,
    pub(super) zero_flag: bool,
    pub(super) carry_flag: bool,
    pub(super) sign_flag: bool,
    pub(super) overflow_flag: bool,
    irq_flag: bool,
    irq_mask_enabled: bool,
    go: bool,
    high_speed_enabled: bool,
    pub(super) clock_speed: ClockSpeed,
    pub(super) multiplier_speed: MultiplierSpeed,
    pub(super) pbr: u8,
    pub(super) rombr: u8,
    rambr: u8,
    pub(super) screen_base: u32,
    pub(super) screen_height: ScreenHeight,
    pub(super) color_gradient: ColorGradient,
    pub(super) color: u8,
    pub(super) plot_transparent_pixels: bool,
    pub(super) dither_on: bool,
    pub(super) por_high_nibble_flag: bool,
    pub(super) por_freeze_high_nibble: bool,
    pub(super) force_obj_mode: bool,
    pub(super) code_cache: CodeCache,
    pub(super) plot_state: PlotState,
    pub(super) state: GsuState,
    sleep_cycles: u64,
    cycles_pending: u64,
}

impl GraphicsSupportUnit {
    pub fn new() -> Self {
        Self {
            r: [0; 16],
            sreg: 0,
            dreg: 0,
            b: false,
            alt1: false,
            alt2: false,
            zero_flag: false,
            carry_flag: false,
            sign_flag: false,
            overflow_flag: false,
            irq_flag: false,
            irq_mask_enabled: true,
            go: false,
            high_speed_enabled: false,
            clock_speed: ClockSpeed::default(),
            multiplier_speed: MultiplierSpeed::default(),
            pbr: 0,
            rombr: 0,
            rambr: 0,
            screen_base: 0,
            screen_height: ScreenHeight::default(),
            color_gradient: ColorGradient::default(),
            color: 0,
            plot_transparent_pixels: false,
            dither_on: false,
            por_high_nibble_flag: false,
            por_freeze_high_nibble: false,
            force_obj_mode: false,
            code_cache: CodeCache::new(),
            plot_state: PlotState::new(),
            state: GsuState::new(),
            sleep_cycles: 0,
            cycles_pending: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.go
    }

    pub fn irq(&self) -> bool {
        self.irq_flag && self.irq_mask_enabled
    }

    pub fn rom_access(&self) -> BusAccess {
        if self.go && self.state.rom_buffer_wait_cycles > 0 { BusAccess::Gsu } else { BusAccess::Snes }
    }

    pub fn ram_access(&self) -> BusAccess {
        if self.go && self.state.ram_buffer_wait_cycles > 0 { BusAccess::Gsu } else { BusAccess::Snes }
    }

    pub fn reset(&mut self) {
        self.go = false;
        self.irq_flag = false;
        self.cycles_pending = 0;
        self.sleep_cycles = 0;
        self.code_cache.full_clear();
    }

    #[must_use]
    fn r15(&self) -> u16 {
        self.r[15]
    }

    pub fn tick(&mut self, master_cycles_elapsed: u64, rom: &[u8], ram: &mut [u8]) {
        if !self.go {
            return;
        }

        // GSU cycles advance once per master cycle at "slow" speed, twice at "fast" speed;
        // the overclock factor passed in by the caller has already scaled `master_cycles_elapsed`
        self.cycles_pending += master_cycles_elapsed;

        while self.cycles_pending > 0 && self.go {
            let cycles = instructions::step(self, rom, ram);
            self.cycles_pending = self.cycles_pending.saturating_sub(cycles.max(1) as u64);
        }
    }

    pub fn read_register(&mut self, address: u32) -> Option<u8> {
        let offset = address & 0xFFFF;
        if (0x3000..=0x301F).contains(&offset) {
            let register = ((offset - 0x3000) / 2) as usize;
            return Some(if offset % 2 == 0 { self.r[register].lsb() } else { self.r[register].msb() });
        }

        let value = match offset {
            0x3030 => {
                // SFR low byte: flags + GO bit
                (u8::from(self.zero_flag) << 1)
                    | (u8::from(self.carry_flag) << 2)
                    | (u8::from(self.sign_flag) << 3)
                    | (u8::from(self.overflow_flag) << 4)
                    | (u8::from(self.go))
            }
            0x3031 => {
                // SFR high byte: IRQ pending + IRQ mask + running flag
                (u8::from(self.irq_flag) << 7) | (u8::from(!self.irq_mask_enabled) << 6) | (u8::from(self.go) << 5)
            }
            0x3034 => self.pbr,
            0x3036 => self.rombr,
            0x3037 => {
                (u8::from(self.multiplier_speed == MultiplierSpeed::High) << 5)
                    | (u8::from(self.irq_mask_enabled) << 7)
            }
            0x3038 => (self.screen_base >> 10) as u8,
            0x3039 => u8::from(self.clock_speed == ClockSpeed::Fast),
            0x303A => {
                let screen_bits = match self.screen_height {
                    ScreenHeight::Bg128Pixel => 0x00,
                    ScreenHeight::Bg160Pixel => 0x04,
                    ScreenHeight::Bg192Pixel => 0x08,
                    ScreenHeight::ObjMode => 0x0C,
                };
                let color_bits = match self.color_gradient {
                    ColorGradient::FourColor => 0x00,
                    ColorGradient::SixteenColor => 0x01,
                    ColorGradient::TwoFiftySixColor => 0x03,
                };
                screen_bits | color_bits | (u8::from(self.high_speed_enabled) << 4)
            }
            0x303B => 0x04, // VCR: fixed GSU-1/GSU-2 version number
            0x303C => self.rambr,
            0x303E => self.code_cache.cbr().lsb(),
            0x303F => self.code_cache.cbr().msb(),
            _ => return None,
        };

        Some(value)
    }

    pub fn write_register(&mut self, address: u32, value: u8) {
        let offset = address & 0xFFFF;
        if (0x3000..=0x301F).contains(&offset) {
            let register = ((offset - 0x3000) / 2) as usize;
            if offset % 2 == 0 {
                self.r[register].set_lsb(value);
            } else {
                self.r[register].set_msb(value);

                if register == 15 {
                    // Writing R15H starts execution from the new PC
                    self.go = true;
                }
            }
            return;
        }

        match offset {
            0x3030 => {
                // SFR low byte is read-only from the SNES side except for the GO bit
            }
            0x3031 => {
                let go = value.bit(5);
                if !go {
                    self.go = false;
                }
                self.irq_mask_enabled = !value.bit(6);
                if value.bit(7) {
                    self.irq_flag = false;
                }
            }
            0x3033 => {
                self.state.ram_buffer_written = value.bit(0);
            }
            0x3034 => self.pbr = value,
            0x3036 => self.rombr = value,
            0x3037 => {
                self.multiplier_speed =
                    if value.bit(5) { MultiplierSpeed::High } else { MultiplierSpeed::Standard };
                self.irq_mask_enabled = value.bit(7);
            }
            0x3038 => {
                self.screen_base = u32::from(value) << 10;
            }
            0x3039 => {
                self.clock_speed = if value.bit(0) { ClockSpeed::Fast } else { ClockSpeed::Slow };
            }
            0x303A => {
                self.color_gradient = ColorGradient::from_scmr(value);
                self.screen_height = match value & 0x0C {
                    0x00 => ScreenHeight::Bg128Pixel,
                    0x04 => ScreenHeight::Bg160Pixel,
                    0x08 => ScreenHeight::Bg192Pixel,
                    _ => ScreenHeight::ObjMode,
                };
                self.high_speed_enabled = value.bit(4);
            }
            0x303C => self.rambr = value & 0x01,
            _ => {}
        }
    }

    pub fn read_code_cache_ram(&mut self, address: u32) -> Option<u8> {
        Some(self.code_cache.read_ram(address as u16))
    }

    pub fn write_code_cache_ram(&mut self, address: u32, value: u8) {
        self.code_cache.write_ram(address as u16, value);
    }
}
