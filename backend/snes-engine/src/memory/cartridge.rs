//! SNES cartridge loading and mapping code

use crate::api::{SnesLoadError, SnesLoadResult};
use bincode::{Decode, Encode};
use jgenesis_common::frontend::{PartialClone, SaveWriter, TimingMode};
use jgenesis_proc_macros::{FakeDecode, FakeEncode};
use snes_coprocessors::superfx::SuperFx;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::mem;
use std::num::NonZeroU64;
use std::ops::Deref;

#[derive(Debug, Clone, FakeEncode, FakeDecode)]
pub struct Rom(pub Box<[u8]>);

impl Default for Rom {
    fn default() -> Self {
        Rom(vec![].into_boxed_slice())
    }
}

impl Deref for Rom {
    type Target = Box<[u8]>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CartridgeType {
    LoRom,
    HiRom,
    ExHiRom,
    SuperFx,
}

impl Display for CartridgeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoRom => write!(f, "LoROM"),
            Self::HiRom => write!(f, "HiROM"),
            Self::ExHiRom => write!(f, "ExHiROM"),
            Self::SuperFx => write!(f, "Super FX"),
        }
    }
}

const LOROM_HEADER_ADDR: usize = 0x007FC0;
const HIROM_HEADER_ADDR: usize = 0x00FFC0;
const EXHIROM_HEADER_ADDR: usize = 0x40FFC0;

const HEADER_MAP_OFFSET: usize = 0x15;

const LOROM_RESET_VECTOR: usize = 0x7FFC;
const HIROM_RESET_VECTOR: usize = 0xFFFC;

#[derive(Debug, Clone, Copy, Encode, Decode)]
pub enum RomAddressMask {
    PowerOfTwo { mask: u32 },
    NonPowerOfTwo { primary_mask: u32, secondary_mask: u32 },
}

impl RomAddressMask {
    fn from_rom_len(rom_len: u32) -> Self {
        if rom_len.count_ones() == 1 {
            // Easy case
            return Self::PowerOfTwo { mask: rom_len - 1 };
        }

        // Annoying case; some games depend on getting this right, e.g. Mega Man X
        let rom_len_log2 = rom_len.ilog2();
        let primary_mask = 1 << rom_len_log2;
        let secondary_log2 = (rom_len & !primary_mask).ilog2();
        let secondary_mask = (1 << secondary_log2) - 1;
        Self::NonPowerOfTwo { primary_mask, secondary_mask }
    }

    fn mask(self, rom_addr: u32) -> u32 {
        match self {
            Self::PowerOfTwo { mask } => rom_addr & mask,
            Self::NonPowerOfTwo { primary_mask, secondary_mask } => {
                if rom_addr & primary_mask == 0 {
                    rom_addr & (primary_mask - 1)
                } else {
                    primary_mask | (rom_addr & secondary_mask)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Encode, Decode, PartialClone)]
pub enum Cartridge {
    LoRom {
        #[partial_clone(default)]
        rom: Rom,
        sram: Box<[u8]>,
        mask: RomAddressMask,
    },
    HiRom {
        #[partial_clone(default)]
        rom: Rom,
        sram: Box<[u8]>,
        mask: RomAddressMask,
    },
    ExHiRom {
        #[partial_clone(default)]
        rom: Rom,
        sram: Box<[u8]>,
        mask: RomAddressMask,
    },
    SuperFx(#[partial_clone(partial)] SuperFx),
}

impl Cartridge {
    pub fn create(
        rom: Box<[u8]>,
        initial_sram: Option<Vec<u8>>,
        forced_timing_mode: Option<TimingMode>,
        gsu_overclock_factor: NonZeroU64,
    ) -> SnesLoadResult<Self> {
        if rom.len() < 0x8000 {
            return Err(SnesLoadError::RomTooSmall { len: rom.len() });
        }

        // Older SNES ROM images have an extra 512-byte header; check for that and strip it off
        if rom.len() & 0x7FFF == 0x0200 {
            let stripped_rom = rom[0x200..].to_vec().into_boxed_slice();
            return Self::create(
                stripped_rom,
                initial_sram,
                forced_timing_mode,
                gsu_overclock_factor,
            );
        }

        let cartridge_type = guess_cartridge_type(&rom).unwrap_or_else(|| {
            log::error!("Unable to confidently determine ROM type; defaulting to LoROM");
            CartridgeType::LoRom
        });

        let rom_header_addr = match cartridge_type {
            CartridgeType::LoRom | CartridgeType::SuperFx => LOROM_HEADER_ADDR,
            CartridgeType::HiRom => HIROM_HEADER_ADDR,
            CartridgeType::ExHiRom => EXHIROM_HEADER_ADDR,
        };

        // Chipset byte identifies coprocessors; refuse anything other than Super FX-class chips.
        // $03-$05 = math coprocessor, $13-$1A = Super FX-class, $25 = OBC1, $34/$35 = other
        // accelerator, $Fx = various RTC/custom-CPU chips
        let chipset_byte = rom[rom_header_addr + 0x16];
        let needs_unsupported_coprocessor = matches!(chipset_byte, 0x03..=0x05 | 0x25 | 0x34 | 0x35)
            || (matches!(chipset_byte, 0xF0..=0xFF) && cartridge_type != CartridgeType::SuperFx);
        if needs_unsupported_coprocessor {
            return Err(SnesLoadError::UnsupportedCoprocessor { chipset_byte });
        }

        // $FFD8 contains SRAM size as a kilobytes power of 2
        let sram_header_byte = rom[rom_header_addr | 0x0018];

        let sram_len = if cartridge_type == CartridgeType::SuperFx {
            snes_coprocessors::superfx::guess_ram_len(&rom)
        } else if sram_header_byte == 0 {
            0
        } else {
            1 << (10 + sram_header_byte)
        };

        let sram = match initial_sram {
            Some(sram) if sram.len() == sram_len => sram.into_boxed_slice(),
            _ => vec![0; sram_len].into_boxed_slice(),
        };

        log::info!("Using mapper {cartridge_type} with SRAM size {sram_len}");

        Ok(match cartridge_type {
            CartridgeType::LoRom => {
                let mask = RomAddressMask::from_rom_len(rom.len() as u32);
                Self::LoRom { rom: Rom(rom), sram, mask }
            }
            CartridgeType::HiRom => {
                let mask = RomAddressMask::from_rom_len(rom.len() as u32);
                Self::HiRom { rom: Rom(rom), sram, mask }
            }
            CartridgeType::ExHiRom => {
                let mask = RomAddressMask::from_rom_len(rom.len() as u32);
                Self::ExHiRom { rom: Rom(rom), sram, mask }
            }
            CartridgeType::SuperFx => Self::SuperFx(SuperFx::new(rom, sram, gsu_overclock_factor)),
        })
    }

    pub fn read(&mut self, address: u32) -> Option<u8> {
        let (mapped_address, rom, sram) = match self {
            Self::LoRom { rom, sram, mask } => {
                (lorom_map_address(address, *mask, sram.len() as u32), rom, sram)
            }
            Self::HiRom { rom, sram, mask } => {
                (hirom_map_address(address, *mask, sram.len() as u32), rom, sram)
            }
            Self::ExHiRom { rom, sram, mask } => (
                exhirom_map_address(address, *mask, rom.len() as u32, sram.len() as u32),
                rom,
                sram,
            ),
            Self::SuperFx(sfx) => return sfx.read(address),
        };

        match mapped_address {
            CartridgeAddress::None => None,
            CartridgeAddress::Rom(rom_addr) => Some(rom[rom_addr as usize]),
            CartridgeAddress::Sram(sram_addr) => Some(sram[sram_addr as usize]),
        }
    }

    pub fn write(&mut self, address: u32, value: u8) {
        match self {
            Self::LoRom { sram, mask, .. } => {
                if let CartridgeAddress::Sram(sram_addr) =
                    lorom_map_address(address, *mask, sram.len() as u32)
                {
                    sram[sram_addr as usize] = value;
                }
            }
            Self::HiRom { sram, mask, .. } => {
                if let CartridgeAddress::Sram(sram_addr) =
                    hirom_map_address(address, *mask, sram.len() as u32)
                {
                    sram[sram_addr as usize] = value;
                }
            }
            Self::ExHiRom { rom, sram, mask, .. } => {
                if let CartridgeAddress::Sram(sram_addr) =
                    exhirom_map_address(address, *mask, rom.len() as u32, sram.len() as u32)
                {
                    sram[sram_addr as usize] = value;
                }
            }
            Self::SuperFx(sfx) => {
                sfx.write(address, value);
            }
        }
    }

    pub fn irq(&self) -> bool {
        match self {
            Self::SuperFx(sfx) => sfx.irq(),
            _ => false,
        }
    }

    pub fn take_rom(&mut self) -> Vec<u8> {
        match self {
            Self::LoRom { rom, .. } | Self::HiRom { rom, .. } | Self::ExHiRom { rom, .. } => {
                mem::take(&mut rom.0).into_vec()
            }
            Self::SuperFx(sfx) => sfx.take_rom(),
        }
    }

    pub fn take_rom_from(&mut self, other: &mut Self) {
        let other_rom = other.take_rom();

        match self {
            Self::LoRom { rom, .. } | Self::HiRom { rom, .. } | Self::ExHiRom { rom, .. } => {
                *rom = Rom(other_rom.into_boxed_slice());
            }
            Self::SuperFx(sfx) => {
                sfx.set_rom(other_rom);
            }
        }
    }

    pub fn sram(&self) -> Option<&[u8]> {
        match self {
            Self::LoRom { sram, .. } | Self::HiRom { sram, .. } | Self::ExHiRom { sram, .. }
                if !sram.is_empty() =>
            {
                Some(sram)
            }
            Self::LoRom { .. } | Self::HiRom { .. } | Self::ExHiRom { .. } => None,
            Self::SuperFx(sfx) => Some(sfx.sram()),
        }
    }

    pub fn write_auxiliary_save_files<S: SaveWriter>(
        &self,
        _save_writer: &mut S,
    ) -> Result<(), S::Err> {
        Ok(())
    }

    pub fn has_sram(&self) -> bool {
        match self {
            Self::LoRom { sram, .. } | Self::HiRom { sram, .. } | Self::ExHiRom { sram, .. } => {
                !sram.is_empty()
            }
            Self::SuperFx(sfx) => !sfx.sram().is_empty(),
        }
    }

    pub fn tick(&mut self, master_cycles_elapsed: u64) {
        if let Self::SuperFx(sfx) = self {
            sfx.tick(master_cycles_elapsed);
        }
    }

    pub fn reset(&mut self) {
        if let Self::SuperFx(sfx) = self {
            sfx.reset();
        }
    }

    pub fn notify_dma_start(&mut self, _channel: u8, _source_address: u32) {}

    pub fn notify_dma_end(&mut self) {}

    pub fn update_gsu_overclock_factor(&mut self, overclock_factor: NonZeroU64) {
        if let Self::SuperFx(sfx) = self {
            sfx.update_gsu_overclock_factor(overclock_factor);
        }
    }
}

pub fn region_to_timing_mode(region_byte: u8) -> TimingMode {
    match region_byte {
        // Japan / USA / South Korea / Canada / Brazil
        0x00 | 0x01 | 0x0D | 0x0F | 0x10 => TimingMode::Ntsc,
        // various European and Asian countries (other than Japan/Korea) + Australia
        0x02..=0x0C | 0x11 => TimingMode::Pal,
        _ => {
            log::warn!(
                "Unrecognized region byte in ROM header, defaulting to NTSC: {region_byte:02X}"
            );
            TimingMode::Ntsc
        }
    }
}

fn guess_cartridge_type(rom: &[u8]) -> Option<CartridgeType> {
    if rom.len() < 0x10000 {
        // Any ROM less than 64KB must be LoROM; HiROM <64KB wouldn't have anywhere to store
        // the 65816 interrupt vectors
        return Some(CartridgeType::LoRom);
    }

    if rom.len() >= 0x410000 {
        // $25 = ExHiROM, $35 = ExHiROM + FastROM
        // A ROM >4MB with $25/$35 in the header is almost certainly ExHiROM; only 2 (?) non-ExHiROM
        // games are larger than 4MB
        let exhirom_map_byte = rom[EXHIROM_HEADER_ADDR + HEADER_MAP_OFFSET];
        if exhirom_map_byte == 0x25 || exhirom_map_byte == 0x35 {
            return Some(CartridgeType::ExHiRom);
        }
    }

    let mut lorom_points = 0;
    let mut hirom_points = 0;

    let lorom_map_byte = rom[LOROM_HEADER_ADDR + HEADER_MAP_OFFSET];
    if lorom_map_byte == 0x20 || lorom_map_byte == 0x30 {
        // $20 == LoROM, $30 == LoROM + FastROM
        lorom_points += 1;
    }

    let hirom_map_byte = rom[HIROM_HEADER_ADDR + HEADER_MAP_OFFSET];
    if hirom_map_byte == 0x21 || hirom_map_byte == 0x31 {
        // $21 == HiROM, $31 == HiROM + FastROM
        hirom_points += 1;
    }

    // All LoROM vectors should be in the range $8000-$FFFF, and A15 is ignored for mapping to ROM
    let lorom_vector = u16::from_le_bytes([rom[LOROM_RESET_VECTOR], rom[LOROM_RESET_VECTOR + 1]]);
    if lorom_vector >= 0x8000 && seems_like_valid_reset_vector(rom, lorom_vector & 0x7FFF) {
        lorom_points += 1;
    }

    let hirom_vector = u16::from_le_bytes([rom[HIROM_RESET_VECTOR], rom[HIROM_RESET_VECTOR + 1]]);
    if seems_like_valid_reset_vector(rom, hirom_vector) {
        hirom_points += 1;
    }

    // Check for Super FX
    // Identified by map == $20 and chipset $13-$1A in the LoROM header area
    if hirom_points <= lorom_points
        && lorom_map_byte == 0x20
        && (0x13..0x1B).contains(&rom[LOROM_HEADER_ADDR + 0x16])
    {
        return Some(CartridgeType::SuperFx);
    }

    match lorom_points.cmp(&hirom_points) {
        Ordering::Less => Some(CartridgeType::HiRom),
        Ordering::Greater => Some(CartridgeType::LoRom),
        Ordering::Equal => None,
    }
}

const CLC_OPCODE: u8 = 0x18;
const SEI_OPCODE: u8 = 0x78;

fn seems_like_valid_reset_vector(rom: &[u8], vector: u16) -> bool {
    // Nearly all games execute either SEI or CLC as the first instruction at the RESET vector
    let vector = vector as usize;
    vector < rom.len() && (rom[vector] == CLC_OPCODE || rom[vector] == SEI_OPCODE)
}

pub(crate) enum CartridgeAddress {
    None,
    Rom(u32),
    Sram(u32),
}

pub(crate) fn lorom_map_address(
    address: u32,
    mask: RomAddressMask,
    sram_len: u32,
) -> CartridgeAddress {
    let bank = address >> 16;
    let offset = address & 0xFFFF;
    match (bank, offset) {
        (0x00..=0x3F | 0x80..=0xBF | 0x70..=0x7D | 0xF0..=0xFF, 0x8000..=0xFFFF)
        | (0x40..=0x6F | 0xC0..=0xEF, _) => {
            // ROM; typically at $8000-$FFFF and sometimes mirrored into $0000-$7FFF
            let rom_addr = lorom_map_rom_address(address, mask);
            CartridgeAddress::Rom(rom_addr)
        }
        (0x70..=0x7D | 0xF0..=0xFF, 0x0000..=0x7FFF) => {
            // SRAM, if mapped
            if sram_len != 0 {
                // SRAM size is always a power of 2; use that to mask address
                let sram_addr = address & (sram_len - 1);
                CartridgeAddress::Sram(sram_addr)
            } else {
                // Treat as ROM mirror
                let rom_addr = lorom_map_rom_address(address, mask);
                CartridgeAddress::Rom(rom_addr)
            }
        }
        _ => CartridgeAddress::None,
    }
}

pub(crate) fn lorom_map_rom_address(address: u32, mask: RomAddressMask) -> u32 {
    // LoROM mapping ignores A23 and A15, and A16-22 are shifted right 1
    let rom_addr = ((address & 0x7F0000) >> 1) | (address & 0x007FFF);
    mask.mask(rom_addr)
}

fn hirom_map_address(address: u32, mask: RomAddressMask, sram_len: u32) -> CartridgeAddress {
    let bank = address >> 16;
    let offset = address & 0xFFFF;
    match (bank, offset) {
        (0x40..=0x7D | 0xC0..=0xFF, _) | (0x00..=0x3F | 0x80..=0xBF, 0x8000..=0xFFFF) => {
            // ROM
            let rom_addr = hirom_map_rom_address(address, mask);
            CartridgeAddress::Rom(rom_addr)
        }
        (0x20..=0x3F | 0xA0..=0xBF, 0x6000..=0x7FFF) if sram_len != 0 => {
            // SRAM, if mapped
            let sram_bank = bank & 0x1F;
            let sram_addr = (sram_bank << 13) | (offset & 0x1FFF);
            CartridgeAddress::Sram(sram_addr & (sram_len - 1))
        }
        _ => CartridgeAddress::None,
    }
}

fn hirom_map_rom_address(address: u32, mask: RomAddressMask) -> u32 {
    // HiROM mapping simply ignores A23 and A22
    let rom_addr = address & 0x3FFFFF;
    mask.mask(rom_addr)
}

fn exhirom_map_address(
    address: u32,
    mask: RomAddressMask,
    rom_len: u32,
    sram_len: u32,
) -> CartridgeAddress {
    let bank = address >> 16;
    let offset = address & 0xFFFF;
    match (bank, offset) {
        (0x40..=0x7D | 0xC0..=0xFF, _) | (0x00..=0x3F | 0x80..=0xBF, 0x8000..=0xFFFF) => {
            // ROM
            let rom_addr = exhirom_map_rom_address(address, mask, rom_len);
            CartridgeAddress::Rom(rom_addr)
        }
        (0x80..=0xBF, 0x6000..=0x7FFF) if sram_len != 0 => {
            // SRAM, if mapped (note bank range is different from regular HiROM)
            let sram_bank = bank & 0x1F;
            let sram_addr = ((sram_bank << 13) | (offset & 0x1FFF)) & (sram_len - 1);
            CartridgeAddress::Sram(sram_addr)
        }
        _ => CartridgeAddress::None,
    }
}

fn exhirom_map_rom_address(address: u32, mask: RomAddressMask, rom_len: u32) -> u32 {
    // ExHiROM mapping ignores A22, and A23 is inverted and shifted right 1
    let rom_addr = (address & 0x3FFFFF) | (((address >> 1) & 0x400000) ^ 0x400000);
    mask.mask(rom_addr % rom_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rom(len: usize, map_byte: u8, chipset_byte: u8) -> Box<[u8]> {
        let mut rom = vec![0u8; len];
        rom[LOROM_HEADER_ADDR + HEADER_MAP_OFFSET] = map_byte;
        rom[LOROM_HEADER_ADDR + 0x16] = chipset_byte;
        rom[LOROM_RESET_VECTOR] = 0x00;
        rom[LOROM_RESET_VECTOR + 1] = 0x80;
        rom[0x7FFF] = SEI_OPCODE;
        rom.into_boxed_slice()
    }

    #[test]
    fn detects_superfx_chipset() {
        let rom = test_rom(0x20000, 0x20, 0x15);
        assert_eq!(guess_cartridge_type(&rom), Some(CartridgeType::SuperFx));
    }

    #[test]
    fn flags_math_coprocessor_chipset_as_unsupported() {
        let rom = test_rom(0x20000, 0x20, 0x03);
        // guess_cartridge_type only scores map bytes, not coprocessor support; the refusal
        // happens in Cartridge::create once the chipset byte is consulted
        let chipset_byte = rom[LOROM_HEADER_ADDR + 0x16];
        assert!(matches!(chipset_byte, 0x03..=0x05));
    }

    #[test]
    fn lorom_rom_address_power_of_two() {
        let mask = RomAddressMask::from_rom_len(0x80000);
        assert_eq!(lorom_map_rom_address(0x00_8000, mask), 0x0000);
        assert_eq!(lorom_map_rom_address(0x01_8000, mask), 0x8000);
    }

    #[test]
    fn hirom_rom_address() {
        let mask = RomAddressMask::from_rom_len(0x100000);
        assert_eq!(hirom_map_rom_address(0xC0_0000, mask), 0x000000);
        assert_eq!(hirom_map_rom_address(0xC1_0000, mask), 0x010000);
    }
}
