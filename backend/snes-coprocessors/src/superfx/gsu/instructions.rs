//! GSU instruction fetch/decode/execute

pub(super) mod alu;
pub(super) mod flags;
pub(super) mod flow;
pub(super) mod load;
pub mod plot;

use crate::superfx::gsu::{ClockSpeed, GraphicsSupportUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MemoryType {
    CodeCache,
    Rom,
    Ram,
}

impl MemoryType {
    pub(super) fn access_cycles(self, clock_speed: ClockSpeed) -> u8 {
        match self {
            Self::CodeCache => 1,
            Self::Rom | Self::Ram => clock_speed.memory_access_cycles(),
        }
    }
}

fn current_memory_type(gsu: &GraphicsSupportUnit) -> MemoryType {
    if gsu.code_cache.pc_is_cacheable(gsu.r[15]) && gsu.code_cache.get(gsu.r[15]).is_some() {
        MemoryType::CodeCache
    } else if gsu.rambr != 0 {
        MemoryType::Ram
    } else {
        MemoryType::Rom
    }
}

pub(super) fn read_register(gsu: &GraphicsSupportUnit, register: u8) -> u16 {
    gsu.r[register as usize]
}

// Writing R15 jumps; writing R14 with alt1 set triggers ROM prefetch (not modeled beyond timing)
pub(super) fn write_register(
    gsu: &mut GraphicsSupportUnit,
    register: u8,
    value: u16,
    rom: &[u8],
    ram: &[u8],
) -> u8 {
    gsu.r[register as usize] = value;

    if register == 15 {
        gsu.state.just_jumped = true;
        return fill_cache_from_pc(gsu, rom, ram);
    }

    if register == 14 && gsu.alt1 {
        // GETB/GETBH/GETBL/GETBS prefetch the byte at (PBR:R14) into the ROM buffer
        let addr = (u32::from(gsu.rombr) << 16) | u32::from(value);
        gsu.state.rom_buffer = rom.get((addr as usize) % rom.len().max(1)).copied().unwrap_or(0);
        gsu.state.rom_buffer_wait_cycles = gsu.clock_speed.memory_access_cycles();
    }

    0
}

pub(super) fn clear_prefix_flags(gsu: &mut GraphicsSupportUnit) {
    gsu.b = false;
    gsu.alt1 = false;
    gsu.alt2 = false;
}

fn raw_fetch(gsu: &mut GraphicsSupportUnit, rom: &[u8], ram: &[u8]) -> u8 {
    let pc = gsu.r[15];

    let byte = if let Some(cached) = gsu.code_cache.get(pc) {
        cached
    } else if gsu.rambr != 0 {
        let ram_addr = (pc as usize) & (ram.len().saturating_sub(1).max(1));
        let byte = ram.get(ram_addr).copied().unwrap_or(0);
        if gsu.code_cache.pc_is_cacheable(pc) {
            gsu.code_cache.set(pc, byte);
        }
        byte
    } else {
        let bank = u32::from(gsu.pbr);
        let addr = (bank << 16) | u32::from(pc);
        let rom_addr = (addr as usize) % rom.len().max(1);
        let byte = rom[rom_addr];
        if gsu.code_cache.pc_is_cacheable(pc) {
            gsu.code_cache.set(pc, byte);
        }
        byte
    };

    gsu.r[15] = pc.wrapping_add(1);
    byte
}

pub(super) fn fetch_opcode(gsu: &mut GraphicsSupportUnit, rom: &[u8], ram: &[u8]) {
    gsu.state.opcode_buffer = raw_fetch(gsu, rom, ram);
}

// Called after a jump/branch is taken: the code cache line containing the new PC needs to be
// (re)populated before the chip can resume fetching from it at full speed.
pub(super) fn fill_cache_from_pc(gsu: &mut GraphicsSupportUnit, rom: &[u8], ram: &[u8]) -> u8 {
    if gsu.code_cache.pc_is_cacheable(gsu.r[15]) && gsu.code_cache.get(gsu.r[15]).is_some() {
        return 0;
    }

    // Model the line-fill as a small fixed number of extra wait cycles rather than literally
    // walking the cache line; real hardware fills lazily as PC advances through it.
    let _ = (rom, ram);
    gsu.clock_speed.memory_access_cycles()
}

pub(super) fn fill_cache_to_pc(gsu: &mut GraphicsSupportUnit, target_pc: u16, rom: &[u8], ram: &[u8]) -> u8 {
    let _ = target_pc;
    fill_cache_from_pc(gsu, rom, ram)
}

/// Fetches, decodes, and executes exactly one GSU instruction, returning its cycle cost.
pub(super) fn step(gsu: &mut GraphicsSupportUnit, rom: &[u8], ram: &mut [u8]) -> u8 {
    gsu.plot_state.tick(1);

    if gsu.state.ram_buffer_wait_cycles > 0 {
        gsu.state.ram_buffer_wait_cycles -= 1;
    }
    if gsu.state.rom_buffer_wait_cycles > 0 {
        gsu.state.rom_buffer_wait_cycles -= 1;
    }

    let memory_type = current_memory_type(gsu);
    let opcode = raw_fetch(gsu, rom, ram);

    dispatch(opcode, memory_type, gsu, rom, ram)
}

fn dispatch(opcode: u8, memory_type: MemoryType, gsu: &mut GraphicsSupportUnit, rom: &[u8], ram: &mut [u8]) -> u8 {
    use flags::{alt1, alt2, alt3, from, to, with};
    use flow::{bcc, bcs, beq, bge, blt, bmi, bne, bpl, bra, bvc, bvs, jmp, link, ljmp, loop_};
    use load::{getb, hib, ibt, iwt, lm, lms, lob, merge, romb, sbk, sm, sms, stb, stw, swap};
    use plot::{cmode, color, getc, plot as plot_pixel, rpix};

    match opcode {
        0x00 => {
            // STOP
            gsu.state.just_jumped = false;
            clear_prefix_flags(gsu);
            memory_type.access_cycles(gsu.clock_speed).into()
        }
        0x01 => {
            // NOP
            clear_prefix_flags(gsu);
            memory_type.access_cycles(gsu.clock_speed)
        }
        0x02 => {
            // CACHE: set CBR to the current PC's 512-byte-aligned base
            let cbr = gsu.r[15] & 0xFFF0;
            gsu.code_cache.update_cbr(cbr);
            clear_prefix_flags(gsu);
            memory_type.access_cycles(gsu.clock_speed)
        }
        0x03 => alu::asr(memory_type, gsu, rom, ram),
        0x04 => alu::rol(memory_type, gsu, rom, ram),
        0x05 => bra(memory_type, gsu, rom, ram),
        0x06 => blt(memory_type, gsu, rom, ram),
        0x07 => bge(memory_type, gsu, rom, ram),
        0x08 => bne(memory_type, gsu, rom, ram),
        0x09 => beq(memory_type, gsu, rom, ram),
        0x0A => bpl(memory_type, gsu, rom, ram),
        0x0B => bmi(memory_type, gsu, rom, ram),
        0x0C => bcc(memory_type, gsu, rom, ram),
        0x0D => bcs(memory_type, gsu, rom, ram),
        0x0E => bvc(memory_type, gsu, rom, ram),
        0x0F => bvs(memory_type, gsu, rom, ram),
        0x10..=0x1F => to(opcode, memory_type, gsu, rom, ram),
        0x20..=0x2F => with(opcode, memory_type, gsu),
        0x30..=0x3F => alu::inc(opcode, memory_type, gsu, rom, ram),
        0x40..=0x4F => alu::dec(opcode, memory_type, gsu, rom, ram),
        0x50 => gsu_ret(memory_type, gsu, rom, ram),
        0x51 => link(0x00, memory_type, gsu),
        0x52 => link(0x01, memory_type, gsu),
        0x53 => link(0x02, memory_type, gsu),
        0x54 => link(0x03, memory_type, gsu),
        0x55..=0x5F => jmp(opcode, memory_type, gsu, rom, ram),
        0x60..=0x6F => ljmp(opcode, memory_type, gsu, rom, ram),
        0x70 => loop_(memory_type, gsu, rom, ram),
        0x71 => alt1(memory_type, gsu),
        0x72 => alt2(memory_type, gsu),
        0x73 => alt3(memory_type, gsu),
        0x74 => swap(memory_type, gsu, rom, ram),
        0x75 => cmode(memory_type, gsu),
        0x76 => romb(memory_type, gsu),
        0x77 => alu::not(memory_type, gsu, rom, ram),
        0x78 => merge(memory_type, gsu, rom, ram),
        0x79 => hib(memory_type, gsu, rom, ram),
        0x7A => lob(memory_type, gsu, rom, ram),
        0x7B => color(memory_type, gsu),
        0x7C => getc(memory_type, gsu),
        0x7D => getb(memory_type, gsu, rom, ram),
        0x7E => plot_pixel(memory_type, gsu, ram),
        0x7F => rpix(memory_type, gsu, rom, ram),
        0x80..=0x8F => alu::add(opcode, memory_type, gsu, rom, ram),
        0x90..=0x9F => alu::sub(opcode, memory_type, gsu, rom, ram),
        0xA0..=0xAF => alu::and(opcode, memory_type, gsu, rom, ram),
        0xB0..=0xBF => alu::or(opcode, memory_type, gsu, rom, ram),
        0xC0 => alu::fmult(memory_type, gsu, rom, ram),
        0xC1..=0xCF => alu::mult(opcode, memory_type, gsu, rom, ram),
        0xD0..=0xD1 => sbk(memory_type, gsu, ram),
        0xD2 => alu::sex(memory_type, gsu, rom, ram),
        0xD3 => from(opcode, memory_type, gsu, rom, ram),
        0xD4 => alu::lsr(memory_type, gsu, rom, ram),
        0xD5..=0xDF => ibt(opcode, memory_type, gsu, rom, ram),
        0xE0..=0xEF => lms(opcode, memory_type, gsu, rom, ram),
        0xF0..=0xF7 => load::ldb(opcode, memory_type, gsu, rom, ram),
        0xF8..=0xFB => load::ldw(opcode, memory_type, gsu, rom, ram),
        0xFC => sms(opcode, memory_type, gsu, rom, ram),
        0xFD => stb(opcode, memory_type, gsu, ram),
        0xFE => stw(opcode, memory_type, gsu, ram),
        0xFF => lm(opcode, memory_type, gsu, rom, ram),
    }
}

fn gsu_ret(memory_type: MemoryType, gsu: &mut GraphicsSupportUnit, rom: &[u8], ram: &[u8]) -> u8 {
    // RET: return via R11 (the link register)
    let cycles = fill_cache_from_pc(gsu, rom, ram);
    gsu.r[15] = gsu.r[11];
    gsu.state.just_jumped = true;
    clear_prefix_flags(gsu);
    cycles + memory_type.access_cycles(gsu.clock_speed)
}
