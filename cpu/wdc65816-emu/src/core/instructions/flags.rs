use super::*;
use std::mem;

macro_rules! impl_flag_op {
    ($name:ident, $flag:ident = $value:expr) => {
        impl_registers_op!($name, |registers| {
            registers.p.$flag = $value;
        });
    };
}

impl_flag_op!(clc, carry = false);
impl_flag_op!(cld, decimal_mode = false);
impl_flag_op!(cli, irq_disabled = false);
impl_flag_op!(clv, overflow = false);
impl_flag_op!(sec, carry = true);
impl_flag_op!(sed, decimal_mode = true);
impl_flag_op!(sei, irq_disabled = true);

impl_registers_op!(xce, |registers| {
    mem::swap(&mut registers.p.carry, &mut registers.emulation_mode);

    if registers.emulation_mode {
        registers.p.accumulator_size = SizeBits::Eight;
        registers.p.index_size = SizeBits::Eight;
        ensure_page_1_stack(registers);
        registers.x &= 0x00FF;
        registers.y &= 0x00FF;
    }
});

pub(crate) fn rep<B: BusInterface>(cpu: &mut Wdc65816, bus: &mut B) {
    match cpu.state.cycle {
        1 => {
            cpu.state.t0 = fetch_operand(cpu, bus);
        }
        2 => {
            final_cycle(cpu, bus);

            bus.idle();

            let mask = if cpu.registers.emulation_mode {
                // Emulation mode forces m and x flags to remain set
                !cpu.state.t0 | 0x30
            } else {
                !cpu.state.t0
            };

            let p: u8 = cpu.registers.p.into();
            cpu.registers.p = (p & mask).into();
        }
        _ => invalid_cycle!(cpu),
    }
}

pub(crate) fn sep<B: BusInterface>(cpu: &mut Wdc65816, bus: &mut B) {
    match cpu.state.cycle {
        1 => {
            cpu.state.t0 = fetch_operand(cpu, bus);
        }
        2 => {
            final_cycle(cpu, bus);

            bus.idle();

            let p: u8 = cpu.registers.p.into();
            cpu.registers.p = (p | cpu.state.t0).into();

            if cpu.registers.p.index_size == SizeBits::Eight {
                cpu.registers.x &= 0x00FF;
                cpu.registers.y &= 0x00FF;
            }
        }
        _ => invalid_cycle!(cpu),
    }
}
