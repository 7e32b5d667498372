use super::*;

impl_read_op_u8!(
    [immediate -> bit_immediate_u8]
    (|registers, value| {
        registers.p.zero = registers.a as u8 & value == 0;
    })
);

impl_read_op_u16!(
    [immediate -> bit_immediate_u16]
    (|registers, value| {
        registers.p.zero = registers.a & value == 0;
    })
);

impl_read_op_u8!(
    [
        direct_page -> bit_direct_page_u8,
        direct_page_x -> bit_direct_page_x_u8,
        absolute -> bit_absolute_u8,
        absolute_x -> bit_absolute_x_u8,
    ]
    (|registers, value| {
        registers.p.zero = registers.a as u8 & value == 0;
        registers.p.overflow = value.bit(6);
        registers.p.negative = value.sign_bit();
    })
);

impl_read_op_u16!(
    [
        direct_page -> bit_direct_page_u16,
        direct_page_x -> bit_direct_page_x_u16,
        absolute -> bit_absolute_u16,
        absolute_x -> bit_absolute_x_u16,
    ]
    (|registers, value| {
        registers.p.zero = registers.a & value == 0;
        registers.p.overflow = value.bit(14);
        registers.p.negative = value.sign_bit();
    })
);

impl_modify_op_u8!(
    [
        direct_page -> trb_direct_page_u8,
        absolute -> trb_absolute_u8,
    ]
    (|registers, value| {
        registers.p.zero = registers.a as u8 & value == 0;
        value & !(registers.a as u8)
    })
);

impl_modify_op_u16!(
    [
        direct_page -> trb_direct_page_u16,
        absolute -> trb_absolute_u16,
    ]
    (|registers, value| {
        registers.p.zero = registers.a & value == 0;
        value & !registers.a
    })
);

impl_modify_op_u8!(
    [
        direct_page -> tsb_direct_page_u8,
        absolute -> tsb_absolute_u8,
    ]
    (|registers, value| {
        registers.p.zero = registers.a as u8 & value == 0;
        value | (registers.a as u8)
    })
);

impl_modify_op_u16!(
    [
        direct_page -> tsb_direct_page_u16,
        absolute -> tsb_absolute_u16,
    ]
    (|registers, value| {
        registers.p.zero = registers.a & value == 0;
        value | registers.a
    })
);

impl_modify_op_u8!(
    [
        accumulator -> asl_accumulator_u8,
        direct_page -> asl_direct_page_u8,
        direct_page_x -> asl_direct_page_x_u8,
        absolute -> asl_absolute_u8,
        absolute_x -> asl_absolute_x_u8,
    ]
    (|registers, value| {
        registers.p.carry = value.sign_bit();
        let shifted = value << 1;
        registers.p.zero = shifted == 0;
        registers.p.negative = shifted.sign_bit();
        shifted
    })
);

impl_modify_op_u16!(
    [
        accumulator -> asl_accumulator_u16,
        direct_page -> asl_direct_page_u16,
        direct_page_x -> asl_direct_page_x_u16,
        absolute -> asl_absolute_u16,
        absolute_x -> asl_absolute_x_u16,
    ]
    (|registers, value| {
        registers.p.carry = value.sign_bit();
        let shifted = value << 1;
        registers.p.zero = shifted == 0;
        registers.p.negative = shifted.sign_bit();
        shifted
    })
);

impl_modify_op_u8!(
    [
        accumulator -> lsr_accumulator_u8,
        direct_page -> lsr_direct_page_u8,
        direct_page_x -> lsr_direct_page_x_u8,
        absolute -> lsr_absolute_u8,
        absolute_x -> lsr_absolute_x_u8,
    ]
    (|registers, value| {
        registers.p.carry = value.bit(0);
        let shifted = value >> 1;
        registers.p.zero = shifted == 0;
        registers.p.negative = false;
        shifted
    })
);

impl_modify_op_u16!(
    [
        accumulator -> lsr_accumulator_u16,
        direct_page -> lsr_direct_page_u16,
        direct_page_x -> lsr_direct_page_x_u16,
        absolute -> lsr_absolute_u16,
        absolute_x -> lsr_absolute_x_u16,
    ]
    (|registers, value| {
        registers.p.carry = value.bit(0);
        let shifted = value >> 1;
        registers.p.zero = shifted == 0;
        registers.p.negative = false;
        shifted
    })
);

impl_modify_op_u8!(
    [
        accumulator -> rol_accumulator_u8,
        direct_page -> rol_direct_page_u8,
        direct_page_x -> rol_direct_page_x_u8,
        absolute -> rol_absolute_u8,
        absolute_x -> rol_absolute_x_u8,
    ]
    (|registers, value| {
        let carry = registers.p.carry;
        registers.p.carry = value.sign_bit();
        let rotated = (value << 1) | u8::from(carry);
        registers.p.zero = rotated == 0;
        registers.p.negative = rotated.sign_bit();
        rotated
    })
);

impl_modify_op_u16!(
    [
        accumulator -> rol_accumulator_u16,
        direct_page -> rol_direct_page_u16,
        direct_page_x -> rol_direct_page_x_u16,
        absolute -> rol_absolute_u16,
        absolute_x -> rol_absolute_x_u16,
    ]
    (|registers, value| {
        let carry = registers.p.carry;
        registers.p.carry = value.sign_bit();
        let rotated = (value << 1) | u16::from(carry);
        registers.p.zero = rotated == 0;
        registers.p.negative = rotated.sign_bit();
        rotated
    })
);

impl_modify_op_u8!(
    [
        accumulator -> ror_accumulator_u8,
        direct_page -> ror_direct_page_u8,
        direct_page_x -> ror_direct_page_x_u8,
        absolute -> ror_absolute_u8,
        absolute_x -> ror_absolute_x_u8,
    ]
    (|registers, value| {
        let carry = registers.p.carry;
        registers.p.carry = value.bit(0);
        let rotated = (value >> 1) | (u8::from(carry) << 7);
        registers.p.zero = rotated == 0;
        registers.p.negative = rotated.sign_bit();
        rotated
    })
);

impl_modify_op_u16!(
    [
        accumulator -> ror_accumulator_u16,
        direct_page -> ror_direct_page_u16,
        direct_page_x -> ror_direct_page_x_u16,
        absolute -> ror_absolute_u16,
        absolute_x -> ror_absolute_x_u16,
    ]
    (|registers, value| {
        let carry = registers.p.carry;
        registers.p.carry = value.bit(0);
        let rotated = (value >> 1) | (u16::from(carry) << 15);
        registers.p.zero = rotated == 0;
        registers.p.negative = rotated.sign_bit();
        rotated
    })
);
