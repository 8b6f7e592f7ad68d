//! 指令字段提取辅助函数
//!
//! 提供从 32-bit 指令字中提取各字段的工具函数。
//! 所有立即数都按其自然位宽用 [`sign_extend`] 扩展到 32 位。

/// 将 `bits` 位宽的值符号扩展为 `i32`
///
/// 最高位为 1 时结果为 `value - (1 << bits)`，否则保持原值。
/// `value` 中高于 `bits` 的位会被忽略。
///
/// ```
/// use rv32i_sim::isa::sign_extend;
///
/// assert_eq!(sign_extend(0xFF, 8), -1);
/// assert_eq!(sign_extend(0x7F, 8), 127);
/// assert_eq!(sign_extend(0x800, 12), -2048);
/// ```
#[inline]
pub fn sign_extend(value: u32, bits: u32) -> i32 {
    debug_assert!((1..=32).contains(&bits));
    let value = u64::from(value) & ((1u64 << bits) - 1);
    if (value >> (bits - 1)) & 1 == 1 {
        (value as i64 - (1i64 << bits)) as i32
    } else {
        value as i32
    }
}

/// 提取 `raw[hi:lo]`（闭区间）
#[inline]
pub fn bits(raw: u32, hi: u32, lo: u32) -> u32 {
    let width = hi - lo + 1;
    let mask = if width == 32 { u32::MAX } else { (1u32 << width) - 1 };
    (raw >> lo) & mask
}

/// 提取 opcode 字段 [6:0]
#[inline]
pub fn opcode(raw: u32) -> u32 {
    raw & 0x7F
}

/// 提取 rd 字段 [11:7]
#[inline]
pub fn rd(raw: u32) -> u8 {
    ((raw >> 7) & 0x1F) as u8
}

/// 提取 funct3 字段 [14:12]
#[inline]
pub fn funct3(raw: u32) -> u32 {
    (raw >> 12) & 0x7
}

/// 提取 rs1 字段 [19:15]
#[inline]
pub fn rs1(raw: u32) -> u8 {
    ((raw >> 15) & 0x1F) as u8
}

/// 提取 rs2 字段 [24:20]
#[inline]
pub fn rs2(raw: u32) -> u8 {
    ((raw >> 20) & 0x1F) as u8
}

/// 提取 funct7 字段 [31:25]
#[inline]
pub fn funct7(raw: u32) -> u32 {
    (raw >> 25) & 0x7F
}

/// I-type 立即数：imm[11:0] = raw[31:20]
#[inline]
pub fn imm_i(raw: u32) -> i32 {
    sign_extend(bits(raw, 31, 20), 12)
}

/// S-type 立即数：imm[11:5] = raw[31:25], imm[4:0] = raw[11:7]
#[inline]
pub fn imm_s(raw: u32) -> i32 {
    let imm = (bits(raw, 31, 25) << 5) | bits(raw, 11, 7);
    sign_extend(imm, 12)
}

/// B-type 立即数
/// imm[12] = raw[31], imm[10:5] = raw[30:25], imm[4:1] = raw[11:8], imm[11] = raw[7]
#[inline]
pub fn imm_b(raw: u32) -> i32 {
    let imm = (bits(raw, 31, 31) << 12)
        | (bits(raw, 7, 7) << 11)
        | (bits(raw, 30, 25) << 5)
        | (bits(raw, 11, 8) << 1);
    sign_extend(imm, 13)
}

/// U-type 立即数：imm[31:12] = raw[31:12], imm[11:0] = 0
#[inline]
pub fn imm_u(raw: u32) -> i32 {
    sign_extend(raw & 0xFFFF_F000, 32)
}

/// J-type 立即数
/// imm[20] = raw[31], imm[10:1] = raw[30:21], imm[11] = raw[20], imm[19:12] = raw[19:12]
#[inline]
pub fn imm_j(raw: u32) -> i32 {
    let imm = (bits(raw, 31, 31) << 20)
        | (bits(raw, 19, 12) << 12)
        | (bits(raw, 20, 20) << 11)
        | (bits(raw, 30, 21) << 1);
    sign_extend(imm, 21)
}

// ========== Opcode 常量 ==========
pub const OP_LUI: u32 = 0b0110111;
pub const OP_AUIPC: u32 = 0b0010111;
pub const OP_JAL: u32 = 0b1101111;
pub const OP_JALR: u32 = 0b1100111;
pub const OP_BRANCH: u32 = 0b1100011;
pub const OP_LOAD: u32 = 0b0000011;
pub const OP_STORE: u32 = 0b0100011;
pub const OP_MISC_MEM: u32 = 0b0001111;
pub const OP_IMM: u32 = 0b0010011;
pub const OP_REG: u32 = 0b0110011;
pub const OP_SYSTEM: u32 = 0b1110011;

/// funct7 的 "alternate" 编码（SUB / SRA / SRAI）
pub const FUNCT7_ALT: u32 = 0b0100000;

// SYSTEM 类的 funct3
pub const F3_PRIV: u32 = 0b000;
pub const F3_CSRRW: u32 = 0b001;
pub const F3_CSRRS: u32 = 0b010;
pub const F3_CSRRC: u32 = 0b011;
pub const F3_CSRRWI: u32 = 0b101;
pub const F3_CSRRSI: u32 = 0b110;
pub const F3_CSRRCI: u32 = 0b111;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_extend_widths() {
        assert_eq!(sign_extend(0xFF, 8), -1);
        assert_eq!(sign_extend(0x7F, 8), 127);
        assert_eq!(sign_extend(0x80, 8), -128);
        assert_eq!(sign_extend(0xFFFF, 16), -1);
        assert_eq!(sign_extend(0x8000, 16), -32768);
        assert_eq!(sign_extend(0x7FFF, 16), 32767);
        assert_eq!(sign_extend(0xFFFF_FFFF, 32), -1);
        assert_eq!(sign_extend(0x8000_0000, 32), i32::MIN);
        assert_eq!(sign_extend(0x7FFF_FFFF, 32), i32::MAX);
    }

    #[test]
    fn test_sign_extend_matches_native_widening() {
        for v in [0u32, 1, 0x55, 0x7F, 0x80, 0xAA, 0xFF] {
            assert_eq!(sign_extend(v, 8), v as u8 as i8 as i32);
        }
        for v in [0u32, 0x1234, 0x7FFF, 0x8000, 0xBEEF, 0xFFFF] {
            assert_eq!(sign_extend(v, 16), v as u16 as i16 as i32);
        }
    }

    #[test]
    fn test_sign_extend_ignores_high_bits() {
        assert_eq!(sign_extend(0x1FF, 8), -1);
        assert_eq!(sign_extend(0xF07F, 8), 127);
    }

    #[test]
    fn test_bits() {
        assert_eq!(bits(0xF000_0000, 31, 28), 0xF);
        assert_eq!(bits(0x8000_0000, 31, 31), 1);
        assert_eq!(bits(0xFFFF_FFFF, 31, 0), 0xFFFF_FFFF);
        assert_eq!(bits(0x0000_0F80, 11, 7), 0x1F);
    }

    #[test]
    fn test_register_fields() {
        let raw = 0x002081B3; // add x3, x1, x2
        assert_eq!(opcode(raw), OP_REG);
        assert_eq!(rd(raw), 3);
        assert_eq!(rs1(raw), 1);
        assert_eq!(rs2(raw), 2);
        assert_eq!(funct3(raw), 0);
        assert_eq!(funct7(raw), 0);
        assert_eq!(funct7(0x402081B3), FUNCT7_ALT); // sub x3, x1, x2
    }

    #[test]
    fn test_imm_i() {
        assert_eq!(imm_i(0x02A00093), 42); // addi x1, x0, 42
        assert_eq!(imm_i(0xFFF00113), -1); // addi x2, x0, -1
        assert_eq!(imm_i(0xC0001073), -1024); // csrrw x0, cycle, x0
    }

    #[test]
    fn test_imm_s() {
        assert_eq!(imm_s(0x00112423), 8); // sw x1, 8(x2)
        assert_eq!(imm_s(0xFE112E23), -4); // sw x1, -4(x2)
    }

    #[test]
    fn test_imm_b() {
        assert_eq!(imm_b(0x00208463), 8); // beq x1, x2, 8
        assert_eq!(imm_b(0xFE314CE3), -8); // blt x2, x3, -8
        assert_eq!(imm_b(0x0041DC63), 24); // bge x3, x4, 24
    }

    #[test]
    fn test_imm_u() {
        assert_eq!(imm_u(0x123450B7), 0x12345000); // lui x1, 0x12345
        assert_eq!(imm_u(0xFFFFF0B7), -4096); // lui x1, 0xfffff
    }

    #[test]
    fn test_imm_j() {
        assert_eq!(imm_j(0x0040006F), 4); // jal x0, 4
        assert_eq!(imm_j(0xFF1FF0EF), -16); // jal ra, -16
        assert_eq!(imm_j(0x800000EF), -(1 << 20)); // jal ra, -1MiB
    }
}
