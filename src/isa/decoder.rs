//! 指令解码
//!
//! 纯函数：按固定位置提取字段，并一次性计算五种立即数。

use super::fields::*;
use super::instr::{DecodedInstr, OpcodeClass};
use super::IsaError;

/// 解码一条 32-bit 指令
///
/// opcode 不属于 RV32I 的任何类别时返回 [`IsaError::UnknownOpcode`]。
pub fn decode(raw: u32) -> Result<DecodedInstr, IsaError> {
    let op = opcode(raw);
    let class = OpcodeClass::from_bits(op).ok_or(IsaError::UnknownOpcode { raw, opcode: op })?;

    Ok(DecodedInstr {
        raw,
        class,
        funct3: funct3(raw),
        funct7: funct7(raw),
        rd: rd(raw),
        rs1: rs1(raw),
        rs2: rs2(raw),
        imm_i: imm_i(raw),
        imm_s: imm_s(raw),
        imm_b: imm_b(raw),
        imm_u: imm_u(raw),
        imm_j: imm_j(raw),
    })
}
