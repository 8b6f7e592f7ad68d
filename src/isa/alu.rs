//! 算术逻辑单元
//!
//! OP 与 OP-IMM 共用同一组 funct3 选择子；SUB/SRA 由 alternate 标志区分。

use super::IsaError;

/// ALU 操作选择子（即 funct3）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AluOp {
    /// ADD，alternate 时为 SUB
    AddSub = 0b000,
    Sll = 0b001,
    Slt = 0b010,
    Sltu = 0b011,
    Xor = 0b100,
    /// SRL，alternate 时为 SRA
    Shr = 0b101,
    Or = 0b110,
    And = 0b111,
}

impl TryFrom<u32> for AluOp {
    type Error = IsaError;

    fn try_from(funct3: u32) -> Result<Self, Self::Error> {
        Ok(match funct3 {
            0b000 => AluOp::AddSub,
            0b001 => AluOp::Sll,
            0b010 => AluOp::Slt,
            0b011 => AluOp::Sltu,
            0b100 => AluOp::Xor,
            0b101 => AluOp::Shr,
            0b110 => AluOp::Or,
            0b111 => AluOp::And,
            _ => return Err(IsaError::InvalidAluOp(funct3)),
        })
    }
}

impl AluOp {
    /// 计算结果，所有运算均按 32 位回绕
    pub fn apply(self, x: u32, y: u32, alternate: bool) -> u32 {
        let shamt = y & 0x1F;
        match self {
            AluOp::AddSub if alternate => x.wrapping_sub(y),
            AluOp::AddSub => x.wrapping_add(y),
            AluOp::Sll => x << shamt,
            AluOp::Slt => ((x as i32) < (y as i32)) as u32,
            AluOp::Sltu => (x < y) as u32,
            AluOp::Xor => x ^ y,
            // 算术右移：逻辑右移后用符号位填充高位
            AluOp::Shr if alternate => ((x as i32) >> shamt) as u32,
            AluOp::Shr => x >> shamt,
            AluOp::Or => x | y,
            AluOp::And => x & y,
        }
    }

    /// 诊断用助记符；`immediate` 选择 OP-IMM 形式
    pub const fn mnemonic(self, alternate: bool, immediate: bool) -> &'static str {
        match (self, alternate, immediate) {
            (AluOp::AddSub, _, true) => "addi",
            (AluOp::AddSub, true, false) => "sub",
            (AluOp::AddSub, false, false) => "add",
            (AluOp::Sll, _, true) => "slli",
            (AluOp::Sll, _, false) => "sll",
            (AluOp::Slt, _, true) => "slti",
            (AluOp::Slt, _, false) => "slt",
            (AluOp::Sltu, _, true) => "sltiu",
            (AluOp::Sltu, _, false) => "sltu",
            (AluOp::Xor, _, true) => "xori",
            (AluOp::Xor, _, false) => "xor",
            (AluOp::Shr, true, true) => "srai",
            (AluOp::Shr, false, true) => "srli",
            (AluOp::Shr, true, false) => "sra",
            (AluOp::Shr, false, false) => "srl",
            (AluOp::Or, _, true) => "ori",
            (AluOp::Or, _, false) => "or",
            (AluOp::And, _, true) => "andi",
            (AluOp::And, _, false) => "and",
        }
    }
}

/// 按 funct3 选择子执行 ALU 运算
///
/// 选择子不合法时返回 [`IsaError::InvalidAluOp`]。
pub fn arith(selector: u32, x: u32, y: u32, alternate: bool) -> Result<u32, IsaError> {
    Ok(AluOp::try_from(selector)?.apply(x, y, alternate))
}
