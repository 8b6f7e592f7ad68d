//! RV32I 指令集抽象与解码
//!
//! - `decode`: 指令字 → `DecodedInstr`
//! - `arith`: 算术逻辑单元
//! - `cond`: 分支条件判断
//!
//! 三者都是纯函数；分派使用封闭枚举（`OpcodeClass`、`AluOp`、`BranchCond`），
//! 名称表只服务于诊断输出。

mod alu;
mod branch;
mod decoder;
mod fields;
mod instr;

use thiserror::Error;

pub use alu::{arith, AluOp};
pub use branch::{cond, BranchCond};
pub use decoder::decode;
pub use fields::*;
pub use instr::{abi_name, DecodedInstr, LoadWidth, OpcodeClass, StoreWidth, ABI_NAMES};

/// 解码与运算单元的错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IsaError {
    /// opcode 不属于任何已知类别
    #[error("unknown opcode 0b{opcode:07b} in instruction 0x{raw:08x}")]
    UnknownOpcode { raw: u32, opcode: u32 },
    /// LOAD/STORE 的宽度选择子不合法
    #[error("unknown {class} width selector 0b{funct3:03b}")]
    UnknownWidth { class: OpcodeClass, funct3: u32 },
    /// ALU 选择子不合法
    #[error("invalid ALU selector {0:#x}")]
    InvalidAluOp(u32),
    /// 分支选择子不合法
    #[error("invalid branch selector 0b{0:03b}")]
    InvalidBranchCond(u32),
}

#[cfg(test)]
mod tests;
