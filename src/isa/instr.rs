//! 已解码指令的表示
//!
//! `DecodedInstr` 只在一个执行周期内存在：解码阶段一次性提取所有字段与
//! 五种立即数，执行阶段再按 opcode 类别选用需要的部分。

use std::fmt;

use super::alu::AluOp;
use super::branch::BranchCond;
use super::fields::*;
use super::IsaError;

/// 通用寄存器的 ABI 名称，仅用于诊断输出
pub const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", //
    "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5", //
    "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", //
    "s8", "s9", "s10", "s11", "t3", "t4", "t5", "t6",
];

/// 返回寄存器编号对应的 ABI 名称
pub fn abi_name(reg: u8) -> &'static str {
    ABI_NAMES[(reg & 0x1F) as usize]
}

/// opcode[6:0] 所划分的指令类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeClass {
    Lui,
    Auipc,
    Load,
    Store,
    Branch,
    Jal,
    Jalr,
    /// 立即数算术/逻辑（OP-IMM）
    OpImm,
    /// 寄存器算术/逻辑（OP）
    Op,
    /// FENCE 等
    MiscMem,
    System,
}

impl OpcodeClass {
    pub const ALL: [OpcodeClass; 11] = [
        OpcodeClass::Lui,
        OpcodeClass::Auipc,
        OpcodeClass::Load,
        OpcodeClass::Store,
        OpcodeClass::Branch,
        OpcodeClass::Jal,
        OpcodeClass::Jalr,
        OpcodeClass::OpImm,
        OpcodeClass::Op,
        OpcodeClass::MiscMem,
        OpcodeClass::System,
    ];

    /// 由 opcode 字段查找类别；未知 opcode 返回 `None`
    pub fn from_bits(opcode: u32) -> Option<Self> {
        match opcode {
            OP_LUI => Some(OpcodeClass::Lui),
            OP_AUIPC => Some(OpcodeClass::Auipc),
            OP_LOAD => Some(OpcodeClass::Load),
            OP_STORE => Some(OpcodeClass::Store),
            OP_BRANCH => Some(OpcodeClass::Branch),
            OP_JAL => Some(OpcodeClass::Jal),
            OP_JALR => Some(OpcodeClass::Jalr),
            OP_IMM => Some(OpcodeClass::OpImm),
            OP_REG => Some(OpcodeClass::Op),
            OP_MISC_MEM => Some(OpcodeClass::MiscMem),
            OP_SYSTEM => Some(OpcodeClass::System),
            _ => None,
        }
    }

    /// 类别对应的 opcode 编码
    pub const fn bits(self) -> u32 {
        match self {
            OpcodeClass::Lui => OP_LUI,
            OpcodeClass::Auipc => OP_AUIPC,
            OpcodeClass::Load => OP_LOAD,
            OpcodeClass::Store => OP_STORE,
            OpcodeClass::Branch => OP_BRANCH,
            OpcodeClass::Jal => OP_JAL,
            OpcodeClass::Jalr => OP_JALR,
            OpcodeClass::OpImm => OP_IMM,
            OpcodeClass::Op => OP_REG,
            OpcodeClass::MiscMem => OP_MISC_MEM,
            OpcodeClass::System => OP_SYSTEM,
        }
    }

    /// 反向名称表
    pub const fn name(self) -> &'static str {
        match self {
            OpcodeClass::Lui => "LUI",
            OpcodeClass::Auipc => "AUIPC",
            OpcodeClass::Load => "LOAD",
            OpcodeClass::Store => "STORE",
            OpcodeClass::Branch => "BRANCH",
            OpcodeClass::Jal => "JAL",
            OpcodeClass::Jalr => "JALR",
            OpcodeClass::OpImm => "OP-IMM",
            OpcodeClass::Op => "OP",
            OpcodeClass::MiscMem => "MISC-MEM",
            OpcodeClass::System => "SYSTEM",
        }
    }
}

impl fmt::Display for OpcodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Load 的宽度与符号扩展方式（funct3）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadWidth {
    Byte,
    Half,
    Word,
    ByteUnsigned,
    HalfUnsigned,
}

impl LoadWidth {
    pub fn from_funct3(funct3: u32) -> Option<Self> {
        match funct3 {
            0b000 => Some(LoadWidth::Byte),
            0b001 => Some(LoadWidth::Half),
            0b010 => Some(LoadWidth::Word),
            0b100 => Some(LoadWidth::ByteUnsigned),
            0b101 => Some(LoadWidth::HalfUnsigned),
            _ => None,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            LoadWidth::Byte => "lb",
            LoadWidth::Half => "lh",
            LoadWidth::Word => "lw",
            LoadWidth::ByteUnsigned => "lbu",
            LoadWidth::HalfUnsigned => "lhu",
        }
    }
}

/// Store 的宽度（funct3）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreWidth {
    Byte,
    Half,
    Word,
}

impl StoreWidth {
    pub fn from_funct3(funct3: u32) -> Option<Self> {
        match funct3 {
            0b000 => Some(StoreWidth::Byte),
            0b001 => Some(StoreWidth::Half),
            0b010 => Some(StoreWidth::Word),
            _ => None,
        }
    }

    /// 写入的字节数
    pub const fn bytes(self) -> usize {
        match self {
            StoreWidth::Byte => 1,
            StoreWidth::Half => 2,
            StoreWidth::Word => 4,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            StoreWidth::Byte => "sb",
            StoreWidth::Half => "sh",
            StoreWidth::Word => "sw",
        }
    }
}

/// 已解码的指令
///
/// 包含原始编码、类别、选择字段、寄存器编号以及五种已符号扩展的立即数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstr {
    /// 原始 32-bit 指令编码
    pub raw: u32,
    pub class: OpcodeClass,
    pub funct3: u32,
    pub funct7: u32,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub imm_i: i32,
    pub imm_s: i32,
    pub imm_b: i32,
    pub imm_u: i32,
    pub imm_j: i32,
}

impl DecodedInstr {
    /// funct7 是否为 alternate 编码（SUB/SRA/SRAI）
    #[inline]
    pub fn is_alternate(&self) -> bool {
        self.funct7 == FUNCT7_ALT
    }

    /// LOAD 指令的访存宽度
    pub fn load_width(&self) -> Result<LoadWidth, IsaError> {
        LoadWidth::from_funct3(self.funct3).ok_or(IsaError::UnknownWidth {
            class: self.class,
            funct3: self.funct3,
        })
    }

    /// STORE 指令的访存宽度
    pub fn store_width(&self) -> Result<StoreWidth, IsaError> {
        StoreWidth::from_funct3(self.funct3).ok_or(IsaError::UnknownWidth {
            class: self.class,
            funct3: self.funct3,
        })
    }

    /// 指令助记符（仅用于跟踪与诊断）
    pub fn mnemonic(&self) -> &'static str {
        match self.class {
            OpcodeClass::Lui => "lui",
            OpcodeClass::Auipc => "auipc",
            OpcodeClass::Jal => "jal",
            OpcodeClass::Jalr => "jalr",
            OpcodeClass::Branch => BranchCond::try_from(self.funct3)
                .map(BranchCond::mnemonic)
                .unwrap_or("branch?"),
            OpcodeClass::Load => self.load_width().map(LoadWidth::mnemonic).unwrap_or("load?"),
            OpcodeClass::Store => self.store_width().map(StoreWidth::mnemonic).unwrap_or("store?"),
            OpcodeClass::OpImm => match AluOp::try_from(self.funct3) {
                Ok(op) => op.mnemonic(op == AluOp::Shr && self.is_alternate(), true),
                Err(_) => "op-imm?",
            },
            OpcodeClass::Op => match AluOp::try_from(self.funct3) {
                Ok(op) => op.mnemonic(self.is_alternate(), false),
                Err(_) => "op?",
            },
            OpcodeClass::MiscMem => "fence",
            OpcodeClass::System => match (self.funct3, self.imm_i) {
                (F3_PRIV, 0) => "ecall",
                (F3_PRIV, 1) => "ebreak",
                (F3_PRIV, _) => "system",
                (F3_CSRRW, _) => "csrrw",
                (F3_CSRRS, _) => "csrrs",
                (F3_CSRRC, _) => "csrrc",
                (F3_CSRRWI, _) => "csrrwi",
                (F3_CSRRSI, _) => "csrrsi",
                (F3_CSRRCI, _) => "csrrci",
                _ => "system?",
            },
        }
    }
}

impl fmt::Display for DecodedInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.mnemonic();
        let (rd, rs1, rs2) = (abi_name(self.rd), abi_name(self.rs1), abi_name(self.rs2));
        match self.class {
            OpcodeClass::Lui | OpcodeClass::Auipc => {
                write!(f, "{m} {rd}, 0x{:x}", (self.imm_u as u32) >> 12)
            }
            OpcodeClass::Jal => write!(f, "{m} {rd}, {}", self.imm_j),
            OpcodeClass::Jalr => write!(f, "{m} {rd}, {}({rs1})", self.imm_i),
            OpcodeClass::Branch => write!(f, "{m} {rs1}, {rs2}, {}", self.imm_b),
            OpcodeClass::Load => write!(f, "{m} {rd}, {}({rs1})", self.imm_i),
            OpcodeClass::Store => write!(f, "{m} {rs2}, {}({rs1})", self.imm_s),
            OpcodeClass::OpImm if matches!(self.funct3, 0b001 | 0b101) => {
                write!(f, "{m} {rd}, {rs1}, {}", self.imm_i & 0x1F)
            }
            OpcodeClass::OpImm => write!(f, "{m} {rd}, {rs1}, {}", self.imm_i),
            OpcodeClass::Op => write!(f, "{m} {rd}, {rs1}, {rs2}"),
            OpcodeClass::MiscMem => f.write_str(m),
            OpcodeClass::System if self.funct3 == F3_PRIV => f.write_str(m),
            OpcodeClass::System => {
                write!(f, "{m} {rd}, 0x{:03x}, {rs1}", (self.imm_i as u32) & 0xFFF)
            }
        }
    }
}
