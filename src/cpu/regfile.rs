//! 架构寄存器状态：x0..x31 与程序计数器

use std::fmt;

use crate::isa::abi_name;

/// 整数寄存器文件
///
/// - 32 个 32-bit 通用寄存器，x0 恒为 0，写入被丢弃
/// - 程序计数器单独存放，不占用寄存器编号
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegFile {
    x: [u32; 32],
    pc: u32,
}

impl RegFile {
    /// 全部清零的寄存器文件
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn read(&self, reg: u8) -> u32 {
        match reg & 0x1F {
            0 => 0,
            r => self.x[r as usize],
        }
    }

    #[inline]
    pub fn write(&mut self, reg: u8, value: u32) {
        match reg & 0x1F {
            0 => {}
            r => self.x[r as usize] = value,
        }
    }

    #[inline]
    pub fn pc(&self) -> u32 {
        self.pc
    }

    #[inline]
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    pub fn snapshot(&self) -> &[u32; 32] {
        &self.x
    }
}

/// 每行 8 个寄存器，最后一行为 PC
impl fmt::Display for RegFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..4u8 {
            for col in 0..8u8 {
                let reg = row * 8 + col;
                write!(f, " {:>4}: {:08x}", abi_name(reg), self.read(reg))?;
            }
            writeln!(f)?;
        }
        write!(f, "   PC: {:08x}", self.pc)
    }
}

impl fmt::Debug for RegFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegFile")
            .field("x", &self.x)
            .field("pc", &format_args!("0x{:08x}", self.pc))
            .finish()
    }
}
