//! CPU 核心与执行引擎
//!
//! 本模块定义了单线程 RV32I CPU 核心 `CpuCore`。它独占自己的寄存器文件和内存，
//! 每次调用 [`CpuCore::step`] 恰好退休一条指令：
//!
//! 1. 取指：按 PC 读取 32-bit 指令字
//! 2. 译码
//! 3. 读取 rs1 / rs2，记录当前 PC
//! 4. 执行（`exu`），只产生待定效果
//! 5. 访存（仅 LOAD / STORE）
//! 6. 写回 rd，更新 PC
//!
//! 所有错误都是致命的：返回 `Err` 之前会通过日志输出完整的寄存器状态。

use thiserror::Error;
use tracing::{error, trace};

use crate::isa::{self, IsaError, LoadWidth, StoreWidth};
use crate::memory::{FlatMemory, MemError, Memory, DEFAULT_MEM_BASE, DEFAULT_MEM_SIZE};

mod exu;
pub mod harness;
mod regfile;

use exu::{Effect, Operands};
pub use harness::{EcallReport, TestConvention};
pub use regfile::RegFile;

/// 执行过程中的致命错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecError {
    /// 取指、访存越界
    #[error(transparent)]
    OutOfBounds(#[from] MemError),
    /// 无法识别的 opcode 或访存宽度
    #[error("decode failure at pc 0x{pc:08x}: {source}")]
    DecodeFailure { pc: u32, source: IsaError },
    /// ALU / 分支选择子不合法
    #[error("invalid operation at pc 0x{pc:08x}: {source}")]
    InvalidOperation { pc: u32, source: IsaError },
    /// 客户程序通过 ECALL 报告失败
    #[error("guest test failure at pc 0x{pc:08x}: report value {value}")]
    GuestTestFailure { pc: u32, value: u32 },
}

impl ExecError {
    /// 按错误来源归类：译码类错误为 `DecodeFailure`，运算单元错误为 `InvalidOperation`
    pub fn from_isa(pc: u32, source: IsaError) -> Self {
        match source {
            IsaError::UnknownOpcode { .. } | IsaError::UnknownWidth { .. } => {
                ExecError::DecodeFailure { pc, source }
            }
            IsaError::InvalidAluOp(_) | IsaError::InvalidBranchCond(_) => {
                ExecError::InvalidOperation { pc, source }
            }
        }
    }
}

/// 机器配置：内存窗口与测试约定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    pub mem_base: u32,
    pub mem_size: usize,
    pub convention: TestConvention,
}

impl MachineConfig {
    pub fn with_memory(mut self, base: u32, size: usize) -> Self {
        self.mem_base = base;
        self.mem_size = size;
        self
    }

    pub fn with_convention(mut self, convention: TestConvention) -> Self {
        self.convention = convention;
        self
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            mem_base: DEFAULT_MEM_BASE,
            mem_size: DEFAULT_MEM_SIZE,
            convention: TestConvention::default(),
        }
    }
}

/// 单线程 CPU 核心
///
/// 设计约定：
/// - x0 永远为 0，写入时丢弃
/// - 寄存器与内存只在访存/写回阶段被修改，出错的指令不会留下部分写回
/// - 核心状态不依赖全局变量，多个实例之间互不影响
pub struct CpuCore {
    regs: RegFile,
    mem: FlatMemory,
    config: MachineConfig,
    /// 自上次复位以来退休的指令数
    retired: u64,
}

impl CpuCore {
    /// 创建一个新的 CPU 核心，寄存器与内存全部清零
    ///
    /// # 示例
    ///
    /// ```
    /// use rv32i_sim::cpu::{CpuCore, MachineConfig};
    ///
    /// let mut cpu = CpuCore::new(MachineConfig::default());
    /// // addi x1, x0, 42
    /// cpu.write_bytes(0x8000_0000, &0x02A00093u32.to_le_bytes()).unwrap();
    /// cpu.set_pc(0x8000_0000);
    /// assert_eq!(cpu.step(), Ok(true));
    /// assert_eq!(cpu.read_reg(1), 42);
    /// ```
    pub fn new(config: MachineConfig) -> Self {
        CpuCore {
            regs: RegFile::new(),
            mem: FlatMemory::new(config.mem_size, config.mem_base),
            config,
            retired: 0,
        }
    }

    /// 重新创建全零的寄存器文件与内存；装载新程序之前必须调用
    pub fn reset(&mut self) {
        self.regs = RegFile::new();
        self.mem = FlatMemory::new(self.config.mem_size, self.config.mem_base);
        self.retired = 0;
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// 获取当前程序计数器值
    pub fn pc(&self) -> u32 {
        self.regs.pc()
    }

    /// 设置程序计数器
    pub fn set_pc(&mut self, pc: u32) {
        self.regs.set_pc(pc);
    }

    /// 读取 x0 总是返回 0
    pub fn read_reg(&self, reg: u8) -> u32 {
        self.regs.read(reg)
    }

    pub fn write_reg(&mut self, reg: u8, value: u32) {
        self.regs.write(reg, value)
    }

    pub fn regs(&self) -> &RegFile {
        &self.regs
    }

    pub fn memory(&self) -> &FlatMemory {
        &self.mem
    }

    /// 供装载器把段数据复制到物理地址
    pub fn write_bytes(&mut self, addr: u32, bytes: &[u8]) -> Result<(), MemError> {
        self.mem.write_bytes(addr, bytes)
    }

    pub fn retired(&self) -> u64 {
        self.retired
    }

    /// 格式化全部寄存器（含 ABI 名称）与 PC
    pub fn dump(&self) -> String {
        self.regs.to_string()
    }

    /// 执行单步指令
    ///
    /// 返回 `Ok(true)` 表示继续，`Ok(false)` 表示遇到结束标记。
    /// 出错时先输出寄存器状态再返回错误。
    pub fn step(&mut self) -> Result<bool, ExecError> {
        self.cycle().inspect_err(|err| {
            error!("{err}\n{}", self.dump());
        })
    }

    fn cycle(&mut self) -> Result<bool, ExecError> {
        // 取指
        let pc = self.regs.pc();
        let raw = self.mem.read_word(pc)?;

        // 译码
        let instr = isa::decode(raw).map_err(|e| ExecError::from_isa(pc, e))?;
        trace!("{pc:08x}: {raw:08x}  {instr}");

        // 读寄存器
        let ops = Operands {
            pc,
            vs1: self.regs.read(instr.rs1),
            vs2: self.regs.read(instr.rs2),
            report: self.regs.read(self.config.convention.report_reg),
        };

        // 执行
        let effect = exu::execute(&instr, ops, &self.config.convention)?;

        // 访存
        let next = pc.wrapping_add(4);
        let (result, next_pc) = match effect {
            Effect::Halt => return Ok(false),
            Effect::Writeback(value) => (Some(value), next),
            Effect::Redirect { target, link } => (link, target),
            Effect::Load { addr, width } => (Some(self.load(addr, width)?), next),
            Effect::Store { addr, width, value } => {
                self.store(addr, width, value)?;
                (None, next)
            }
            Effect::Advance => (None, next),
        };

        // 写回
        if let Some(value) = result {
            self.regs.write(instr.rd, value);
        }
        self.regs.set_pc(next_pc);
        self.retired += 1;

        Ok(true)
    }

    fn load(&self, addr: u32, width: LoadWidth) -> Result<u32, MemError> {
        Ok(match width {
            LoadWidth::Byte => isa::sign_extend(u32::from(self.mem.load8(addr)?), 8) as u32,
            LoadWidth::Half => isa::sign_extend(u32::from(self.mem.load16(addr)?), 16) as u32,
            LoadWidth::Word => self.mem.read_word(addr)?,
            LoadWidth::ByteUnsigned => u32::from(self.mem.load8(addr)?),
            LoadWidth::HalfUnsigned => u32::from(self.mem.load16(addr)?),
        })
    }

    fn store(&mut self, addr: u32, width: StoreWidth, value: u32) -> Result<(), MemError> {
        match width {
            StoreWidth::Byte => self.mem.store8(addr, value as u8),
            StoreWidth::Half => self.mem.store16(addr, value as u16),
            StoreWidth::Word => self.mem.store32(addr, value),
        }
    }
}

impl Default for CpuCore {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}
