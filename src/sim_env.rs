//! 仿真环境
//!
//! 本模块负责：
//! - 仿真配置 `SimConfig`
//! - 解析 ELF 文件，取出 `PT_LOAD` 段
//! - 复位 CPU、把段写入物理地址、从入口地址运行到结束标记
//! - 按前缀枚举测试目录并逐个运行
//!
//! # 示例
//!
//! ```no_run
//! use rv32i_sim::sim_env::{SimConfig, SimEnv};
//!
//! let config = SimConfig::default()
//!     .with_test_dir("riscv-tests/isa")
//!     .with_prefix("rv32ui-p");
//!
//! let mut env = SimEnv::new(config);
//! let report = env.run_suite().expect("failed to list tests");
//! println!("{} passed / {} failed", report.passed().count(), report.failed().count());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use elf::abi::{EM_RISCV, PT_LOAD};
use elf::endian::AnyEndian;
use elf::ElfBytes;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cpu::{CpuCore, ExecError, MachineConfig, TestConvention};
use crate::memory::{MemError, DEFAULT_MEM_BASE, DEFAULT_MEM_SIZE};

/// 仿真环境错误
#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("ELF parse error: {0}")]
    Elf(String),
    /// 段落在内存窗口之外
    #[error("segment load failed: {0}")]
    Load(#[source] MemError),
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// 仿真配置
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// 内存基地址
    pub mem_base: u32,
    /// 内存大小（字节）
    pub mem_size: usize,
    /// 入口 PC，不使用 ELF 头中的 e_entry
    pub entry_pc: u32,
    /// 单个程序最多执行的指令数
    pub max_instructions: u64,
    pub convention: TestConvention,
    /// 测试程序所在目录
    pub test_dir: PathBuf,
    /// 测试文件名前缀
    pub prefix: String,
    /// 文件名还需包含的子串
    pub filter: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            mem_base: DEFAULT_MEM_BASE,
            mem_size: DEFAULT_MEM_SIZE,
            entry_pc: DEFAULT_MEM_BASE,
            max_instructions: 2_000_000,
            convention: TestConvention::default(),
            test_dir: PathBuf::from("riscv-tests/isa"),
            prefix: "rv32ui-p".to_string(),
            filter: None,
        }
    }
}

impl SimConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置内存基地址
    pub fn with_memory_base(mut self, base: u32) -> Self {
        self.mem_base = base;
        self
    }

    /// 设置内存大小
    pub fn with_memory_size(mut self, size: usize) -> Self {
        self.mem_size = size;
        self
    }

    /// 设置入口 PC
    pub fn with_entry_pc(mut self, pc: u32) -> Self {
        self.entry_pc = pc;
        self
    }

    /// 设置最大指令数
    pub fn with_max_instructions(mut self, max: u64) -> Self {
        self.max_instructions = max;
        self
    }

    pub fn with_convention(mut self, convention: TestConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn with_test_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.test_dir = dir.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    /// CPU 核心需要的那部分配置
    pub fn machine_config(&self) -> MachineConfig {
        MachineConfig::default()
            .with_memory(self.mem_base, self.mem_size)
            .with_convention(self.convention)
    }
}

/// 一个可加载段：物理地址与文件中的字节
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub paddr: u32,
    pub data: Vec<u8>,
}

/// 解析后的 ELF 映像
#[derive(Debug, Clone)]
pub struct ElfImage {
    /// ELF 头中的入口地址，仅用于诊断
    pub entry: u32,
    pub segments: Vec<Segment>,
}

impl ElfImage {
    /// 解析 ELF 文件
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let data = fs::read(path.as_ref())?;
        Self::parse(&data)
    }

    /// 从字节数组解析 ELF（使用 elf crate）
    ///
    /// 只接受 32 位小端 RISC-V 映像。段只取文件中的字节，
    /// `p_memsz` 超出的部分在复位后本来就是 0。
    pub fn parse(data: &[u8]) -> Result<Self, SimError> {
        let elf_file = ElfBytes::<AnyEndian>::minimal_parse(data)
            .map_err(|e| SimError::Elf(format!("failed to parse ELF: {e}")))?;

        let header = &elf_file.ehdr;

        // 检查机器类型
        if header.e_machine != EM_RISCV {
            return Err(SimError::Elf(format!(
                "not a RISC-V ELF (machine type: 0x{:x}, expected 0x{:x})",
                header.e_machine, EM_RISCV
            )));
        }

        if header.class != elf::file::Class::ELF32 {
            return Err(SimError::Elf("only 32-bit ELF is supported".into()));
        }

        if header.endianness != AnyEndian::Little {
            return Err(SimError::Elf("only little-endian ELF is supported".into()));
        }

        let mut segments = Vec::new();

        if let Some(phdrs) = elf_file.segments() {
            for phdr in phdrs {
                if phdr.p_type != PT_LOAD {
                    continue;
                }

                let paddr = u32::try_from(phdr.p_paddr).map_err(|_| {
                    SimError::Elf(format!("segment address 0x{:x} exceeds 32 bits", phdr.p_paddr))
                })?;

                let data = elf_file
                    .segment_data(&phdr)
                    .map_err(|e| SimError::Elf(format!("failed to read segment data: {e}")))?
                    .to_vec();

                debug!(
                    "segment paddr=0x{paddr:08x} filesz=0x{:x} memsz=0x{:x}",
                    data.len(),
                    phdr.p_memsz
                );
                segments.push(Segment { paddr, data });
            }
        }

        Ok(ElfImage {
            entry: header.e_entry as u32,
            segments,
        })
    }
}

/// 解析 ELF 并返回全部可加载段
pub fn load_segments(data: &[u8]) -> Result<Vec<Segment>, SimError> {
    ElfImage::parse(data).map(|image| image.segments)
}

/// 单个程序的运行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 遇到结束标记
    Halted,
    /// 达到指令数上限仍未结束
    StepLimit,
}

/// 单个测试程序的记录
#[derive(Debug, Clone)]
pub struct CaseReport {
    pub name: String,
    /// 退休的指令数
    pub retired: u64,
    pub elapsed: Duration,
    /// 失败原因，通过时为 `None`
    pub failure: Option<String>,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// 整个测试集的结果
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| c.passed())
    }

    pub fn failed(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| !c.passed())
    }

    /// 没有任何失败（空测试集也算成功）
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// 列出 `dir` 下以 `prefix` 开头的测试程序，跳过 `.dump` 反汇编文件，按路径排序
pub fn collect_cases(dir: &Path, prefix: &str, filter: Option<&str>) -> io::Result<Vec<PathBuf>> {
    let mut cases = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if !name.starts_with(prefix) || name.ends_with(".dump") {
            continue;
        }
        if let Some(pattern) = filter {
            if !name.contains(pattern) {
                continue;
            }
        }
        cases.push(path);
    }
    cases.sort();
    Ok(cases)
}

/// 仿真环境：一个 CPU 核心加上运行配置
pub struct SimEnv {
    cpu: CpuCore,
    config: SimConfig,
}

impl SimEnv {
    /// 从配置创建仿真环境
    pub fn new(config: SimConfig) -> Self {
        SimEnv {
            cpu: CpuCore::new(config.machine_config()),
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn cpu(&self) -> &CpuCore {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CpuCore {
        &mut self.cpu
    }

    /// 复位 CPU，把每个段写到它的物理地址，PC 指向入口
    pub fn load_image(&mut self, image: &ElfImage) -> Result<(), SimError> {
        self.cpu.reset();
        for segment in &image.segments {
            self.cpu
                .write_bytes(segment.paddr, &segment.data)
                .map_err(SimError::Load)?;
        }
        self.cpu.set_pc(self.config.entry_pc);
        Ok(())
    }

    /// 从当前状态运行，直到结束标记、出错或达到指令数上限
    pub fn run(&mut self) -> Result<RunOutcome, SimError> {
        for _ in 0..self.config.max_instructions {
            if !self.cpu.step()? {
                return Ok(RunOutcome::Halted);
            }
        }
        Ok(RunOutcome::StepLimit)
    }

    /// 装载 ELF 字节并运行
    pub fn run_image(&mut self, data: &[u8]) -> Result<RunOutcome, SimError> {
        let image = ElfImage::parse(data)?;
        self.load_image(&image)?;
        self.run()
    }

    /// 读取 ELF 文件并运行
    pub fn run_elf<P: AsRef<Path>>(&mut self, path: P) -> Result<RunOutcome, SimError> {
        let data = fs::read(path.as_ref())?;
        self.run_image(&data)
    }

    /// 运行单个测试程序，把任何错误记录为失败
    pub fn run_case(&mut self, path: &Path) -> CaseReport {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!("test {}", path.display());
        self.cpu.reset();
        let start = Instant::now();
        let failure = match self.run_elf(path) {
            Ok(RunOutcome::Halted) => None,
            Ok(RunOutcome::StepLimit) => Some(format!(
                "did not halt within {} instructions",
                self.config.max_instructions
            )),
            Err(err) => Some(err.to_string()),
        };
        let report = CaseReport {
            name,
            retired: self.cpu.retired(),
            elapsed: start.elapsed(),
            failure,
        };

        match &report.failure {
            None => info!(
                "{}: pass ({} instr, {:?})",
                report.name, report.retired, report.elapsed
            ),
            Some(reason) => warn!("{}: {reason}", report.name),
        }
        report
    }

    /// 运行配置目录下的全部测试；单个程序失败不会中断测试集
    pub fn run_suite(&mut self) -> Result<SuiteReport, SimError> {
        let cases = collect_cases(
            &self.config.test_dir,
            &self.config.prefix,
            self.config.filter.as_deref(),
        )?;
        info!(
            "discovered {} {}* tests under {}",
            cases.len(),
            self.config.prefix,
            self.config.test_dir.display()
        );

        let mut report = SuiteReport::default();
        for case in &cases {
            report.cases.push(self.run_case(case));
        }
        Ok(report)
    }
}
