//! rv32i_sim: RV32I 功能级指令集仿真库
//!
//! 运行 riscv-tests 的 `rv32ui-p-*` 裸机测试程序，每退休一条指令后都可以观察
//! 寄存器、内存与 PC。
//!
//! # 模块结构
//!
//! - `isa`: 字段提取、立即数、译码、ALU 与分支条件
//! - `cpu`: CPU 核心、寄存器文件与执行引擎
//! - `memory`: 内存抽象层
//! - `sim_env`: 仿真环境（配置、ELF 加载、测试集运行）

pub mod cpu;
pub mod isa;
pub mod memory;
pub mod sim_env;
