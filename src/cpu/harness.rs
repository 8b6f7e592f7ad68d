//! 测试程序与仿真器之间的约定
//!
//! riscv-tests 的裸机环境在没有 trap 支持时，用两种方式与宿主通信：
//! - `ecall` 时把结果放在 gp (x3) 中：0 通过、1 为提示、更大的值表示失败
//! - 代码段末尾的 `unimp`（`csrrw x0, cycle, x0`，立即数 0xC00）表示结束
//!
//! 这些值集中在 `TestConvention` 中，替换成别的客户程序约定时只需改配置。

/// ECALL 报告值的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcallReport {
    /// 测试通过
    Pass,
    /// 提示信息，继续执行
    Info,
    /// 客户程序报告失败
    Fail(u32),
}

/// 终止与结果报告约定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestConvention {
    /// 作为结束标记的 CSRRW 立即数（符号扩展后的 12 位值）
    pub halt_csr_imm: i32,
    /// ECALL 时读取报告值的寄存器编号
    pub report_reg: u8,
    /// 表示通过的报告值
    pub pass_value: u32,
    /// 不超过此值的报告都视为非致命
    pub max_benign_value: u32,
}

impl TestConvention {
    /// riscv-tests `p` 环境的约定
    pub const RISCV_TESTS: TestConvention = TestConvention {
        halt_csr_imm: -1024,
        report_reg: 3,
        pass_value: 0,
        max_benign_value: 1,
    };

    pub fn with_halt_csr_imm(mut self, imm: i32) -> Self {
        self.halt_csr_imm = imm;
        self
    }

    pub fn with_report_reg(mut self, reg: u8) -> Self {
        self.report_reg = reg & 0x1F;
        self
    }

    pub fn with_max_benign_value(mut self, value: u32) -> Self {
        self.max_benign_value = value;
        self
    }

    /// 对 ECALL 报告值分类
    pub fn classify(&self, value: u32) -> EcallReport {
        if value == self.pass_value {
            EcallReport::Pass
        } else if value <= self.max_benign_value {
            EcallReport::Info
        } else {
            EcallReport::Fail(value)
        }
    }
}

impl Default for TestConvention {
    fn default() -> Self {
        Self::RISCV_TESTS
    }
}
