//! 执行阶段
//!
//! 按 opcode 类别计算本周期的结果，但不修改任何架构状态：
//! 访存与写回由 `CpuCore::step` 在之后统一完成。

use tracing::info;

use super::harness::{EcallReport, TestConvention};
use super::ExecError;
use crate::isa::{
    self, AluOp, DecodedInstr, IsaError, LoadWidth, OpcodeClass, StoreWidth, F3_CSRRW, F3_PRIV,
};

/// 本周期读取到的操作数
#[derive(Debug, Clone, Copy)]
pub(super) struct Operands {
    pub pc: u32,
    pub vs1: u32,
    pub vs2: u32,
    /// ECALL 报告寄存器的当前值
    pub report: u32,
}

/// 执行阶段产生的待定效果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Effect {
    /// 结果写回 rd，PC += 4
    Writeback(u32),
    /// PC 重定向；`link` 为 `Some` 时先把返回地址写回 rd
    Redirect { target: u32, link: Option<u32> },
    /// 待定的内存读取，读到的值写回 rd
    Load { addr: u32, width: LoadWidth },
    /// 待定的内存写入
    Store {
        addr: u32,
        width: StoreWidth,
        value: u32,
    },
    /// 只推进 PC
    Advance,
    /// 遇到结束标记，停止运行且不修改状态
    Halt,
}

#[inline]
fn offset(base: u32, imm: i32) -> u32 {
    base.wrapping_add(imm as u32)
}

pub(super) fn execute(
    instr: &DecodedInstr,
    ops: Operands,
    convention: &TestConvention,
) -> Result<Effect, ExecError> {
    let Operands { pc, vs1, vs2, report } = ops;
    let link = Some(pc.wrapping_add(4));
    let isa_err = |e: IsaError| ExecError::from_isa(pc, e);

    let effect = match instr.class {
        OpcodeClass::Lui => Effect::Writeback(instr.imm_u as u32),
        OpcodeClass::Auipc => Effect::Writeback(offset(pc, instr.imm_u)),
        OpcodeClass::Jal => Effect::Redirect {
            target: offset(pc, instr.imm_j),
            link,
        },
        OpcodeClass::Jalr => Effect::Redirect {
            target: offset(vs1, instr.imm_i),
            link,
        },
        OpcodeClass::Branch => {
            if isa::cond(instr.funct3, vs1, vs2).map_err(isa_err)? {
                Effect::Redirect {
                    target: offset(pc, instr.imm_b),
                    link: None,
                }
            } else {
                Effect::Advance
            }
        }
        OpcodeClass::Op => Effect::Writeback(
            isa::arith(instr.funct3, vs1, vs2, instr.is_alternate()).map_err(isa_err)?,
        ),
        OpcodeClass::OpImm => {
            // 只有 SRAI 使用 funct7 的 alternate 编码
            let alternate = instr.funct3 == AluOp::Shr as u32 && instr.is_alternate();
            Effect::Writeback(
                isa::arith(instr.funct3, vs1, instr.imm_i as u32, alternate).map_err(isa_err)?,
            )
        }
        OpcodeClass::Load => Effect::Load {
            addr: offset(vs1, instr.imm_i),
            width: instr.load_width().map_err(isa_err)?,
        },
        OpcodeClass::Store => Effect::Store {
            addr: offset(vs1, instr.imm_s),
            width: instr.store_width().map_err(isa_err)?,
            value: vs2,
        },
        OpcodeClass::MiscMem => Effect::Advance,
        OpcodeClass::System => system(instr, pc, report, convention)?,
    };

    Ok(effect)
}

fn system(
    instr: &DecodedInstr,
    pc: u32,
    report: u32,
    convention: &TestConvention,
) -> Result<Effect, ExecError> {
    match instr.funct3 {
        F3_CSRRW if instr.imm_i == convention.halt_csr_imm => Ok(Effect::Halt),
        F3_PRIV => match convention.classify(report) {
            EcallReport::Pass => {
                info!("ecall {report} at 0x{pc:08x}: pass");
                Ok(Effect::Advance)
            }
            EcallReport::Info => {
                info!("ecall {report} at 0x{pc:08x}");
                Ok(Effect::Advance)
            }
            EcallReport::Fail(value) => Err(ExecError::GuestTestFailure { pc, value }),
        },
        // 其余 CSR 操作不建模
        _ => Ok(Effect::Advance),
    }
}
