//! 分支条件判断

use super::IsaError;

/// 分支比较选择子（即 BRANCH 的 funct3）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BranchCond {
    Eq = 0b000,
    Ne = 0b001,
    Lt = 0b100,
    Ge = 0b101,
    Ltu = 0b110,
    Geu = 0b111,
}

impl TryFrom<u32> for BranchCond {
    type Error = IsaError;

    fn try_from(funct3: u32) -> Result<Self, Self::Error> {
        Ok(match funct3 {
            0b000 => BranchCond::Eq,
            0b001 => BranchCond::Ne,
            0b100 => BranchCond::Lt,
            0b101 => BranchCond::Ge,
            0b110 => BranchCond::Ltu,
            0b111 => BranchCond::Geu,
            _ => return Err(IsaError::InvalidBranchCond(funct3)),
        })
    }
}

impl BranchCond {
    pub fn holds(self, vs1: u32, vs2: u32) -> bool {
        match self {
            BranchCond::Eq => vs1 == vs2,
            BranchCond::Ne => vs1 != vs2,
            BranchCond::Lt => (vs1 as i32) < (vs2 as i32),
            BranchCond::Ge => (vs1 as i32) >= (vs2 as i32),
            BranchCond::Ltu => vs1 < vs2,
            BranchCond::Geu => vs1 >= vs2,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            BranchCond::Eq => "beq",
            BranchCond::Ne => "bne",
            BranchCond::Lt => "blt",
            BranchCond::Ge => "bge",
            BranchCond::Ltu => "bltu",
            BranchCond::Geu => "bgeu",
        }
    }
}

/// 按 funct3 选择子判断分支是否成立
pub fn cond(selector: u32, vs1: u32, vs2: u32) -> Result<bool, IsaError> {
    Ok(BranchCond::try_from(selector)?.holds(vs1, vs2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality() {
        assert_eq!(cond(0b000, 7, 7), Ok(true));
        assert_eq!(cond(0b000, 7, 8), Ok(false));
        assert_eq!(cond(0b001, 7, 8), Ok(true));
    }

    #[test]
    fn test_signed_vs_unsigned() {
        let minus_one = 0xFFFF_FFFF;
        assert_eq!(cond(0b100, minus_one, 0), Ok(true)); // blt
        assert_eq!(cond(0b101, minus_one, 0), Ok(false)); // bge
        assert_eq!(cond(0b110, minus_one, 0), Ok(false)); // bltu
        assert_eq!(cond(0b111, minus_one, 0), Ok(true)); // bgeu
    }

    #[test]
    fn test_ge_includes_equal() {
        assert_eq!(cond(0b101, 3, 3), Ok(true));
        assert_eq!(cond(0b111, 3, 3), Ok(true));
    }

    #[test]
    fn test_invalid_selectors() {
        assert_eq!(cond(0b010, 0, 0), Err(IsaError::InvalidBranchCond(0b010)));
        assert_eq!(cond(0b011, 0, 0), Err(IsaError::InvalidBranchCond(0b011)));
    }
}
