//! 内存抽象层
//!
//! 本模块定义了内存访问的统一接口 `Memory` trait，
//! 以及固定基地址、固定容量的线性内存实现 `FlatMemory`。
//!
//! 所有访问都经过边界检查；不做对齐检查（非对齐访问是允许的）。

use thiserror::Error;

/// 参考配置下的内存基地址
pub const DEFAULT_MEM_BASE: u32 = 0x8000_0000;

/// 参考配置下的内存容量（16 KiB）
pub const DEFAULT_MEM_SIZE: usize = 0x4000;

/// 内存访问错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemError {
    /// 访问区间落在 `[base, base + size)` 之外
    #[error("out-of-bounds access of {len} byte(s) at 0x{addr:08x} (base=0x{base:08x}, size=0x{size:x})")]
    OutOfBounds {
        addr: u32,
        len: usize,
        base: u32,
        size: usize,
    },
}

pub type MemResult<T> = Result<T, MemError>;

/// 内存访问的统一接口
///
/// 实现者只需要提供按字读取与按字节区间写入两个原语，
/// 更窄的读取由整字读取后截取得到，各宽度的写入编码为小端字节后写入。
pub trait Memory {
    /// 从指定地址读取 32 位数据（小端序）
    fn read_word(&self, addr: u32) -> MemResult<u32>;

    /// 将 `bytes` 原地写入 `[addr, addr + bytes.len())`
    fn write_bytes(&mut self, addr: u32, bytes: &[u8]) -> MemResult<()>;

    /// 读取 8 位数据（取所在字的最低字节）
    fn load8(&self, addr: u32) -> MemResult<u8> {
        Ok((self.read_word(addr)? & 0xFF) as u8)
    }

    /// 读取 16 位数据（小端序）
    fn load16(&self, addr: u32) -> MemResult<u16> {
        Ok((self.read_word(addr)? & 0xFFFF) as u16)
    }

    fn load32(&self, addr: u32) -> MemResult<u32> {
        self.read_word(addr)
    }

    fn store8(&mut self, addr: u32, value: u8) -> MemResult<()> {
        self.write_bytes(addr, &[value])
    }

    fn store16(&mut self, addr: u32, value: u16) -> MemResult<()> {
        self.write_bytes(addr, &value.to_le_bytes())
    }

    fn store32(&mut self, addr: u32, value: u32) -> MemResult<()> {
        self.write_bytes(addr, &value.to_le_bytes())
    }

    /// `store32` 的别名，与 `read_word` 成对使用
    fn write_word(&mut self, addr: u32, value: u32) -> MemResult<()> {
        self.store32(addr, value)
    }
}

/// 简单线性内存实现
///
/// 使用固定长度的 `Vec<u8>` 存储一段映射到 `base_addr` 起的地址空间。
/// 写入总是在原有缓冲区上按区间覆盖，不会重新分配。
#[derive(Clone)]
pub struct FlatMemory {
    /// 内存数据存储
    data: Vec<u8>,
    /// 内存映射起始地址
    base_addr: u32,
}

impl FlatMemory {
    /// 创建一个指定大小、全部清零的内存区域
    ///
    /// # 示例
    ///
    /// ```
    /// use rv32i_sim::memory::{FlatMemory, Memory};
    ///
    /// let mut mem = FlatMemory::new(16 * 1024, 0x8000_0000);
    /// mem.write_word(0x8000_0100, 0x11223344).unwrap();
    /// assert_eq!(mem.read_word(0x8000_0100).unwrap(), 0x11223344);
    /// ```
    pub fn new(size: usize, base_addr: u32) -> Self {
        FlatMemory {
            data: vec![0; size],
            base_addr,
        }
    }

    /// 获取内存的基地址
    pub fn base_addr(&self) -> u32 {
        self.base_addr
    }

    /// 获取内存的大小
    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn out_of_bounds(&self, addr: u32, len: usize) -> MemError {
        MemError::OutOfBounds {
            addr,
            len,
            base: self.base_addr,
            size: self.data.len(),
        }
    }

    /// 将地址翻译为缓冲区偏移，并检查 `len` 字节的区间是否完整落在内存内
    fn bounds_check(&self, addr: u32, len: usize) -> MemResult<usize> {
        let relative = addr
            .checked_sub(self.base_addr)
            .ok_or_else(|| self.out_of_bounds(addr, len))? as usize;

        let end = relative
            .checked_add(len)
            .ok_or_else(|| self.out_of_bounds(addr, len))?;

        if end > self.data.len() {
            return Err(self.out_of_bounds(addr, len));
        }

        Ok(relative)
    }

    /// 批量读取数据
    pub fn read_bytes(&self, addr: u32, len: usize) -> MemResult<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let start = self.bounds_check(addr, len)?;
        Ok(self.data[start..start + len].to_vec())
    }
}

impl Memory for FlatMemory {
    fn read_word(&self, addr: u32) -> MemResult<u32> {
        let idx = self.bounds_check(addr, 4)?;
        Ok(u32::from_le_bytes([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]))
    }

    fn write_bytes(&mut self, addr: u32, bytes: &[u8]) -> MemResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let start = self.bounds_check(addr, bytes.len())?;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

impl std::fmt::Debug for FlatMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatMemory")
            .field("base_addr", &format_args!("0x{:08x}", self.base_addr))
            .field("size", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u32 = DEFAULT_MEM_BASE;

    #[test]
    fn test_word_round_trip() {
        let mut mem = FlatMemory::new(DEFAULT_MEM_SIZE, BASE);

        mem.write_word(BASE + 0x100, 0x11223344).unwrap();
        assert_eq!(mem.read_word(BASE + 0x100).unwrap(), 0x11223344);

        mem.write_word(BASE, 0xFFFF_FFFF).unwrap();
        assert_eq!(mem.read_word(BASE).unwrap(), 0xFFFF_FFFF);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut mem = FlatMemory::new(1024, BASE);
        mem.store32(BASE + 4, 0x78ABCDEF).unwrap();

        assert_eq!(mem.load8(BASE + 4).unwrap(), 0xEF); // 最低字节
        assert_eq!(mem.load8(BASE + 5).unwrap(), 0xCD);
        assert_eq!(mem.load16(BASE + 6).unwrap(), 0x78AB);
        assert_eq!(
            mem.read_bytes(BASE + 4, 4).unwrap(),
            vec![0xEF, 0xCD, 0xAB, 0x78]
        );
    }

    #[test]
    fn test_narrow_stores_touch_only_their_bytes() {
        let mut mem = FlatMemory::new(1024, BASE);
        mem.store32(BASE, 0xAAAA_AAAA).unwrap();

        mem.store8(BASE, 0x11).unwrap();
        assert_eq!(mem.read_word(BASE).unwrap(), 0xAAAA_AA11);

        mem.store16(BASE + 2, 0x2233).unwrap();
        assert_eq!(mem.read_word(BASE).unwrap(), 0x2233_AA11);
    }

    #[test]
    fn test_unaligned_access_allowed() {
        let mut mem = FlatMemory::new(1024, BASE);
        mem.store32(BASE + 1, 0xDEADBEEF).unwrap();
        assert_eq!(mem.read_word(BASE + 1).unwrap(), 0xDEADBEEF);
        assert_eq!(mem.load16(BASE + 3).unwrap(), 0xDEAD);
    }

    #[test]
    fn test_write_bytes() {
        let mut mem = FlatMemory::new(1024, BASE);
        mem.write_bytes(BASE + 8, &[0x01, 0x02, 0x03, 0x04]).unwrap();
        assert_eq!(mem.read_word(BASE + 8).unwrap(), 0x04030201);

        // 空区间不做边界检查
        mem.write_bytes(0, &[]).unwrap();
    }

    #[test]
    fn test_out_of_bounds_below_base() {
        let mem = FlatMemory::new(DEFAULT_MEM_SIZE, BASE);
        let err = mem.read_word(BASE - 4).unwrap_err();
        assert!(matches!(err, MemError::OutOfBounds { addr, .. } if addr == BASE - 4));
    }

    #[test]
    fn test_out_of_bounds_at_end() {
        let mem = FlatMemory::new(DEFAULT_MEM_SIZE, BASE);
        let end = BASE + DEFAULT_MEM_SIZE as u32;

        assert!(mem.read_word(end).is_err());
        // 跨越末尾的整字读取同样失败
        assert!(mem.read_word(end - 2).is_err());
        assert!(mem.read_word(end - 4).is_ok());
    }

    #[test]
    fn test_narrow_load_needs_enclosing_word() {
        let mem = FlatMemory::new(DEFAULT_MEM_SIZE, BASE);
        let last = BASE + DEFAULT_MEM_SIZE as u32 - 1;
        assert!(mem.load8(last).is_err());
    }

    #[test]
    fn test_write_span_past_end_is_rejected() {
        let mut mem = FlatMemory::new(16, BASE);
        let err = mem.write_bytes(BASE + 12, &[0; 8]).unwrap_err();
        assert_eq!(
            err,
            MemError::OutOfBounds {
                addr: BASE + 12,
                len: 8,
                base: BASE,
                size: 16
            }
        );
        // 失败的写入不能修改内存
        assert_eq!(mem.read_bytes(BASE + 12, 4).unwrap(), vec![0; 4]);
    }

    #[test]
    fn test_error_message() {
        let mem = FlatMemory::new(0x4000, BASE);
        let err = mem.read_word(0x1000).unwrap_err();
        assert_eq!(
            err.to_string(),
            "out-of-bounds access of 4 byte(s) at 0x00001000 (base=0x80000000, size=0x4000)"
        );
    }
}
