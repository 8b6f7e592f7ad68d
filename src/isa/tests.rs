//! ISA 模块测试

use super::*;

#[test]
fn test_decode_addi() {
    let raw = 0x02A00093; // addi x1, x0, 42
    let d = decode(raw).unwrap();
    assert_eq!(d.class, OpcodeClass::OpImm);
    assert_eq!(d.rd, 1);
    assert_eq!(d.rs1, 0);
    assert_eq!(d.funct3, 0);
    assert_eq!(d.imm_i, 42);
}

#[test]
fn test_decode_addi_negative() {
    let raw = 0xFFF00113; // addi x2, x0, -1
    let d = decode(raw).unwrap();
    assert_eq!(d.rd, 2);
    assert_eq!(d.imm_i, -1);
}

#[test]
fn test_decode_add_sub() {
    let add = decode(0x002081B3).unwrap(); // add x3, x1, x2
    assert_eq!(add.class, OpcodeClass::Op);
    assert_eq!((add.rd, add.rs1, add.rs2), (3, 1, 2));
    assert!(!add.is_alternate());

    let sub = decode(0x402081B3).unwrap(); // sub x3, x1, x2
    assert!(sub.is_alternate());
    assert_eq!(sub.funct7, FUNCT7_ALT);
}

#[test]
fn test_decode_srai_keeps_funct7() {
    let d = decode(0x4030D093).unwrap(); // srai x1, x1, 3
    assert_eq!(d.class, OpcodeClass::OpImm);
    assert_eq!(d.funct3, AluOp::Shr as u32);
    assert!(d.is_alternate());
    assert_eq!(d.imm_i & 0x1F, 3);
}

#[test]
fn test_decode_all_immediates_present() {
    // 每条指令都计算全部五种立即数，由执行阶段挑选
    let d = decode(0x00208463).unwrap(); // beq x1, x2, 8
    assert_eq!(d.class, OpcodeClass::Branch);
    assert_eq!(d.imm_b, 8);
    assert_eq!(d.imm_i, imm_i(0x00208463));
    assert_eq!(d.imm_s, imm_s(0x00208463));
    assert_eq!(d.imm_u, imm_u(0x00208463));
    assert_eq!(d.imm_j, imm_j(0x00208463));
}

#[test]
fn test_decode_every_class() {
    let cases = [
        (0x123450B7, OpcodeClass::Lui),     // lui x1, 0x12345
        (0x00001097, OpcodeClass::Auipc),   // auipc x1, 1
        (0x00012183, OpcodeClass::Load),    // lw x3, 0(x2)
        (0x00112023, OpcodeClass::Store),   // sw x1, 0(x2)
        (0x00208463, OpcodeClass::Branch),  // beq x1, x2, 8
        (0x0040006F, OpcodeClass::Jal),     // jal x0, 4
        (0x000080E7, OpcodeClass::Jalr),    // jalr ra, 0(ra)
        (0x02A00093, OpcodeClass::OpImm),   // addi x1, x0, 42
        (0x002081B3, OpcodeClass::Op),      // add x3, x1, x2
        (0x0FF0000F, OpcodeClass::MiscMem), // fence
        (0x00000073, OpcodeClass::System),  // ecall
    ];
    for (raw, class) in cases {
        let d = decode(raw).unwrap();
        assert_eq!(d.class, class, "raw=0x{raw:08x}");
        assert_eq!(d.class.bits(), raw & 0x7F);
    }
}

#[test]
fn test_decode_unknown_opcode() {
    // 0x00000000 的 opcode 为 0
    assert_eq!(
        decode(0x0000_0000),
        Err(IsaError::UnknownOpcode { raw: 0, opcode: 0 })
    );
    // A 扩展的 AMO 指令（opcode 0x2F）不被支持
    let raw = 0x0000_202F;
    assert!(matches!(
        decode(raw),
        Err(IsaError::UnknownOpcode { opcode: 0x2F, .. })
    ));
}

#[test]
fn test_opcode_class_round_trip() {
    for class in OpcodeClass::ALL {
        assert_eq!(OpcodeClass::from_bits(class.bits()), Some(class));
    }
}

#[test]
fn test_load_store_widths() {
    let lbu = decode(0x00014183).unwrap(); // lbu x3, 0(x2)
    assert_eq!(lbu.load_width(), Ok(LoadWidth::ByteUnsigned));

    let sh = decode(0x00111023).unwrap(); // sh x1, 0(x2)
    assert_eq!(sh.store_width(), Ok(StoreWidth::Half));
    assert_eq!(StoreWidth::Half.bytes(), 2);

    // funct3 = 011 对 LOAD 与 STORE 都不合法
    let bad_load = decode(0x00013183).unwrap();
    assert_eq!(
        bad_load.load_width(),
        Err(IsaError::UnknownWidth {
            class: OpcodeClass::Load,
            funct3: 0b011
        })
    );
    let bad_store = decode(0x00113023).unwrap();
    assert!(bad_store.store_width().is_err());
}

#[test]
fn test_display() {
    let show = |raw: u32| decode(raw).unwrap().to_string();

    assert_eq!(show(0x02A00093), "addi ra, zero, 42");
    assert_eq!(show(0x402081B3), "sub gp, ra, sp");
    assert_eq!(show(0x4030D093), "srai ra, ra, 3");
    assert_eq!(show(0x00012183), "lw gp, 0(sp)");
    assert_eq!(show(0x00112423), "sw ra, 8(sp)");
    assert_eq!(show(0xFE314CE3), "blt sp, gp, -8");
    assert_eq!(show(0x123450B7), "lui ra, 0x12345");
    assert_eq!(show(0x00000073), "ecall");
    assert_eq!(show(0xC0001073), "csrrw zero, 0xc00, zero");
}

#[test]
fn test_abi_names() {
    assert_eq!(abi_name(0), "zero");
    assert_eq!(abi_name(3), "gp");
    assert_eq!(abi_name(13), "a3");
    assert_eq!(abi_name(31), "t6");
    assert_eq!(ABI_NAMES.len(), 32);
}

#[test]
fn test_error_messages() {
    assert_eq!(
        IsaError::UnknownOpcode { raw: 0x2F, opcode: 0x2F }.to_string(),
        "unknown opcode 0b0101111 in instruction 0x0000002f"
    );
    assert_eq!(
        IsaError::UnknownWidth { class: OpcodeClass::Store, funct3: 3 }.to_string(),
        "unknown STORE width selector 0b011"
    );
}
