//! Instruction parsing and classification.

use pretty_assertions::assert_eq;
use rstest::rstest;
use sspsim_core::common::ParseError;
use sspsim_core::isa::{Category, InstId, Instruction, Opcode, Operand, Reg, UnitKind};

fn parse(text: &str) -> Instruction {
    Instruction::from_asm(InstId(0), 0, text).unwrap()
}

#[rstest]
#[case("ADD $t0, $t1, $t2", Opcode::Add, UnitKind::Alu, Category::Arithmetic)]
#[case("andi $s0 $s1 0xff", Opcode::Andi, UnitKind::Alu, Category::Logical)]
#[case("LW $t0, 8($sp)", Opcode::Lw, UnitKind::Lsu, Category::Memory)]
#[case("SB $t0, ($a0)", Opcode::Sb, UnitKind::Lsu, Category::Memory)]
#[case("BLT $t0, $t1, -2", Opcode::Blt, UnitKind::Alu, Category::Branch)]
#[case("JAL 40", Opcode::Jal, UnitKind::Alu, Category::Jump)]
#[case("FMUL $f2, $f4, $f6", Opcode::Fmul, UnitKind::Fpu, Category::Float)]
fn test_classification(
    #[case] text: &str,
    #[case] opcode: Opcode,
    #[case] unit: UnitKind,
    #[case] category: Category,
) {
    let inst = parse(text);
    assert_eq!(inst.opcode, opcode);
    assert_eq!(inst.unit_kind(), unit);
    assert_eq!(inst.category(), category);
}

#[test]
fn test_sources_and_destination() {
    let add = parse("ADD $t0, $t1, $t2");
    assert_eq!(add.destination(), Reg::parse("$t0").ok());
    assert_eq!(add.sources(), vec![Reg::Int(9), Reg::Int(10)]);

    let store = parse("SW $t3, -4($sp)");
    assert_eq!(store.destination(), None);
    assert!(store.sources().contains(&Reg::Int(11)));
    assert!(store.sources().contains(&Reg::Int(29)));
    assert_eq!(
        store.operands[1],
        Operand::Mem {
            offset: -4,
            base: Reg::Int(29)
        }
    );

    let branch = parse("BNE $t0, $zero, 3");
    assert_eq!(branch.destination(), None);

    let link = parse("JAL 16");
    assert_eq!(link.destination(), Some(Reg::RA));
}

#[test]
fn test_static_targets() {
    let branch = Instruction::from_asm(InstId(1), 8, "BEQ $t0, $t1, -2").unwrap();
    assert_eq!(branch.static_target(), Some(4));
    assert_eq!(branch.fallthrough(), 12);

    let jump = Instruction::from_asm(InstId(2), 8, "J 64").unwrap();
    assert_eq!(jump.static_target(), Some(64));

    let indirect = Instruction::from_asm(InstId(3), 8, "JR $ra").unwrap();
    assert_eq!(indirect.static_target(), None);
}

#[rstest]
#[case("$zero", Reg::Int(0))]
#[case("$0", Reg::Int(0))]
#[case("r31", Reg::Int(31))]
#[case("$s8", Reg::Int(30))]
#[case("$F3", Reg::Float(3))]
#[case("12", Reg::Int(12))]
fn test_register_aliases(#[case] name: &str, #[case] expected: Reg) {
    assert_eq!(Reg::parse(name).unwrap(), expected);
}

#[rstest]
#[case("$t10")]
#[case("$f32")]
#[case("x1")]
#[case("")]
fn test_bad_register_names(#[case] name: &str) {
    assert!(Reg::parse(name).is_err());
}

#[test]
fn test_parse_errors() {
    let unknown = Instruction::from_asm(InstId(0), 0, "FROB $t0").unwrap_err();
    assert!(matches!(unknown, ParseError::UnknownOpcode { ref mnemonic, .. } if mnemonic == "FROB"));

    let count = Instruction::from_asm(InstId(0), 0, "ADD $t0, $t1").unwrap_err();
    assert!(matches!(
        count,
        ParseError::OperandCount {
            opcode: Opcode::Add,
            expected: 3,
            found: 2,
            ..
        }
    ));

    let operand = Instruction::from_asm(InstId(0), 0, "ADDI $t0, $t1, ten").unwrap_err();
    assert!(matches!(operand, ParseError::InvalidOperand { .. }));

    let register = Instruction::from_asm(InstId(0), 0, "ADD $t0, $q1, $t2").unwrap_err();
    assert!(matches!(register, ParseError::InvalidRegister { .. }));
}

#[test]
fn test_display_round_trips_through_parser() {
    let inst = parse("sw $t0 12($sp)");
    let again = parse(&inst.to_string());
    assert_eq!(again.opcode, inst.opcode);
    assert_eq!(again.operands, inst.operands);
}
