//! rv32i_sim 命令行入口
//!
//! 运行单个 ELF，或按前缀运行整个 riscv-tests 目录。任何程序失败时以非零状态退出。

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing_subscriber::{fmt, EnvFilter};

use rv32i_sim::memory::{DEFAULT_MEM_BASE, DEFAULT_MEM_SIZE};
use rv32i_sim::sim_env::{CaseReport, SimConfig, SimEnv, SuiteReport};

#[derive(Parser, Debug)]
#[command(name = "rv32i_sim_cli")]
#[command(about = "Functional RV32I simulator for riscv-tests binaries", long_about = None)]
struct Args {
    /// Directory holding the test binaries
    #[arg(long, default_value = "riscv-tests/isa")]
    dir: PathBuf,

    /// File name prefix of the tests to run
    #[arg(long, default_value = "rv32ui-p")]
    prefix: String,

    /// Only run tests whose name contains this string
    #[arg(long)]
    filter: Option<String>,

    /// Run a single ELF instead of the suite
    #[arg(long)]
    elf: Option<PathBuf>,

    /// Instruction cap per program
    #[arg(long, default_value_t = 2_000_000)]
    max_instructions: u64,

    /// Memory base address (accepts 0x prefix)
    #[arg(long, value_parser = parse_u32, default_value_t = DEFAULT_MEM_BASE)]
    mem_base: u32,

    /// Memory size in bytes
    #[arg(long, default_value_t = DEFAULT_MEM_SIZE)]
    mem_size: usize,

    /// Trace every retired instruction
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{s}': {e}"))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "trace" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn print_case(case: &CaseReport) {
    match &case.failure {
        None => println!(
            "[RUN] {} ... PASS ({} instr, {:?})",
            case.name, case.retired, case.elapsed
        ),
        Some(reason) => println!("[RUN] {} ... FAIL: {reason}", case.name),
    }
}

fn print_summary(report: &SuiteReport) {
    println!(
        "\nSummary: {} passed / {} failed",
        report.passed().count(),
        report.failed().count()
    );
    if !report.is_success() {
        println!("Failed cases:");
        for case in report.failed() {
            println!("  {}: {}", case.name, case.failure.as_deref().unwrap_or_default());
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = SimConfig::new()
        .with_memory_base(args.mem_base)
        .with_memory_size(args.mem_size)
        .with_entry_pc(args.mem_base)
        .with_max_instructions(args.max_instructions)
        .with_test_dir(&args.dir)
        .with_prefix(args.prefix.as_str())
        .with_filter(args.filter.clone());
    let mut env = SimEnv::new(config);

    let report = match &args.elf {
        Some(path) => SuiteReport {
            cases: vec![env.run_case(path)],
        },
        None => {
            if !args.dir.exists() {
                return Err(format!("{} does not exist", args.dir.display()).into());
            }
            env.run_suite()?
        }
    };

    for case in &report.cases {
        print_case(case);
    }
    print_summary(&report);

    if !report.is_success() {
        return Err("some programs failed".into());
    }
    Ok(())
}
