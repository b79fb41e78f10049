use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;

use xcalc::{ops, Calc, Value};

/// Symbolic command-line calculator with arbitrary precision.
#[derive(Parser)]
#[command(name = "x-calc", version, about)]
struct Args {
    /// Expression to evaluate; lists the known functions, constants,
    /// and operators when omitted
    expression: Vec<String>,

    /// Seed the `ans` constant with a number or a previous result
    #[arg(short, long, value_name = "VALUE")]
    ans: Option<String>,

    /// Maximum displayed length of the result
    #[arg(short, long, value_name = "N", default_value_t = 100)]
    precision: usize,

    /// Print per-phase evaluation traces
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("{}", format!("{:#}", err).red());
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    if args.precision == 0 {
        bail!("precision must be at least 1");
    }
    let expr = args.expression.join(" ");
    if expr.trim().is_empty() {
        print_tables();
        return Ok(());
    }
    let mut calc = Calc::new(args.precision).with_debug(args.debug);
    if let Some(seed) = &args.ans {
        let value = Value::from_result_str(seed)
            .with_context(|| format!("invalid --ans value '{}'", seed))?;
        calc.set_ans(value);
    }
    let outcome = calc.eval(&expr);
    for line in &calc.trace {
        println!("{}", line.dimmed());
    }
    let result = outcome?;
    println!("{} {}", "=".bold(), result);
    Ok(())
}

fn print_tables() {
    println!("{}", "Functions".bold());
    for aliases in ops::FUNCTION_ALIASES {
        println!("  {}", aliases.join(", "));
    }
    println!("{}", "Constants".bold());
    for aliases in ops::CONSTANT_ALIASES {
        println!("  {}", aliases.join(", "));
    }
    println!("{}", "Operators".bold());
    for (_, surfaces) in ops::OPERATOR_SURFACES {
        println!("  {}", surfaces.join(", "));
    }
}
