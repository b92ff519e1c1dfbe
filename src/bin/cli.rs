use clap::Parser;
use colored::Colorize;
use evalexpr_symdiff::{evaluate, Equation};
use log::{Level, LevelFilter, Metadata, Record};
use std::process;

#[derive(Parser)]
#[command(name = "symdiff")]
#[command(about = "Differentiate mathematical expressions symbolically")]
#[command(version)]
struct Args {
    /// Mathematical expression to differentiate
    expression: String,

    /// Variable to differentiate with respect to (defaults to the first one)
    #[arg(long)]
    wrt: Option<String>,

    /// Order of the derivative
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    order: i64,

    /// Point to evaluate at, one value per variable in alphabetical order
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    at: Option<Vec<f64>>,

    /// Also print the gradient at the point
    #[arg(long)]
    gradient: bool,

    /// Also print the Hessian at the point
    #[arg(long)]
    hessian: bool,

    /// Log differentiation and evaluation requests to stderr
    #[arg(long)]
    verbose: bool,
}

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Trace
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "ERROR".red(),
            Level::Warn => "WARN".yellow(),
            Level::Info => "INFO".green(),
            Level::Debug => "DEBUG".blue(),
            Level::Trace => "TRACE".dimmed(),
        };
        eprintln!("{} {}: {}", level, record.target().dimmed(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() {
    let args = Args::parse();

    if args.verbose {
        if let Err(e) = log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Trace)) {
            eprintln!("Error: {}", e);
        }
    }

    if let Err(e) = run(&args) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let equation = Equation::new(args.expression.clone())?;

    let wrt = match &args.wrt {
        Some(name) => name.clone(),
        None => equation
            .sorted_variables()
            .first()
            .cloned()
            .ok_or("expression has no variables to differentiate with respect to")?,
    };

    let derivative = equation.nth_derivative(&wrt, args.order)?;

    println!("{} {}", "Function:".bold(), equation.function());
    println!("{} {}", format!("d^{}/d{}^{}:", args.order, wrt, args.order).bold(), derivative);

    let Some(point) = &args.at else {
        return Ok(());
    };

    println!("{} {}", "Value:".bold(), equation.eval(point)?);
    let slope = evaluate(&derivative, point)?.into_scalar()?;
    println!("{} {}", "Derivative:".bold(), slope);

    if args.gradient {
        println!("{} {:?}", "Gradient:".bold(), equation.gradient(point)?);
    }
    if args.hessian {
        println!("{}", "Hessian:".bold());
        for row in equation.hessian(point)? {
            println!("  {:?}", row);
        }
    }

    Ok(())
}
