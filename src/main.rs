use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use hotwatch::notify::Event;
use hotwatch::{
    blocking::{Flow, Hotwatch},
    EventKind,
};
use miette::{bail, IntoDiagnostic, Result};

use ls8::output::{self, Console};
use ls8::{loader, CallConvention, Config, Machine, UnknownOpcodePolicy};

/// Steps allowed per rerun while watching, so a looping program can't wedge the watcher.
const WATCH_MAX_STEPS: u64 = 1_000_000;

/// ls8 runs programs for the LS-8, a tiny 8-bit virtual CPU.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.ls8` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a text `.ls8` or raw `.bin` program and print its output
    Run {
        /// `.ls8` or `.bin` file to run
        name: PathBuf,
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Load a program without running it
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Place a watch on a program and rerun it on every change
    Watch {
        /// `.ls8` file to watch
        name: PathBuf,
    },
}

#[derive(clap::Args, Default)]
struct RunOpts {
    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long)]
    minimal: bool,
    /// Print machine state to stderr before every instruction
    #[arg(short, long)]
    trace: bool,
    /// Give up after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,
    /// How CALL and RET use the stack: `faithful` or `conventional`
    #[arg(long, default_value_t = CallConvention::Faithful)]
    call: CallConvention,
    /// Skip unknown opcodes instead of stopping
    #[arg(long)]
    lenient: bool,
}

impl RunOpts {
    fn config(&self) -> Config {
        Config {
            call: self.call,
            unknown_opcodes: if self.lenient {
                UnknownOpcodePolicy::Ignore
            } else {
                UnknownOpcodePolicy::Reject
            },
            max_steps: self.max_steps.or_else(ls8::env::max_steps),
        }
    }
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    ls8::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(ls8::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    match args.command {
        Some(Command::Run { name, opts }) => run(&name, &opts),
        Some(Command::Check { name }) => {
            file_message(Green, "Checking", &name);
            let image = loader::load_file(&name)?;
            message(Green, "Success", &format!("{} bytes loaded", image.len()));
            Ok(())
        }
        Some(Command::Watch { name }) => watch(name),
        None => match args.path {
            Some(path) => run(&path, &RunOpts::default()),
            None => {
                println!("\n~ ls8 v{VERSION} ~");
                println!("{SHORT_INFO}");
                Ok(())
            }
        },
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    if output::is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn run(name: &Path, opts: &RunOpts) -> Result<()> {
    output::set_minimal(opts.minimal);
    file_message(MsgColor::Green, "Loading", name);
    let image = loader::load_file(name)?;
    let mut machine = Machine::from_image(&image, opts.config()).into_diagnostic()?;

    message(MsgColor::Green, "Running", &format!("{} bytes", image.len()));
    let steps = if opts.trace || ls8::env::is_trace_enabled() {
        machine.run_with(&mut Console, |m| output::print_trace(&m.trace()))
    } else {
        machine.run(&mut Console)
    }
    .into_diagnostic()?;

    message(MsgColor::Cyan, "Halted", &format!("after {steps} steps"));
    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

fn watch(name: PathBuf) -> Result<()> {
    use MsgColor::*;
    if !name.exists() {
        bail!("File does not exist. Exiting...")
    }
    // Vim breaks if watching a single file
    let folder_path = match name.parent() {
        Some(pth) if pth.is_dir() => pth.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    // Clear screen and move cursor to top left
    print!("\x1B[2J\x1B[2;1H");
    file_message(Green, "Watching", &name);
    message(Cyan, "Help", "press CTRL+C to exit");

    let mut watcher =
        Hotwatch::new_with_custom_delay(Duration::from_millis(500)).into_diagnostic()?;

    watcher
        .watch(folder_path, move |event: Event| match event.kind {
            // Watch remove for vim changes
            EventKind::Modify(_) | EventKind::Remove(_) => {
                print!("\x1B[2J\x1B[2;1H");
                file_message(Green, "Watching", &name);
                message(Green, "Re-running", "file change detected");
                message(Cyan, "Help", "press CTRL+C to exit");

                sleep(Duration::from_millis(50));

                let opts = RunOpts {
                    max_steps: Some(WATCH_MAX_STEPS),
                    ..RunOpts::default()
                };
                if let Err(e) = run(&name, &opts) {
                    println!("\n{:?}", e);
                }
                Flow::Continue
            }
            _ => Flow::Continue,
        })
        .into_diagnostic()?;
    watcher.run();
    Ok(())
}

const SHORT_INFO: &str = r"
Welcome to ls8, an emulator for the LS-8 8-bit virtual CPU.
Please use `-h` or `--help` to access the usage instructions.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
