use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use vrex::{Builder, Pattern};

#[derive(Parser)]
#[command(name = "vrex")]
#[command(about = "Vrex - A compiler from verbose patterns to regular expressions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test a pattern against input
    Test {
        /// The pattern source
        pattern: String,
        /// The input string to test
        input: String,
        /// Show capture groups
        #[arg(short, long)]
        verbose: bool,
        #[command(flatten)]
        flags: FlagArgs,
    },
    /// Convert a pattern to a regular expression
    Convert {
        /// The pattern to convert
        pattern: String,
        /// Show tokens and syntax tree
        #[arg(short, long)]
        debug: bool,
        #[command(flatten)]
        flags: FlagArgs,
    },
    /// Find all matches in input
    Find {
        /// The pattern source
        pattern: String,
        /// The input string
        input: String,
        #[command(flatten)]
        flags: FlagArgs,
    },
    /// Check if pattern matches
    Match {
        /// The pattern source
        pattern: String,
        /// The input string
        input: String,
        #[command(flatten)]
        flags: FlagArgs,
    },
}

/// Base flags, applied before the pattern's own `<...>` declarations
#[derive(Args)]
struct FlagArgs {
    /// Match case-insensitively
    #[arg(short, long)]
    ignore_case: bool,
    /// Stop at the first match (no `g` flag)
    #[arg(short, long)]
    first: bool,
    /// Report match indices (`d` flag)
    #[arg(long)]
    indices: bool,
    /// Only match at the current position (`y` flag)
    #[arg(long)]
    sticky: bool,
    /// Drop unicode mode
    #[arg(long, conflicts_with = "unicode_sets")]
    legacy: bool,
    /// Use unicode sets mode (`v` flag)
    #[arg(long)]
    unicode_sets: bool,
}

impl FlagArgs {
    fn builder(&self) -> Builder {
        let mut builder = Builder::new();
        if self.ignore_case {
            builder = builder.ignore_case();
        }
        if self.first {
            builder = builder.first();
        }
        if self.indices {
            builder = builder.indices();
        }
        if self.sticky {
            builder = builder.sticky();
        }
        if self.legacy {
            builder = builder.legacy();
        }
        if self.unicode_sets {
            builder = builder.unicode();
        }
        builder
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Test {
            pattern,
            input,
            verbose,
            flags,
        } => cmd_test(&flags, &pattern, &input, verbose),
        Commands::Convert {
            pattern,
            debug,
            flags,
        } => cmd_convert(&flags, &pattern, debug),
        Commands::Find {
            pattern,
            input,
            flags,
        } => cmd_find(&flags, &pattern, &input),
        Commands::Match {
            pattern,
            input,
            flags,
        } => cmd_match(&flags, &pattern, &input),
    }
}

fn fail(error: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), error);
    std::process::exit(1);
}

fn compile(flags: &FlagArgs, source: &str) -> Pattern {
    match flags.builder().compile(source) {
        Ok(pattern) => pattern,
        Err(e) => fail(e),
    }
}

fn cmd_test(flags: &FlagArgs, source: &str, input: &str, verbose: bool) {
    println!("{}", "Testing pattern...".bold());
    println!("  Pattern: {}", source.cyan());
    println!("  Input:   {}", input.yellow());
    println!();

    let pattern = compile(flags, source);
    println!("  Regex:   {}", pattern.to_string().cyan());
    println!();

    let found = match pattern.find(input) {
        Ok(found) => found,
        Err(e) => fail(e),
    };

    if let Some(m) = found {
        println!("{}", "✓ Match found!".green().bold());
        println!("  Position: {}..{}", m.start, m.end);
        println!("  Match:    {}", m.text.green());

        if verbose && !m.groups.is_empty() {
            println!();
            println!("{}", "Capture groups:".bold());
            for (idx, group) in m.groups.iter().enumerate() {
                let name = pattern
                    .groups()
                    .name_of(idx as u32 + 1)
                    .map(|name| format!(" ({})", name))
                    .unwrap_or_default();
                match group {
                    Some(text) => println!("  Group {}{}: {}", idx + 1, name, text.green()),
                    None => println!("  Group {}{}: {}", idx + 1, name, "unmatched".dimmed()),
                }
            }
        }
    } else {
        println!("{}", "✗ No match".red());
    }
}

fn cmd_convert(flags: &FlagArgs, source: &str, debug: bool) {
    println!("{}", "Converting pattern...".bold());
    println!("  Input:  {}", source.cyan());
    println!();

    if debug {
        match flags.builder().compile_debug(source) {
            Ok(result) => {
                result.report();
            }
            Err(e) => fail(e),
        }
    } else {
        let pattern = compile(flags, source);
        println!("{}", "Output:".bold());
        println!("  {}", pattern.to_string().green());
    }
}

fn cmd_find(flags: &FlagArgs, source: &str, input: &str) {
    let pattern = compile(flags, source);

    let matches = match pattern.find_all(input) {
        Ok(matches) => matches,
        Err(e) => fail(e),
    };

    if matches.is_empty() {
        println!("{}", "No matches found".red());
    } else {
        println!(
            "{} {}",
            "Found".bold(),
            format!("{} match(es)", matches.len()).green()
        );
        println!();

        for (i, m) in matches.iter().enumerate() {
            println!("  [{}] {}..{} = {}", i + 1, m.start, m.end, m.text.green());
        }
    }
}

fn cmd_match(flags: &FlagArgs, source: &str, input: &str) {
    let pattern = compile(flags, source);

    match pattern.is_match(input) {
        Ok(true) => {
            println!("{}", "true".green());
            std::process::exit(0);
        }
        Ok(false) => {
            println!("{}", "false".red());
            std::process::exit(1);
        }
        Err(e) => fail(e),
    }
}
