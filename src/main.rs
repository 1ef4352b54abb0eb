use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::{fs::read_to_string, process::ExitCode};

use ferrox::compiler::formatter::{
    BasicFormatter as BasicCompileFormatter, CompileErrorFormatter,
    PrettyFormatter as PrettyCompileFormatter,
};
use ferrox::compiler::Compiler;
use ferrox::machine::error::ExecutionError;
use ferrox::machine::formatter::{
    BasicFormatter as BasicRuntimeFormatter, PrettyFormatter as PrettyRuntimeFormatter,
    RuntimeErrorFormatter,
};
use ferrox::machine::{StdioContext, VirtualMachine};
use ferrox::string::StringHeap;

#[derive(Debug, Parser)]
#[clap(name = "ferrox", version, args_conflicts_with_subcommands = true)]
pub struct CLArgs {
    #[clap(subcommand)]
    pub routine: Option<FerroxCommand>,
    /// Script to run. Without one the interpreter starts as a REPL.
    pub script: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum FerroxCommand {
    /// Dump the token stream of a script.
    Tokenize {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "basic")]
        format: TokenFormat,
    },
    /// Compile a script and dump its bytecode.
    Disassemble {
        path: PathBuf,
    },
    /// Compile and run a script.
    Run {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "basic")]
        format: DiagnosticFormat,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum TokenFormat {
    Debug,
    Basic,
    Line,
    Pretty,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum DiagnosticFormat {
    Basic,
    Pretty,
}

fn main() -> ExitCode {
    ferrox_main().expect("Encountered an error!")
}

fn ferrox_main() -> Result<ExitCode> {
    color_eyre::install().expect("Can't fail at first call!");
    let args = match CLArgs::try_parse() {
        Ok(args) => args,
        Err(error) => {
            // --help and --version land here too; only real usage mistakes
            // exit with 64.
            error.print()?;
            return Ok(if error.use_stderr() {
                ExitCode::from(64)
            } else {
                ExitCode::SUCCESS
            });
        }
    };

    match args.routine {
        Some(FerroxCommand::Tokenize { path, format }) => {
            eprintln!("Tokenizing {:?}...", path);
            let src = read_to_string(&path)?;
            match tokenize(&src, &path, &format) {
                true => Ok(ExitCode::SUCCESS),
                false => Ok(ExitCode::from(65)),
            }
        }
        Some(FerroxCommand::Disassemble { path }) => {
            eprintln!("Disassembling {:?}...", path);
            let src = read_to_string(&path)?;
            match disassemble(&src, &path) {
                true => Ok(ExitCode::SUCCESS),
                false => Ok(ExitCode::from(65)),
            }
        }
        Some(FerroxCommand::Run { path, format }) => {
            let src = read_to_string(&path)?;
            Ok(run(&src, &path, &format))
        }
        None => match args.script {
            Some(path) => {
                let src = read_to_string(&path)?;
                Ok(run(&src, &path, &DiagnosticFormat::Basic))
            }
            None => repl(),
        },
    }
}

fn tokenize(src: &str, path: &Path, format: &TokenFormat) -> bool {
    use ferrox::lexer::formatter::{
        BasicFormatter, DebugFormatter, LineFormatter, PrettyFormatter, ToFormatter, TokenFormatter,
    };
    use ferrox::lexer::{Lexer, TokenKind};

    let mut scanner = Lexer::new(src, path);
    let formatter: Box<dyn TokenFormatter + '_> = match format {
        TokenFormat::Debug => Box::new(ToFormatter::<DebugFormatter>::create_formatter(&scanner)),
        TokenFormat::Basic => Box::new(ToFormatter::<BasicFormatter>::create_formatter(&scanner)),
        TokenFormat::Line => Box::new(ToFormatter::<LineFormatter>::create_formatter(&scanner)),
        TokenFormat::Pretty => Box::new(ToFormatter::<PrettyFormatter>::create_formatter(&scanner)),
    };
    let mut succeeded = true;
    loop {
        match scanner.next_token() {
            Ok(token) => {
                println!("{}", formatter.format(&token));
                if matches!(token.kind, TokenKind::Eof) {
                    return succeeded;
                }
            }
            Err(error) => {
                eprintln!("{}", formatter.format_lexical_error(&error));
                succeeded = false;
            }
        };
    }
}

fn disassemble(src: &str, path: &Path) -> bool {
    let mut heap = StringHeap::new();
    match Compiler::new(&chunk_name(path), src, &mut heap).compile() {
        Ok(chunk) => {
            println!("{}", chunk.disassemble(&heap));
            true
        }
        Err(errors) => {
            let formatter = BasicCompileFormatter::new(src);
            for error in &errors {
                eprintln!("{}", formatter.format(error));
            }
            false
        }
    }
}

fn run(src: &str, path: &Path, format: &DiagnosticFormat) -> ExitCode {
    let mut machine = VirtualMachine::new(StdioContext);
    match machine.interpret(&chunk_name(path), src) {
        Ok(()) => ExitCode::SUCCESS,
        Err(ExecutionError::Compile(errors)) => {
            let formatter: Box<dyn CompileErrorFormatter + '_> = match format {
                DiagnosticFormat::Basic => Box::new(BasicCompileFormatter::new(src)),
                DiagnosticFormat::Pretty => Box::new(PrettyCompileFormatter::new(src, path)),
            };
            for error in &errors {
                eprintln!("{}", formatter.format(error));
            }
            ExitCode::from(65)
        }
        Err(ExecutionError::Runtime(error)) => {
            let formatter: Box<dyn RuntimeErrorFormatter + '_> = match format {
                DiagnosticFormat::Basic => Box::new(BasicRuntimeFormatter::new(src)),
                DiagnosticFormat::Pretty => Box::new(PrettyRuntimeFormatter::new(src, path)),
            };
            eprintln!("{}", formatter.format(&error));
            ExitCode::from(70)
        }
    }
}

fn repl() -> Result<ExitCode> {
    let mut machine = VirtualMachine::new(StdioContext);
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }

        // Errors are reported and the session continues.
        match machine.interpret("repl", &line) {
            Ok(()) => {}
            Err(ExecutionError::Compile(errors)) => {
                let formatter = BasicCompileFormatter::new(&line);
                for error in &errors {
                    eprintln!("{}", formatter.format(error));
                }
            }
            Err(ExecutionError::Runtime(error)) => {
                let formatter = BasicRuntimeFormatter::new(&line);
                eprintln!("{}", formatter.format(&error));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn chunk_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("script"))
}
