//! subc-drv - Compiler Driver
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! The driver owns the pipeline. It parses the command line, reads the
//! input, runs the phases in order, decides where to stop, and renders
//! every accumulated diagnostic at the end:
//!
//! ```text
//! source -> [lex] -> tokens -> [parse] -> AST -> [sem] -> HIR
//!        -> [ir] -> IR (-> [fold] at -O1+) -> [gen] -> assembly
//!        -> cc -> executable
//! ```
//!
//! The front-end phases (lexer, parser, semantic analysis) accumulate
//! diagnostics and always run to completion, so one invocation shows
//! as many errors as possible. After semantic analysis the driver
//! checks the handler: any error stops the build before lowering. IR
//! generation and emission fail fast; an error there is a compiler
//! bug, not a user mistake.
//!
//! ============================================================================
//! COMMAND LINE
//! ============================================================================
//!
//! ```text
//! subc <input.sb> [-o <output>] [-S] [-emit-ir] [-O<0|1|2|3>] [-v]
//!
//!   -o <file>   output name (default a.out; with -S, <input>.s)
//!   -S          stop after assembly emission, write the .s file
//!   -emit-ir    print the IR module to stdout and exit
//!   -O<n>       optimization level; constant folding at 1 and above
//!   -v          phase-by-phase progress on stderr
//! ```
//!
//! Exit code 0 on success, 1 on any failed phase or I/O error.
//! Warnings never fail the build.

use std::fmt;
use std::path::{Path, PathBuf};

use subc_util::{Handler, SourceMap};

/// What the driver should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitKind {
    /// Assemble and link to an executable (the default)
    #[default]
    Executable,
    /// Stop after assembly emission
    Asm,
    /// Print the IR module and exit
    Ir,
}

/// Compiler configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Input source file
    pub input: PathBuf,

    /// Output path (None for the default)
    pub output: Option<PathBuf>,

    /// What to produce
    pub emit: EmitKind,

    /// Optimization level 0..=3; levels are semantically identical
    pub opt_level: u8,

    /// Phase-by-phase progress on stderr
    pub verbose: bool,
}

impl Config {
    pub const USAGE: &'static str =
        "usage: subc <input.sb> [-o <output>] [-S] [-emit-ir] [-O<0|1|2|3>] [-v]";

    /// Parse a command line (without the program name)
    pub fn parse_args<I>(args: I) -> Result<Config, CompileError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut input: Option<PathBuf> = None;
        let mut output = None;
        let mut emit = EmitKind::Executable;
        let mut opt_level = 0u8;
        let mut verbose = false;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-o" => match args.next() {
                    Some(path) => output = Some(PathBuf::from(path)),
                    None => {
                        return Err(CompileError::InvalidArguments(
                            "`-o` needs a file name".to_string(),
                        ))
                    }
                },
                "-S" => emit = EmitKind::Asm,
                "-emit-ir" => emit = EmitKind::Ir,
                "-O0" => opt_level = 0,
                "-O1" => opt_level = 1,
                "-O2" => opt_level = 2,
                "-O3" => opt_level = 3,
                "-v" => verbose = true,
                flag if flag.starts_with('-') => {
                    return Err(CompileError::InvalidArguments(format!(
                        "unknown flag `{}`",
                        flag
                    )))
                }
                path => {
                    if input.is_some() {
                        return Err(CompileError::InvalidArguments(
                            "more than one input file".to_string(),
                        ));
                    }
                    input = Some(PathBuf::from(path));
                }
            }
        }

        let Some(input) = input else {
            return Err(CompileError::InvalidArguments("no input file".to_string()));
        };

        Ok(Config {
            input,
            output,
            emit,
            opt_level,
            verbose,
        })
    }

    /// The effective output path for the configured emit kind
    pub fn output_path(&self) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        match self.emit {
            EmitKind::Asm => self.input.with_extension("s"),
            _ => PathBuf::from("a.out"),
        }
    }
}

/// Compilation session: one input, one diagnostics sink
///
/// Every compilation gets a fresh session, so concurrent or repeated
/// compilations never share state.
pub struct Session {
    pub config: Config,
    pub sources: SourceMap,
    pub handler: Handler,
    diagnostics_printed: bool,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sources: SourceMap::new(),
            handler: Handler::new(),
            diagnostics_printed: false,
        }
    }

    /// Run the pipeline according to the configuration
    pub fn compile(&mut self) -> Result<(), CompileError> {
        let input = self.config.input.clone();
        let content = std::fs::read_to_string(&input).map_err(|source| CompileError::Io {
            path: input.display().to_string(),
            source,
        })?;
        let file_id = self
            .sources
            .add_file(input.display().to_string(), content.clone());

        self.progress("lexing");
        let tokens = subc_lex::tokenize(&content, file_id, &self.handler);

        self.progress("parsing");
        let ast = subc_par::Parser::new(tokens, &self.handler).parse();

        self.progress("semantic analysis");
        let program = subc_sem::analyze(&ast, &self.handler);

        if self.handler.has_errors() {
            return Err(self.fail());
        }

        self.progress("generating ir");
        let Some(mut module) = subc_ir::lower(&program, &self.handler) else {
            return Err(self.fail());
        };

        if self.config.opt_level >= 1 {
            self.progress("constant folding");
            subc_ir::opt::fold_constants(&mut module);
        }

        if self.config.emit == EmitKind::Ir {
            self.print_diagnostics();
            print!("{}", module);
            return Ok(());
        }

        self.progress("emitting assembly");
        let asm = subc_gen::emit(&module)?;

        match self.config.emit {
            EmitKind::Asm => {
                let path = self.config.output_path();
                write_file(&path, &asm)?;
            }
            EmitKind::Executable => {
                if !subc_gen::have_cc() {
                    return Err(CompileError::Emit(subc_gen::EmitError::Toolchain {
                        tool: "cc".to_string(),
                        message: "not found on PATH".to_string(),
                    }));
                }
                let output = self.config.output_path();
                let asm_path =
                    std::env::temp_dir().join(format!("subc-{}.s", std::process::id()));
                write_file(&asm_path, &asm)?;
                self.progress("assembling and linking");
                let linked = subc_gen::assemble_and_link(&asm_path, &output);
                let _ = std::fs::remove_file(&asm_path);
                linked?;
            }
            EmitKind::Ir => unreachable!("handled above"),
        }

        self.print_diagnostics();
        Ok(())
    }

    /// Render every accumulated diagnostic plus the summary line
    pub fn print_diagnostics(&mut self) {
        if self.diagnostics_printed {
            return;
        }
        self.diagnostics_printed = true;

        for diagnostic in self.handler.diagnostics() {
            let name = self
                .sources
                .get(diagnostic.span.file_id)
                .map(|file| file.name().to_string())
                .unwrap_or_else(|| self.config.input.display().to_string());
            eprintln!("{}", diagnostic.render(&name));
            for note in &diagnostic.notes {
                eprintln!("  note: {}", note);
            }
            for help in &diagnostic.helps {
                eprintln!("  help: {}", help);
            }
        }

        let errors = self.handler.error_count();
        let warnings = self.handler.warning_count();
        if errors > 0 || warnings > 0 {
            eprintln!("{} error(s), {} warning(s)", errors, warnings);
        }
    }

    fn fail(&mut self) -> CompileError {
        self.print_diagnostics();
        CompileError::CompilationFailed {
            errors: self.handler.error_count(),
        }
    }

    fn progress(&self, phase: &str) {
        if self.config.verbose {
            eprintln!("subc: {}", phase);
        }
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), CompileError> {
    std::fs::write(path, content).map_err(|source| CompileError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Driver entry point used by the binary
pub fn run<I>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = String>,
{
    let config = Config::parse_args(args)?;
    let mut session = Session::new(config);
    session.compile()?;
    session.print_diagnostics();
    Ok(())
}

/// Driver-level errors
#[derive(Debug)]
pub enum CompileError {
    /// Bad command line
    InvalidArguments(String),
    /// Reading the input or writing the output failed
    Io {
        path: String,
        source: std::io::Error,
    },
    /// One or more diagnostics at the error level
    CompilationFailed { errors: usize },
    /// Emission or toolchain failure
    Emit(subc_gen::EmitError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::InvalidArguments(message) => {
                write!(f, "{}\n{}", message, Config::USAGE)
            }
            CompileError::Io { path, source } => write!(f, "{}: {}", path, source),
            CompileError::CompilationFailed { errors } => {
                write!(f, "compilation failed with {} error(s)", errors)
            }
            CompileError::Emit(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Io { source, .. } => Some(source),
            CompileError::Emit(error) => Some(error),
            _ => None,
        }
    }
}

impl From<subc_gen::EmitError> for CompileError {
    fn from(error: subc_gen::EmitError) -> Self {
        CompileError::Emit(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, CompileError> {
        Config::parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_minimal() {
        let config = parse(&["prog.sb"]).unwrap();
        assert_eq!(config.input, PathBuf::from("prog.sb"));
        assert_eq!(config.emit, EmitKind::Executable);
        assert_eq!(config.opt_level, 0);
        assert!(!config.verbose);
        assert_eq!(config.output_path(), PathBuf::from("a.out"));
    }

    #[test]
    fn test_parse_all_flags() {
        let config = parse(&["-v", "prog.sb", "-O2", "-o", "out"]).unwrap();
        assert!(config.verbose);
        assert_eq!(config.opt_level, 2);
        assert_eq!(config.output_path(), PathBuf::from("out"));
    }

    #[test]
    fn test_emit_kinds() {
        assert_eq!(parse(&["p.sb", "-S"]).unwrap().emit, EmitKind::Asm);
        assert_eq!(parse(&["p.sb", "-emit-ir"]).unwrap().emit, EmitKind::Ir);
    }

    #[test]
    fn test_default_asm_output_follows_input() {
        let config = parse(&["dir/prog.sb", "-S"]).unwrap();
        assert_eq!(config.output_path(), PathBuf::from("dir/prog.s"));
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["-x", "p.sb"]).is_err());
        assert!(parse(&["a.sb", "b.sb"]).is_err());
        assert!(parse(&["p.sb", "-o"]).is_err());
    }

    #[test]
    fn test_error_display_includes_usage() {
        let error = parse(&[]).unwrap_err();
        assert!(error.to_string().contains("usage: subc"));
    }
}
