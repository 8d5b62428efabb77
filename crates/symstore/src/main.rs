use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use symstore_core::prelude::*;
use symstore_utils::{info, init_logging, init_logging_with_level, LogFormat, LogLevel};

/// Inspect the CodeView symbol information embedded in a PE image.
#[derive(Parser, Debug)]
#[command(name = "symstore")]
#[command(version)]
#[command(about = "Inspect CodeView symbol information embedded in PE images", long_about = None)]
struct Cli
{
    /// Log level, overriding RUST_LOG (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// List the image's sections as the address map sees them
    Sections
    {
        /// Path to the PE image
        image: PathBuf,
    },
    /// List compilands with their segment and source file counts
    Compilands
    {
        /// Path to the PE image
        image: PathBuf,
    },
    /// List the symbols of one hashed symbol heap
    Symbols
    {
        /// Path to the PE image
        image: PathBuf,
        /// Heap to enumerate
        #[arg(long, value_enum, default_value_t = Heap::Global)]
        heap: Heap,
    },
    /// List the global type table
    Types
    {
        /// Path to the PE image
        image: PathBuf,
    },
    /// Resolve an RVA to its function, enclosing blocks and source line
    Lookup
    {
        /// Path to the PE image
        image: PathBuf,
        /// Relative virtual address (hex format: 0x1000 or decimal)
        #[arg(value_parser = parse_number)]
        rva: u32,
    },
    /// Find the code generated for a source line
    Lines
    {
        /// Path to the PE image
        image: PathBuf,
        /// Source file name, matched as a path suffix
        file: String,
        /// Source line number
        line: u16,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Heap
{
    Global,
    Static,
    Public,
}

impl From<Heap> for SymbolHeapId
{
    fn from(heap: Heap) -> Self
    {
        match heap {
            Heap::Global => SymbolHeapId::Global,
            Heap::Static => SymbolHeapId::Static,
            Heap::Public => SymbolHeapId::Public,
        }
    }
}

fn main()
{
    let cli = Cli::parse();

    // An explicit --log-level wins; otherwise RUST_LOG and SYMSTORE_LOG_FORMAT apply
    let logging = match cli.log_level {
        Some(level) => init_logging_with_level(level, LogFormat::Pretty),
        None => init_logging(),
    };
    if let Err(e) = logging {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(1);
    }

    if let Err(e) = run_command(cli.command) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Commands) -> SymbolResult<()>
{
    match command {
        Commands::Sections { image } => print_sections(&load(&image)?),
        Commands::Compilands { image } => print_compilands(&load(&image)?),
        Commands::Symbols { image, heap } => print_symbols(&load(&image)?, heap.into()),
        Commands::Types { image } => print_types(&load(&image)?),
        Commands::Lookup { image, rva } => print_lookup(&load(&image)?, rva),
        Commands::Lines { image, file, line } => print_lines(&load(&image)?, &file, line),
    }
}

fn load(image: &Path) -> SymbolResult<DataSource<CodeViewStore>>
{
    info!("Loading debug information from {}", image.display());
    DataSource::load_image(image)
}

fn print_sections(source: &DataSource<CodeViewStore>) -> SymbolResult<()>
{
    println!("{:>3}  {:<8}  {:>10}  {:>10}", "#", "name", "rva", "size");
    for (index, section) in source.address_map().sections().enumerate() {
        println!(
            "{:>3}  {:<8}  {:#010x}  {:#010x}",
            index + 1,
            lossy(section.trimmed_name()),
            section.rva,
            section.size
        );
    }
    Ok(())
}

fn print_compilands(source: &DataSource<CodeViewStore>) -> SymbolResult<()>
{
    let store = source.store();
    let count = store.compiland_count()?;
    println!("{count} compilands");

    for index in 1..=count {
        let compiland = store.compiland_info(index)?;
        println!(
            "{index:>5}  {}  ({} segments, {} files)",
            lossy(&compiland.name),
            compiland.segment_count,
            compiland.file_count
        );
        for file in 0..compiland.file_count {
            let file_info = store.file_info(index, file)?;
            println!("         {}", lossy(&file_info.name));
        }
    }
    Ok(())
}

fn print_symbols(source: &DataSource<CodeViewStore>, heap: SymbolHeapId) -> SymbolResult<()>
{
    let session = source.open_session();
    let store = session.store();
    let mut scope = store.set_symbol_scope(heap)?;

    let mut count = 0usize;
    while let Some(handle) = store.next_symbol(&mut scope) {
        let info = store.symbol_info(handle)?;
        let location = match (info.address_segment(), info.address_offset()) {
            (Some(segment), Some(offset)) => format!("{segment:04x}:{offset:08x}"),
            _ => " ".repeat(13),
        };
        let name = session.display_name(handle).unwrap_or_else(|_| lossy(info.name().unwrap_or_default()));
        println!("{location}  {:<14}  {name}", format!("{:?}", info.sym_tag()));
        count += 1;
    }
    store.end_symbol_scope(scope);

    println!("{count} symbols in the {heap} heap");
    Ok(())
}

fn print_types(source: &DataSource<CodeViewStore>) -> SymbolResult<()>
{
    let store = source.store();
    let mut scope = store.set_global_type_scope()?;

    let mut count = 0usize;
    while let Some(handle) = store.next_type(&mut scope) {
        let info = store.type_info(handle)?;
        let size = info.length().map(|len| format!("{len:>6}")).unwrap_or_else(|| " ".repeat(6));
        println!(
            "{:<14}  {size}  {}",
            format!("{:?}", info.sym_tag()),
            lossy(info.name().unwrap_or_default())
        );
        count += 1;
    }
    store.end_type_scope(scope);

    println!("{count} types");
    Ok(())
}

fn print_lookup(source: &DataSource<CodeViewStore>, rva: u32) -> SymbolResult<()>
{
    let Some(location) = source.address_map().segment_offset(rva) else {
        return Err(SymbolError::NotFound(format!("no section contains rva {rva:#x}")));
    };
    println!("{rva:#010x} = {location}");

    let mut session = source.open_session();
    let SegmentOffset { segment, offset } = location;

    match session.find_outer_symbol_by_addr(SymbolHeapId::Global, segment, offset) {
        Ok((function, delta)) => {
            println!("function  {} + {delta:#x}", session.display_name(function)?);
            for block in session.find_innermost_symbol(function, segment, offset)?.into_iter().skip(1) {
                let info = session.symbol_info(block)?;
                println!(
                    "  in {:?} at {:08x}, {:#x} bytes",
                    info.sym_tag(),
                    info.address_offset().unwrap_or_default(),
                    info.length().unwrap_or_default()
                );
            }
        }
        Err(e) if e.is_not_found() => {
            let (public, delta) = session.find_outer_symbol_by_addr(SymbolHeapId::Public, segment, offset)?;
            println!("public    {} + {delta:#x}", session.display_name(public)?);
        }
        Err(e) => return Err(e),
    }

    if let Some(line) = session.find_line(segment, offset) {
        let file = session.store().file_info(line.compiland_index, line.file_index)?;
        println!("line      {}:{}", lossy(&file.name), line.number);
    }
    Ok(())
}

fn print_lines(source: &DataSource<CodeViewStore>, file: &str, line: u16) -> SymbolResult<()>
{
    let session = source.open_session();
    let lines = session.find_lines(false, file.as_bytes(), line, line);
    if lines.is_empty() {
        return Err(SymbolError::NotFound(format!("no code for {file}:{line}")));
    }

    for found in lines {
        let compiland = session.compiland_info(found.compiland_index)?;
        let rva = session.rva_from_sec_offset(found.section, found.offset).unwrap_or_default();
        println!(
            "{}  line {}  {:04x}:{:08x}  rva {rva:#010x}  {:#x} bytes",
            lossy(&compiland.name),
            found.number,
            found.section,
            found.offset,
            found.length
        );
    }
    Ok(())
}

fn lossy(bytes: &[u8]) -> String
{
    String::from_utf8_lossy(bytes).into_owned()
}

fn parse_number(s: &str) -> Result<u32, String>
{
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{s}': {e}"))
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_parse_number()
    {
        assert_eq!(parse_number("0x1110"), Ok(0x1110));
        assert_eq!(parse_number("0XFF"), Ok(0xff));
        assert_eq!(parse_number("4096"), Ok(4096));
        assert!(parse_number("0xzz").is_err());
        assert!(parse_number("").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands()
    {
        let cli = Cli::try_parse_from(["symstore", "lookup", "app.exe", "0x1110"]).unwrap();
        assert!(matches!(cli.command, Commands::Lookup { rva: 0x1110, .. }));

        let cli = Cli::try_parse_from(["symstore", "symbols", "app.exe", "--heap", "public"]).unwrap();
        assert!(matches!(cli.command, Commands::Symbols { heap: Heap::Public, .. }));

        let cli = Cli::try_parse_from(["symstore", "--log-level", "debug", "types", "app.exe"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
    }

    #[test]
    fn test_cli_verifies()
    {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
