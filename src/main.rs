//! bindery - build EPUB archives from a book descriptor

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bindery::Generator;

#[derive(Parser)]
#[command(name = "bindery")]
#[command(version, about = "Build an EPUB from a JSON book descriptor", long_about = None)]
#[command(after_help = "EXAMPLES:
    bindery iliada.json                  Write iliada.epub next to the descriptor
    bindery iliada.json -o out.epub      Write to a chosen path
    bindery -i iliada.json               Show the outline without writing")]
struct Cli {
    /// Book descriptor (JSON)
    #[arg(value_name = "DESCRIPTOR")]
    descriptor: PathBuf,

    /// Output archive [default: <DESCRIPTOR stem>.epub]
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Show the book outline without writing an archive
    #[arg(short, long)]
    info: bool,

    /// Suppress output messages
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log every document and archive entry
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = if cli.info {
        show_info(&cli)
    } else {
        build(&cli)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let default = if cli.quiet {
        "bindery=warn"
    } else if cli.verbose {
        "bindery=debug"
    } else {
        "bindery=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build(cli: &Cli) -> bindery::Result<()> {
    let generator = Generator::open(&cli.descriptor)?;
    let output = generator.write(cli.output.as_deref())?;

    if !cli.quiet {
        println!("{}", output.display());
    }
    Ok(())
}

fn show_info(cli: &Cli) -> bindery::Result<()> {
    let generator = Generator::open(&cli.descriptor)?;
    let book = generator.book();

    println!("File: {}", cli.descriptor.display());
    println!("Title: {}", book.title);
    if !book.authors.is_empty() {
        let names: Vec<_> = book.authors.iter().map(|a| a.name.as_str()).collect();
        println!("Authors: {}", names.join(", "));
    }
    println!("Language: {}", book.language);
    if let Some(cover) = &book.cover {
        println!("Cover: {cover}");
    }
    println!("Documents: {}", book.contents.len());
    println!("Images: {}", generator.images().len());
    println!(
        "TOC entries: {} (depth {})",
        generator.nav_map().len(),
        generator.nav_map().depth()
    );

    for point in generator.nav_map().iter() {
        let indent = "  ".repeat(usize::from(point.level.saturating_sub(1)));
        println!("  {indent}{} -> {}", point.label, point.href);
    }

    Ok(())
}
