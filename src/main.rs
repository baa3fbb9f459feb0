use std::path::PathBuf;

use clap::{Parser, Subcommand};
use minigit::commands;
use minigit::object::ObjectKind;

#[derive(Parser, Debug)]
#[command(name = "minigit", about = "A minimal, on-disk-compatible version control core")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an empty repository.
    Init {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Stage files into the index.
    Add { paths: Vec<PathBuf> },
    /// Remove files from the index (and, unless `--cached`, the worktree).
    Rm {
        #[arg(long)]
        cached: bool,
        paths: Vec<PathBuf>,
    },
    /// Record a commit from the current index.
    Commit {
        #[arg(short = 'm')]
        message: String,
    },
    /// Print an object's contents.
    CatFile {
        #[arg(value_name = "TYPE")]
        kind: String,
        name: String,
    },
    /// Hash a file as an object, optionally writing it to the store.
    HashObject {
        #[arg(short = 'w')]
        write: bool,
        #[arg(short = 't', default_value = "blob")]
        kind: String,
        path: PathBuf,
    },
    /// Render a graphviz DOT graph of commit ancestry.
    Log { name: Option<String> },
    /// List the paths currently staged in the index.
    LsFiles {
        #[arg(long)]
        verbose: bool,
    },
    /// List the entries of a tree object.
    LsTree {
        #[arg(short = 'r')]
        recursive: bool,
        name: String,
    },
    /// Materialize a tree into an empty directory.
    Checkout { name: String, target: PathBuf },
    /// List every ref under `refs/`.
    ShowRef,
    /// Create or list tags.
    Tag {
        #[arg(short = 'a')]
        annotate: bool,
        #[arg(short = 'm')]
        message: Option<String>,
        name: Option<String>,
        object: Option<String>,
    },
    /// Resolve a name to a canonical object hash.
    RevParse {
        #[arg(long = "git-type")]
        git_type: Option<String>,
        name: String,
    },
    /// Report which of the given paths are ignored.
    CheckIgnore { paths: Vec<PathBuf> },
    /// Show the working tree status.
    Status,
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    match args.command {
        Command::Init { path } => commands::init::run(&path)?,
        Command::Add { paths } => commands::add::run(&paths)?,
        Command::Rm { cached, paths } => commands::rm::run(&paths, cached)?,
        Command::Commit { message } => commands::commit::run(&message)?,
        Command::CatFile { kind, name } => commands::cat_file::run(&kind, &name)?,
        Command::HashObject { write, kind, path } => {
            let kind = ObjectKind::parse(&kind)?;
            commands::hash_object::run(write, kind, &path)?
        }
        Command::Log { name } => commands::log::run(name.as_deref())?,
        Command::LsFiles { verbose } => commands::ls_files::run(verbose)?,
        Command::LsTree { recursive, name } => commands::ls_tree::run(recursive, &name)?,
        Command::Checkout { name, target } => commands::checkout::run(&name, &target)?,
        Command::ShowRef => commands::show_ref::run()?,
        Command::Tag {
            annotate,
            message,
            name,
            object,
        } => commands::tag::run(annotate, message.as_deref(), name.as_deref(), object.as_deref())?,
        Command::RevParse { git_type, name } => commands::rev_parse::run(git_type.as_deref(), &name)?,
        Command::CheckIgnore { paths } => commands::check_ignore::run(&paths)?,
        Command::Status => commands::status::run()?,
    }
    Ok(())
}
