//! cellvault CLI - cell-granular version control from the shell
//!
//! operates a repository at `--root` together with a JSON-file-backed
//! workbook store kept in `workbooks.json` next to `.VCS/`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use cellvault::ops::{
    cherry_pick, commit, hard_reset, history, preview_rollback, revert, soft_reset, stage, status,
};
use cellvault::{cell, object, refs, Hash, MemoryWorkbookStore, Repo, WorkbookStore};

#[derive(Parser)]
#[command(name = "cellvault")]
#[command(about = "cell-granular version control for spreadsheet workbooks")]
#[command(version)]
struct Cli {
    /// repository root path
    #[arg(short, long, default_value = ".", env = "CELLVAULT_ROOT")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// initialize a new repository
    Init {
        /// path to create the repository at
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// write a cell value into the workbook store
    SetCell {
        workbook: String,
        sheet: u32,
        /// cell address, e.g. A1
        cell: String,
        value: String,
    },

    /// print a cell value from the workbook store
    GetCell {
        workbook: String,
        sheet: u32,
        /// cell address, e.g. A1
        cell: String,
    },

    /// stage a cell's current value
    Stage {
        workbook: String,
        sheet: u32,
        /// cell address, e.g. A1
        cell: String,
    },

    /// remove a staged entry
    Unstage {
        /// index key, e.g. wb1:1:A:1
        key: String,
    },

    /// record the staged cells as a commit
    Commit {
        /// commit message
        #[arg(short, long)]
        message: String,

        /// author name (falls back to config)
        #[arg(short, long)]
        author: Option<String>,

        /// author email (falls back to config)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// show the staging area and last commit
    Status,

    /// show commit history
    Log {
        /// maximum number of commits to show
        #[arg(short = 'n', long, default_value_t = 10)]
        max_count: usize,
    },

    /// move the current branch to a commit
    Reset {
        /// target commit hash
        target: String,

        /// also rewrite the workbook store and index
        #[arg(long)]
        hard: bool,
    },

    /// create a commit undoing an earlier one
    Revert {
        /// commit hash to revert
        commit: String,

        #[arg(short, long)]
        author: Option<String>,

        #[arg(short, long)]
        email: Option<String>,
    },

    /// replay a commit's snapshot on top of HEAD
    CherryPick {
        /// commit hash to pick
        commit: String,

        #[arg(short, long)]
        author: Option<String>,

        #[arg(short, long)]
        email: Option<String>,
    },

    /// show what a rollback would touch
    Preview {
        /// target commit hash
        target: String,

        /// rollback kind: hard_reset, soft_reset, revert, cherry_pick
        #[arg(short, long)]
        kind: String,
    },

    /// show contents of an object
    CatFile {
        /// object hash
        object: String,
    },

    /// list branches
    Branches,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn workbooks_path(repo: &Repo) -> PathBuf {
    repo.root().join("workbooks.json")
}

fn resolve_identity(
    repo: &Repo,
    author: Option<String>,
    email: Option<String>,
) -> cellvault::Result<(String, String)> {
    let configured = repo.config().author.clone();
    let author = author
        .or_else(|| configured.as_ref().map(|i| i.name.clone()))
        .ok_or_else(|| {
            cellvault::Error::InvalidInput(
                "no author given and none configured".to_string(),
            )
        })?;
    let email = email
        .or_else(|| configured.map(|i| i.email))
        .ok_or_else(|| {
            cellvault::Error::InvalidInput("no email given and none configured".to_string())
        })?;
    Ok((author, email))
}

fn run(cli: Cli) -> cellvault::Result<()> {
    match cli.command {
        Commands::Init { path } => {
            Repo::init(&path)?;
            println!("initialized cellvault repository at {}", path.display());
        }

        Commands::SetCell {
            workbook,
            sheet,
            cell,
            value,
        } => {
            let repo = Repo::open(&cli.root)?;
            let (letters, number) = cell::parse_address(&cell)?;

            let path = workbooks_path(&repo);
            let mut store = MemoryWorkbookStore::load(&path)?;
            store.write_cell(&workbook, sheet, &letters, number, &value)?;
            store.save(&path)?;
        }

        Commands::GetCell {
            workbook,
            sheet,
            cell,
        } => {
            let repo = Repo::open(&cli.root)?;
            let (letters, number) = cell::parse_address(&cell)?;

            let store = MemoryWorkbookStore::load(&workbooks_path(&repo))?;
            println!("{}", store.read_cell(&workbook, sheet, &letters, number)?);
        }

        Commands::Stage {
            workbook,
            sheet,
            cell,
        } => {
            let repo = Repo::open(&cli.root)?;
            let (letters, number) = cell::parse_address(&cell)?;

            let store = MemoryWorkbookStore::load(&workbooks_path(&repo))?;
            let outcome = stage(&repo, &store, &workbook, sheet, &letters, number)?;
            println!(
                "{} {} ({} -> {} bytes) {}",
                outcome.status.as_str(),
                outcome.cell_address,
                outcome.original_size,
                outcome.compressed_size,
                outcome.blob_hash
            );
        }

        Commands::Unstage { key } => {
            let repo = Repo::open(&cli.root)?;
            if repo.index().unstage(&key)? {
                println!("unstaged {}", key);
            } else {
                println!("nothing staged for {}", key);
            }
        }

        Commands::Commit {
            message,
            author,
            email,
        } => {
            let repo = Repo::open(&cli.root)?;
            let (author, email) = resolve_identity(&repo, author, email)?;

            let outcome = commit(&repo, &message, &author, &email)?;
            println!(
                "[{} {}] {} cell(s)",
                outcome.branch,
                &outcome.commit_hash.to_hex()[..12],
                outcome.staged_files
            );
        }

        Commands::Status => {
            let repo = Repo::open(&cli.root)?;
            let s = status(&repo)?;

            match &s.last_commit {
                Some(info) => println!("HEAD at {} ({})", info.hash, info.message.lines().next().unwrap_or("")),
                None => println!("no commits yet"),
            }

            if s.clean {
                println!("nothing staged");
            } else {
                println!("{} staged cell(s):", s.staged);
                for path in &s.staged_files {
                    println!("  {}", path);
                }
            }
        }

        Commands::Log { max_count } => {
            let repo = Repo::open(&cli.root)?;
            for entry in history(&repo, max_count)? {
                println!("{}", entry);
            }
        }

        Commands::Reset { target, hard } => {
            let repo = Repo::open(&cli.root)?;
            if hard {
                let path = workbooks_path(&repo);
                let mut store = MemoryWorkbookStore::load(&path)?;
                let outcome = hard_reset(&repo, &mut store, &target)?;
                store.save(&path)?;
                println!(
                    "hard reset to {} ({} restored, {} skipped)",
                    outcome.target, outcome.restored, outcome.skipped
                );
            } else {
                let outcome = soft_reset(&repo, &target)?;
                println!("soft reset to {}", outcome.target);
                for path in &outcome.changed_paths {
                    println!("  would change {}", path);
                }
            }
        }

        Commands::Revert {
            commit,
            author,
            email,
        } => {
            let repo = Repo::open(&cli.root)?;
            let (author, email) = resolve_identity(&repo, author, email)?;

            let outcome = revert(&repo, &commit, &author, &email)?;
            println!("reverted in {}", outcome.commit_hash);
        }

        Commands::CherryPick {
            commit,
            author,
            email,
        } => {
            let repo = Repo::open(&cli.root)?;
            let (author, email) = resolve_identity(&repo, author, email)?;

            let outcome = cherry_pick(&repo, &commit, &author, &email)?;
            println!("picked as {}", outcome.commit_hash);
        }

        Commands::Preview { target, kind } => {
            let repo = Repo::open(&cli.root)?;
            let preview = preview_rollback(&repo, &target, &kind)?;

            println!(
                "{} from {} to {}{}",
                preview.kind.as_str(),
                &preview.current.hash.to_hex()[..12],
                &preview.target.hash.to_hex()[..12],
                if preview.destructive { " (destructive)" } else { "" }
            );
            for path in &preview.touched_paths {
                println!("  {}", path);
            }
        }

        Commands::CatFile { object } => {
            let repo = Repo::open(&cli.root)?;
            let hash = Hash::from_hex(&object)?;
            let (kind, payload) = object::get(&repo, &hash)?;

            match kind {
                object::ObjectKind::Blob | object::ObjectKind::Commit => {
                    print!("{}", String::from_utf8_lossy(&payload));
                }
                object::ObjectKind::Tree => {
                    for entry in object::Tree::parse(&payload)?.entries() {
                        println!("{} {} {}", entry.mode, entry.hash, entry.name);
                    }
                }
            }
        }

        Commands::Branches => {
            let repo = Repo::open(&cli.root)?;
            let current = refs::current_branch(&repo)?;
            for name in refs::list_branches(&repo)? {
                let marker = if Some(&name) == current.as_ref() { "*" } else { " " };
                println!("{} {}", marker, name);
            }
        }
    }

    Ok(())
}
