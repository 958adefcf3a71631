use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use folio_application::ReadingSession;
use folio_core::{BookId, BookRepository as _, Config, ReaderId};
use folio_engine::Paginator;
use folio_storage::{BookmarkStore, FsBookRepository, ProgressStore};
use folio_ui::Ui;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(version, about = "Paginated plain-text reader that remembers where you stopped")]
struct Cli {
    /// Directory holding books/ and users/ (overrides FOLIO_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Characters per page (overrides FOLIO_CHUNK_SIZE)
    #[arg(long, global = true, value_name = "CHARS")]
    chunk_size: Option<usize>,

    /// Reader whose progress is used; falls back to FOLIO_READER, then anonymous
    #[arg(short, long, global = true)]
    reader: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a book in the terminal reader
    Read { book: String },
    /// Reopen the most recently read book
    Resume,
    /// List saved positions, most recent first
    History,
    /// List the books in the library
    Books,
    /// Print a book's page count, or one page with --page
    Pages {
        book: String,
        /// 1-based page to print
        #[arg(short, long)]
        page: Option<usize>,
    },
    /// Drop the saved position for a book
    Forget { book: String },
    /// Add a book to the reading list, or remove it if it is already there
    Bookmark { book: String },
    /// List the reading list in the order books were added
    Bookmarks,
}

impl Command {
    fn is_interactive(&self) -> bool {
        matches!(self, Command::Read { .. } | Command::Resume)
    }
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env().context("read configuration from environment")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.chunk_size = chunk_size;
    }
    config.validate().context("validate configuration")?;

    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("create data dir {}", config.data_dir.display()))?;
    init_logging(&config, cli.command.is_interactive())?;

    let reader = resolve_reader(cli.reader);
    let repo = FsBookRepository::new(&config);
    let store = Arc::new(ProgressStore::new(&config));
    tracing::debug!(data_dir = %config.data_dir.display(), chunk_size = config.chunk_size, %reader, "starting");

    match cli.command {
        Command::Read { book } => read(&config, &repo, store, BookId::new(book), reader),
        Command::Resume => {
            let Some((book, _)) = store.peek_most_recent(&reader) else {
                println!("Nothing to resume for {reader}.");
                return Ok(());
            };
            read(&config, &repo, store, book, reader)
        }
        Command::History => history(&config, &repo, &store, &reader),
        Command::Books => {
            for book in repo.list_books().context("list books")? {
                println!("{}\t{}", book.id, book.title);
            }
            Ok(())
        }
        Command::Pages { book, page } => pages(&config, &repo, &BookId::new(book), page),
        Command::Forget { book } => {
            let book = BookId::new(book);
            if store.forget(&reader, &book)? {
                println!("Forgot {book} for {reader}.");
            } else {
                println!("No saved position for {book}.");
            }
            Ok(())
        }
        Command::Bookmark { book } => {
            let book = BookId::new(book);
            if BookmarkStore::new(&config).toggle(&reader, &book)? {
                println!("Bookmarked {book} for {reader}.");
            } else if reader.is_anonymous() {
                println!("Bookmarks need a reader; pass --reader.");
            } else {
                println!("Removed {book} from the reading list.");
            }
            Ok(())
        }
        Command::Bookmarks => bookmarks(&repo, &BookmarkStore::new(&config), &reader),
    }
}

fn resolve_reader(arg: Option<String>) -> ReaderId {
    let name = arg.or_else(|| std::env::var("FOLIO_READER").ok());
    match name {
        Some(name) => ReaderId::new(&name),
        None => ReaderId::anonymous(),
    }
}

fn init_logging(config: &Config, to_file: bool) -> anyhow::Result<()> {
    if to_file {
        let path = config.log_path();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open log file {}", path.display()))?;
        let filter = EnvFilter::try_from_env("FOLIO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        let filter = EnvFilter::try_from_env("FOLIO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn read(
    config: &Config,
    repo: &FsBookRepository,
    store: Arc<ProgressStore>,
    book: BookId,
    reader: ReaderId,
) -> anyhow::Result<()> {
    if reader.is_anonymous() {
        tracing::warn!("no reader given, progress will not be saved");
    }
    let mut session = ReadingSession::from_config(config, store);
    session
        .open(repo, &book, reader)
        .with_context(|| format!("open book {book}"))?;

    let mut ui = Ui::new(session);
    ui.run()?;

    let mut session = ui.into_session();
    if let Some(err) = session.close() {
        eprintln!("warning: reading progress not saved: {err}");
    }
    Ok(())
}

fn history(
    config: &Config,
    repo: &FsBookRepository,
    store: &ProgressStore,
    reader: &ReaderId,
) -> anyhow::Result<()> {
    let entries = store.history(reader);
    if entries.is_empty() {
        println!("No reading history for {reader}.");
        return Ok(());
    }

    let paginator = Paginator::new(config.chunk_size);
    for (book, page_index) in entries {
        match repo.load(&book) {
            Ok(content) => {
                let total = paginator.paginate(&content.text).total_pages();
                let page = page_index.min(total - 1) + 1;
                println!("{}\t{}\tpage {page} of {total}", book, content.book.title);
            }
            Err(err) => {
                tracing::debug!(%book, error = %err, "history entry without content");
                println!("{book}\t(unavailable)\tpage {}", page_index + 1);
            }
        }
    }
    Ok(())
}

fn bookmarks(
    repo: &FsBookRepository,
    store: &BookmarkStore,
    reader: &ReaderId,
) -> anyhow::Result<()> {
    let books = store.load(reader);
    if books.is_empty() {
        println!("No bookmarks for {reader}.");
        return Ok(());
    }
    for id in books {
        match repo.book(&id) {
            Ok(book) => println!("{}\t{}", book.id, book.title),
            Err(err) => {
                tracing::debug!(book = %id, error = %err, "bookmark without metadata");
                println!("{id}\t(unavailable)");
            }
        }
    }
    Ok(())
}

fn pages(
    config: &Config,
    repo: &FsBookRepository,
    book: &BookId,
    page: Option<usize>,
) -> anyhow::Result<()> {
    let content = repo.load(book).with_context(|| format!("open book {book}"))?;
    let paged = Paginator::new(config.chunk_size).paginate(&content.text);
    match page {
        Some(page) => println!("{}", paged.page(page.saturating_sub(1))),
        None => println!(
            "{}: {} pages of {} characters",
            content.book.title,
            paged.total_pages(),
            config.chunk_size
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["folio", "read", "42", "--reader", "alice", "--chunk-size", "500"]);
        assert_eq!(cli.reader.as_deref(), Some("alice"));
        assert_eq!(cli.chunk_size, Some(500));
        assert!(matches!(cli.command, Command::Read { ref book } if book == "42"));
        assert!(cli.command.is_interactive());
    }

    #[test]
    fn pages_takes_optional_page() {
        let cli = Cli::parse_from(["folio", "pages", "7", "-p", "3"]);
        assert!(matches!(cli.command, Command::Pages { ref book, page: Some(3) } if book == "7"));
        assert!(!cli.command.is_interactive());
    }

    #[test]
    fn parses_bookmark_commands() {
        let cli = Cli::parse_from(["folio", "-r", "sam", "bookmark", "12"]);
        assert!(matches!(cli.command, Command::Bookmark { ref book } if book == "12"));
        let cli = Cli::parse_from(["folio", "bookmarks"]);
        assert!(matches!(cli.command, Command::Bookmarks));
        assert!(!cli.command.is_interactive());
    }

    #[test]
    fn reader_names_are_sanitized() {
        assert_eq!(
            resolve_reader(Some("al.ice".to_string())),
            ReaderId::Named("alice".to_string())
        );
        assert_eq!(resolve_reader(Some("--".to_string())), ReaderId::Anonymous);
    }
}
