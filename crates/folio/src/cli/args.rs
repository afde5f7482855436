//! Clap argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Draft books chapter by chapter, with full revision history.
#[derive(Parser)]
#[command(name = "folio", version, about)]
pub struct Cli {
    /// Override the data directory (defaults to the configured one)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the config file, choosing where data lives
    Init {
        /// Directory the document store keeps its data in
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Manage books
    Book {
        #[command(subcommand)]
        command: BookCommand,
    },

    /// Manage chapters
    Chapter {
        #[command(subcommand)]
        command: ChapterCommand,
    },

    /// Inspect and restore chapter revision history
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Subcommand)]
pub enum BookCommand {
    /// Create a new book
    Create {
        /// Book title
        title: String,
        /// Author name shown on the book card
        #[arg(long, default_value = "")]
        author: String,
        /// Owning user id
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// List books
    List {
        /// Only books owned by this user
        #[arg(long)]
        user: Option<String>,
    },
    /// Show a book and its chapters
    Show {
        /// Book id
        bookid: String,
    },
    /// Delete a book, its chapters, and their histories
    Delete {
        /// Book id
        bookid: String,
    },
}

#[derive(Subcommand)]
pub enum ChapterCommand {
    /// Create a new chapter in a book
    Create {
        /// Owning book id
        bookid: String,
        /// Chapter title
        title: String,
    },
    /// Print a chapter's current text
    Show {
        /// Chapter id
        chapterid: String,
    },
    /// List a book's chapters
    List {
        /// Owning book id
        bookid: String,
    },
    /// Save chapter text (and record a revision)
    Save {
        /// Chapter id
        chapterid: String,
        /// Read the text from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Delete a chapter and its history
    Delete {
        /// Chapter id
        chapterid: String,
    },
}

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// List a chapter's revisions, newest first
    List {
        /// Chapter id
        chapterid: String,
    },
    /// Print the full text of one revision
    Show {
        /// Chapter id
        chapterid: String,
        /// Revision index (0 is the oldest)
        index: usize,
    },
    /// Save a past revision's text as the newest revision
    Restore {
        /// Chapter id
        chapterid: String,
        /// Revision index (0 is the oldest)
        index: usize,
    },
}
