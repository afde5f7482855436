//! Book command handlers

use chrono::{TimeZone, Utc};
use folio_core::library::{Book, Library};

use crate::cli::args::BookCommand;

/// Render a millisecond timestamp as a date for list output.
fn format_date(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d").to_string(),
        _ => "-".to_string(),
    }
}

/// Handle a `book` subcommand.
/// Returns true on success, false on error
pub fn handle_book_command(library: &Library, command: BookCommand) -> bool {
    match command {
        BookCommand::Create { title, author, user } => {
            let book = Book::new(user, title, author);
            match library.save_book(&book) {
                Ok(()) => {
                    println!("✓ Created book '{}'", book.title);
                    println!("  id: {}", book.bookid);
                    true
                }
                Err(e) => {
                    eprintln!("✗ Error creating book: {}", e);
                    false
                }
            }
        }

        BookCommand::List { user } => {
            let books = match user {
                Some(user) => library.books_for(&user),
                None => library.list_books(),
            };
            match books {
                Ok(books) => {
                    if books.is_empty() {
                        println!("No books found.");
                    }
                    for book in books {
                        println!(
                            "{}  {} ({})  {}",
                            book.bookid,
                            book.title,
                            book.author,
                            format_date(book.created_at)
                        );
                    }
                    true
                }
                Err(e) => {
                    eprintln!("✗ Error listing books: {}", e);
                    false
                }
            }
        }

        BookCommand::Show { bookid } => match library.get_book(&bookid) {
            Ok(Some(book)) => {
                println!("{} by {}", book.title, book.author);
                match library.chapters_of(&bookid) {
                    Ok(chapters) => {
                        for chapter in chapters {
                            println!("  {}  {}", chapter.chapterid, chapter.title);
                        }
                        true
                    }
                    Err(e) => {
                        eprintln!("✗ Error listing chapters: {}", e);
                        false
                    }
                }
            }
            Ok(None) => {
                eprintln!("✗ Book '{}' not found", bookid);
                false
            }
            Err(e) => {
                eprintln!("✗ Error reading book: {}", e);
                false
            }
        },

        BookCommand::Delete { bookid } => match library.delete_book(&bookid) {
            Ok(()) => {
                println!("✓ Deleted book '{}'", bookid);
                true
            }
            Err(e) => {
                eprintln!("✗ Error deleting book: {}", e);
                false
            }
        },
    }
}
