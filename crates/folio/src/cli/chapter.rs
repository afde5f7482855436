//! Chapter command handlers

use std::io::Read;
use std::path::PathBuf;

use folio_core::library::{Chapter, Library};

use crate::cli::args::ChapterCommand;

/// Handle a `chapter` subcommand.
/// Returns true on success, false on error
pub fn handle_chapter_command(library: &Library, command: ChapterCommand) -> bool {
    match command {
        ChapterCommand::Create { bookid, title } => {
            if !book_exists(library, &bookid) {
                return false;
            }
            let chapter = Chapter::new(bookid, title, String::new());
            match library.save_chapter(&chapter) {
                Ok(()) => {
                    println!("✓ Created chapter '{}'", chapter.title);
                    println!("  id: {}", chapter.chapterid);
                    true
                }
                Err(e) => {
                    eprintln!("✗ Error creating chapter: {}", e);
                    false
                }
            }
        }

        ChapterCommand::Show { chapterid } => match library.require_chapter(&chapterid) {
            Ok(chapter) => {
                print!("{}", chapter.text);
                true
            }
            Err(e) => {
                eprintln!("✗ {}", e);
                false
            }
        },

        ChapterCommand::List { bookid } => match library.chapters_of(&bookid) {
            Ok(chapters) => {
                if chapters.is_empty() {
                    println!("No chapters found.");
                }
                for chapter in chapters {
                    println!("{}  {}", chapter.chapterid, chapter.title);
                }
                true
            }
            Err(e) => {
                eprintln!("✗ Error listing chapters: {}", e);
                false
            }
        },

        ChapterCommand::Save { chapterid, file } => handle_save(library, &chapterid, file),

        ChapterCommand::Delete { chapterid } => match library.delete_chapter(&chapterid) {
            Ok(()) => {
                println!("✓ Deleted chapter '{}'", chapterid);
                true
            }
            Err(e) => {
                eprintln!("✗ Error deleting chapter: {}", e);
                false
            }
        },
    }
}

/// Save new chapter text and record a revision.
fn handle_save(library: &Library, chapterid: &str, file: Option<PathBuf>) -> bool {
    let mut chapter = match library.require_chapter(chapterid) {
        Ok(chapter) => chapter,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };

    let text = match read_text(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("✗ Error reading text: {}", e);
            return false;
        }
    };

    chapter.text = text;
    if let Err(e) = library.save_chapter(&chapter) {
        eprintln!("✗ Error saving chapter: {}", e);
        return false;
    }
    match library.history().save_revision(chapterid, &chapter.text) {
        Ok(outcome) => {
            log::debug!("revision outcome for '{}': {:?}", chapterid, outcome);
            println!("✓ Saved chapter '{}'", chapter.title);
            true
        }
        Err(e) => {
            eprintln!("✗ Chapter saved, but recording its revision failed: {}", e);
            false
        }
    }
}

fn read_text(file: Option<PathBuf>) -> std::io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn book_exists(library: &Library, bookid: &str) -> bool {
    match library.get_book(bookid) {
        Ok(Some(_)) => true,
        Ok(None) => {
            eprintln!("✗ Book '{}' not found", bookid);
            false
        }
        Err(e) => {
            eprintln!("✗ Error reading book: {}", e);
            false
        }
    }
}
