//! History command handlers

use folio_core::error::FolioError;
use folio_core::library::Library;

use crate::cli::args::HistoryCommand;

/// Handle a `history` subcommand.
/// Returns true on success, false on error
pub fn handle_history_command(library: &Library, command: HistoryCommand) -> bool {
    match command {
        HistoryCommand::List { chapterid } => match library.history().list_revisions(&chapterid) {
            Ok(revisions) => {
                if revisions.is_empty() {
                    println!("No history yet.");
                }
                for revision in revisions {
                    println!("#{:<4} {}", revision.index, summarize(&revision.text));
                }
                true
            }
            Err(e) => {
                eprintln!("✗ History unavailable: {}", e);
                false
            }
        },

        HistoryCommand::Show { chapterid, index } => {
            match reconstruct(library, &chapterid, index) {
                Ok(text) => {
                    print!("{}", text);
                    true
                }
                Err(e) => {
                    eprintln!("✗ {}", e);
                    false
                }
            }
        }

        HistoryCommand::Restore { chapterid, index } => {
            let text = match reconstruct(library, &chapterid, index) {
                Ok(text) => text,
                Err(e) => {
                    eprintln!("✗ {}", e);
                    return false;
                }
            };

            // Restoring never rewrites history: the old text is saved
            // again as the newest revision.
            let mut chapter = match library.require_chapter(&chapterid) {
                Ok(chapter) => chapter,
                Err(e) => {
                    eprintln!("✗ {}", e);
                    return false;
                }
            };
            chapter.text = text;
            if let Err(e) = library.save_chapter(&chapter) {
                eprintln!("✗ Error saving chapter: {}", e);
                return false;
            }
            match library.history().save_revision(&chapterid, &chapter.text) {
                Ok(_) => {
                    println!("✓ Restored revision {} of '{}'", index, chapter.title);
                    true
                }
                Err(e) => {
                    eprintln!("✗ Error recording restored revision: {}", e);
                    false
                }
            }
        }
    }
}

fn reconstruct(library: &Library, chapterid: &str, index: usize) -> Result<String, FolioError> {
    // A chapter with no history yet has a chain of length zero; asking
    // for any index of it is out of range, not "chapter missing".
    let chain = library
        .history()
        .get_chain(chapterid)?
        .ok_or(FolioError::IndexOutOfRange { index, len: 0 })?;
    chain.reconstruct_at(index)
}

/// First line of a revision, shortened for list output.
fn summarize(text: &str) -> String {
    const MAX: usize = 60;
    let first_line = text.lines().next().unwrap_or("(empty)");
    let mut summary: String = first_line.chars().take(MAX).collect();
    if first_line.chars().count() > MAX {
        summary.push('…');
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_short_text() {
        assert_eq!(summarize("Hello world"), "Hello world");
    }

    #[test]
    fn test_summarize_takes_first_line() {
        assert_eq!(summarize("first\nsecond"), "first");
    }

    #[test]
    fn test_summarize_truncates() {
        let long = "x".repeat(100);
        let summary = summarize(&long);
        assert_eq!(summary.chars().count(), 61);
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(""), "(empty)");
    }
}
