//! Book and chapter records.
//!
//! Thin CRUD over the document store, with the one rule the store cannot
//! enforce itself: deletes cascade. Removing a chapter removes its
//! revision chain; removing a book removes its chapters and every one of
//! their chains.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};
use crate::history::HistoryStore;
use crate::store::{DocumentStore, WriteCondition};

/// Collection book records are stored under, keyed by book id.
pub const BOOKS_COLLECTION: &str = "books";

/// Collection chapter records are stored under, keyed by chapter id.
pub const CHAPTERS_COLLECTION: &str = "chapters";

/// Position of a chapter card on the book's grid view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pos {
    /// Horizontal grid coordinate.
    pub x: f64,
    /// Vertical grid coordinate.
    pub y: f64,
}

/// A book: a titled collection of chapters owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Stable book id.
    pub bookid: String,
    /// Owning user id.
    pub userid: String,
    /// Display title.
    pub title: String,
    /// Author name shown on the book card.
    pub author: String,
    /// Unix timestamp of the last save (milliseconds).
    pub created_at: i64,
}

impl Book {
    /// Create a book with a fresh id and timestamp.
    pub fn new(userid: impl Into<String>, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            bookid: uuid::Uuid::new_v4().to_string(),
            userid: userid.into(),
            title: title.into(),
            author: author.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// A chapter: one body of text belonging to a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Stable chapter id; also the key of its revision chain.
    pub chapterid: String,
    /// Id of the owning book.
    pub bookid: String,
    /// Display title.
    pub title: String,
    /// Chapter body.
    pub text: String,
    /// Position of the chapter card on the book's grid view.
    #[serde(default)]
    pub pos: Pos,
    /// Unix timestamp of the last save (milliseconds).
    pub created_at: i64,
}

impl Chapter {
    /// Create a chapter with a fresh id and timestamp.
    pub fn new(bookid: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chapterid: uuid::Uuid::new_v4().to_string(),
            bookid: bookid.into(),
            title: title.into(),
            text: text.into(),
            pos: Pos::default(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// CRUD for books and chapters over an injected store handle.
pub struct Library {
    store: Arc<dyn DocumentStore>,
    history: HistoryStore,
}

impl Library {
    /// Create a library over the given document store. The revision
    /// chains it cascades into live in the same store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let history = HistoryStore::new(Arc::clone(&store));
        Self { store, history }
    }

    /// The history store this library cascades deletes into.
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Write a book record, stamping its save time.
    pub fn save_book(&self, book: &Book) -> Result<()> {
        let mut book = book.clone();
        book.created_at = chrono::Utc::now().timestamp_millis();
        let value = serde_json::to_value(&book)?;
        self.store
            .put(BOOKS_COLLECTION, &book.bookid, value, WriteCondition::Any)?;
        Ok(())
    }

    /// Read a book record. `Ok(None)` when it does not exist.
    pub fn get_book(&self, bookid: &str) -> Result<Option<Book>> {
        match self.store.get(BOOKS_COLLECTION, bookid)? {
            Some(doc) => Ok(Some(serde_json::from_value(doc.value)?)),
            None => Ok(None),
        }
    }

    /// All books, in stable store order.
    pub fn list_books(&self) -> Result<Vec<Book>> {
        let mut books = Vec::new();
        for key in self.store.list(BOOKS_COLLECTION)? {
            if let Some(book) = self.get_book(&key)? {
                books.push(book);
            }
        }
        Ok(books)
    }

    /// Books owned by `userid`.
    pub fn books_for(&self, userid: &str) -> Result<Vec<Book>> {
        let mut books = self.list_books()?;
        books.retain(|book| book.userid == userid);
        Ok(books)
    }

    /// Delete a book, its chapters, and their revision chains.
    pub fn delete_book(&self, bookid: &str) -> Result<()> {
        let chapters = self.chapters_of(bookid)?;
        log::debug!(
            "deleting book '{}' and {} chapter(s)",
            bookid,
            chapters.len()
        );
        for chapter in chapters {
            self.delete_chapter(&chapter.chapterid)?;
        }
        self.store.delete(BOOKS_COLLECTION, bookid)
    }

    /// Write a chapter record, stamping its save time. Revision history
    /// is recorded separately via [`HistoryStore::save_revision`].
    pub fn save_chapter(&self, chapter: &Chapter) -> Result<()> {
        let mut chapter = chapter.clone();
        chapter.created_at = chrono::Utc::now().timestamp_millis();
        let value = serde_json::to_value(&chapter)?;
        self.store.put(
            CHAPTERS_COLLECTION,
            &chapter.chapterid,
            value,
            WriteCondition::Any,
        )?;
        Ok(())
    }

    /// Read a chapter record. `Ok(None)` when it does not exist.
    pub fn get_chapter(&self, chapterid: &str) -> Result<Option<Chapter>> {
        match self.store.get(CHAPTERS_COLLECTION, chapterid)? {
            Some(doc) => Ok(Some(serde_json::from_value(doc.value)?)),
            None => Ok(None),
        }
    }

    /// Read a chapter record, failing when it does not exist.
    pub fn require_chapter(&self, chapterid: &str) -> Result<Chapter> {
        self.get_chapter(chapterid)?
            .ok_or_else(|| FolioError::ChapterNotFound(chapterid.to_string()))
    }

    /// Chapters of one book, in stable store order.
    pub fn chapters_of(&self, bookid: &str) -> Result<Vec<Chapter>> {
        let mut chapters = Vec::new();
        for key in self.store.list(CHAPTERS_COLLECTION)? {
            if let Some(chapter) = self.get_chapter(&key)?
                && chapter.bookid == bookid
            {
                chapters.push(chapter);
            }
        }
        Ok(chapters)
    }

    /// Delete a chapter and its revision chain.
    pub fn delete_chapter(&self, chapterid: &str) -> Result<()> {
        self.store.delete(CHAPTERS_COLLECTION, chapterid)?;
        self.history.delete_chain(chapterid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn library() -> Library {
        Library::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_book_round_trip() {
        let library = library();
        let book = Book::new("u1", "Dune", "Frank Herbert");
        library.save_book(&book).unwrap();

        let loaded = library.get_book(&book.bookid).unwrap().unwrap();
        assert_eq!(loaded.title, "Dune");
        assert_eq!(loaded.userid, "u1");
    }

    #[test]
    fn test_books_for_filters_by_user() {
        let library = library();
        library.save_book(&Book::new("u1", "A", "x")).unwrap();
        library.save_book(&Book::new("u2", "B", "y")).unwrap();
        library.save_book(&Book::new("u1", "C", "z")).unwrap();

        let books = library.books_for("u1").unwrap();
        assert_eq!(books.len(), 2);
        assert!(books.iter().all(|b| b.userid == "u1"));
    }

    #[test]
    fn test_chapter_round_trip() {
        let library = library();
        let chapter = Chapter::new("b1", "One", "It begins.");
        library.save_chapter(&chapter).unwrap();

        let loaded = library.get_chapter(&chapter.chapterid).unwrap().unwrap();
        assert_eq!(loaded.text, "It begins.");
        assert_eq!(loaded.bookid, "b1");
    }

    #[test]
    fn test_require_chapter_missing() {
        let library = library();
        let err = library.require_chapter("nope").unwrap_err();
        assert!(matches!(err, FolioError::ChapterNotFound(_)));
    }

    #[test]
    fn test_delete_chapter_cascades_to_history() {
        let library = library();
        let chapter = Chapter::new("b1", "One", "draft");
        library.save_chapter(&chapter).unwrap();
        library
            .history()
            .save_revision(&chapter.chapterid, "draft")
            .unwrap();

        library.delete_chapter(&chapter.chapterid).unwrap();
        assert!(library.get_chapter(&chapter.chapterid).unwrap().is_none());
        assert!(
            library
                .history()
                .get_chain(&chapter.chapterid)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_delete_book_cascades_to_chapters_and_chains() {
        let library = library();
        let book = Book::new("u1", "Dune", "Frank Herbert");
        library.save_book(&book).unwrap();

        let one = Chapter::new(&book.bookid, "One", "first");
        let two = Chapter::new(&book.bookid, "Two", "second");
        let other = Chapter::new("other-book", "Foreign", "keep me");
        for chapter in [&one, &two, &other] {
            library.save_chapter(chapter).unwrap();
            library
                .history()
                .save_revision(&chapter.chapterid, &chapter.text)
                .unwrap();
        }

        library.delete_book(&book.bookid).unwrap();

        assert!(library.get_book(&book.bookid).unwrap().is_none());
        assert!(library.get_chapter(&one.chapterid).unwrap().is_none());
        assert!(library.history().get_chain(&two.chapterid).unwrap().is_none());

        // Chapters of other books are untouched.
        assert!(library.get_chapter(&other.chapterid).unwrap().is_some());
        assert!(
            library
                .history()
                .get_chain(&other.chapterid)
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_chapters_of_lists_only_that_book() {
        let library = library();
        let a = Chapter::new("b1", "A", "");
        let b = Chapter::new("b2", "B", "");
        library.save_chapter(&a).unwrap();
        library.save_chapter(&b).unwrap();

        let chapters = library.chapters_of("b1").unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].chapterid, a.chapterid);
    }
}
