use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::api::{NewSavedBook, SavedBook, UserId};
use crate::saved_books_repository::{SavedBooksRepository, SavedBooksRepositoryError};

#[derive(Default)]
pub struct InMemorySavedBooksRepository {
    saved_books: parking_lot::RwLock<HashMap<UserId, Vec<SavedBook>>>,
    id_sequence_generator: AtomicU64,
}

#[async_trait::async_trait]
impl SavedBooksRepository for InMemorySavedBooksRepository {
    async fn add_saved_book(
        &self,
        user_id: &UserId,
        book: NewSavedBook,
    ) -> Result<SavedBook, SavedBooksRepositoryError> {
        let mut locked_books = self.saved_books.write();
        let collection = locked_books.entry(user_id.clone()).or_default();

        if collection
            .iter()
            .any(|saved| saved.is_same_book(&book.title, &book.author))
        {
            return Err(SavedBooksRepositoryError::AlreadySaved(book.title));
        }

        let id = self.id_sequence_generator.fetch_add(1, Ordering::Relaxed) + 1;
        let saved_book = SavedBook::from_new(id.to_string(), user_id.clone(), book, Utc::now());
        collection.insert(0, saved_book.clone());
        Ok(saved_book)
    }

    async fn list_saved_books(&self, user_id: &UserId) -> Vec<SavedBook> {
        self.saved_books
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn remove_saved_book(
        &self,
        user_id: &UserId,
        id: &str,
    ) -> Result<(), SavedBooksRepositoryError> {
        let mut locked_books = self.saved_books.write();
        let collection = locked_books.entry(user_id.clone()).or_default();

        match collection.iter().position(|saved| saved.id == id) {
            Some(index) => {
                collection.remove(index);
                Ok(())
            }
            None => Err(SavedBooksRepositoryError::NotFound(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests_in_memory_saved_books_repository {
    use super::*;

    fn new_book(title: &str, author: &str) -> NewSavedBook {
        NewSavedBook {
            title: title.to_string(),
            author: author.to_string(),
            genre: "Unknown".to_string(),
            summary: "".to_string(),
            cover_image_url: None,
            rating: None,
            isbn: None,
            publication_year: None,
        }
    }

    #[tokio::test]
    /// Simple test to cover collection management
    /// Combined into big unit test to avoid duplicate setup
    /// 1. Lists empty collection
    /// 2. Saves two books, newest is listed first
    /// 3. Saving the same book with different case is rejected
    /// 4. Collections of different users are separate
    /// 5. Removes a book, removing it again is not found
    async fn test_saved_books_management() {
        let repository = InMemorySavedBooksRepository::default();
        let user = "user1".to_string();
        let other_user = "user2".to_string();

        assert_eq!(repository.list_saved_books(&user).await, vec![]);

        let first = repository
            .add_saved_book(&user, new_book("Dune", "Frank Herbert"))
            .await
            .unwrap();
        let second = repository
            .add_saved_book(&user, new_book("Emma", "Jane Austen"))
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(first.user_id, user);

        let listed = repository.list_saved_books(&user).await;
        assert_eq!(listed, vec![second.clone(), first.clone()]);

        let duplicate = repository
            .add_saved_book(&user, new_book("DUNE", "frank herbert"))
            .await;
        assert!(matches!(
            duplicate,
            Err(SavedBooksRepositoryError::AlreadySaved(..))
        ));

        repository
            .add_saved_book(&other_user, new_book("Dune", "Frank Herbert"))
            .await
            .unwrap();
        assert_eq!(repository.list_saved_books(&other_user).await.len(), 1);

        repository
            .remove_saved_book(&user, &first.id)
            .await
            .unwrap();
        assert_eq!(repository.list_saved_books(&user).await, vec![second]);

        let missing = repository.remove_saved_book(&user, &first.id).await;
        assert!(matches!(
            missing,
            Err(SavedBooksRepositoryError::NotFound(..))
        ));
    }
}
