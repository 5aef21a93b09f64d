use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::category::{
    Category, CategoryView, CreateCategoryRequest, UpdateCategoryRequest, OTHER_CATEGORY_ID,
    OTHER_CATEGORY_LABEL,
};
use crate::models::user::{User, UserRole};
use crate::repositories::category_repository::CategoryRepository;
use crate::repositories::default_category_repository::DefaultCategoryRepository;
use crate::repositories::transaction_repository::TransactionRepository;
use crate::repositories::RepositoryError;
use crate::scope::Scope;

/// Category service errors
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Category with this label already exists")]
    LabelTaken,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("The Other category cannot be renamed or deleted")]
    OtherImmutable,

    #[error("Not allowed to modify another Administrator's category")]
    AdminOwned,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for CategoryError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => CategoryError::CategoryNotFound,
            RepositoryError::ConstraintViolation(_) => CategoryError::LabelTaken,
            RepositoryError::DatabaseError(msg) => CategoryError::DatabaseError(msg),
        }
    }
}

/// Trait defining category service operations
///
/// Visibility follows the actor's [`Scope`]: administrators resolve categories
/// across all users, regular users only within their own. The synthetic
/// "Other" category (id 0) is always the *actor's* own, never another user's.
#[async_trait]
pub trait CategoryService: Send + Sync {
    /// Resolve a category by id for the given actor. Absence is not an error.
    async fn get_category(
        &self,
        id: i64,
        actor: &User,
    ) -> Result<Option<CategoryView>, CategoryError>;

    /// Resolve a category by label for the given actor. Absence is not an error.
    async fn get_category_by_label(
        &self,
        label: &str,
        actor: &User,
    ) -> Result<Option<CategoryView>, CategoryError>;

    /// Resolve a label strictly within `owner`'s categories, including "Other"
    async fn get_user_category_by_label(
        &self,
        owner: &User,
        label: &str,
    ) -> Result<Option<CategoryView>, CategoryError>;

    /// All of `user`'s categories in insertion order, "Other" appended last
    async fn get_user_categories(&self, user: &User) -> Result<Vec<CategoryView>, CategoryError>;

    async fn create_category(
        &self,
        user: &User,
        request: CreateCategoryRequest,
    ) -> Result<CategoryView, CategoryError>;

    async fn update_category(
        &self,
        id: i64,
        request: UpdateCategoryRequest,
        actor: &User,
    ) -> Result<CategoryView, CategoryError>;

    async fn delete_category(&self, id: i64, actor: &User) -> Result<(), CategoryError>;

    /// Replace the default-category template (admin boundary); "Other" is
    /// filtered out of the input and the in-process cache is refreshed
    async fn update_default_categories(
        &self,
        labels: Vec<String>,
    ) -> Result<Vec<String>, CategoryError>;

    /// Seed a freshly created user with one category per template label
    async fn create_default_categories(
        &self,
        user: &User,
    ) -> Result<Vec<Category>, CategoryError>;
}

/// Cached copy of the default-category template
///
/// Populated from storage on first read and overwritten whenever the template
/// is rewritten. Correctness does not depend on the cache; it only avoids a
/// template query per registration.
#[derive(Debug, Default)]
struct TemplateCache {
    labels: Vec<String>,
    fetched: bool,
}

/// Implementation of CategoryService
pub struct CategoryServiceImpl {
    category_repository: Arc<dyn CategoryRepository>,
    transaction_repository: Arc<dyn TransactionRepository>,
    default_category_repository: Arc<dyn DefaultCategoryRepository>,
    template_cache: RwLock<TemplateCache>,
}

impl CategoryServiceImpl {
    pub fn new(
        category_repository: Arc<dyn CategoryRepository>,
        transaction_repository: Arc<dyn TransactionRepository>,
        default_category_repository: Arc<dyn DefaultCategoryRepository>,
    ) -> Self {
        Self {
            category_repository,
            transaction_repository,
            default_category_repository,
            template_cache: RwLock::new(TemplateCache::default()),
        }
    }

    /// Synthesize the user's "Other" category from their uncategorized transactions
    async fn other_category_for(&self, user: &User) -> Result<CategoryView, CategoryError> {
        let transactions = self
            .transaction_repository
            .find_uncategorized(user.id)
            .await?;
        Ok(CategoryView::other(transactions))
    }

    /// Project a persisted category to its boundary shape with transactions attached
    async fn view(&self, category: Category) -> Result<CategoryView, CategoryError> {
        let transactions = self
            .transaction_repository
            .find_by_category(category.id)
            .await?;
        Ok(CategoryView {
            id: category.id,
            label: category.label,
            transactions,
        })
    }

    /// Resolve a category for mutation, returning it with its owner
    async fn resolve_for_mutation(
        &self,
        id: i64,
        actor: &User,
    ) -> Result<(Category, User), CategoryError> {
        if id == OTHER_CATEGORY_ID {
            return Err(CategoryError::OtherImmutable);
        }

        let (category, owner) = self
            .category_repository
            .find_by_id_with_owner(Scope::of(actor), id)
            .await?
            .ok_or(CategoryError::CategoryNotFound)?;

        // Admins may act on regular users' categories but not on each other's.
        if actor.id != owner.id && owner.role == UserRole::Admin {
            return Err(CategoryError::AdminOwned);
        }

        Ok((category, owner))
    }
}

#[async_trait]
impl CategoryService for CategoryServiceImpl {
    async fn get_category(
        &self,
        id: i64,
        actor: &User,
    ) -> Result<Option<CategoryView>, CategoryError> {
        if id == OTHER_CATEGORY_ID {
            return Ok(Some(self.other_category_for(actor).await?));
        }

        match self
            .category_repository
            .find_by_id(Scope::of(actor), id)
            .await?
        {
            Some(category) => Ok(Some(self.view(category).await?)),
            None => Ok(None),
        }
    }

    async fn get_category_by_label(
        &self,
        label: &str,
        actor: &User,
    ) -> Result<Option<CategoryView>, CategoryError> {
        if label == OTHER_CATEGORY_LABEL {
            return Ok(Some(self.other_category_for(actor).await?));
        }

        match self
            .category_repository
            .find_by_label(Scope::of(actor), label)
            .await?
        {
            Some(category) => Ok(Some(self.view(category).await?)),
            None => Ok(None),
        }
    }

    async fn get_user_category_by_label(
        &self,
        owner: &User,
        label: &str,
    ) -> Result<Option<CategoryView>, CategoryError> {
        if label == OTHER_CATEGORY_LABEL {
            return Ok(Some(self.other_category_for(owner).await?));
        }

        match self
            .category_repository
            .find_by_label(Scope::SelfOnly(owner.id), label)
            .await?
        {
            Some(category) => Ok(Some(self.view(category).await?)),
            None => Ok(None),
        }
    }

    async fn get_user_categories(&self, user: &User) -> Result<Vec<CategoryView>, CategoryError> {
        let categories = self.category_repository.find_by_user(user.id).await?;

        let mut views = Vec::with_capacity(categories.len() + 1);
        for category in categories {
            views.push(self.view(category).await?);
        }
        views.push(self.other_category_for(user).await?);

        Ok(views)
    }

    async fn create_category(
        &self,
        user: &User,
        request: CreateCategoryRequest,
    ) -> Result<CategoryView, CategoryError> {
        // The label lookup special-cases "Other", so creating a category named
        // "Other" is rejected here as a conflict.
        if self
            .get_user_category_by_label(user, &request.label)
            .await?
            .is_some()
        {
            return Err(CategoryError::LabelTaken);
        }

        let category = self
            .category_repository
            .create(user.id, &request.label)
            .await?;

        Ok(CategoryView {
            id: category.id,
            label: category.label,
            transactions: Vec::new(),
        })
    }

    async fn update_category(
        &self,
        id: i64,
        request: UpdateCategoryRequest,
        actor: &User,
    ) -> Result<CategoryView, CategoryError> {
        let (category, owner) = self.resolve_for_mutation(id, actor).await?;

        if let Some(new_label) = &request.label {
            if new_label != &category.label
                && self
                    .get_user_category_by_label(&owner, new_label)
                    .await?
                    .is_some()
            {
                return Err(CategoryError::LabelTaken);
            }
        }

        let merged = Category {
            label: request.label.unwrap_or(category.label),
            ..category
        };
        let saved = self.category_repository.save(&merged).await?;

        self.view(saved).await
    }

    async fn delete_category(&self, id: i64, actor: &User) -> Result<(), CategoryError> {
        let (category, _owner) = self.resolve_for_mutation(id, actor).await?;

        // The storage layer nulls the category reference on dependent
        // transactions, reclassifying them into the owner's Other category.
        self.category_repository.delete(category.id).await?;

        Ok(())
    }

    async fn update_default_categories(
        &self,
        labels: Vec<String>,
    ) -> Result<Vec<String>, CategoryError> {
        // "Other" is synthesized per user and must never appear in the template.
        let filtered: Vec<String> = labels
            .into_iter()
            .filter(|label| label != OTHER_CATEGORY_LABEL)
            .collect();

        let stored = self
            .default_category_repository
            .replace_all(&filtered)
            .await?;

        let mut cache = self.template_cache.write().await;
        cache.labels = stored.clone();
        cache.fetched = true;

        tracing::info!(count = stored.len(), "default category template replaced");

        Ok(stored)
    }

    async fn create_default_categories(
        &self,
        user: &User,
    ) -> Result<Vec<Category>, CategoryError> {
        let labels = {
            let cache = self.template_cache.read().await;
            if cache.fetched {
                cache.labels.clone()
            } else {
                drop(cache);
                let labels = self.default_category_repository.list_labels().await?;
                let mut cache = self.template_cache.write().await;
                cache.labels = labels.clone();
                cache.fetched = true;
                labels
            }
        };

        if labels.is_empty() {
            return Ok(Vec::new());
        }

        let categories = self
            .category_repository
            .create_batch(user.id, &labels)
            .await?;

        tracing::debug!(
            user_id = user.id,
            count = categories.len(),
            "seeded default categories"
        );

        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::{CreateCategoryRequest, UpdateCategoryRequest};
    use crate::models::transaction::Transaction;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    // In-memory store implementing the three repositories the category
    // service depends on. Deleting a category nulls the category reference on
    // dependent transactions, mirroring the ON DELETE SET NULL constraint.
    struct MockStore {
        users: Mutex<HashMap<i64, User>>,
        categories: Mutex<HashMap<i64, Category>>,
        transactions: Mutex<HashMap<i64, Transaction>>,
        default_labels: Mutex<Vec<String>>,
        next_category_id: AtomicI64,
        next_transaction_id: AtomicI64,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                users: Mutex::new(HashMap::new()),
                categories: Mutex::new(HashMap::new()),
                transactions: Mutex::new(HashMap::new()),
                default_labels: Mutex::new(Vec::new()),
                next_category_id: AtomicI64::new(1),
                next_transaction_id: AtomicI64::new(1),
            }
        }

        fn add_user(&self, user: &User) {
            self.users.lock().unwrap().insert(user.id, user.clone());
        }

        fn add_transaction(&self, user_id: i64, category_id: Option<i64>) -> Transaction {
            let id = self.next_transaction_id.fetch_add(1, Ordering::SeqCst);
            let transaction = Transaction {
                id,
                label: format!("transaction {}", id),
                date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                amount: -10.0,
                user_id,
                category_id,
            };
            self.transactions
                .lock()
                .unwrap()
                .insert(id, transaction.clone());
            transaction
        }

        fn set_default_labels(&self, labels: &[&str]) {
            *self.default_labels.lock().unwrap() =
                labels.iter().map(|l| l.to_string()).collect();
        }
    }

    #[async_trait]
    impl CategoryRepository for MockStore {
        async fn create(&self, user_id: i64, label: &str) -> Result<Category, RepositoryError> {
            let mut categories = self.categories.lock().unwrap();
            if categories
                .values()
                .any(|c| c.user_id == user_id && c.label == label)
            {
                return Err(RepositoryError::ConstraintViolation(
                    "duplicate label".to_string(),
                ));
            }
            let id = self.next_category_id.fetch_add(1, Ordering::SeqCst);
            let category = Category {
                id,
                label: label.to_string(),
                user_id,
            };
            categories.insert(id, category.clone());
            Ok(category)
        }

        async fn create_batch(
            &self,
            user_id: i64,
            labels: &[String],
        ) -> Result<Vec<Category>, RepositoryError> {
            let mut created = Vec::new();
            for label in labels {
                let id = self.next_category_id.fetch_add(1, Ordering::SeqCst);
                let category = Category {
                    id,
                    label: label.clone(),
                    user_id,
                };
                self.categories.lock().unwrap().insert(id, category.clone());
                created.push(category);
            }
            Ok(created)
        }

        async fn find_by_id(
            &self,
            scope: Scope,
            id: i64,
        ) -> Result<Option<Category>, RepositoryError> {
            let categories = self.categories.lock().unwrap();
            Ok(categories
                .get(&id)
                .filter(|c| scope.allows(c.user_id))
                .cloned())
        }

        async fn find_by_id_with_owner(
            &self,
            scope: Scope,
            id: i64,
        ) -> Result<Option<(Category, User)>, RepositoryError> {
            let categories = self.categories.lock().unwrap();
            let users = self.users.lock().unwrap();
            Ok(categories
                .get(&id)
                .filter(|c| scope.allows(c.user_id))
                .and_then(|c| users.get(&c.user_id).map(|u| (c.clone(), u.clone()))))
        }

        async fn find_by_label(
            &self,
            scope: Scope,
            label: &str,
        ) -> Result<Option<Category>, RepositoryError> {
            let categories = self.categories.lock().unwrap();
            let mut matches: Vec<&Category> = categories
                .values()
                .filter(|c| c.label == label && scope.allows(c.user_id))
                .collect();
            matches.sort_by_key(|c| c.id);
            Ok(matches.first().map(|c| (*c).clone()))
        }

        async fn find_by_user(&self, user_id: i64) -> Result<Vec<Category>, RepositoryError> {
            let categories = self.categories.lock().unwrap();
            let mut result: Vec<Category> = categories
                .values()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect();
            result.sort_by_key(|c| c.id);
            Ok(result)
        }

        async fn save(&self, category: &Category) -> Result<Category, RepositoryError> {
            let mut categories = self.categories.lock().unwrap();
            if !categories.contains_key(&category.id) {
                return Err(RepositoryError::NotFound);
            }
            categories.insert(category.id, category.clone());
            Ok(category.clone())
        }

        async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
            let mut categories = self.categories.lock().unwrap();
            if categories.remove(&id).is_none() {
                return Err(RepositoryError::NotFound);
            }
            let mut transactions = self.transactions.lock().unwrap();
            for transaction in transactions.values_mut() {
                if transaction.category_id == Some(id) {
                    transaction.category_id = None;
                }
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TransactionRepository for MockStore {
        async fn create(
            &self,
            user_id: i64,
            label: &str,
            date: chrono::NaiveDate,
            amount: f64,
            category_id: Option<i64>,
        ) -> Result<Transaction, RepositoryError> {
            let id = self.next_transaction_id.fetch_add(1, Ordering::SeqCst);
            let transaction = Transaction {
                id,
                label: label.to_string(),
                date,
                amount,
                user_id,
                category_id,
            };
            self.transactions
                .lock()
                .unwrap()
                .insert(id, transaction.clone());
            Ok(transaction)
        }

        async fn find_by_id(
            &self,
            scope: Scope,
            id: i64,
        ) -> Result<Option<Transaction>, RepositoryError> {
            let transactions = self.transactions.lock().unwrap();
            Ok(transactions
                .get(&id)
                .filter(|t| scope.allows(t.user_id))
                .cloned())
        }

        async fn find_by_id_with_owner(
            &self,
            scope: Scope,
            id: i64,
        ) -> Result<Option<(Transaction, User)>, RepositoryError> {
            let transactions = self.transactions.lock().unwrap();
            let users = self.users.lock().unwrap();
            Ok(transactions
                .get(&id)
                .filter(|t| scope.allows(t.user_id))
                .and_then(|t| users.get(&t.user_id).map(|u| (t.clone(), u.clone()))))
        }

        async fn find_by_user(&self, user_id: i64) -> Result<Vec<Transaction>, RepositoryError> {
            let transactions = self.transactions.lock().unwrap();
            let mut result: Vec<Transaction> = transactions
                .values()
                .filter(|t| t.user_id == user_id)
                .cloned()
                .collect();
            result.sort_by_key(|t| t.id);
            Ok(result)
        }

        async fn find_uncategorized(
            &self,
            user_id: i64,
        ) -> Result<Vec<Transaction>, RepositoryError> {
            let transactions = self.transactions.lock().unwrap();
            let mut result: Vec<Transaction> = transactions
                .values()
                .filter(|t| t.user_id == user_id && t.category_id.is_none())
                .cloned()
                .collect();
            result.sort_by_key(|t| t.id);
            Ok(result)
        }

        async fn find_by_category(
            &self,
            category_id: i64,
        ) -> Result<Vec<Transaction>, RepositoryError> {
            let transactions = self.transactions.lock().unwrap();
            let mut result: Vec<Transaction> = transactions
                .values()
                .filter(|t| t.category_id == Some(category_id))
                .cloned()
                .collect();
            result.sort_by_key(|t| t.id);
            Ok(result)
        }

        async fn find_all(&self) -> Result<Vec<Transaction>, RepositoryError> {
            let transactions = self.transactions.lock().unwrap();
            let mut result: Vec<Transaction> = transactions.values().cloned().collect();
            result.sort_by_key(|t| t.id);
            Ok(result)
        }

        async fn save(&self, transaction: &Transaction) -> Result<Transaction, RepositoryError> {
            let mut transactions = self.transactions.lock().unwrap();
            if !transactions.contains_key(&transaction.id) {
                return Err(RepositoryError::NotFound);
            }
            transactions.insert(transaction.id, transaction.clone());
            Ok(transaction.clone())
        }

        async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
            let mut transactions = self.transactions.lock().unwrap();
            if transactions.remove(&id).is_none() {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DefaultCategoryRepository for MockStore {
        async fn list_labels(&self) -> Result<Vec<String>, RepositoryError> {
            Ok(self.default_labels.lock().unwrap().clone())
        }

        async fn replace_all(&self, labels: &[String]) -> Result<Vec<String>, RepositoryError> {
            let mut stored = self.default_labels.lock().unwrap();
            *stored = labels.to_vec();
            Ok(stored.clone())
        }
    }

    fn make_user(id: i64, role: UserRole) -> User {
        User {
            id,
            username: format!("user{}", id),
            display_name: format!("User {}", id),
            role,
            password_hash: "hash".to_string(),
            refresh_token: None,
            logout_timestamp: None,
        }
    }

    fn setup() -> (Arc<MockStore>, CategoryServiceImpl) {
        let store = Arc::new(MockStore::new());
        let service = CategoryServiceImpl::new(store.clone(), store.clone(), store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn test_user_cannot_see_another_users_category() {
        let (store, service) = setup();
        let owner = make_user(1, UserRole::User);
        let stranger = make_user(2, UserRole::User);
        store.add_user(&owner);
        store.add_user(&stranger);

        let created = service
            .create_category(&owner, CreateCategoryRequest { label: "Food".into() })
            .await
            .unwrap();

        assert!(service
            .get_category(created.id, &stranger)
            .await
            .unwrap()
            .is_none());
        assert!(service
            .get_category_by_label("Food", &stranger)
            .await
            .unwrap()
            .is_none());

        // The owner still resolves it.
        assert!(service
            .get_category(created.id, &owner)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_admin_resolves_any_users_category() {
        let (store, service) = setup();
        let owner = make_user(2, UserRole::User);
        let admin = make_user(1, UserRole::Admin);
        store.add_user(&owner);
        store.add_user(&admin);

        let created = service
            .create_category(&owner, CreateCategoryRequest { label: "Food".into() })
            .await
            .unwrap();

        let found = service.get_category(created.id, &admin).await.unwrap();
        assert_eq!(found.unwrap().label, "Food");
    }

    #[tokio::test]
    async fn test_absent_category_on_read_is_not_an_error() {
        let (store, service) = setup();
        let user = make_user(1, UserRole::User);
        store.add_user(&user);

        let result = service.get_category(99, &user).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_other_category_is_synthesized_per_user() {
        let (store, service) = setup();
        let user = make_user(1, UserRole::User);
        let admin = make_user(2, UserRole::Admin);
        store.add_user(&user);
        store.add_user(&admin);

        let uncategorized = store.add_transaction(user.id, None);
        store.add_transaction(admin.id, None);

        let other = service
            .get_category(OTHER_CATEGORY_ID, &user)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(other.id, OTHER_CATEGORY_ID);
        assert_eq!(other.label, OTHER_CATEGORY_LABEL);
        // Only the actor's own uncategorized transactions, even for admins.
        assert_eq!(other.transactions.len(), 1);
        assert_eq!(other.transactions[0].id, uncategorized.id);

        let admin_other = service
            .get_category(OTHER_CATEGORY_ID, &admin)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin_other.transactions.len(), 1);
        assert_ne!(admin_other.transactions[0].id, uncategorized.id);
    }

    #[tokio::test]
    async fn test_get_user_categories_appends_other_exactly_once() {
        let (store, service) = setup();
        let user = make_user(1, UserRole::User);
        store.add_user(&user);

        for label in ["Food", "Rent", "Fun"] {
            service
                .create_category(&user, CreateCategoryRequest { label: label.into() })
                .await
                .unwrap();
        }

        let categories = service.get_user_categories(&user).await.unwrap();
        assert_eq!(categories.len(), 4);
        assert_eq!(
            categories.last().unwrap().label,
            OTHER_CATEGORY_LABEL,
            "Other must come last"
        );
        let other_count = categories.iter().filter(|c| c.is_other()).count();
        assert_eq!(other_count, 1);
        // Persisted rows keep insertion order.
        let labels: Vec<&str> = categories.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Food", "Rent", "Fun", "Other"]);
    }

    #[tokio::test]
    async fn test_duplicate_label_for_same_user_conflicts() {
        let (store, service) = setup();
        let user = make_user(1, UserRole::User);
        store.add_user(&user);

        service
            .create_category(&user, CreateCategoryRequest { label: "Food".into() })
            .await
            .unwrap();
        let result = service
            .create_category(&user, CreateCategoryRequest { label: "Food".into() })
            .await;

        assert!(matches!(result, Err(CategoryError::LabelTaken)));
    }

    #[tokio::test]
    async fn test_same_label_for_different_users_succeeds() {
        let (store, service) = setup();
        let user1 = make_user(1, UserRole::User);
        let user2 = make_user(2, UserRole::User);
        store.add_user(&user1);
        store.add_user(&user2);

        let first = service
            .create_category(&user1, CreateCategoryRequest { label: "Food".into() })
            .await
            .unwrap();
        let second = service
            .create_category(&user2, CreateCategoryRequest { label: "Food".into() })
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_creating_category_named_other_conflicts() {
        let (store, service) = setup();
        let user = make_user(1, UserRole::User);
        store.add_user(&user);

        let result = service
            .create_category(&user, CreateCategoryRequest { label: "Other".into() })
            .await;

        assert!(matches!(result, Err(CategoryError::LabelTaken)));
    }

    #[tokio::test]
    async fn test_renaming_other_fails_bad_request() {
        let (store, service) = setup();
        let user = make_user(1, UserRole::User);
        let admin = make_user(2, UserRole::Admin);
        store.add_user(&user);
        store.add_user(&admin);

        for actor in [&user, &admin] {
            let result = service
                .update_category(
                    OTHER_CATEGORY_ID,
                    UpdateCategoryRequest { label: Some("y".into()) },
                    actor,
                )
                .await;
            assert!(matches!(result, Err(CategoryError::OtherImmutable)));
        }
    }

    #[tokio::test]
    async fn test_deleting_other_fails_bad_request() {
        let (store, service) = setup();
        let user = make_user(1, UserRole::User);
        store.add_user(&user);

        let result = service.delete_category(OTHER_CATEGORY_ID, &user).await;
        assert!(matches!(result, Err(CategoryError::OtherImmutable)));
    }

    #[tokio::test]
    async fn test_update_category_renames_and_persists() {
        let (store, service) = setup();
        let user = make_user(1, UserRole::User);
        store.add_user(&user);

        let created = service
            .create_category(&user, CreateCategoryRequest { label: "Food".into() })
            .await
            .unwrap();
        let updated = service
            .update_category(
                created.id,
                UpdateCategoryRequest { label: Some("Groceries".into()) },
                &user,
            )
            .await
            .unwrap();

        assert_eq!(updated.label, "Groceries");
        let reloaded = service.get_category(created.id, &user).await.unwrap();
        assert_eq!(reloaded.unwrap().label, "Groceries");
    }

    #[tokio::test]
    async fn test_rename_collision_conflicts() {
        let (store, service) = setup();
        let user = make_user(1, UserRole::User);
        store.add_user(&user);

        service
            .create_category(&user, CreateCategoryRequest { label: "Food".into() })
            .await
            .unwrap();
        let second = service
            .create_category(&user, CreateCategoryRequest { label: "Rent".into() })
            .await
            .unwrap();

        let result = service
            .update_category(
                second.id,
                UpdateCategoryRequest { label: Some("Food".into()) },
                &user,
            )
            .await;
        assert!(matches!(result, Err(CategoryError::LabelTaken)));

        // Renaming to "Other" collides with the synthetic category.
        let result = service
            .update_category(
                second.id,
                UpdateCategoryRequest { label: Some("Other".into()) },
                &user,
            )
            .await;
        assert!(matches!(result, Err(CategoryError::LabelTaken)));
    }

    #[tokio::test]
    async fn test_admin_updates_regular_users_category() {
        let (store, service) = setup();
        let owner = make_user(2, UserRole::User);
        let admin = make_user(1, UserRole::Admin);
        store.add_user(&owner);
        store.add_user(&admin);

        let created = service
            .create_category(&owner, CreateCategoryRequest { label: "Food".into() })
            .await
            .unwrap();
        let updated = service
            .update_category(
                created.id,
                UpdateCategoryRequest { label: Some("Meals".into()) },
                &admin,
            )
            .await
            .unwrap();

        assert_eq!(updated.label, "Meals");
    }

    #[tokio::test]
    async fn test_admin_cannot_mutate_another_admins_category() {
        let (store, service) = setup();
        let admin1 = make_user(1, UserRole::Admin);
        let admin2 = make_user(2, UserRole::Admin);
        store.add_user(&admin1);
        store.add_user(&admin2);

        let created = service
            .create_category(&admin2, CreateCategoryRequest { label: "Food".into() })
            .await
            .unwrap();

        let update = service
            .update_category(
                created.id,
                UpdateCategoryRequest { label: Some("x".into()) },
                &admin1,
            )
            .await;
        assert!(matches!(update, Err(CategoryError::AdminOwned)));

        let delete = service.delete_category(created.id, &admin1).await;
        assert!(matches!(delete, Err(CategoryError::AdminOwned)));

        // Self-mutation between admins stays allowed.
        let own = service
            .update_category(
                created.id,
                UpdateCategoryRequest { label: Some("Meals".into()) },
                &admin2,
            )
            .await;
        assert!(own.is_ok());
    }

    #[tokio::test]
    async fn test_user_updating_unowned_category_is_not_found() {
        let (store, service) = setup();
        let owner = make_user(1, UserRole::User);
        let stranger = make_user(2, UserRole::User);
        store.add_user(&owner);
        store.add_user(&stranger);

        let created = service
            .create_category(&owner, CreateCategoryRequest { label: "Food".into() })
            .await
            .unwrap();

        let result = service
            .update_category(
                created.id,
                UpdateCategoryRequest { label: Some("x".into()) },
                &stranger,
            )
            .await;
        assert!(matches!(result, Err(CategoryError::CategoryNotFound)));
    }

    #[tokio::test]
    async fn test_deleting_category_reclassifies_transactions_into_other() {
        let (store, service) = setup();
        let user = make_user(1, UserRole::User);
        store.add_user(&user);

        let category = service
            .create_category(&user, CreateCategoryRequest { label: "Food".into() })
            .await
            .unwrap();
        let t1 = store.add_transaction(user.id, Some(category.id));
        let t2 = store.add_transaction(user.id, Some(category.id));
        let t3 = store.add_transaction(user.id, Some(category.id));

        service.delete_category(category.id, &user).await.unwrap();

        let other = service
            .get_category(OTHER_CATEGORY_ID, &user)
            .await
            .unwrap()
            .unwrap();
        let ids: Vec<i64> = other.transactions.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![t1.id, t2.id, t3.id]);
    }

    #[tokio::test]
    async fn test_update_default_categories_filters_other() {
        let (_store, service) = setup();

        let stored = service
            .update_default_categories(vec![
                "Food".to_string(),
                "Other".to_string(),
                "Rent".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(stored, vec!["Food".to_string(), "Rent".to_string()]);
    }

    #[tokio::test]
    async fn test_seeding_uses_template_and_is_idempotent_across_users() {
        let (store, service) = setup();
        let user1 = make_user(1, UserRole::User);
        let user2 = make_user(2, UserRole::User);
        store.add_user(&user1);
        store.add_user(&user2);
        store.set_default_labels(&["Food", "Rent"]);

        let first = service.create_default_categories(&user1).await.unwrap();
        let second = service.create_default_categories(&user2).await.unwrap();

        let labels1: Vec<&str> = first.iter().map(|c| c.label.as_str()).collect();
        let labels2: Vec<&str> = second.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels1, vec!["Food", "Rent"]);
        assert_eq!(labels1, labels2);
        assert!(first.iter().all(|c| c.user_id == user1.id));
        assert!(second.iter().all(|c| c.user_id == user2.id));
    }

    #[tokio::test]
    async fn test_template_is_cached_after_first_read() {
        let (store, service) = setup();
        let user1 = make_user(1, UserRole::User);
        let user2 = make_user(2, UserRole::User);
        store.add_user(&user1);
        store.add_user(&user2);
        store.set_default_labels(&["Food"]);

        service.create_default_categories(&user1).await.unwrap();

        // Mutating storage behind the cache's back is not observed.
        store.set_default_labels(&["Rent"]);
        let seeded = service.create_default_categories(&user2).await.unwrap();
        assert_eq!(seeded[0].label, "Food");
    }

    #[tokio::test]
    async fn test_template_update_invalidates_cache() {
        let (store, service) = setup();
        let user1 = make_user(1, UserRole::User);
        let user2 = make_user(2, UserRole::User);
        store.add_user(&user1);
        store.add_user(&user2);
        store.set_default_labels(&["Food"]);

        service.create_default_categories(&user1).await.unwrap();
        service
            .update_default_categories(vec!["Travel".to_string()])
            .await
            .unwrap();

        let seeded = service.create_default_categories(&user2).await.unwrap();
        let labels: Vec<&str> = seeded.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Travel"]);
    }

    #[tokio::test]
    async fn test_empty_template_seeds_nothing() {
        let (store, service) = setup();
        let user = make_user(1, UserRole::User);
        store.add_user(&user);

        let seeded = service.create_default_categories(&user).await.unwrap();
        assert!(seeded.is_empty());

        let categories = service.get_user_categories(&user).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert!(categories[0].is_other());
    }
}
