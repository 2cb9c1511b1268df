//! The per-session copy of the user's data and the cache that holds it.
//!
//! A [Ledger] is only ever changed through [Ledger::apply], which keeps the
//! category lookup maps in step with the category and subcategory lists.
//! Page loads re-fetch everything from the API and replace the cached copy;
//! mutations apply the API's answer to the cached copy so that the next page
//! render reflects it without another round trip.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::extract::FromRef;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    account::{Account, AccountId, ensure_default_account},
    api::ApiClient,
    category::{Category, CategoryLookup, Subcategory},
    session::{Session, SessionKey},
    transaction::{Transaction, TransactionId},
};

/// A change to a [Ledger].
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerUpdate {
    ReplaceCategories(Vec<Category>),
    ReplaceSubcategories(Vec<Subcategory>),
    ReplaceAccounts(Vec<Account>),
    ReplaceTransactions(Vec<Transaction>),
    AppendCategory(Category),
    AppendSubcategory(Subcategory),
    /// Replace the category with the same ID, e.g. after a rename.
    UpdateCategory(Category),
    /// Replace the subcategory with the same ID.
    UpdateSubcategory(Subcategory),
    /// Add newly created transactions to the front of the list, keeping their order.
    PrependTransactions(Vec<Transaction>),
    RemoveTransaction(TransactionId),
}

/// The categories, subcategories, accounts and transactions of one user.
///
/// Transactions are kept most recent first: new transactions are added to the
/// front of the list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    categories: Vec<Category>,
    subcategories: Vec<Subcategory>,
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
    lookup: CategoryLookup,
}

impl Ledger {
    /// Create a ledger from freshly fetched lists, transactions most recent first.
    pub fn new(
        categories: Vec<Category>,
        subcategories: Vec<Subcategory>,
        accounts: Vec<Account>,
        transactions: Vec<Transaction>,
    ) -> Self {
        let mut ledger = Self::default();

        for update in [
            LedgerUpdate::ReplaceCategories(categories),
            LedgerUpdate::ReplaceSubcategories(subcategories),
            LedgerUpdate::ReplaceAccounts(accounts),
            LedgerUpdate::ReplaceTransactions(transactions),
        ] {
            ledger.apply(update);
        }

        ledger
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn subcategories(&self) -> &[Subcategory] {
        &self.subcategories
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn lookup(&self) -> &CategoryLookup {
        &self.lookup
    }

    /// The account new transactions are recorded in, the first account.
    pub fn default_account_id(&self) -> Option<AccountId> {
        self.accounts.first().map(|account| account.id)
    }

    /// Apply `update` to the ledger.
    ///
    /// Updates that reference an ID the ledger does not contain are ignored.
    pub fn apply(&mut self, update: LedgerUpdate) {
        let mut categories_changed = false;

        match update {
            LedgerUpdate::ReplaceCategories(categories) => {
                self.categories = categories;
                categories_changed = true;
            }
            LedgerUpdate::ReplaceSubcategories(subcategories) => {
                self.subcategories = subcategories;
                categories_changed = true;
            }
            LedgerUpdate::ReplaceAccounts(accounts) => self.accounts = accounts,
            LedgerUpdate::ReplaceTransactions(transactions) => self.transactions = transactions,
            LedgerUpdate::AppendCategory(category) => {
                self.categories.push(category);
                categories_changed = true;
            }
            LedgerUpdate::AppendSubcategory(subcategory) => {
                self.subcategories.push(subcategory);
                categories_changed = true;
            }
            LedgerUpdate::UpdateCategory(category) => {
                if let Some(existing) = self
                    .categories
                    .iter_mut()
                    .find(|existing| existing.id == category.id)
                {
                    *existing = category;
                    categories_changed = true;
                }
            }
            LedgerUpdate::UpdateSubcategory(subcategory) => {
                if let Some(existing) = self
                    .subcategories
                    .iter_mut()
                    .find(|existing| existing.id == subcategory.id)
                {
                    *existing = subcategory;
                    categories_changed = true;
                }
            }
            LedgerUpdate::PrependTransactions(transactions) => {
                self.transactions.splice(0..0, transactions);
            }
            LedgerUpdate::RemoveTransaction(id) => {
                self.transactions.retain(|transaction| transaction.id != id);
            }
        }

        if categories_changed {
            self.lookup = CategoryLookup::new(&self.categories, &self.subcategories);
        }
    }
}

#[derive(Debug)]
struct CachedLedger {
    ledger: Ledger,
    last_used: OffsetDateTime,
}

/// The ledgers of every active session.
///
/// A ledger that has not been used for `max_idle` belongs to a session that
/// has expired, so it is dropped the next time the cache is read or written.
/// The lock is only held to read or swap a ledger, never while waiting on the API.
#[derive(Debug, Clone)]
pub struct LedgerCache {
    entries: Arc<Mutex<HashMap<SessionKey, CachedLedger>>>,
    max_idle: Duration,
}

impl LedgerCache {
    pub fn new(max_idle: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            max_idle,
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<SessionKey, CachedLedger>>, Error> {
        self.entries.lock().map_err(|_| Error::LedgerLockError)
    }

    fn is_fresh(&self, entry: &CachedLedger, now: OffsetDateTime) -> bool {
        now - entry.last_used < self.max_idle
    }

    fn get_at(&self, session: &Session, now: OffsetDateTime) -> Result<Option<Ledger>, Error> {
        let mut entries = self.entries()?;
        let key = session.key();

        let Some(entry) = entries.get_mut(&key) else {
            return Ok(None);
        };

        if !self.is_fresh(entry, now) {
            entries.remove(&key);
            return Ok(None);
        }

        entry.last_used = now;
        Ok(Some(entry.ledger.clone()))
    }

    /// Store `ledger` for `session` and drop every ledger idle for too long.
    fn insert_at(&self, session: &Session, ledger: Ledger, now: OffsetDateTime) -> Result<(), Error> {
        let mut entries = self.entries()?;

        let before = entries.len();
        entries.retain(|_, entry| self.is_fresh(entry, now));
        let swept = before - entries.len();
        if swept > 0 {
            tracing::debug!("Dropped {swept} idle cached ledger(s)");
        }

        entries.insert(
            session.key(),
            CachedLedger {
                ledger,
                last_used: now,
            },
        );

        Ok(())
    }

    pub(crate) fn insert(&self, session: &Session, ledger: Ledger) -> Result<(), Error> {
        self.insert_at(session, ledger, OffsetDateTime::now_utc())
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, session: &Session) -> bool {
        self.entries
            .lock()
            .unwrap()
            .contains_key(&session.key())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

/// The state needed by handlers that read or change the user's ledger.
#[derive(Debug, Clone)]
pub struct LedgerState {
    pub api: ApiClient,
    pub ledgers: LedgerCache,
}

impl FromRef<AppState> for LedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api: state.api.clone(),
            ledgers: state.ledgers.clone(),
        }
    }
}

#[cfg(test)]
impl LedgerState {
    /// State backed by `api` with an empty ledger cache.
    pub(crate) fn with_api(api: ApiClient) -> Self {
        Self {
            api,
            ledgers: LedgerCache::new(crate::session::DEFAULT_COOKIE_DURATION),
        }
    }
}

/// Fetch the user's data from the API.
///
/// Creates the default account if the user has no accounts.
///
/// # Errors
///
/// Returns [Error::Api] if any of the requests fail.
pub async fn fetch_ledger(api: &ApiClient, session: &Session) -> Result<Ledger, Error> {
    let (categories, subcategories, accounts, transactions) = tokio::try_join!(
        api.list_categories(session),
        api.list_subcategories(session),
        api.list_accounts(session),
        api.list_transactions(session),
    )?;

    let accounts = ensure_default_account(api, session, accounts).await?;

    Ok(Ledger::new(categories, subcategories, accounts, transactions))
}

/// Fetch a fresh copy of the user's ledger and store it in `cache`.
///
/// # Errors
///
/// Returns [Error::Api] if the ledger could not be fetched, or
/// [Error::LedgerLockError] if the cache lock is poisoned.
pub async fn refresh_ledger(
    cache: &LedgerCache,
    api: &ApiClient,
    session: &Session,
) -> Result<Ledger, Error> {
    let ledger = fetch_ledger(api, session).await?;
    cache.insert(session, ledger.clone())?;

    Ok(ledger)
}

/// Get the cached ledger for `session`, fetching it if it is not cached yet.
///
/// # Errors
///
/// See [refresh_ledger].
pub async fn cached_ledger(
    cache: &LedgerCache,
    api: &ApiClient,
    session: &Session,
) -> Result<Ledger, Error> {
    let cached = cache.get_at(session, OffsetDateTime::now_utc())?;

    match cached {
        Some(ledger) => Ok(ledger),
        None => refresh_ledger(cache, api, session).await,
    }
}

/// Apply `update` to the cached ledger of `session`, if there is one.
///
/// # Errors
///
/// Returns [Error::LedgerLockError] if the cache lock is poisoned.
pub fn apply_to_cached_ledger(
    cache: &LedgerCache,
    session: &Session,
    update: LedgerUpdate,
) -> Result<(), Error> {
    let mut entries = cache.entries()?;

    if let Some(entry) = entries.get_mut(&session.key()) {
        entry.ledger.apply(update);
    }

    Ok(())
}

/// Drop the cached ledger of `session`, e.g. when the user logs out.
pub fn evict_ledger(cache: &LedgerCache, session: &Session) {
    match cache.entries.lock() {
        Ok(mut ledgers) => {
            ledgers.remove(&session.key());
        }
        Err(error) => tracing::error!("Could not evict cached ledger: {error}"),
    }
}


#[cfg(test)]
mod cache_tests {
    use time::{Duration, OffsetDateTime};

    use crate::{
        ledger::{
            Ledger, LedgerCache, LedgerUpdate, apply_to_cached_ledger, cached_ledger,
            evict_ledger,
        },
        session::Session,
        test_utils::fake_api::FakeApi,
    };

    async fn fake_api() -> FakeApi {
        FakeApi::builder()
            .json(
                "GET",
                "/categories",
                r#"[{"id": 1, "name": "Food", "kind": "expense"}]"#,
            )
            .json("GET", "/subcategories", "[]")
            .json("GET", "/accounts", "[]")
            .json(
                "POST",
                "/accounts",
                r#"{"id": 5, "name": "Personal", "type": "other"}"#,
            )
            .json(
                "GET",
                "/transactions",
                r#"[{"id": 1, "account_id": 5, "category_id": 1, "amount": -20.0, "date": "2024-05-01"}]"#,
            )
            .start()
            .await
    }

    fn new_cache() -> LedgerCache {
        LedgerCache::new(Duration::days(1))
    }

    #[tokio::test]
    async fn loads_ledger_and_creates_default_account_once() {
        let fake = fake_api().await;
        let cache = new_cache();
        let session = Session::new("token", "alice");

        let ledger = cached_ledger(&cache, &fake.client(), &session)
            .await
            .unwrap();
        let again = cached_ledger(&cache, &fake.client(), &session)
            .await
            .unwrap();

        assert_eq!(ledger.default_account_id(), Some(5));
        assert_eq!(ledger, again);
        let account_creations = fake
            .requests()
            .iter()
            .filter(|request| request.method == "POST" && request.path == "/accounts")
            .count();
        assert_eq!(account_creations, 1);
    }

    #[tokio::test]
    async fn updates_apply_to_cached_ledger() {
        let fake = fake_api().await;
        let cache = new_cache();
        let session = Session::new("token", "alice");
        cached_ledger(&cache, &fake.client(), &session)
            .await
            .unwrap();

        apply_to_cached_ledger(&cache, &session, LedgerUpdate::RemoveTransaction(1)).unwrap();

        let ledger = cached_ledger(&cache, &fake.client(), &session)
            .await
            .unwrap();
        assert!(ledger.transactions().is_empty());
    }

    #[tokio::test]
    async fn evicted_ledger_is_fetched_again() {
        let fake = fake_api().await;
        let cache = new_cache();
        let session = Session::new("token", "alice");
        cached_ledger(&cache, &fake.client(), &session)
            .await
            .unwrap();

        evict_ledger(&cache, &session);

        assert_eq!(cache.len(), 0);
        cached_ledger(&cache, &fake.client(), &session)
            .await
            .unwrap();
        let category_fetches = fake
            .requests()
            .iter()
            .filter(|request| request.path == "/categories")
            .count();
        assert_eq!(category_fetches, 2);
    }

    #[test]
    fn idle_ledger_is_not_served() {
        let cache = new_cache();
        let session = Session::new("token", "alice");
        let cached_at = OffsetDateTime::now_utc() - Duration::days(2);
        cache
            .insert_at(&session, Ledger::default(), cached_at)
            .unwrap();

        let cached = cache.get_at(&session, OffsetDateTime::now_utc()).unwrap();

        assert_eq!(cached, None);
        assert!(!cache.contains(&session));
    }

    #[test]
    fn reading_a_ledger_keeps_it_fresh() {
        let cache = new_cache();
        let session = Session::new("token", "alice");
        let start = OffsetDateTime::now_utc();
        cache.insert_at(&session, Ledger::default(), start).unwrap();

        let read_at = start + Duration::hours(20);
        assert!(cache.get_at(&session, read_at).unwrap().is_some());

        let later = start + Duration::hours(40);
        assert!(cache.get_at(&session, later).unwrap().is_some());
    }

    #[test]
    fn storing_a_ledger_sweeps_idle_sessions() {
        let cache = new_cache();
        let idle = Session::new("token-idle", "alice");
        let active = Session::new("token-active", "bob");
        let now = OffsetDateTime::now_utc();
        cache
            .insert_at(&idle, Ledger::default(), now - Duration::days(2))
            .unwrap();

        cache.insert_at(&active, Ledger::default(), now).unwrap();

        assert!(!cache.contains(&idle));
        assert!(cache.contains(&active));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn sessions_do_not_share_ledgers() {
        let fake = fake_api().await;
        let cache = new_cache();
        let alice = Session::new("token-a", "alice");
        let bob = Session::new("token-b", "bob");
        cached_ledger(&cache, &fake.client(), &alice)
            .await
            .unwrap();

        apply_to_cached_ledger(&cache, &bob, LedgerUpdate::RemoveTransaction(1)).unwrap();

        assert_eq!(cache.len(), 1);
        let ledger = cached_ledger(&cache, &fake.client(), &alice)
            .await
            .unwrap();
        assert_eq!(ledger.transactions().len(), 1);
    }
}
