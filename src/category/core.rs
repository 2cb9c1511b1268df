//! Core category domain types and the lookup maps used by the views.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Identifier the remote API assigns to a category.
pub type CategoryId = i64;

/// Identifier the remote API assigns to a subcategory.
pub type SubcategoryId = i64;

/// Whether a category groups money going out or money coming in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Money spent.
    #[default]
    Expense,
    /// Money earned.
    Income,
}

impl CategoryKind {
    /// The value used in forms and query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Expense => "expense",
            CategoryKind::Income => "income",
        }
    }

    /// The label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            CategoryKind::Expense => "Expense",
            CategoryKind::Income => "Income",
        }
    }
}

impl FromStr for CategoryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "expense" => Ok(CategoryKind::Expense),
            "income" => Ok(CategoryKind::Income),
            other => Err(Error::InvalidCategoryKind(other.to_owned())),
        }
    }
}

/// A validated, non-empty category or subcategory name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is
    /// empty after trimming whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user-defined classification for transactions, e.g. "Groceries".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub kind: CategoryKind,
}

/// The second level of the category hierarchy, e.g. "Vegetables" under "Groceries".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: SubcategoryId,
    pub category_id: CategoryId,
    pub name: String,
}

/// Lookup maps derived from the category and subcategory collections.
///
/// A lookup is a snapshot: it must be rebuilt with [CategoryLookup::new]
/// whenever either source collection changes. [crate::ledger::Ledger] does
/// this every time it applies an update that touches categories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryLookup {
    categories: HashMap<CategoryId, Category>,
    subcategories: HashMap<SubcategoryId, Subcategory>,
    subcategories_by_category: HashMap<CategoryId, Vec<Subcategory>>,
}

impl CategoryLookup {
    /// Index `categories` and `subcategories` by ID.
    ///
    /// Subcategories keep the order they have in `subcategories` within each
    /// category group.
    pub fn new(categories: &[Category], subcategories: &[Subcategory]) -> Self {
        let categories_by_id = categories
            .iter()
            .map(|category| (category.id, category.clone()))
            .collect();

        let mut subcategories_by_id = HashMap::with_capacity(subcategories.len());
        let mut subcategories_by_category: HashMap<CategoryId, Vec<Subcategory>> = HashMap::new();

        for subcategory in subcategories {
            subcategories_by_id.insert(subcategory.id, subcategory.clone());
            subcategories_by_category
                .entry(subcategory.category_id)
                .or_default()
                .push(subcategory.clone());
        }

        Self {
            categories: categories_by_id,
            subcategories: subcategories_by_id,
            subcategories_by_category,
        }
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn subcategory(&self, id: SubcategoryId) -> Option<&Subcategory> {
        self.subcategories.get(&id)
    }

    /// The subcategories that belong to `category_id`, empty if there are none.
    pub fn subcategories_of(&self, category_id: CategoryId) -> &[Subcategory] {
        self.subcategories_by_category
            .get(&category_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The display name of a category, falling back to the raw ID for
    /// categories that are not (or no longer) known.
    pub fn category_label(&self, id: CategoryId) -> String {
        match self.category(id) {
            Some(category) => category.name.clone(),
            None => id.to_string(),
        }
    }

    /// The display name of a subcategory, falling back to the raw ID.
    pub fn subcategory_label(&self, id: SubcategoryId) -> String {
        match self.subcategory(id) {
            Some(subcategory) => subcategory.name.clone(),
            None => id.to_string(),
        }
    }
}
