//! Category tree shared by pickers and browse screens.

use parking_lot::Mutex;

use crate::services::{Api, CategoryService};
use crate::types::{Category, Subcategory};

#[derive(Debug, Default)]
struct State {
    categories: Vec<Category>,
    loading: bool,
    error: Option<String>,
}

/// Category tree for pickers and browse screens.
pub struct CategoriesStore {
    service: CategoryService,
    state: Mutex<State>,
}

impl CategoriesStore {
    pub fn new(api: Api) -> Self {
        Self {
            service: CategoryService::new(api),
            state: Mutex::new(State::default()),
        }
    }

    /// Fetch the tree. A call made while another is running does nothing.
    /// On failure the previously loaded tree is kept.
    pub async fn load(&self) {
        {
            let mut state = self.state.lock();
            if state.loading {
                return;
            }
            state.loading = true;
            state.error = None;
        }

        let envelope = self.service.categories().await;

        let mut state = self.state.lock();
        state.loading = false;
        match envelope.into_result() {
            Ok(categories) => {
                tracing::debug!(count = categories.len(), "categories loaded");
                state.categories = categories;
            }
            Err(message) => state.error = Some(message),
        }
    }

    pub async fn retry(&self) {
        self.load().await;
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.categories.clear();
        state.error = None;
    }

    pub fn categories(&self) -> Vec<Category> {
        self.state.lock().categories.clone()
    }

    pub fn category_by_id(&self, id: u64) -> Option<Category> {
        self.state
            .lock()
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn subcategory_by_id(&self, id: u64) -> Option<Subcategory> {
        self.state
            .lock()
            .categories
            .iter()
            .flat_map(|c| c.subcategories.iter())
            .find(|s| s.id == id)
            .cloned()
    }

    pub fn all_subcategories(&self) -> Vec<Subcategory> {
        self.state
            .lock()
            .categories
            .iter()
            .flat_map(|c| c.subcategories.iter().cloned())
            .collect()
    }

    pub fn has_categories(&self) -> bool {
        !self.state.lock().categories.is_empty()
    }

    pub fn total_subcategories(&self) -> usize {
        self.state
            .lock()
            .categories
            .iter()
            .map(|c| c.subcategories.len())
            .sum()
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn has_error(&self) -> bool {
        self.state.lock().error.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }
}
