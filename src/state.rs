use std::sync::Arc;

use crate::services::{Accounts, Analytics, Catalog, EventBus, Inventory, TokenKeys};
use crate::store::Stores;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub inventory: Inventory,
    pub accounts: Accounts,
    pub analytics: Analytics,
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    pub fn new(stores: Stores, tokens: TokenKeys, events: EventBus) -> Self {
        let tokens = Arc::new(tokens);
        Self {
            catalog: Catalog::new(stores.products.clone(), events.clone()),
            inventory: Inventory::new(stores.products.clone(), stores.orders.clone(), events.clone()),
            accounts: Accounts::new(stores.users.clone(), tokens.clone(), events),
            analytics: Analytics::new(stores.products, stores.users, stores.orders),
            tokens,
        }
    }
}
