use crate::store::ProductStore;

pub(crate) struct AppState {
    pub(crate) store: ProductStore,
}
