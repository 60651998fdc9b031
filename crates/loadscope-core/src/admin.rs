// ── Admin facade ──
//
// Couples catalog writes with the display-bus bookkeeping they imply.
// The REST collaborator calls these and translates `CoreError` through
// `http_status()`; it never touches the store or the bus directly.

use std::sync::Arc;

use tracing::info;

use crate::display::DisplayBus;
use crate::error::CoreError;
use crate::model::DataType;
use crate::store::TrafficStore;

pub struct AdminApi {
    store: Arc<TrafficStore>,
    bus: Arc<DisplayBus>,
}

impl AdminApi {
    pub fn new(store: Arc<TrafficStore>, bus: Arc<DisplayBus>) -> Self {
        Self { store, bus }
    }

    pub async fn list_data_types(&self) -> Result<Vec<DataType>, CoreError> {
        self.store.list_data_types().await
    }

    pub async fn get_data_type(&self, id: i64) -> Result<DataType, CoreError> {
        self.store.get_data_type(id).await
    }

    pub async fn create_data_type(&self, spec: DataType) -> Result<DataType, CoreError> {
        let created = self.store.create_data_type(&spec).await?;
        info!(id = created.id, name = %created.name, "data type created");
        Ok(created)
    }

    /// Update a data type and mirror the change on the display bus:
    /// renames rewrite entry names, a disabled forecast drops the
    /// prediction entries.
    pub async fn update_data_type(&self, id: i64, spec: DataType) -> Result<DataType, CoreError> {
        let previous = self.store.get_data_type(id).await?;
        let updated = self.store.update_data_type(id, &spec).await?;

        if previous.name != updated.name {
            self.bus.rename_class(id, &updated.name).await;
        }
        if previous.forecasting && !updated.forecasting {
            self.bus.disable_forecast(id).await;
        }
        info!(id, name = %updated.name, "data type updated");
        Ok(updated)
    }

    /// Delete a data type (cascading in the store) and drop its display
    /// entries.
    pub async fn delete_data_type(&self, id: i64) -> Result<DataType, CoreError> {
        let removed = self.store.delete_data_type(id).await?;
        self.bus.remove_class(id).await;
        info!(id, name = %removed.name, "data type deleted");
        Ok(removed)
    }
}
