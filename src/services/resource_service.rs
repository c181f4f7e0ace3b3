use crate::auth::AuthUser;
use crate::database::models::{NewResource, Resource};
use crate::database::Store;
use crate::error::ApiError;

pub const RESOURCE_FIELDS_REQUIRED: &str =
    "Título, descripción, URL, tipo y al menos un tag son requeridos";
pub const RESOURCES_TABLE_MISSING: &str = "La tabla resources no existe en la base de datos. Por favor, ejecuta el script SQL para crear las tablas.";
pub const RESOURCES_TABLE_HINT: &str = "Ejecuta las migraciones de la base de datos (directorio migrations/)";
pub const RESOURCE_CREATE_FAILED: &str = "Error al crear el recurso";
pub const RESOURCES_LIST_FAILED: &str = "Error al obtener los recursos";

pub async fn create(
    store: &dyn Store,
    author: &AuthUser,
    draft: &NewResource,
) -> Result<Resource, ApiError> {
    if !draft.is_complete() {
        return Err(ApiError::bad_request(RESOURCE_FIELDS_REQUIRED).with("received", draft.received()));
    }

    match store.resources_ready().await {
        Ok(true) => {}
        Ok(false) => {
            tracing::error!("resources table is missing");
            return Err(ApiError::internal(RESOURCES_TABLE_MISSING).with("hint", RESOURCES_TABLE_HINT));
        }
        Err(e) => {
            tracing::error!(error = %e, "Could not check the resources table");
            return Err(ApiError::internal(RESOURCES_TABLE_MISSING)
                .with("details", e.to_string())
                .with("hint", RESOURCES_TABLE_HINT));
        }
    }

    let resource = store
        .insert_resource(author.id, draft)
        .await
        .map_err(ApiError::store_with_details(RESOURCE_CREATE_FAILED))?;

    tracing::info!(id = %resource.id, author = %author.id, "Created resource");
    Ok(resource)
}

pub async fn list(store: &dyn Store) -> Result<Vec<Resource>, ApiError> {
    store
        .list_resources()
        .await
        .map_err(ApiError::store_with_details(RESOURCES_LIST_FAILED))
}
