//! Index lifecycle.

use tracing::info;

use crate::destination::Destination;
use crate::error::EtlResult;
use crate::schema::Schema;

/// Drops `index_name` if it exists and creates it again, empty, with mappings from `schema`.
///
/// Every load starts from a fresh index, so no document or mapping survives from an earlier run.
pub async fn recreate_index<D>(destination: &D, index_name: &str, schema: &Schema) -> EtlResult<()>
where
    D: Destination,
{
    info!(index_name, destination = D::name(), "recreating index");

    destination.delete_index(index_name).await?;
    destination
        .create_index(index_name, &schema.index_mappings())
        .await?;

    Ok(())
}
