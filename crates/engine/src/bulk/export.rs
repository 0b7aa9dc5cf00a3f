use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    io::Write,
};

use sea_orm::{EntityTrait, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Asset, CSV_HEADERS, EngineError, LedgerRow, ResultEngine, Transaction, assets,
    ops::{Engine, with_tx},
    transactions,
};

use super::format_row_date;

fn asset_token(
    assets: &HashMap<Uuid, Asset>,
    asset_id: Option<Uuid>,
) -> ResultEngine<Option<String>> {
    asset_id
        .map(|id| {
            assets
                .get(&id)
                .map(|asset| asset.reference().to_string())
                .ok_or_else(|| EngineError::KeyNotFound(format!("asset {id}")))
        })
        .transpose()
}

fn export_row(assets: &HashMap<Uuid, Asset>, tx: &Transaction) -> ResultEngine<LedgerRow> {
    Ok(LedgerRow {
        date: format_row_date(tx.occurred_at),
        kind: tx.kind.label().to_string(),
        category: tx.category.clone(),
        amount: tx.amount.to_string(),
        currency: Some(tx.currency.code().to_string()),
        from_asset: asset_token(assets, tx.from_asset_id)?,
        to_asset: asset_token(assets, tx.to_asset_id)?,
        description: tx.description.clone(),
    })
}

/// Tokens that more than one exported asset renders to, with the number of
/// assets behind each. Re-importing such a file merges those assets.
fn shared_tokens(assets: &HashMap<Uuid, Asset>, txs: &[Transaction]) -> Vec<(String, usize)> {
    let mut by_token: BTreeMap<String, BTreeSet<Uuid>> = BTreeMap::new();
    for id in txs
        .iter()
        .flat_map(|tx| [tx.from_asset_id, tx.to_asset_id])
        .flatten()
    {
        if let Some(asset) = assets.get(&id) {
            by_token
                .entry(asset.reference().to_string())
                .or_default()
                .insert(id);
        }
    }
    by_token
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(token, ids)| (token, ids.len()))
        .collect()
}

impl Engine {
    /// Every transaction of the user as file rows, oldest first
    /// (`occurred_at`, then `created_at`, then id). Read-only.
    pub async fn export_rows(&self, user_id: &str) -> ResultEngine<Vec<LedgerRow>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let asset_models: Vec<assets::Model> = assets::Entity::find()
                .filter(assets::Column::UserId.eq(user_id.to_string()))
                .all(&db_tx)
                .await?;
            let mut assets_by_id: HashMap<Uuid, Asset> = HashMap::new();
            for model in asset_models {
                let asset = Asset::try_from(model)?;
                assets_by_id.insert(asset.id, asset);
            }

            let tx_models: Vec<transactions::Model> = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(transactions::Column::OccurredAt)
                .order_by_asc(transactions::Column::CreatedAt)
                .order_by_asc(transactions::Column::Id)
                .all(&db_tx)
                .await?;

            let txs = tx_models
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            for (token, assets) in shared_tokens(&assets_by_id, &txs) {
                tracing::warn!(
                    user_id,
                    %token,
                    assets,
                    "assets share an export token, re-import will merge them"
                );
            }

            txs.iter()
                .map(|tx| export_row(&assets_by_id, tx))
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Write [`Engine::export_rows`] as CSV with a header row. Returns the
    /// number of data rows written.
    pub async fn export_csv<W: Write>(&self, user_id: &str, output: W) -> ResultEngine<usize> {
        let rows = self.export_rows(user_id).await?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(output);
        writer.write_record(CSV_HEADERS)?;
        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush().map_err(csv::Error::from)?;

        tracing::info!(user_id, rows = rows.len(), "csv export finished");
        Ok(rows.len())
    }
}
