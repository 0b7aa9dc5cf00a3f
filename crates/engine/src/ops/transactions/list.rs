use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Transaction, TransactionKind, transactions};

use super::super::{Engine, with_tx};

/// Filters for listing transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// If present, acts as an allow-list of kinds to return.
    pub kinds: Option<Vec<TransactionKind>>,
    /// Only transactions touching this asset, on either side.
    pub asset_id: Option<Uuid>,
}

impl TransactionListFilter {
    /// The filter as a query condition on the user's transactions.
    fn condition(&self, user_id: &str) -> ResultEngine<Condition> {
        let mut condition = Condition::all().add(transactions::Column::UserId.eq(user_id));

        match (self.from, self.to) {
            (Some(from), Some(to)) if from >= to => {
                return Err(EngineError::InvalidDate(
                    "invalid range: from must be < to".to_string(),
                ));
            }
            (from, to) => {
                if let Some(from) = from {
                    condition = condition.add(transactions::Column::OccurredAt.gte(from));
                }
                if let Some(to) = to {
                    condition = condition.add(transactions::Column::OccurredAt.lt(to));
                }
            }
        }

        if let Some(kinds) = &self.kinds {
            if kinds.is_empty() {
                return Err(EngineError::InvalidKind(
                    "kinds must not be empty".to_string(),
                ));
            }
            condition = condition
                .add(transactions::Column::Kind.is_in(kinds.iter().map(|kind| kind.as_str())));
        }

        if let Some(asset_id) = self.asset_id {
            let asset_id = asset_id.to_string();
            condition = condition.add(
                Condition::any()
                    .add(transactions::Column::FromAssetId.eq(asset_id.clone()))
                    .add(transactions::Column::ToAssetId.eq(asset_id)),
            );
        }
        Ok(condition)
    }
}

/// Position after the last transaction of a page.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
struct PageCursor {
    occurred_at: DateTime<Utc>,
    id: Uuid,
}

impl PageCursor {
    fn encode(&self) -> ResultEngine<String> {
        serde_json::to_vec(self)
            .map(|json| URL_SAFE_NO_PAD.encode(json))
            .map_err(|_| invalid_cursor())
    }

    fn decode(token: &str) -> ResultEngine<Self> {
        let json = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|_| invalid_cursor())?;
        serde_json::from_slice(&json).map_err(|_| invalid_cursor())
    }

    /// Everything strictly older in `(occurred_at DESC, id DESC)` order.
    fn older(&self) -> Condition {
        Condition::any()
            .add(transactions::Column::OccurredAt.lt(self.occurred_at))
            .add(
                Condition::all()
                    .add(transactions::Column::OccurredAt.eq(self.occurred_at))
                    .add(transactions::Column::Id.lt(self.id.to_string())),
            )
    }
}

fn invalid_cursor() -> EngineError {
    EngineError::InvalidCursor("invalid transactions cursor".to_string())
}

impl Engine {
    /// One page of the user's transactions, newest first.
    ///
    /// Order is `(occurred_at DESC, id DESC)`. The returned cursor is `None`
    /// on the last page.
    pub async fn list_transactions_page(
        &self,
        user_id: &str,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        let mut condition = filter.condition(user_id)?;
        if let Some(token) = cursor {
            condition = condition.add(PageCursor::decode(token)?.older());
        }

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            // One extra row tells whether another page exists.
            let mut models: Vec<transactions::Model> = transactions::Entity::find()
                .filter(condition)
                .order_by_desc(transactions::Column::OccurredAt)
                .order_by_desc(transactions::Column::Id)
                .limit(limit.saturating_add(1))
                .all(&db_tx)
                .await?;
            let has_more = models.len() as u64 > limit;
            models.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

            let page = models
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            let next = match page.last() {
                Some(last) if has_more => Some(
                    PageCursor {
                        occurred_at: last.occurred_at,
                        id: last.id,
                    }
                    .encode()?,
                ),
                _ => None,
            };
            Ok((page, next))
        })
    }
}
