use std::io::Read;

use crate::{
    EngineError, ImportReport, LedgerRow, ResultEngine,
    ops::{Engine, ResolveMode, retry_on_conflict},
};

use super::Columns;

impl Engine {
    /// Import rows into the user's ledger, in order.
    ///
    /// Each row runs in its own DB transaction: assets named by its tokens are
    /// looked up among the active ones and created when missing, then the
    /// transaction is validated and applied. A failing row is rolled back
    /// (including any asset it created) and reported; the batch goes on.
    ///
    /// Only a missing user fails the whole call.
    pub async fn import_rows(
        &self,
        user_id: &str,
        rows: Vec<LedgerRow>,
    ) -> ResultEngine<ImportReport> {
        self.require_user(&self.database, user_id).await?;

        let mut report = ImportReport::default();
        for (idx, row) in rows.into_iter().enumerate() {
            let outcome = self.import_row(user_id, &row).await;
            report.record(idx + 1, row, outcome);
        }

        tracing::info!(
            user_id,
            created = report.created_count,
            skipped = report.skipped_count,
            "import finished"
        );
        Ok(report)
    }

    /// Import a CSV file with a header row.
    ///
    /// Columns are matched by header name, case-insensitively; `Date`, `Type`
    /// and `Amount` are required. A missing header or required column fails
    /// the whole import before any row runs. Records are read and imported one
    /// at a time; a record the CSV reader cannot decode, or one that is not
    /// UTF-8, is reported as a row failure carrying what could be read of it.
    pub async fn import_csv<R: Read>(
        &self,
        user_id: &str,
        input: R,
    ) -> ResultEngine<ImportReport> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let header = reader.headers()?.clone();
        if header.iter().all(|column| column.trim().is_empty()) {
            return Err(EngineError::InvalidHeader("missing header row".to_string()));
        }
        let columns = Columns::from_header(&header)?;

        self.require_user(&self.database, user_id).await?;

        let mut report = ImportReport::default();
        for (idx, record) in reader.byte_records().enumerate() {
            let row_index = idx + 1;
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    report.record(row_index, LedgerRow::default(), Err(err.into()));
                    continue;
                }
            };
            let row = columns.row(&record);
            let utf8 = record
                .iter()
                .try_for_each(|field| std::str::from_utf8(field).map(drop));
            let outcome = match utf8 {
                Ok(()) => self.import_row(user_id, &row).await,
                Err(err) => Err(EngineError::InvalidEncoding(format!(
                    "row is not valid UTF-8: {err}"
                ))),
            };
            report.record(row_index, row, outcome);
        }

        tracing::info!(
            user_id,
            created = report.created_count,
            skipped = report.skipped_count,
            "csv import finished"
        );
        Ok(report)
    }

    async fn import_row(&self, user_id: &str, row: &LedgerRow) -> ResultEngine<()> {
        let cmd = row.to_command(user_id, self.config.default_currency)?;
        let mode =
            ResolveMode::CreateMissing(cmd.currency.unwrap_or(self.config.default_currency));
        retry_on_conflict!(self, "import_row", self.try_create_transaction(&cmd, mode))?;
        Ok(())
    }
}
