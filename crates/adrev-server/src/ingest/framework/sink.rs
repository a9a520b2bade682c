//! Persistence sink: the stored procedure side of a file feed

use adrev_common::Result;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::db::{ProcedureCall, ProcedureExecutor};

use super::types::Watermark;

/// Where decoded records and processed filenames go
#[async_trait]
pub trait FeedSink: Send + Sync {
    type Record: Send + Sync;

    /// Filenames already ingested for this feed
    async fn load_watermark(&self) -> Result<Watermark>;

    /// Exactly one stored procedure call for one record
    async fn upsert(&self, record: &Self::Record) -> Result<()>;

    /// Record that every row of `filename` has been attempted
    async fn mark_processed(&self, filename: &str) -> Result<()>;

    /// Finalize a run after every listed object was visited
    async fn commit_catchup(&self) -> Result<()>;
}

/// Builds the upsert call for a record
///
/// Text fields are coerced to dates and numbers here. An error means the row
/// is dropped; it never aborts the file.
pub trait ToProcedure {
    fn to_procedure(&self, procedure: &'static str) -> Result<ProcedureCall>;
}

/// Stored procedure names for one file feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedProcedures {
    pub upsert: &'static str,
    pub get_filenames: &'static str,
    pub set_filename: &'static str,
    pub commit_catchup: &'static str,
}

/// Parameter carrying the processed filename
pub const FILENAME_PARAM: &str = "Filename";

/// [`FeedSink`] backed by stored procedures
pub struct ProcedureSink<R> {
    executor: Arc<dyn ProcedureExecutor>,
    procedures: FeedProcedures,
    _record: PhantomData<fn(&R)>,
}

impl<R> ProcedureSink<R> {
    pub fn new(executor: Arc<dyn ProcedureExecutor>, procedures: FeedProcedures) -> Self {
        Self {
            executor,
            procedures,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<R> FeedSink for ProcedureSink<R>
where
    R: ToProcedure + Send + Sync,
{
    type Record = R;

    #[instrument(skip(self), fields(procedure = self.procedures.get_filenames))]
    async fn load_watermark(&self) -> Result<Watermark> {
        let call = ProcedureCall::new(self.procedures.get_filenames);
        let filenames = self.executor.query_text(&call).await?;
        debug!(count = filenames.len(), "Loaded processed filenames");
        Ok(filenames.into_iter().collect())
    }

    async fn upsert(&self, record: &R) -> Result<()> {
        let call = record.to_procedure(self.procedures.upsert)?;
        self.executor.execute(&call).await?;
        Ok(())
    }

    async fn mark_processed(&self, filename: &str) -> Result<()> {
        let call = ProcedureCall::new(self.procedures.set_filename).text(FILENAME_PARAM, filename);
        self.executor.execute(&call).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(procedure = self.procedures.commit_catchup))]
    async fn commit_catchup(&self) -> Result<()> {
        self.executor
            .execute(&ProcedureCall::new(self.procedures.commit_catchup))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{RecordingExecutor, SqlParam};

    const PROCS: FeedProcedures = FeedProcedures {
        upsert: "Demo_Set",
        get_filenames: "Demo_getFilename",
        set_filename: "Demo_setFilename",
        commit_catchup: "DemoCommitCatchup",
    };

    struct Row(&'static str);

    impl ToProcedure for Row {
        fn to_procedure(&self, procedure: &'static str) -> Result<ProcedureCall> {
            Ok(ProcedureCall::new(procedure).text("Value", self.0))
        }
    }

    #[tokio::test]
    async fn test_sink_calls_named_procedures() {
        let executor = Arc::new(
            RecordingExecutor::new()
                .with_text_rows("Demo_getFilename", vec!["a.csv".into(), "b.csv".into()]),
        );
        let sink: ProcedureSink<Row> = ProcedureSink::new(executor.clone(), PROCS);

        let watermark = sink.load_watermark().await.unwrap();
        assert_eq!(watermark.len(), 2);
        assert!(watermark.contains("b.csv"));

        sink.upsert(&Row("42")).await.unwrap();
        sink.mark_processed("c.csv").await.unwrap();
        sink.commit_catchup().await.unwrap();

        let names: Vec<&str> = executor.calls().iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec!["Demo_getFilename", "Demo_Set", "Demo_setFilename", "DemoCommitCatchup"]
        );
        assert_eq!(
            executor.calls_to("Demo_setFilename")[0].param(FILENAME_PARAM),
            Some(&SqlParam::Text("c.csv".to_string()))
        );
    }

    #[tokio::test]
    async fn test_watermark_load_failure_propagates() {
        let executor = Arc::new(RecordingExecutor::new().failing("Demo_getFilename"));
        let sink: ProcedureSink<Row> = ProcedureSink::new(executor, PROCS);
        assert!(sink.load_watermark().await.is_err());
    }
}
