//! SQL Server executor backed by `tiberius`

use adrev_common::{AdrevError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::borrow::Cow;
use tiberius::{Client, ColumnData, Config, ToSql};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info, instrument};

use super::{ProcedureCall, ProcedureExecutor, SqlParam};

/// Single SQL Server connection shared by the ingestion worker
///
/// Runs are sequential, so one connection behind a mutex is enough.
pub struct SqlServerExecutor {
    client: Mutex<Client<Compat<TcpStream>>>,
}

impl SqlServerExecutor {
    /// Connect using an ADO.NET style connection string
    #[instrument(skip_all)]
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let config = Config::from_ado_string(connection_string)
            .map_err(|e| AdrevError::Config(format!("Invalid SQL Server connection string: {}", e)))?;

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| AdrevError::transport(format!("Failed to reach SQL Server: {}", e)))?;
        tcp.set_nodelay(true)?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(database_error)?;

        info!("SQL Server connection established");

        Ok(Self {
            client: Mutex::new(client),
        })
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> ColumnData<'_> {
        match self {
            SqlParam::Text(value) => ColumnData::String(Some(Cow::Borrowed(value.as_str()))),
            SqlParam::Date(value) => value.to_sql(),
            SqlParam::Int(value) => ColumnData::I64(Some(*value)),
            SqlParam::Decimal(value) => ColumnData::F64(Some(*value)),
        }
    }
}

fn bind(call: &ProcedureCall) -> Vec<&dyn ToSql> {
    call.params
        .iter()
        .map(|(_, value)| value as &dyn ToSql)
        .collect()
}

fn database_error(e: tiberius::error::Error) -> AdrevError {
    AdrevError::Database(e.to_string())
}

#[async_trait]
impl ProcedureExecutor for SqlServerExecutor {
    #[instrument(skip_all, fields(procedure = call.name))]
    async fn execute(&self, call: &ProcedureCall) -> Result<u64> {
        let sql = call.sql();
        let params = bind(call);

        let mut client = self.client.lock().await;
        let result = client
            .execute(sql, &params)
            .await
            .map_err(database_error)?;

        let total = result.total();
        debug!(rows = total, "Procedure executed");
        Ok(total)
    }

    #[instrument(skip_all, fields(procedure = call.name))]
    async fn query_text(&self, call: &ProcedureCall) -> Result<Vec<String>> {
        let sql = call.sql();
        let params = bind(call);

        let mut client = self.client.lock().await;
        let rows = client
            .query(sql, &params)
            .await
            .map_err(database_error)?
            .into_first_result()
            .await
            .map_err(database_error)?;

        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(value) = row.try_get::<&str, _>(0).map_err(database_error)? {
                values.push(value.to_string());
            }
        }

        debug!(rows = values.len(), "Procedure returned text column");
        Ok(values)
    }

    #[instrument(skip_all, fields(procedure = call.name))]
    async fn query_date(&self, call: &ProcedureCall) -> Result<Option<NaiveDate>> {
        let sql = call.sql();
        let params = bind(call);

        let mut client = self.client.lock().await;
        let row = client
            .query(sql, &params)
            .await
            .map_err(database_error)?
            .into_row()
            .await
            .map_err(database_error)?;

        match row {
            Some(row) => row.try_get::<NaiveDate, _>(0).map_err(database_error),
            None => Ok(None),
        }
    }
}
