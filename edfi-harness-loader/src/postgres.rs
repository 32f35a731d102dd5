use edfi_harness_types::{RequestDescriptor, RequestErr, RequestExecutor, Response};
use serde_json::{Map, Value as Json};
use sqlx::{
    postgres::{PgColumn, PgConnectOptions, PgPool, PgPoolOptions, PgRow},
    Column, Row, TypeInfo,
};
use std::time::Duration;

use crate::{loader_err, LoaderErr, LoaderResult};

/// Reads one page of the `records` table per request.
pub const PAGE_QUERY: &str = "SELECT * FROM records ORDER BY id OFFSET $1 LIMIT $2";

#[derive(Debug, Clone)]
/// Where the database is and how to log in.
pub struct PostgresOptions {
    host: String,
    port: u16,
    user: String,
    password: String,
    database: String,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 5432,
            user: "postgres".to_owned(),
            password: String::new(),
            database: "testdb".to_owned(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl PostgresOptions {
    pub fn set_host<S: Into<String>>(&mut self, v: S) -> &mut Self {
        self.host = v.into();
        self
    }
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn set_port(&mut self, v: u16) -> &mut Self {
        self.port = v;
        self
    }
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn set_user<S: Into<String>>(&mut self, v: S) -> &mut Self {
        self.user = v.into();
        self
    }
    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn set_password<S: Into<String>>(&mut self, v: S) -> &mut Self {
        self.password = v.into();
        self
    }

    pub fn set_database<S: Into<String>>(&mut self, v: S) -> &mut Self {
        self.database = v.into();
        self
    }
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Requests of a batch run concurrently; at most this many run a query at once.
    pub fn set_max_connections(&mut self, v: u32) -> &mut Self {
        self.max_connections = v;
        self
    }
    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    /// How long a request waits for a connection before failing.
    pub fn set_acquire_timeout(&mut self, v: Duration) -> &mut Self {
        self.acquire_timeout = v;
        self
    }
    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }

    /// The database URL without the password, fit for logging.
    pub fn display_url(&self) -> String {
        format!(
            "postgres://{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }

    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
    }
}

#[derive(Debug, Clone)]
/// Reads one page of a PostgreSQL table per request with [`PAGE_QUERY`]. Rows are returned as a JSON array
/// of objects keyed by column name.
pub struct PostgresPager {
    pool: PgPool,
}

impl PostgresPager {
    /// Connect eagerly, so a wrong address or password fails here rather than on every request.
    pub async fn connect(options: &PostgresOptions) -> LoaderResult<Self> {
        log::debug!("Connecting to {}", options.display_url());
        let pool = options
            .pool_options()
            .connect_with(options.connect_options())
            .await
            .map_err(|e| loader_err(LoaderErr::Sql(e)))?;
        Ok(Self { pool })
    }

    /// Connections are opened on the first request.
    pub fn connect_lazy(options: &PostgresOptions) -> Self {
        let pool = options
            .pool_options()
            .connect_lazy_with(options.connect_options());
        Self { pool }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn query(&self) -> &'static str {
        PAGE_QUERY
    }

    /// Close every connection. Requests after this fail.
    pub async fn close(&self) {
        self.pool.close().await
    }
}

impl RequestExecutor for PostgresPager {
    async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Response, RequestErr> {
        let offset = bind_value(descriptor.offset())?;
        let limit = bind_value(descriptor.size())?;
        let rows = sqlx::query(PAGE_QUERY)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(request_err)?;
        Ok(Response::Json(Json::Array(
            rows.iter().map(row_json).collect(),
        )))
    }
}

fn bind_value(v: u64) -> Result<i64, RequestErr> {
    i64::try_from(v).map_err(|_| RequestErr::InvalidResponse(format!("{v} is out of range for BIGINT")))
}

fn request_err(e: sqlx::Error) -> RequestErr {
    match e {
        sqlx::Error::Database(e) => RequestErr::Database(e.to_string()),
        e @ (sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_)) => RequestErr::Transport(e.to_string()),
        e => RequestErr::InvalidResponse(e.to_string()),
    }
}

fn row_json(row: &PgRow) -> Json {
    let object: Map<String, Json> = row
        .columns()
        .iter()
        .map(|column| (column.name().to_owned(), column_json(row, column)))
        .collect();
    Json::Object(object)
}

/// Columns of a type with no JSON counterpart read as `null`.
fn column_json(row: &PgRow, column: &PgColumn) -> Json {
    let i = column.ordinal();
    let value = match column.type_info().name() {
        "BOOL" => row.try_get::<Option<bool>, _>(i).ok().flatten().map(Json::from),
        "INT2" => row.try_get::<Option<i16>, _>(i).ok().flatten().map(Json::from),
        "INT4" => row.try_get::<Option<i32>, _>(i).ok().flatten().map(Json::from),
        "INT8" => row.try_get::<Option<i64>, _>(i).ok().flatten().map(Json::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(i)
            .ok()
            .flatten()
            .map(|v| Json::from(f64::from(v))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(i).ok().flatten().map(Json::from),
        "JSON" | "JSONB" => row.try_get::<Option<Json>, _>(i).ok().flatten(),
        _ => row.try_get::<Option<String>, _>(i).ok().flatten().map(Json::from),
    };
    value.unwrap_or(Json::Null)
}
