use std::time::Duration;

use _model::{LatLng, StoreCollection};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::Args;
use serde_json::Value;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use tracing::{debug, info};

use super::{Radius, StoreRepository};

/// Connection settings, normally supplied by the hosting environment.
#[derive(Clone, Debug, Default, Args)]
pub struct DatabaseArgs {
    #[arg(long, env = "DB_USER", hide_env_values = true)]
    pub db_user: Option<String>,
    #[arg(long, env = "DB_PASS", hide_env_values = true)]
    pub db_pass: Option<String>,
    #[arg(long, env = "DB_NAME")]
    pub db_name: Option<String>,
    /// Connect over TCP, e.g. `127.0.0.1`.
    #[arg(long, env = "DB_TCP_HOST")]
    pub db_tcp_host: Option<String>,
    #[arg(long, env = "DB_PORT")]
    pub db_port: Option<u16>,
    /// Directory holding the server's Unix socket.
    #[arg(long, env = "INSTANCE_UNIX_SOCKET")]
    pub instance_unix_socket: Option<String>,
}

impl DatabaseArgs {
    pub fn is_configured(&self) -> bool {
        self.db_tcp_host.is_some() || self.instance_unix_socket.is_some()
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        let options = PgConnectOptions::new()
            .username(required("DB_USER", &self.db_user)?)
            .password(required("DB_PASS", &self.db_pass)?)
            .database(required("DB_NAME", &self.db_name)?);

        Ok(match (&self.db_tcp_host, &self.instance_unix_socket) {
            (Some(host), _) => match self.db_port {
                Some(port) => options.host(host).port(port),
                None => bail!("DB_PORT environment variable not set"),
            },
            (None, Some(socket)) => options.socket(socket),
            (None, None) => bail!("Neither DB_TCP_HOST nor INSTANCE_UNIX_SOCKET is set"),
        })
    }
}

fn required<'a>(name: &str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref() {
        Some(x) if !x.is_empty() => Ok(x),
        _ => bail!("{name} environment variable not set"),
    }
}

pub struct PostgisRepository {
    pool: PgPool,
    query: String,
    radius: Radius,
}

impl PostgisRepository {
    pub async fn connect(args: &DatabaseArgs, table: &str, radius: Radius) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(7)
            .min_connections(5)
            .max_lifetime(Duration::from_secs(1800))
            .connect_with(args.connect_options()?)
            .await
            .context("Unable to connect to database")?;
        info!("Connected to database, querying table {table}");
        Ok(Self {
            pool,
            query: nearby_query(table)?,
            radius,
        })
    }
}

#[async_trait]
impl StoreRepository for PostgisRepository {
    async fn nearby(&self, center: LatLng) -> Result<StoreCollection> {
        debug!("Querying stores near {center}");
        let raw: Option<Value> = sqlx::query_scalar(&self.query)
            .bind(center.lng)
            .bind(center.lat)
            .bind(self.radius.limit as i64)
            .bind(self.radius.meters)
            .fetch_one(&self.pool)
            .await?;
        Ok(match raw {
            Some(x) => serde_json::from_value(x)?,
            None => StoreCollection::default(),
        })
    }
}

/// One row holding the whole FeatureCollection; `$1` lng, `$2` lat,
/// `$3` limit, `$4` radius in meters.
fn nearby_query(table: &str) -> Result<String> {
    if table.is_empty()
        || !table
            .chars()
            .all(|x| x.is_ascii_alphanumeric() || x == '_' || x == '.')
    {
        bail!("invalid table name: {table}");
    }

    Ok(format!(
        r#"
        SELECT jsonb_build_object(
            'type', 'FeatureCollection',
            'features', coalesce(jsonb_agg(feature), '[]'::jsonb)
        )
        FROM (
            SELECT jsonb_build_object(
                'type', 'Feature',
                'id', ogc_fid,
                'geometry', ST_AsGeoJSON(wkb_geometry)::jsonb,
                'properties', to_jsonb(row) - 'ogc_fid' - 'wkb_geometry'
            ) AS feature
            FROM (
                SELECT *,
                    ST_Distance(
                        wkb_geometry::geography,
                        ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography
                    ) AS distance
                FROM {table}
                ORDER BY distance
                LIMIT $3
            ) row
            WHERE distance < $4
        ) features
        "#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> DatabaseArgs {
        DatabaseArgs {
            db_user: Some("recycling".to_string()),
            db_pass: Some("secret".to_string()),
            db_name: Some("austin".to_string()),
            db_port: Some(5432),
            ..Default::default()
        }
    }

    #[test]
    fn configured() {
        assert!(!DatabaseArgs::default().is_configured());
        assert!(!args().is_configured());

        let tcp = DatabaseArgs {
            db_tcp_host: Some("127.0.0.1".to_string()),
            ..args()
        };
        assert!(tcp.is_configured());
        let options = tcp.connect_options().unwrap();
        assert_eq!(options.get_host(), "127.0.0.1");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_database(), Some("austin"));

        let socket = DatabaseArgs {
            instance_unix_socket: Some("/cloudsql/project:region:instance".to_string()),
            ..args()
        };
        assert!(socket.is_configured());
        assert!(socket.connect_options().is_ok());
    }

    #[test]
    fn missing_variable() {
        let tcp = DatabaseArgs {
            db_tcp_host: Some("127.0.0.1".to_string()),
            db_pass: None,
            ..args()
        };
        let err = tcp.connect_options().unwrap_err();
        assert_eq!(err.to_string(), "DB_PASS environment variable not set");

        let tcp = DatabaseArgs {
            db_tcp_host: Some("127.0.0.1".to_string()),
            db_port: None,
            ..args()
        };
        let err = tcp.connect_options().unwrap_err();
        assert_eq!(err.to_string(), "DB_PORT environment variable not set");

        // the port only matters over TCP
        let socket = DatabaseArgs {
            instance_unix_socket: Some("/cloudsql/project:region:instance".to_string()),
            db_port: None,
            ..args()
        };
        assert!(socket.connect_options().is_ok());

        let err = args().connect_options().unwrap_err();
        assert!(err.to_string().contains("DB_TCP_HOST"));
    }

    #[test]
    fn port_from_environment() {
        use clap::Parser;

        #[derive(Debug, Parser)]
        struct Cli {
            #[command(flatten)]
            database: DatabaseArgs,
        }

        let cli = Cli::try_parse_from([
            "dropoffs",
            "--db-user",
            "recycling",
            "--db-pass",
            "secret",
            "--db-name",
            "austin",
            "--db-tcp-host",
            "127.0.0.1",
        ])
        .unwrap();
        if std::env::var_os("DB_PORT").is_none() {
            let err = cli.database.connect_options().unwrap_err();
            assert_eq!(err.to_string(), "DB_PORT environment variable not set");
        }

        let cli = Cli::try_parse_from([
            "dropoffs",
            "--db-user",
            "recycling",
            "--db-pass",
            "secret",
            "--db-name",
            "austin",
            "--db-tcp-host",
            "127.0.0.1",
            "--db-port",
            "6432",
        ])
        .unwrap();
        assert_eq!(cli.database.connect_options().unwrap().get_port(), 6432);
    }

    #[test]
    fn query_text() {
        let query = nearby_query("austinrecycling").unwrap();
        assert!(query.contains("FROM austinrecycling"));
        assert!(query.contains("LIMIT $3"));
        assert!(query.contains("WHERE distance < $4"));

        assert!(nearby_query("stores; DROP TABLE stores").is_err());
        assert!(nearby_query("").is_err());
    }
}
