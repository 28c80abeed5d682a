use async_trait::async_trait;
use reqwest::Client;

use crate::config::Config;
use crate::error::CollectError;
use crate::models::point::Point;

/// InfluxDB timestamp precision used for every batch.
pub const PRECISION: &str = "s";

/// All points of one cycle, sharing a database and a timestamp.
#[derive(Debug, Clone)]
pub struct Batch {
    pub database: String,
    pub timestamp: i64,
    pub points: Vec<Point>,
}

impl Batch {
    pub fn new(database: impl Into<String>, timestamp: i64) -> Self {
        Self {
            database: database.into(),
            timestamp,
            points: Vec::new(),
        }
    }

    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn add_points(&mut self, points: impl IntoIterator<Item = Point>) {
        self.points.extend(points);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Line-protocol body, one line per point.
    pub fn to_line_protocol(&self) -> String {
        let mut out = String::with_capacity(self.points.len() * 256);
        for point in &self.points {
            point.write_line(&mut out, self.timestamp);
            out.push('\n');
        }
        out
    }
}

#[async_trait]
pub trait MetricSink: Send + Sync {
    async fn write(&self, batch: &Batch) -> Result<(), CollectError>;
}

/// Writes batches to the InfluxDB 1.x `/write` endpoint.
pub struct InfluxSink {
    client: Client,
    write_url: String,
}

impl InfluxSink {
    pub fn new(client: Client, config: &Config) -> Self {
        let base = config.influxdb_connection.trim_end_matches('/');
        Self {
            client,
            write_url: format!("{base}/write"),
        }
    }

    pub fn write_url(&self) -> &str {
        &self.write_url
    }
}

#[async_trait]
impl MetricSink for InfluxSink {
    async fn write(&self, batch: &Batch) -> Result<(), CollectError> {
        tracing::debug!(
            url = %self.write_url,
            database = %batch.database,
            points = batch.len(),
            "sink: POST /write"
        );

        let resp = self
            .client
            .post(&self.write_url)
            .query(&[("db", batch.database.as_str()), ("precision", PRECISION)])
            .body(batch.to_line_protocol())
            .send()
            .await
            .map_err(CollectError::Sink)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CollectError::SinkStatus { status, body });
        }

        tracing::debug!(status = status.as_u16(), "sink: write accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_shares_timestamp() {
        let mut batch = Batch::new("mastidon", 1_600_000_000);
        batch.add_point(Point::new("totals").field("totalUsers", 3i64));
        batch.add_points(vec![
            Point::new("instances").tag("id", "a").field("users", 1i64),
            Point::new("instances").tag("id", "b").field("users", 2i64),
        ]);

        assert_eq!(batch.len(), 3);
        assert_eq!(
            batch.to_line_protocol(),
            "totals totalUsers=3i 1600000000\n\
             instances,id=a users=1i 1600000000\n\
             instances,id=b users=2i 1600000000\n"
        );
    }

    #[test]
    fn test_write_url_trims_trailing_slash() {
        let config = Config {
            influxdb_connection: "http://influx:8086/".into(),
            ..Config::default()
        };
        let sink = InfluxSink::new(Client::new(), &config);
        assert_eq!(sink.write_url(), "http://influx:8086/write");
    }
}
