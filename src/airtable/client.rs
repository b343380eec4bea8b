// src/airtable/client.rs

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde::{
    de::{DeserializeOwned, IgnoredAny},
    Deserialize, Serialize,
};
use tracing::{debug, instrument};
use url::Url;

use super::{FieldSpec, Record, TableHandle, TableService};
use crate::{config::Config, error::ImportError};

/// The create-records endpoint takes at most this many records per request.
pub const MAX_RECORDS_PER_REQUEST: usize = 10;

#[derive(Deserialize)]
struct ListTablesResponse {
    tables: Vec<TableHandle>,
}

#[derive(Serialize)]
struct CreateTableBody<'a> {
    name: &'a str,
    fields: &'a [FieldSpec],
}

#[derive(Serialize)]
struct CreateRecordsBody<'a> {
    records: Vec<RecordFields<'a>>,
}

#[derive(Serialize)]
struct RecordFields<'a> {
    fields: &'a Record,
}

#[derive(Deserialize)]
struct CreateRecordsResponse {
    records: Vec<IgnoredAny>,
}

/// Blocking client for the Airtable Web API.
pub struct AirtableClient {
    http: Client,
    api_url: Url,
    api_key: String,
}

impl AirtableClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_url = Url::parse(&config.api_url)
            .with_context(|| format!("parsing Airtable API URL {}", config.api_url))?;
        if api_url.cannot_be_a_base() {
            return Err(anyhow!("Airtable API URL cannot be a base: {}", api_url));
        }
        let http = Client::builder()
            .user_agent(concat!("csv2airtable/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            http,
            api_url,
            api_key: config.api_key.clone(),
        })
    }

    /// `{api_url}/v0/<segments...>`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v0").extend(segments);
        }
        url
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .with_context(|| format!("{} failed", what))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
            return Err(ImportError::Remote {
                status: status.as_u16(),
                body,
            })
            .with_context(|| format!("{} rejected", what));
        }

        response
            .json::<T>()
            .with_context(|| format!("decoding response of {}", what))
    }
}

impl TableService for AirtableClient {
    #[instrument(level = "debug", skip(self))]
    fn list_tables(&self, base_id: &str) -> Result<Vec<TableHandle>> {
        let url = self.endpoint(&["meta", "bases", base_id, "tables"]);
        debug!(%url, "GET");
        let resp: ListTablesResponse =
            self.send(self.http.get(url), &format!("listing tables of base {}", base_id))?;
        Ok(resp.tables)
    }

    #[instrument(level = "debug", skip(self, fields), fields(n_fields = fields.len()))]
    fn create_table(&self, base_id: &str, name: &str, fields: &[FieldSpec]) -> Result<TableHandle> {
        let url = self.endpoint(&["meta", "bases", base_id, "tables"]);
        debug!(%url, "POST");
        let body = CreateTableBody { name, fields };
        self.send(
            self.http.post(url).json(&body),
            &format!("creating table {:?} in base {}", name, base_id),
        )
    }

    #[instrument(level = "debug", skip(self, table, records), fields(table = %table.id, n = records.len()))]
    fn batch_create(&self, base_id: &str, table: &TableHandle, records: &[Record]) -> Result<usize> {
        let url = self.endpoint(&[base_id, &table.id]);
        let mut created = 0;

        for (i, chunk) in records.chunks(MAX_RECORDS_PER_REQUEST).enumerate() {
            debug!(%url, chunk = i, size = chunk.len(), "POST");
            let body = CreateRecordsBody {
                records: chunk.iter().map(|fields| RecordFields { fields }).collect(),
            };
            let resp: CreateRecordsResponse = self.send(
                self.http.post(url.clone()).json(&body),
                &format!("creating records in table {}", table.id),
            )?;
            created += resp.records.len();
        }

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::{
        io::{BufRead, BufReader, Read, Write},
        net::TcpListener,
        sync::{Arc, Mutex},
        thread::{self, JoinHandle},
    };

    /// Request line and JSON body of each request the stub received.
    type Seen = Arc<Mutex<Vec<(String, Value)>>>;

    /// Serve exactly `n` requests on a local port, one per connection, answering
    /// each with `reply(request_line, body)` as `(status, json text)`.
    fn stub_server<F>(n: usize, reply: F) -> Result<(String, Seen, JoinHandle<Result<()>>)>
    where
        F: Fn(&str, &Value) -> (u16, String) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let url = format!("http://{}", listener.local_addr()?);
        let seen: Seen = Arc::default();
        let log = Arc::clone(&seen);

        let handle = thread::spawn(move || -> Result<()> {
            for _ in 0..n {
                let (mut stream, _) = listener.accept()?;
                let mut reader = BufReader::new(stream.try_clone()?);

                let mut request_line = String::new();
                reader.read_line(&mut request_line)?;
                let request_line = request_line.trim_end().to_string();

                let mut content_length = 0;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line)?;
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse()?;
                        }
                    }
                }
                let mut raw = vec![0; content_length];
                reader.read_exact(&mut raw)?;
                let body = if raw.is_empty() {
                    Value::Null
                } else {
                    serde_json::from_slice(&raw)?
                };

                let (status, payload) = reply(&request_line, &body);
                log.lock().unwrap().push((request_line, body));

                write!(
                    stream,
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    payload.len(),
                    payload
                )?;
                stream.flush()?;
            }
            Ok(())
        });

        Ok((url, seen, handle))
    }

    fn join(server: JoinHandle<Result<()>>) -> Result<()> {
        server
            .join()
            .map_err(|_| anyhow!("stub server panicked"))?
    }

    fn client(api_url: &str) -> AirtableClient {
        AirtableClient::new(&Config {
            api_key: "pat-test".into(),
            api_url: api_url.into(),
        })
        .unwrap()
    }

    #[test]
    fn endpoints() {
        let c = client("https://api.airtable.com");
        assert_eq!(
            c.endpoint(&["meta", "bases", "app1", "tables"]).as_str(),
            "https://api.airtable.com/v0/meta/bases/app1/tables"
        );
        assert_eq!(
            c.endpoint(&["app1", "tbl2"]).as_str(),
            "https://api.airtable.com/v0/app1/tbl2"
        );
    }

    #[test]
    fn endpoint_keeps_proxy_prefix() {
        let c = client("http://localhost:8080/airtable/");
        assert_eq!(
            c.endpoint(&["app1", "tbl2"]).as_str(),
            "http://localhost:8080/airtable/v0/app1/tbl2"
        );
    }

    #[test]
    fn rejects_unusable_api_url() {
        let cfg = Config {
            api_key: "k".into(),
            api_url: "mailto:someone@example.com".into(),
        };
        assert!(AirtableClient::new(&cfg).is_err());
        let cfg = Config {
            api_key: "k".into(),
            api_url: "not a url".into(),
        };
        assert!(AirtableClient::new(&cfg).is_err());
    }

    #[test]
    fn request_bodies() {
        let fields = vec![FieldSpec::text("Date"), FieldSpec::text("Value")];
        let body = CreateTableBody {
            name: "natwest",
            fields: &fields,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "name": "natwest",
                "fields": [
                    {"name": "Date", "type": "singleLineText"},
                    {"name": "Value", "type": "singleLineText"},
                ]
            })
        );

        let record: Record = [("Date", "2024-01-01"), ("Value", "900")].into_iter().collect();
        let body = CreateRecordsBody {
            records: vec![RecordFields { fields: &record }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"records": [{"fields": {"Date": "2024-01-01", "Value": "900"}}]})
        );
    }

    #[test]
    fn list_response_ignores_extra_fields() {
        let raw = r#"{"tables":[{"id":"tbl1","name":"natwest","primaryFieldId":"fld1","fields":[],"views":[]}]}"#;
        let resp: ListTablesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            resp.tables,
            vec![TableHandle {
                id: "tbl1".into(),
                name: "natwest".into()
            }]
        );
    }

    #[test]
    fn batch_create_sends_chunks_of_ten_in_order() -> Result<()> {
        let (url, seen, server) = stub_server(3, |_, body| {
            let n = body["records"].as_array().map_or(0, Vec::len);
            let created: Vec<Value> = (0..n).map(|i| json!({ "id": format!("rec{}", i) })).collect();
            (200, json!({ "records": created }).to_string())
        })?;
        let table = TableHandle {
            id: "tbl1".into(),
            name: "natwest".into(),
        };
        let records: Vec<Record> = (0..23)
            .map(|i| [("Date", i.to_string())].into_iter().collect())
            .collect();

        let created = client(&url).batch_create("app1", &table, &records)?;
        join(server)?;
        assert_eq!(created, 23);

        let seen = seen.lock().unwrap();
        let lines: Vec<&str> = seen.iter().map(|(line, _)| line.as_str()).collect();
        assert_eq!(lines, vec!["POST /v0/app1/tbl1 HTTP/1.1"; 3]);

        let dates: Vec<Vec<String>> = seen
            .iter()
            .map(|(_, body)| {
                body["records"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|r| r["fields"]["Date"].as_str().unwrap().to_string())
                    .collect()
            })
            .collect();
        let expected: Vec<Vec<String>> = [0..10, 10..20, 20..23]
            .into_iter()
            .map(|rows| rows.map(|i| i.to_string()).collect())
            .collect();
        assert_eq!(dates, expected);
        Ok(())
    }

    #[test]
    fn non_success_status_becomes_remote_error() -> Result<()> {
        let (url, seen, server) =
            stub_server(1, |_, _| (422, r#"{"error":"INVALID"}"#.to_string()))?;

        let err = client(&url)
            .create_table("app1", "t", &[FieldSpec::text("Date")])
            .unwrap_err();
        join(server)?;

        match err.downcast_ref::<ImportError>() {
            Some(ImportError::Remote { status, body }) => {
                assert_eq!(*status, 422);
                assert_eq!(body, r#"{"error":"INVALID"}"#);
            }
            other => panic!("expected remote error, got {:?}", other),
        }
        assert!(format!("{:#}", err).contains(r#"{"error":"INVALID"}"#));

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, "POST /v0/meta/bases/app1/tables HTTP/1.1");
        assert_eq!(seen[0].1["name"], "t");
        Ok(())
    }
}
