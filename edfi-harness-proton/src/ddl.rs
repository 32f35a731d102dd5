use edfi_harness_types::SourceKey;

/// The stream the platform's documents land in, unless configured otherwise
pub const DEFAULT_STREAM: &str = "document";
/// The topic the platform publishes documents to
pub const DEFAULT_TOPIC: &str = "edfi.dms.document";
pub const DEFAULT_BROKERS: &str = "dms-kafka1:9092";

#[derive(Debug, Clone, PartialEq, Eq)]
/// A Proton stream reading a Kafka topic, one `raw` string column per message.
pub struct ExternalStream {
    name: SourceKey,
    brokers: String,
    topic: SourceKey,
    skip_ssl_cert_check: bool,
}

impl Default for ExternalStream {
    fn default() -> Self {
        Self {
            name: SourceKey::new(DEFAULT_STREAM).expect("valid stream name"),
            brokers: DEFAULT_BROKERS.to_owned(),
            topic: SourceKey::new(DEFAULT_TOPIC).expect("valid topic name"),
            skip_ssl_cert_check: true,
        }
    }
}

impl ExternalStream {
    pub fn new(name: SourceKey, brokers: String, topic: SourceKey) -> Self {
        Self {
            name,
            brokers,
            topic,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &SourceKey {
        &self.name
    }

    /// Comma separated `host:port` list
    pub fn set_brokers<S: Into<String>>(&mut self, v: S) -> &mut Self {
        self.brokers = v.into();
        self
    }
    pub fn brokers(&self) -> &str {
        &self.brokers
    }

    pub fn set_topic(&mut self, v: SourceKey) -> &mut Self {
        self.topic = v;
        self
    }
    pub fn topic(&self) -> &SourceKey {
        &self.topic
    }

    /// If unset, defaults to true.
    pub fn set_skip_ssl_cert_check(&mut self, v: bool) -> &mut Self {
        self.skip_ssl_cert_check = v;
        self
    }
    pub fn skip_ssl_cert_check(&self) -> bool {
        self.skip_ssl_cert_check
    }

    pub fn to_sql(&self) -> String {
        format!(
            "CREATE EXTERNAL STREAM IF NOT EXISTS {}(raw string) \
             SETTINGS type='kafka', brokers='{}', topic='{}', skip_ssl_cert_check='{}'",
            self.name,
            quote(&self.brokers),
            self.topic,
            self.skip_ssl_cert_check
        )
    }
}

/// Every message of a stream.
pub fn select_all(stream: &SourceKey) -> String {
    format!("SELECT * FROM {stream}")
}

/// Messages of a stream carrying documents of one resource, e.g. `School`.
pub fn select_resource(stream: &SourceKey, resource: &str) -> String {
    format!(
        "SELECT * FROM {stream} WHERE raw:resourcename='{}'",
        quote(resource)
    )
}

/// Escape the inside of a single-quoted string literal.
fn quote(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_external_stream() {
        assert_eq!(
            ExternalStream::default().to_sql(),
            "CREATE EXTERNAL STREAM IF NOT EXISTS document(raw string) \
             SETTINGS type='kafka', brokers='dms-kafka1:9092', topic='edfi.dms.document', skip_ssl_cert_check='true'"
        );

        let mut stream = ExternalStream::new(
            SourceKey::new("schools").unwrap(),
            "localhost:9092,localhost:9093".to_owned(),
            SourceKey::new("edfi.dms.school").unwrap(),
        );
        stream.set_skip_ssl_cert_check(false);
        assert_eq!(
            stream.to_sql(),
            "CREATE EXTERNAL STREAM IF NOT EXISTS schools(raw string) \
             SETTINGS type='kafka', brokers='localhost:9092,localhost:9093', topic='edfi.dms.school', skip_ssl_cert_check='false'"
        );
    }

    #[test]
    fn test_select() {
        let stream = SourceKey::new("document").unwrap();
        assert_eq!(select_all(&stream), "SELECT * FROM document");
        assert_eq!(
            select_resource(&stream, "School"),
            "SELECT * FROM document WHERE raw:resourcename='School'"
        );
        assert_eq!(
            select_resource(&stream, "O'Brien"),
            "SELECT * FROM document WHERE raw:resourcename='O\\'Brien'"
        );
    }
}
