use std::{fmt::Display, str::FromStr};
use url::Url;

use crate::{SourceKey, SourceUrlErr};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Endpoint of a collaborator with source key(s).
///
/// Examples:
///
/// ```ignore
/// stdio://
/// stdio:///document
/// http://localhost:8123/document
/// http://proton:8123/document,schools
/// ```
pub struct SourceUrl {
    endpoint: Url,
    sources: Vec<SourceKey>,
}

impl SourceUrl {
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn protocol(&self) -> &str {
        self.endpoint.scheme()
    }

    pub fn source_keys(&self) -> &[SourceKey] {
        &self.sources
    }

    pub fn source_key(&self) -> Result<SourceKey, SourceUrlErr> {
        match self.sources.as_slice() {
            [one] => Ok(one.to_owned()),
            _ => Err(SourceUrlErr::NotOneSourceKey),
        }
    }
}

impl Display for SourceUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.endpoint.as_str().trim_end_matches('/'))?;
        write!(f, "/")?;
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{source}")?;
        }
        Ok(())
    }
}

impl FromStr for SourceUrl {
    type Err = SourceUrlErr;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let (protocol, remaining) = url.split_once("://").ok_or(SourceUrlErr::ProtocolRequired)?;
        if protocol.is_empty() {
            return Err(SourceUrlErr::ProtocolRequired);
        }
        let (host, sources) = match remaining.split_once('/') {
            Some((host, sources)) => (host, sources),
            None => (remaining, ""),
        };
        let endpoint: Url = if host.is_empty() {
            format!("{protocol}://.").parse()?
        } else {
            format!("{protocol}://{host}").parse()?
        };
        let sources = sources
            .split(',')
            .filter(|x| !x.is_empty())
            .map(SourceKey::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { endpoint, sources })
    }
}
