use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize, Serializer};

#[derive(Deserialize, Debug, Clone)]
pub struct Server {
    pub id: u64,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub public_net: PublicNet,
}

impl Server {
    /// First public IPv4 address, if the server has one
    pub fn ipv4(&self) -> Option<&str> {
        self.public_net.ipv4.as_ref().map(|v4| v4.ip.as_str())
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PublicNet {
    pub ipv4: Option<Ipv4>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Ipv4 {
    pub ip: String,
}

/// Image to boot from, either a numeric image ID or a name like `ubuntu-24.04`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ImageRef {
    Id(u64),
    Name(String),
}

impl Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Name(name) => f.write_str(name),
        }
    }
}

// The API takes both forms as a string
impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Body of `POST /servers`
#[derive(Serialize, Debug, Clone)]
pub struct CreateServer {
    pub name: String,
    pub server_type: String,
    pub image: ImageRef,
    pub ssh_keys: Vec<String>,
    pub location: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct CreateServerResponse {
    pub server: Server,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ServersPage {
    pub servers: Vec<Server>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl ServersPage {
    pub fn next_page(&self) -> Option<u32> {
        self.meta.as_ref()?.pagination.as_ref()?.next_page
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct Meta {
    pub pagination: Option<Pagination>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct Pagination {
    pub next_page: Option<u32>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ApiErrorBody {
    pub error: ApiError,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ApiError {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn create_body() {
        let body = CreateServer {
            name: "collector-001".to_owned(),
            server_type: "cx22".to_owned(),
            image: ImageRef::Id(114690387),
            ssh_keys: vec!["controller".to_owned()],
            location: "nbg1".to_owned(),
            labels: BTreeMap::from([
                ("batch".to_owned(), "batch-001".to_owned()),
                ("role".to_owned(), "data-collection".to_owned()),
            ]),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["image"], "114690387");
        assert_eq!(value["ssh_keys"][0], "controller");
        assert_eq!(value["labels"]["batch"], "batch-001");
    }

    #[test]
    fn image_from_config() {
        let id: ImageRef = serde_json::from_str("67794396").unwrap();
        assert_eq!(id, ImageRef::Id(67794396));
        let name: ImageRef = serde_json::from_str("\"ubuntu-24.04\"").unwrap();
        assert_eq!(name.to_string(), "ubuntu-24.04");
    }

    #[test]
    fn servers_page() {
        let page: ServersPage = serde_json::from_str(
            r#"{
                "servers": [
                    {"id": 1, "name": "collector-001", "status": "running",
                     "public_net": {"ipv4": {"ip": "203.0.113.7", "blocked": false}, "ipv6": null}},
                    {"id": 2, "name": "collector-002", "status": "initializing",
                     "public_net": {"ipv4": null}}
                ],
                "meta": {"pagination": {"page": 1, "per_page": 50, "next_page": 2}}
            }"#,
        )
        .unwrap();
        assert_eq!(page.next_page(), Some(2));
        assert_eq!(page.servers[0].ipv4(), Some("203.0.113.7"));
        assert_eq!(page.servers[1].ipv4(), None);
    }

    #[test]
    fn last_page() {
        let page: ServersPage = serde_json::from_str(
            r#"{"servers": [], "meta": {"pagination": {"page": 3, "next_page": null}}}"#,
        )
        .unwrap();
        assert_eq!(page.next_page(), None);
    }
}
