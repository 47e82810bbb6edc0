//! Seitenwahl aus der Page-URL

use crate::config::WebCallConfig;
use url::Url;

/// Pfad der Join-Seite
pub const JOIN_PATH: &str = "/custom";

/// Welche Seite angezeigt wird
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    /// Startet Calls mit fest konfigurierten IDs
    Start {
        organization_id: String,
        use_case_id: String,
    },
    /// Tritt einem Room mit Zugangsdaten aus der Query bei
    Join {
        room_url: Option<String>,
        token: Option<String>,
    },
}

impl Page {
    /// Wählt die Seite anhand von Pfad und Query-Parametern
    ///
    /// Die Room-URL kommt aus `roomUrl` oder, falls nicht gesetzt, aus
    /// `liveKitUrl`. Fehlende Parameter fallen erst beim Join auf.
    pub fn from_url(url: &Url, config: &WebCallConfig) -> Self {
        if url.path().trim_end_matches('/') != JOIN_PATH {
            return Self::Start {
                organization_id: config.organization_id.clone(),
                use_case_id: config.use_case_id.clone(),
            };
        }

        let query = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        Self::Join {
            room_url: query("roomUrl").or_else(|| query("liveKitUrl")),
            token: query("token"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WebCallConfig {
        WebCallConfig::from_lookup(|key| match key {
            "WEBCALL_ORGANIZATION_ID" => Some("org-1".to_string()),
            "WEBCALL_USE_CASE_ID" => Some("uc-1".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_start_page() {
        let url = Url::parse("http://localhost:5173/").unwrap();

        assert_eq!(
            Page::from_url(&url, &config()),
            Page::Start {
                organization_id: "org-1".to_string(),
                use_case_id: "uc-1".to_string(),
            }
        );
    }

    #[test]
    fn test_join_page_with_live_kit_url() {
        let url =
            Url::parse("http://localhost/custom?liveKitUrl=wss%3A%2F%2Froom.io&token=abc").unwrap();

        assert_eq!(
            Page::from_url(&url, &config()),
            Page::Join {
                room_url: Some("wss://room.io".to_string()),
                token: Some("abc".to_string()),
            }
        );
    }

    #[test]
    fn test_room_url_wins_over_live_kit_url() {
        let url = Url::parse("http://localhost/custom/?liveKitUrl=wss://a&roomUrl=wss://b").unwrap();

        assert_eq!(
            Page::from_url(&url, &config()),
            Page::Join {
                room_url: Some("wss://b".to_string()),
                token: None,
            }
        );
    }
}
