//! Wi-Fi network operations.
//!
//! Thin wrappers over the RouterOS wireless menus. Every operation is a
//! stateless request/response exchange with no retry and no local cache:
//! the router's configuration is the only source of truth.
//!
//! A network named `X` is represented on the router by a wireless
//! interface `X` paired with a security profile of the same name holding
//! its WPA2 pre-shared key.

use anyhow::Result;

use crate::client::Transport;
use crate::error::MikrotikWifiError;

/// Lists the SSIDs of all configured wireless networks, in the order the
/// router reports them.
pub async fn list_networks<T: Transport>(client: &T) -> Result<Vec<String>> {
    let replies = client.run("/interface/wireless/print", &[]).await?;
    Ok(replies
        .iter()
        .map(|re| re.get("ssid").unwrap_or_default().to_string())
        .collect())
}

/// Creates a new network: a WPA2 security profile named after the SSID,
/// then a wireless interface bound to it on the master radio.
pub async fn create_network<T: Transport>(client: &T, ssid: &str, password: &str) -> Result<()> {
    client
        .run(
            "/interface/wireless/security-profiles/add",
            &[
                format!("=name={ssid}"),
                format!("=wpa2-pre-shared-key={password}"),
            ],
        )
        .await?;

    client
        .run(
            "/interface/wireless/add",
            &[
                format!("=name={ssid}"),
                format!("=ssid={ssid}"),
                format!("=security-profile={ssid}"),
                "=master-interface=wlan1".to_string(),
            ],
        )
        .await?;

    Ok(())
}

/// Updates one property of an existing network. `ssid` renames the
/// wireless interface only; `password` rotates the security profile's
/// pre-shared key only.
pub async fn update_network<T: Transport>(
    client: &T,
    ssid: &str,
    property: &str,
    new_value: &str,
) -> Result<()> {
    match property {
        "ssid" => {
            client
                .run(
                    "/interface/wireless/set",
                    &[format!("?ssid={ssid}"), format!("=ssid={new_value}")],
                )
                .await?;
        }
        "password" => {
            client
                .run(
                    "/interface/wireless/security-profiles/set",
                    &[
                        format!("?name={ssid}"),
                        format!("=wpa2-pre-shared-key={new_value}"),
                    ],
                )
                .await?;
        }
        other => return Err(MikrotikWifiError::UnknownProperty(other.to_string()).into()),
    }

    Ok(())
}

/// Removes the wireless interface matching the SSID.
pub async fn remove_network<T: Transport>(client: &T, ssid: &str) -> Result<()> {
    client
        .run("/interface/wireless/remove", &[format!("?ssid={ssid}")])
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Reply;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records every issued command and plays back scripted replies by
    /// command path.
    #[derive(Default)]
    struct ScriptedTransport {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        replies: HashMap<String, Vec<Reply>>,
    }

    impl ScriptedTransport {
        fn with_replies(command: &str, words: &[&[&str]]) -> Self {
            let replies = words
                .iter()
                .map(|record| {
                    record
                        .iter()
                        .map(|w| w.to_string())
                        .collect::<Vec<String>>()
                })
                .map(|ws| reply_from(&ws))
                .collect();
            Self {
                calls: Mutex::new(Vec::new()),
                replies: HashMap::from([(command.to_string(), replies)]),
            }
        }

        fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn reply_from(words: &[String]) -> Reply {
        Reply::from_words(words)
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn run(&self, command: &str, args: &[String]) -> Result<Vec<Reply>> {
            self.calls
                .lock()
                .unwrap()
                .push((command.to_string(), args.to_vec()));
            Ok(self.replies.get(command).cloned().unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn list_returns_ssids_in_reply_order() {
        let transport = ScriptedTransport::with_replies(
            "/interface/wireless/print",
            &[&["=ssid=home"], &["=ssid=guest"], &["=ssid=iot"]],
        );

        let ssids = list_networks(&transport).await.unwrap();
        assert_eq!(ssids, vec!["home", "guest", "iot"]);

        // No intervening mutation: the same call answers the same way.
        let again = list_networks(&transport).await.unwrap();
        assert_eq!(again, ssids);
    }

    #[tokio::test]
    async fn create_adds_profile_then_interface() {
        let transport = ScriptedTransport::default();

        create_network(&transport, "guest", "secret123")
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "/interface/wireless/security-profiles/add");
        assert_eq!(
            calls[0].1,
            vec!["=name=guest", "=wpa2-pre-shared-key=secret123"]
        );
        assert_eq!(calls[1].0, "/interface/wireless/add");
        assert_eq!(
            calls[1].1,
            vec![
                "=name=guest",
                "=ssid=guest",
                "=security-profile=guest",
                "=master-interface=wlan1"
            ]
        );
    }

    #[tokio::test]
    async fn update_ssid_touches_only_the_wireless_interface() {
        let transport = ScriptedTransport::default();

        update_network(&transport, "guest", "ssid", "guest2")
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "/interface/wireless/set");
        assert_eq!(calls[0].1, vec!["?ssid=guest", "=ssid=guest2"]);
    }

    #[tokio::test]
    async fn update_password_touches_only_the_security_profile() {
        let transport = ScriptedTransport::default();

        update_network(&transport, "guest", "password", "newsecret")
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "/interface/wireless/security-profiles/set");
        assert_eq!(
            calls[0].1,
            vec!["?name=guest", "=wpa2-pre-shared-key=newsecret"]
        );
    }

    #[tokio::test]
    async fn update_rejects_unknown_properties_without_touching_the_router() {
        let transport = ScriptedTransport::default();

        let err = update_network(&transport, "guest", "channel", "11")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("channel"), "{err}");
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn remove_targets_the_matching_ssid() {
        let transport = ScriptedTransport::default();

        remove_network(&transport, "guest").await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "/interface/wireless/remove");
        assert_eq!(calls[0].1, vec!["?ssid=guest"]);
    }

    #[tokio::test]
    async fn list_tolerates_records_without_an_ssid() {
        let transport = ScriptedTransport::with_replies(
            "/interface/wireless/print",
            &[&["=ssid=home"], &["=name=wlan9"]],
        );

        let ssids = list_networks(&transport).await.unwrap();
        assert_eq!(ssids, vec!["home", ""]);
    }
}
