use ebics_core::return_code::OrderStatus;
use ebics_core::types::{OrderAttribute, OrderType, TransactionDirection};
use ebics_core::EbicsError;
use ebics_xml::names::*;
use ebics_xml::Element;

use crate::transaction::TransactionOutcome;

use super::Command;

/// HPD: download the bank's access and protocol parameters.
pub struct HpdCommand;

#[derive(Debug, Clone)]
pub struct HpdResponse {
    pub status: OrderStatus,
    pub access: Option<AccessParams>,
    pub protocol: Option<ProtocolParams>,
}

/// `AccessParams` of the HPD order data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessParams {
    pub url: String,
    pub institute: String,
    pub host_id: String,
}

/// `ProtocolParams`: what the host supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolParams {
    /// Schema versions offered by the host, e.g. `["H004", "H005"]`.
    pub protocols: Vec<String>,
    pub recovery_supported: bool,
    pub prevalidation_supported: bool,
    pub x509_data_supported: bool,
    pub x509_data_persistent: bool,
    pub client_data_download_supported: bool,
    pub downloadable_order_data_supported: bool,
}

impl Command for HpdCommand {
    type Response = HpdResponse;

    fn order_type(&self) -> OrderType {
        OrderType::Hpd
    }

    fn order_attribute(&self) -> OrderAttribute {
        OrderAttribute::Dzhnn
    }

    fn direction(&self) -> TransactionDirection {
        TransactionDirection::Download
    }

    fn deserialize(&self, outcome: TransactionOutcome) -> Result<Self::Response, EbicsError> {
        let Some(payload) = outcome.payload else {
            return Ok(HpdResponse {
                status: outcome.status,
                access: None,
                protocol: None,
            });
        };

        let doc = Element::parse(&payload)?;
        if doc.local_name() != HPD_RESPONSE_ORDER_DATA {
            return Err(EbicsError::Deserialization(format!(
                "expected HPDResponseOrderData, got <{}>",
                doc.name
            )));
        }

        let access = doc.first_child(ACCESS_PARAMS).map(|el| AccessParams {
            url: child_text(el, URL),
            institute: child_text(el, INSTITUTE),
            host_id: child_text(el, HOST_ID),
        });

        let protocol = doc.first_child(PROTOCOL_PARAMS).map(|el| {
            let protocols = el
                .first_child(VERSION)
                .map(|version| {
                    version
                        .find_all(PROTOCOL)
                        .iter()
                        .map(|p| p.text_content().trim().to_string())
                        .collect()
                })
                .unwrap_or_default();
            ProtocolParams {
                protocols,
                recovery_supported: supported(el, RECOVERY),
                prevalidation_supported: supported(el, PRE_VALIDATION),
                x509_data_supported: supported(el, X509_DATA),
                x509_data_persistent: el
                    .first_child(X509_DATA)
                    .and_then(|x| x.attribute(ATTR_PERSISTENT))
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(false),
                client_data_download_supported: supported(el, CLIENT_DATA_DOWNLOAD),
                downloadable_order_data_supported: supported(el, DOWNLOADABLE_ORDER_DATA),
            }
        });

        Ok(HpdResponse {
            status: outcome.status,
            access,
            protocol,
        })
    }
}

fn child_text(parent: &Element, name: &str) -> String {
    parent
        .first_child(name)
        .map(|el| el.text_content().trim().to_string())
        .unwrap_or_default()
}

/// The schema defaults `supported` to true; an absent capability element
/// means unsupported.
fn supported(parent: &Element, name: &str) -> bool {
    parent
        .first_child(name)
        .map(|el| el.attribute(ATTR_SUPPORTED) != Some("false"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebics_core::return_code::ReturnCode;

    fn outcome_with(payload: &[u8]) -> TransactionOutcome {
        TransactionOutcome {
            status: OrderStatus {
                technical_code: ReturnCode::OK,
                business_code: Some(ReturnCode::OK),
                report_text: "[EBICS_OK] OK".into(),
                order_id: None,
            },
            payload: Some(payload.to_vec()),
            response: Element::new("ebicsResponse"),
        }
    }

    #[test]
    fn parses_bank_parameters() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<HPDResponseOrderData xmlns="urn:org:ebics:H004">
  <AccessParams>
    <URL>https://ebics.bank.example/ebicsweb</URL>
    <Institute>Bank Example AG</Institute>
    <HostID>EBIXHOST</HostID>
  </AccessParams>
  <ProtocolParams>
    <Version>
      <Protocol>H004</Protocol>
      <Protocol>H005</Protocol>
    </Version>
    <Recovery supported="true"/>
    <PreValidation supported="false"/>
    <X509Data supported="true" persistent="false"/>
    <ClientDataDownload supported="true"/>
    <DownloadableOrderData supported="true"/>
  </ProtocolParams>
</HPDResponseOrderData>"#;

        let response = HpdCommand.deserialize(outcome_with(xml)).unwrap();
        let access = response.access.unwrap();
        assert_eq!(access.url, "https://ebics.bank.example/ebicsweb");
        assert_eq!(access.institute, "Bank Example AG");
        assert_eq!(access.host_id, "EBIXHOST");

        let protocol = response.protocol.unwrap();
        assert_eq!(protocol.protocols, vec!["H004", "H005"]);
        assert!(protocol.recovery_supported);
        assert!(!protocol.prevalidation_supported);
        assert!(protocol.x509_data_supported);
        assert!(!protocol.x509_data_persistent);
        assert!(protocol.client_data_download_supported);
        assert!(protocol.downloadable_order_data_supported);
    }

    #[test]
    fn missing_capability_elements_read_as_unsupported() {
        let xml = br#"<HPDResponseOrderData xmlns="urn:org:ebics:H004">
  <ProtocolParams>
    <Version><Protocol>H004</Protocol></Version>
    <Recovery/>
  </ProtocolParams>
</HPDResponseOrderData>"#;

        let response = HpdCommand.deserialize(outcome_with(xml)).unwrap();
        let protocol = response.protocol.unwrap();
        // An attribute-less capability element defaults to supported.
        assert!(protocol.recovery_supported);
        assert!(!protocol.prevalidation_supported);
        assert!(!protocol.client_data_download_supported);
        assert!(response.access.is_none());
    }

    #[test]
    fn foreign_payload_is_a_deserialization_error() {
        let err = HpdCommand
            .deserialize(outcome_with(b"<SomethingElse/>"))
            .unwrap_err();
        assert!(matches!(err, EbicsError::Deserialization(_)));
    }
}
